use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  /// Colour for dimmed rows that are about to disappear.
  pub faded: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Crimson",
    bg: Color::Rgb(18, 18, 20),
    fg: Color::Rgb(226, 226, 230),
    accent: Color::Rgb(230, 57, 70),
    muted: Color::Rgb(128, 128, 138),
    border: Color::Rgb(60, 60, 68),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(120, 28, 36),
    stripe_bg: Color::Rgb(24, 24, 27),
    status: Color::Rgb(241, 196, 15),
    error: Color::Rgb(255, 99, 99),
    faded: Color::Rgb(78, 78, 86),
    key_fg: Color::Rgb(18, 18, 20),
    key_bg: Color::Rgb(230, 57, 70),
  },
  Theme {
    name: "Nord",
    bg: Color::Rgb(46, 52, 64),
    fg: Color::Rgb(216, 222, 233),
    accent: Color::Rgb(136, 192, 208),
    muted: Color::Rgb(118, 130, 150),
    border: Color::Rgb(76, 86, 106),
    highlight_fg: Color::Rgb(46, 52, 64),
    highlight_bg: Color::Rgb(136, 192, 208),
    stripe_bg: Color::Rgb(52, 58, 72),
    status: Color::Rgb(235, 203, 139),
    error: Color::Rgb(191, 97, 106),
    faded: Color::Rgb(90, 100, 118),
    key_fg: Color::Rgb(46, 52, 64),
    key_bg: Color::Rgb(129, 161, 193),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 243),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(196, 40, 40),
    muted: Color::Rgb(120, 116, 108),
    border: Color::Rgb(200, 196, 186),
    highlight_fg: Color::Rgb(250, 248, 243),
    highlight_bg: Color::Rgb(196, 40, 40),
    stripe_bg: Color::Rgb(242, 239, 232),
    status: Color::Rgb(160, 110, 0),
    error: Color::Rgb(180, 20, 20),
    faded: Color::Rgb(190, 186, 178),
    key_fg: Color::Rgb(250, 248, 243),
    key_bg: Color::Rgb(90, 90, 90),
  },
];

/// Index of the theme called `name`, falling back to the first one.
pub fn index_of(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_is_case_insensitive_with_fallback() {
    assert_eq!(index_of(Some("nord")), 1);
    assert_eq!(index_of(Some("unknown")), 0);
    assert_eq!(index_of(None), 0);
  }
}
