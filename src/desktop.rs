//! Clipboard and browser hand-off.

use std::io::Write;

use anyhow::{Context, Result};
use base64::Engine;
use tracing::debug;

/// OSC 52 "set clipboard" sequence. Inside tmux the sequence has to be
/// wrapped in a DCS passthrough or tmux swallows it.
pub fn osc52_sequence(text: &str, in_tmux: bool) -> String {
  let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
  if in_tmux { format!("\x1bPtmux;\x1b\x1b]52;c;{}\x07\x1b\\", encoded) } else { format!("\x1b]52;c;{}\x07", encoded) }
}

/// Copy through the terminal, bypassing the ratatui buffer.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
  let seq = osc52_sequence(text, std::env::var_os("TMUX").is_some());
  let mut out = std::io::stdout();
  out.write_all(seq.as_bytes()).context("Failed to write clipboard sequence")?;
  out.flush().context("Failed to flush clipboard sequence")?;
  debug!(chars = text.chars().count(), "copied to clipboard");
  Ok(())
}

pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to open browser ({})", cmd))?;
  // Reap in the background so no zombie is left behind.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  debug!(%url, "opened in browser");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn osc52_plain() {
    assert_eq!(osc52_sequence("hi", false), "\x1b]52;c;aGk=\x07");
  }

  #[test]
  fn osc52_tmux_passthrough() {
    let seq = osc52_sequence("hi", true);
    assert!(seq.starts_with("\x1bPtmux;\x1b\x1b]52;c;aGk="));
    assert!(seq.ends_with("\x1b\\"));
  }

  #[test]
  fn osc52_encodes_utf8_title() {
    let seq = osc52_sequence("떡상 영상", false);
    let encoded = base64::engine::general_purpose::STANDARD.encode("떡상 영상".as_bytes());
    assert!(seq.contains(&encoded));
  }
}
