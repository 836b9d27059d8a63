//! Tunables embedded from `constants.ron` at compile time and parsed once on
//! first access.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Backend
  pub default_backend_url: String,
  pub connect_timeout_secs: u64,

  // Cosmetic delays
  pub unsubscribe_fade_ms: u64,
  pub copy_feedback_ms: u64,

  // Search form defaults
  pub default_max_subscribers: u64,
  pub default_min_views: u64,
  pub default_days_within: u32,
  pub default_mutation_ratio: f64,
}

impl Constants {
  pub fn unsubscribe_fade(&self) -> Duration {
    Duration::from_millis(self.unsubscribe_fade_ms)
  }

  pub fn copy_feedback(&self) -> Duration {
    Duration::from_millis(self.copy_feedback_ms)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // The file is embedded, so a malformed constants.ron fails on first launch of any build.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.unsubscribe_fade(), Duration::from_millis(300));
    assert_eq!(c.copy_feedback(), Duration::from_millis(1500));
    assert_eq!(c.default_days_within, 15);
  }
}
