//! Progress reporting for a running search.
//!
//! The backend pushes `(text, percent)` pairs through a sender that is only
//! alive for one search call. The UI keeps the newest pair and nothing else,
//! and the surface disappears when the search call resolves, whatever the last
//! percent was.

use tokio::sync::mpsc;
use tracing::debug;

use crate::model::ProgressEvent;

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// What the progress bar currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
  pub text: String,
  /// Always within `0.0..=100.0`.
  pub percent: f64,
}

impl ProgressView {
  fn from_event(event: ProgressEvent) -> Self {
    Self { percent: clamp_percent(event.percent), text: event.text }
  }

  /// Gauge ratio in `0.0..=1.0`.
  pub fn ratio(&self) -> f64 {
    self.percent / 100.0
  }
}

pub fn clamp_percent(percent: f64) -> f64 {
  if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) }
}

#[derive(Debug, Default)]
pub struct ProgressChannel {
  rx: Option<mpsc::UnboundedReceiver<ProgressEvent>>,
  latest: Option<ProgressView>,
}

impl ProgressChannel {
  /// Open a fresh listener for one search and show the initial state.
  /// Any previous listener is dropped.
  pub fn attach(&mut self) -> ProgressSender {
    let (tx, rx) = mpsc::unbounded_channel();
    self.rx = Some(rx);
    self.latest = Some(ProgressView { text: "Preparing search…".to_string(), percent: 0.0 });
    tx
  }

  /// Pull everything pushed since the last frame, keeping only the newest.
  pub fn drain(&mut self) {
    let Some(rx) = self.rx.as_mut() else { return };
    let mut newest = None;
    while let Ok(event) = rx.try_recv() {
      debug!(text = %event.text, percent = event.percent, "search progress");
      newest = Some(event);
    }
    if let Some(event) = newest {
      self.latest = Some(ProgressView::from_event(event));
    }
  }

  /// Stop listening and hide the surface. Later pushes are discarded.
  pub fn detach(&mut self) {
    self.rx = None;
    self.latest = None;
  }

  pub fn visible(&self) -> Option<&ProgressView> {
    self.latest.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn event(text: &str, percent: f64) -> ProgressEvent {
    ProgressEvent { text: text.to_string(), percent }
  }

  #[test]
  fn attach_shows_preparing_state() {
    let mut ch = ProgressChannel::default();
    assert!(ch.visible().is_none());
    let _tx = ch.attach();
    assert_eq!(ch.visible().map(|v| v.percent), Some(0.0));
  }

  #[test]
  fn drain_keeps_latest_only() {
    let mut ch = ProgressChannel::default();
    let tx = ch.attach();
    tx.send(event("fetching channels", 10.0)).unwrap();
    tx.send(event("collecting feeds", 60.0)).unwrap();
    ch.drain();
    assert_eq!(ch.visible(), Some(&ProgressView { text: "collecting feeds".into(), percent: 60.0 }));
  }

  #[test]
  fn percent_is_clamped_and_may_move_backwards() {
    let mut ch = ProgressChannel::default();
    let tx = ch.attach();
    tx.send(event("over", 150.0)).unwrap();
    ch.drain();
    assert_eq!(ch.visible().unwrap().percent, 100.0);
    tx.send(event("retry", 40.0)).unwrap();
    ch.drain();
    assert_eq!(ch.visible().unwrap().percent, 40.0);
    tx.send(event("under", -5.0)).unwrap();
    ch.drain();
    assert_eq!(ch.visible().unwrap().percent, 0.0);
    tx.send(event("nan", f64::NAN)).unwrap();
    ch.drain();
    assert_eq!(ch.visible().unwrap().percent, 0.0);
  }

  #[test]
  fn detach_hides_and_ignores_late_pushes() {
    let mut ch = ProgressChannel::default();
    let tx = ch.attach();
    ch.detach();
    assert!(tx.send(event("late", 90.0)).is_err());
    ch.drain();
    assert!(ch.visible().is_none());
  }

  #[test]
  fn empty_drain_keeps_current_view() {
    let mut ch = ProgressChannel::default();
    let _tx = ch.attach();
    ch.drain();
    assert_eq!(ch.visible().unwrap().text, "Preparing search…");
  }
}
