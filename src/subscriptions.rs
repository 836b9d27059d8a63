//! The in-memory list of subscribed channels.
//!
//! The stored order is whatever the last load returned. Anything shown to the
//! operator is sorted on a copy, so a removal that lands mid-render never
//! disturbs an iteration in progress.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::model::{Loaded, SubscriptionEntry};

#[derive(Debug, Default)]
pub struct SubscriptionManager {
  entries: Vec<SubscriptionEntry>,
  loaded: bool,
  from_cache: bool,
  load_failed: bool,
}

impl SubscriptionManager {
  /// Replace the whole list with a successful load. Duplicate ids keep their
  /// first occurrence.
  ///
  /// `from_cache` is only shown for non-forced loads.
  pub fn replace(&mut self, loaded: Loaded, forced: bool) {
    let mut seen = HashSet::new();
    self.entries = loaded.entries.into_iter().filter(|e| seen.insert(e.id.clone())).collect();
    self.loaded = true;
    self.from_cache = loaded.from_cache && !forced;
    self.load_failed = false;
  }

  /// Record a failed load. The current list stays as it is.
  pub fn mark_failed(&mut self) {
    self.load_failed = true;
  }

  /// Drop a channel after the backend confirmed the unsubscribe.
  pub fn remove(&mut self, channel_id: &str) -> Option<SubscriptionEntry> {
    let idx = self.entries.iter().position(|e| e.id == channel_id)?;
    Some(self.entries.remove(idx))
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  pub fn get(&self, channel_id: &str) -> Option<&SubscriptionEntry> {
    self.entries.iter().find(|e| e.id == channel_id)
  }

  pub fn entries(&self) -> &[SubscriptionEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_loaded(&self) -> bool {
    self.loaded
  }

  /// Sorted copy for display: most subscribers first, hidden counts as 0.
  pub fn sorted_for_display(&self) -> Vec<SubscriptionEntry> {
    let mut sorted = self.entries.clone();
    sort_by_subscribers(&mut sorted);
    sorted
  }

  /// One-line summary next to the load controls.
  pub fn summary_label(&self) -> String {
    if self.load_failed {
      return "error".to_string();
    }
    if !self.loaded {
      return String::new();
    }
    let suffix = if self.from_cache { " (cached)" } else { "" };
    format!("{} channels{}", self.len(), suffix)
  }

  /// Count shown in the list modal header.
  pub fn header_label(&self) -> String {
    format!("({} channels)", self.len())
  }
}

/// Stable, so channels with equal counts keep their load order.
pub fn sort_by_subscribers(entries: &mut [SubscriptionEntry]) {
  entries.sort_by(|a, b| b.subscriber_count.unwrap_or(0).cmp(&a.subscriber_count.unwrap_or(0)));
}

// --- Fade-out ---

/// A row that was already removed from the list but stays visible, dimmed,
/// for a short moment.
#[derive(Debug, Clone)]
pub struct FadingRow {
  pub entry: SubscriptionEntry,
  until: Instant,
}

#[derive(Debug, Default)]
pub struct FadeOut {
  rows: Vec<FadingRow>,
}

impl FadeOut {
  pub fn push(&mut self, entry: SubscriptionEntry, now: Instant, delay: Duration) {
    self.rows.push(FadingRow { entry, until: now + delay });
  }

  pub fn expire(&mut self, now: Instant) {
    self.rows.retain(|row| row.until > now);
  }

  pub fn clear(&mut self) {
    self.rows.clear();
  }

  pub fn contains(&self, channel_id: &str) -> bool {
    self.rows.iter().any(|row| row.entry.id == channel_id)
  }

  /// Live entries merged with fading ghosts, in display order.
  pub fn merged(&self, live: &SubscriptionManager) -> Vec<SubscriptionEntry> {
    if self.rows.is_empty() {
      return live.sorted_for_display();
    }
    let mut rows = live.entries().to_vec();
    rows.extend(self.rows.iter().map(|row| row.entry.clone()));
    sort_by_subscribers(&mut rows);
    rows
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: &str, subs: Option<u64>) -> SubscriptionEntry {
    SubscriptionEntry {
      id: id.to_string(),
      title: format!("channel {}", id),
      thumbnail: String::new(),
      subscriber_count: subs,
    }
  }

  fn loaded(entries: Vec<SubscriptionEntry>, from_cache: bool) -> Loaded {
    Loaded { entries, from_cache }
  }

  #[test]
  fn replace_swaps_whole_list_and_dedups() {
    let mut m = SubscriptionManager::default();
    m.replace(loaded(vec![entry("a", None), entry("b", None)], false), false);
    m.replace(loaded(vec![entry("c", Some(1)), entry("c", Some(2)), entry("d", None)], false), false);
    let ids: Vec<_> = m.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["c", "d"]);
    assert_eq!(m.get("c").unwrap().subscriber_count, Some(1));
  }

  #[test]
  fn cache_label_only_on_unforced_load() {
    let mut m = SubscriptionManager::default();
    m.replace(loaded(vec![entry("a", None)], true), false);
    assert_eq!(m.summary_label(), "1 channels (cached)");
    m.replace(loaded(vec![entry("a", None), entry("b", None)], true), true);
    assert_eq!(m.summary_label(), "2 channels");
  }

  #[test]
  fn failed_load_keeps_list() {
    let mut m = SubscriptionManager::default();
    m.replace(loaded(vec![entry("a", None)], false), false);
    m.mark_failed();
    assert_eq!(m.len(), 1);
    assert!(m.is_loaded());
    assert_eq!(m.summary_label(), "error");
  }

  #[test]
  fn remove_updates_both_counts() {
    let mut m = SubscriptionManager::default();
    m.replace(loaded(vec![entry("a", None), entry("b", None), entry("c", None)], false), false);
    assert_eq!(m.remove("b").map(|e| e.id), Some("b".to_string()));
    assert_eq!(m.header_label(), "(2 channels)");
    assert_eq!(m.summary_label(), "2 channels");
    assert!(m.remove("b").is_none());
  }

  #[test]
  fn display_sort_is_a_stable_copy() {
    let mut m = SubscriptionManager::default();
    m.replace(
      loaded(vec![entry("low", Some(5)), entry("hidden", None), entry("high", Some(900)), entry("zero", Some(0))], false),
      false,
    );
    let sorted: Vec<_> = m.sorted_for_display().into_iter().map(|e| e.id).collect();
    assert_eq!(sorted, ["high", "low", "hidden", "zero"]);
    let stored: Vec<_> = m.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(stored, ["low", "hidden", "high", "zero"]);
  }

  #[test]
  fn fade_keeps_ghost_until_deadline() {
    let mut m = SubscriptionManager::default();
    m.replace(loaded(vec![entry("a", Some(10)), entry("b", Some(20))], false), false);
    let removed = m.remove("b").unwrap();
    let mut fade = FadeOut::default();
    let t0 = Instant::now();
    fade.push(removed, t0, Duration::from_millis(300));

    assert_eq!(m.len(), 1);
    let rows: Vec<_> = fade.merged(&m).into_iter().map(|e| e.id).collect();
    assert_eq!(rows, ["b", "a"]);
    assert!(fade.contains("b"));

    fade.expire(t0 + Duration::from_millis(299));
    assert!(fade.contains("b"));
    fade.expire(t0 + Duration::from_millis(300));
    assert!(!fade.contains("b"));
    assert_eq!(fade.merged(&m).len(), 1);
  }
}
