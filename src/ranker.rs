//! Ordering and summary text for one displayed result set.

use crate::model::{FilterType, SearchStats, VideoResult};

/// Results of the last successful search, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
  videos: Vec<VideoResult>,
  stats: SearchStats,
}

impl ResultSet {
  pub fn new(videos: Vec<VideoResult>, stats: SearchStats) -> Self {
    Self { videos, stats }
  }

  pub fn len(&self) -> usize {
    self.videos.len()
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty()
  }

  /// Display order for `mode`. Equal keys keep backend order.
  pub fn ordered(&self, mode: FilterType) -> Vec<&VideoResult> {
    rank(&self.videos, mode)
  }

  pub fn count_label(&self) -> String {
    format!("({} videos)", self.videos.len())
  }

  /// Backend numbers, shown as-is.
  pub fn stats_label(&self) -> String {
    format!("total {}, filtered {}", self.stats.total, self.stats.filtered)
  }
}

/// `normal` ranks by views, `mutation` by ratio, both descending.
pub fn rank(videos: &[VideoResult], mode: FilterType) -> Vec<&VideoResult> {
  let mut ordered: Vec<&VideoResult> = videos.iter().collect();
  match mode {
    FilterType::Normal => ordered.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
    FilterType::Mutation => ordered.sort_by(|a, b| sort_key(b.ratio).total_cmp(&sort_key(a.ratio))),
  }
  ordered
}

/// NaN sorts as 0 so it cannot jump ahead of real ratios.
fn sort_key(ratio: f64) -> f64 {
  if ratio.is_nan() { 0.0 } else { ratio }
}
