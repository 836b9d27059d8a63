//! Data exchanged with the backend. Field names follow the backend's
//! camelCase JSON contract.

use serde::{Deserialize, Serialize};

use crate::constants::constants;
use crate::error::{AppError, Operation};

// --- Session & credentials ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub is_configured: bool,
  pub is_authenticated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
  #[serde(default)]
  pub client_id: String,
  #[serde(default)]
  pub client_secret: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
}

impl Credentials {
  /// Copy with surrounding whitespace stripped and an empty API key dropped.
  pub fn trimmed(&self) -> Self {
    Self {
      client_id: self.client_id.trim().to_string(),
      client_secret: self.client_secret.trim().to_string(),
      api_key: self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()).map(str::to_string),
    }
  }
}

// --- Subscriptions ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub thumbnail: String,
  #[serde(default)]
  pub subscriber_count: Option<u64>,
}

// --- Search ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
  #[default]
  Normal,
  Mutation,
}

impl FilterType {
  pub fn label(self) -> &'static str {
    match self {
      FilterType::Normal => "Normal",
      FilterType::Mutation => "Mutation",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      FilterType::Normal => FilterType::Mutation,
      FilterType::Mutation => FilterType::Normal,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
  pub filter_type: FilterType,
  pub max_subscribers: u64,
  pub min_views: u64,
  pub days_within: u32,
  pub mutation_ratio: f64,
}

impl Default for FilterConfig {
  fn default() -> Self {
    let c = constants();
    Self {
      filter_type: FilterType::Normal,
      max_subscribers: c.default_max_subscribers,
      min_views: c.default_min_views,
      days_within: c.default_days_within,
      mutation_ratio: c.default_mutation_ratio,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
  pub video_id: String,
  pub title: String,
  pub channel_title: String,
  #[serde(default)]
  pub thumbnail: String,
  /// Length in seconds.
  #[serde(default)]
  pub duration: u64,
  /// Timestamp as sent by the backend (RFC 3339 or naive ISO 8601).
  #[serde(default)]
  pub published_at: String,
  #[serde(default)]
  pub view_count: u64,
  #[serde(default)]
  pub subscriber_count: Option<u64>,
  #[serde(default)]
  pub ratio: f64,
}

impl VideoResult {
  pub fn watch_url(&self) -> String {
    format!("https://www.youtube.com/watch?v={}", self.video_id)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
  pub total: u64,
  pub filtered: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
  pub text: String,
  pub percent: f64,
}

// --- Replies ---

/// `{success, error?}` reply shared by save/login/unsubscribe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl Reply {
  #[cfg(test)]
  pub fn ok() -> Self {
    Self { success: true, error: None }
  }

  #[cfg(test)]
  pub fn failed(msg: impl Into<String>) -> Self {
    Self { success: false, error: Some(msg.into()) }
  }

  pub fn into_result(self, op: Operation) -> Result<(), AppError> {
    if self.success { Ok(()) } else { Err(AppError::reported(op, self.error)) }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReply {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscriptions: Option<Vec<SubscriptionEntry>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from_cache: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// A successful subscription load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
  pub entries: Vec<SubscriptionEntry>,
  pub from_cache: bool,
}

impl LoadReply {
  pub fn into_result(self) -> Result<Loaded, AppError> {
    if !self.success {
      return Err(AppError::reported(Operation::LoadSubscriptions, self.error));
    }
    Ok(Loaded { entries: self.subscriptions.unwrap_or_default(), from_cache: self.from_cache.unwrap_or(false) })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReply {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub videos: Option<Vec<VideoResult>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stats: Option<SearchStats>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl SearchReply {
  pub fn into_result(self) -> Result<(Vec<VideoResult>, SearchStats), AppError> {
    if !self.success {
      return Err(AppError::reported(Operation::Search, self.error));
    }
    Ok((self.videos.unwrap_or_default(), self.stats.unwrap_or_default()))
  }
}
