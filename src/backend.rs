//! The call contract to the backend service.
//!
//! Every operation resolves to `anyhow::Result`. An `Err` means the call itself
//! failed (connection, decode, task panic); structured failures come back as
//! `Ok` replies with `success: false`.

use std::future::Future;

use anyhow::Result;

use crate::model::{Credentials, FilterConfig, LoadReply, Reply, SearchReply, Session};
use crate::progress::ProgressSender;

pub trait Backend: Send + Sync + 'static {
  fn check_status(&self) -> impl Future<Output = Result<Session>> + Send;

  /// Secret fields may come back redacted or empty.
  fn get_current_config(&self) -> impl Future<Output = Result<Credentials>> + Send;

  fn save_config(&self, credentials: Credentials) -> impl Future<Output = Result<Reply>> + Send;

  fn login(&self) -> impl Future<Output = Result<Reply>> + Send;

  /// Local state is discarded whatever this returns.
  fn logout(&self) -> impl Future<Output = Result<()>> + Send;

  fn load_subscriptions(&self, force_refresh: bool) -> impl Future<Output = Result<LoadReply>> + Send;

  fn unsubscribe(&self, channel_id: String) -> impl Future<Output = Result<Reply>> + Send;

  /// `progress` is only valid for this call. Pushes after the call resolved
  /// are dropped on the floor.
  fn search(&self, filter: FilterConfig, progress: ProgressSender) -> impl Future<Output = Result<SearchReply>> + Send;
}

#[cfg(test)]
pub mod fake {
  //! Scripted in-memory backend for workflow tests.

  use std::collections::HashMap;
  use std::sync::{Arc, Mutex};

  use anyhow::{Result, anyhow};
  use tokio::sync::Notify;

  use super::*;
  use crate::model::{ProgressEvent, SearchStats, SubscriptionEntry, VideoResult};

  /// `Err(msg)` makes the call fail at the transport level.
  type Scripted<T> = std::result::Result<T, String>;

  pub struct FakeBackend {
    pub session: Mutex<Scripted<Session>>,
    pub current_config: Mutex<Scripted<Credentials>>,
    pub save_reply: Mutex<Scripted<Reply>>,
    pub login_reply: Mutex<Scripted<Reply>>,
    pub logout_fails: Mutex<bool>,
    pub load_replies: Mutex<Vec<Scripted<LoadReply>>>,
    pub unsubscribe_reply: Mutex<Scripted<Reply>>,
    pub search_reply: Mutex<Scripted<SearchReply>>,
    pub progress: Mutex<Vec<ProgressEvent>>,
    /// Sender of the most recent search, kept around to push after resolution.
    pub last_progress: Mutex<Option<ProgressSender>>,
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
  }

  impl Default for FakeBackend {
    fn default() -> Self {
      Self {
        session: Mutex::new(Ok(Session::default())),
        current_config: Mutex::new(Ok(Credentials::default())),
        save_reply: Mutex::new(Ok(Reply::ok())),
        login_reply: Mutex::new(Ok(Reply::ok())),
        logout_fails: Mutex::new(false),
        load_replies: Mutex::new(Vec::new()),
        unsubscribe_reply: Mutex::new(Ok(Reply::ok())),
        search_reply: Mutex::new(Ok(SearchReply { success: true, ..SearchReply::default() })),
        progress: Mutex::new(Vec::new()),
        last_progress: Mutex::new(None),
        calls: Mutex::new(Vec::new()),
        gates: Mutex::new(HashMap::new()),
      }
    }
  }

  pub fn entry(id: &str, subscribers: Option<u64>) -> SubscriptionEntry {
    SubscriptionEntry {
      id: id.to_string(),
      title: format!("Channel {}", id),
      thumbnail: format!("https://example.com/{}.jpg", id),
      subscriber_count: subscribers,
    }
  }

  pub fn video(id: &str, views: u64, ratio: f64) -> VideoResult {
    VideoResult {
      video_id: id.to_string(),
      title: format!("Video {}", id),
      channel_title: "Channel".to_string(),
      thumbnail: String::new(),
      duration: 425,
      published_at: "2024-06-01T00:00:00Z".to_string(),
      view_count: views,
      subscriber_count: Some(2_000),
      ratio,
    }
  }

  pub fn load_ok(entries: Vec<SubscriptionEntry>, from_cache: bool) -> Scripted<LoadReply> {
    Ok(LoadReply { success: true, subscriptions: Some(entries), from_cache: Some(from_cache), error: None })
  }

  pub fn search_ok(videos: Vec<VideoResult>, total: u64) -> Scripted<SearchReply> {
    let filtered = videos.len() as u64;
    Ok(SearchReply { success: true, videos: Some(videos), stats: Some(SearchStats { total, filtered }), error: None })
  }

  impl FakeBackend {
    pub fn configured() -> Self {
      let fake = Self::default();
      *fake.session.lock().unwrap() = Ok(Session { is_configured: true, is_authenticated: false });
      fake
    }

    pub fn authenticated(entries: Vec<SubscriptionEntry>) -> Self {
      let fake = Self::default();
      *fake.session.lock().unwrap() = Ok(Session { is_configured: true, is_authenticated: true });
      fake.load_replies.lock().unwrap().push(load_ok(entries, true));
      fake
    }

    pub fn calls(&self) -> Vec<String> {
      self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
      self.calls.lock().unwrap().iter().filter(|c| c.starts_with(op)).count()
    }

    /// Hold every later call of `op` until the returned gate is notified once
    /// per call.
    pub fn hold(&self, op: &'static str) -> Arc<Notify> {
      self.gates.lock().unwrap().entry(op).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    fn record(&self, call: String) {
      self.calls.lock().unwrap().push(call);
    }

    async fn gate(&self, op: &'static str) {
      let gate = self.gates.lock().unwrap().get(op).cloned();
      if let Some(gate) = gate {
        gate.notified().await;
      }
    }
  }

  impl Backend for FakeBackend {
    async fn check_status(&self) -> Result<Session> {
      self.record("check_status".into());
      self.gate("check_status").await;
      self.session.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn get_current_config(&self) -> Result<Credentials> {
      self.record("get_current_config".into());
      self.current_config.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn save_config(&self, credentials: Credentials) -> Result<Reply> {
      self.record(format!("save_config({},{})", credentials.client_id, credentials.client_secret));
      self.gate("save_config").await;
      let reply = self.save_reply.lock().unwrap().clone().map_err(|e| anyhow!(e))?;
      if reply.success
        && let Ok(session) = self.session.lock().unwrap().as_mut()
      {
        session.is_configured = true;
      }
      Ok(reply)
    }

    async fn login(&self) -> Result<Reply> {
      self.record("login".into());
      self.gate("login").await;
      let reply = self.login_reply.lock().unwrap().clone().map_err(|e| anyhow!(e))?;
      if reply.success
        && let Ok(session) = self.session.lock().unwrap().as_mut()
      {
        session.is_authenticated = true;
      }
      Ok(reply)
    }

    async fn logout(&self) -> Result<()> {
      self.record("logout".into());
      self.gate("logout").await;
      if let Ok(session) = self.session.lock().unwrap().as_mut() {
        session.is_authenticated = false;
      }
      if *self.logout_fails.lock().unwrap() { Err(anyhow!("logout endpoint unreachable")) } else { Ok(()) }
    }

    async fn load_subscriptions(&self, force_refresh: bool) -> Result<LoadReply> {
      self.record(format!("load_subscriptions({})", force_refresh));
      self.gate("load_subscriptions").await;
      let mut replies = self.load_replies.lock().unwrap();
      // The last scripted reply repeats once the queue runs dry.
      let next = if replies.len() > 1 { replies.remove(0) } else { replies.first().cloned().unwrap_or(load_ok(vec![], false)) };
      next.map_err(|e| anyhow!(e))
    }

    async fn unsubscribe(&self, channel_id: String) -> Result<Reply> {
      self.record(format!("unsubscribe({})", channel_id));
      self.gate("unsubscribe").await;
      self.unsubscribe_reply.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    async fn search(&self, filter: FilterConfig, progress: ProgressSender) -> Result<SearchReply> {
      self.record(format!("search({})", filter.filter_type.label()));
      let events: Vec<_> = self.progress.lock().unwrap().drain(..).collect();
      for event in events {
        let _ = progress.send(event);
      }
      *self.last_progress.lock().unwrap() = Some(progress);
      self.gate("search").await;
      self.search_reply.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }
  }
}
