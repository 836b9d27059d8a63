//! The controller that sequences every backend call.
//!
//! Command handlers (`on_*`) validate, spawn the backend call and return right
//! away. `check_pending` is polled once per frame and applies whatever
//! finished. An operation is in flight exactly while its receiver is stored,
//! and the matching control is disabled for that whole time.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{AppError, Operation};
use crate::gate::{PrimaryAction, validate_credentials};
use crate::model::{Credentials, FilterConfig, LoadReply, Reply, SearchReply, Session, SubscriptionEntry};
use crate::progress::ProgressChannel;
use crate::ranker::ResultSet;
use crate::subscriptions::SubscriptionManager;

// --- Phase & controls ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Unconfigured,
  Configured,
  Authenticating,
  Authenticated,
  LoadingSubscriptions,
  Ready,
  Searching,
}

impl Phase {
  pub fn label(self) -> &'static str {
    match self {
      Phase::Unconfigured => "not configured",
      Phase::Configured => "logged out",
      Phase::Authenticating => "logging in",
      Phase::Authenticated => "logged in",
      Phase::LoadingSubscriptions => "loading channels",
      Phase::Ready => "ready",
      Phase::Searching => "searching",
    }
  }

  /// Whether the search pane is shown instead of the login pane.
  pub fn is_signed_in(self) -> bool {
    matches!(self, Phase::Authenticated | Phase::LoadingSubscriptions | Phase::Ready | Phase::Searching)
  }
}

/// Label and availability of one triggering action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
  pub label: &'static str,
  pub enabled: bool,
}

impl Control {
  fn idle(label: &'static str, enabled: bool) -> Self {
    Self { label, enabled }
  }

  fn busy(label: &'static str) -> Self {
    Self { label, enabled: false }
  }
}

// --- Notices & outcomes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// A blocking message the operator has to dismiss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

/// Completions the presentation layer reacts to beyond re-rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  /// Prefill for the setup form. Empty when the backend could not provide it.
  CurrentConfig(Credentials),
  ConfigSaved,
  ConfigFailed,
  Unsubscribed(SubscriptionEntry),
  /// The session ended, by logout or because the backend no longer reports
  /// it as authenticated.
  LoggedOut,
}

// --- In-flight operations ---

type Pending<T> = Option<oneshot::Receiver<Result<T>>>;

struct PendingLoad {
  force: bool,
  rx: oneshot::Receiver<Result<LoadReply>>,
}

#[derive(Default)]
struct PendingOps {
  status: Pending<Session>,
  current_config: Pending<Credentials>,
  save: Pending<Reply>,
  login: Pending<Reply>,
  logout: Pending<()>,
  load: Option<PendingLoad>,
  search: Pending<SearchReply>,
  unsubscribe: HashMap<String, oneshot::Receiver<Result<Reply>>>,
}

impl PendingOps {
  #[cfg(test)]
  fn any(&self) -> bool {
    self.status.is_some()
      || self.current_config.is_some()
      || self.save.is_some()
      || self.login.is_some()
      || self.logout.is_some()
      || self.load.is_some()
      || self.search.is_some()
      || !self.unsubscribe.is_empty()
  }
}

fn spawn_op<T, F>(fut: F) -> oneshot::Receiver<Result<T>>
where
  T: Send + 'static,
  F: Future<Output = Result<T>> + Send + 'static,
{
  let (tx, rx) = oneshot::channel();
  tokio::spawn(async move {
    let _ = tx.send(fut.await);
  });
  rx
}

/// `None` while the task is still running.
fn poll_rx<T>(rx: &mut oneshot::Receiver<Result<T>>) -> Option<Result<T>> {
  match rx.try_recv() {
    Ok(result) => Some(result),
    Err(oneshot::error::TryRecvError::Empty) => None,
    Err(oneshot::error::TryRecvError::Closed) => Some(Err(anyhow!("backend task ended without a reply"))),
  }
}

fn poll_op<T>(slot: &mut Pending<T>) -> Option<Result<T>> {
  let result = poll_rx(slot.as_mut()?)?;
  *slot = None;
  Some(result)
}

// --- Workflow ---

pub struct Workflow<B: Backend> {
  backend: Arc<B>,
  /// Latest status reply. Only used for rendering; every decision that
  /// depends on the backend re-queries it.
  session: Option<Session>,
  /// The latest status query failed in transport.
  status_failed: bool,
  authenticated: bool,
  subscriptions: SubscriptionManager,
  results: Option<ResultSet>,
  progress: ProgressChannel,
  notices: VecDeque<Notice>,
  pending: PendingOps,
}

impl<B: Backend> Workflow<B> {
  pub fn new(backend: Arc<B>) -> Self {
    Self {
      backend,
      session: None,
      status_failed: false,
      authenticated: false,
      subscriptions: SubscriptionManager::default(),
      results: None,
      progress: ProgressChannel::default(),
      notices: VecDeque::new(),
      pending: PendingOps::default(),
    }
  }

  pub fn phase(&self) -> Phase {
    if !self.authenticated {
      if self.pending.login.is_some() {
        return Phase::Authenticating;
      }
      return match self.session {
        Some(s) if s.is_configured => Phase::Configured,
        _ => Phase::Unconfigured,
      };
    }
    if self.pending.search.is_some() {
      Phase::Searching
    } else if self.pending.load.is_some() {
      Phase::LoadingSubscriptions
    } else if self.subscriptions.is_loaded() {
      Phase::Ready
    } else {
      Phase::Authenticated
    }
  }

  pub fn session(&self) -> Option<Session> {
    self.session
  }

  pub fn subscriptions(&self) -> &SubscriptionManager {
    &self.subscriptions
  }

  pub fn results(&self) -> Option<&ResultSet> {
    self.results.as_ref()
  }

  pub fn progress(&self) -> &ProgressChannel {
    &self.progress
  }

  pub fn status_failed(&self) -> bool {
    self.status_failed
  }

  /// What Enter does on the login pane. `None` until the first status reply.
  pub fn primary_action(&self) -> Option<PrimaryAction> {
    match self.session {
      Some(session) => Some(PrimaryAction::for_session(session)),
      None if self.status_failed => Some(PrimaryAction::Retry),
      None => None,
    }
  }

  pub fn is_checking_status(&self) -> bool {
    self.pending.status.is_some()
  }

  pub fn is_loading(&self) -> bool {
    self.pending.load.is_some()
  }

  #[cfg(test)]
  pub fn has_pending(&self) -> bool {
    self.pending.any()
  }

  // --- Controls ---

  pub fn setup_control(&self) -> Control {
    if self.pending.current_config.is_some() {
      Control::busy("Opening…")
    } else {
      Control::idle("Set up API", !self.authenticated)
    }
  }

  pub fn retry_control(&self) -> Control {
    if self.pending.status.is_some() { Control::busy("Checking…") } else { Control::idle("Retry", true) }
  }

  pub fn login_control(&self) -> Control {
    if self.pending.login.is_some() {
      Control::busy("Logging in…")
    } else {
      Control::idle("Log in with Google", self.phase() == Phase::Configured)
    }
  }

  pub fn save_control(&self) -> Control {
    if self.pending.save.is_some() { Control::busy("Saving…") } else { Control::idle("Save", true) }
  }

  pub fn load_control(&self) -> Control {
    if self.pending.load.is_some() {
      Control::busy("Loading…")
    } else {
      Control::idle("Load channels", self.authenticated && self.pending.search.is_none())
    }
  }

  pub fn search_control(&self) -> Control {
    if self.pending.search.is_some() {
      Control::busy("Searching…")
    } else {
      Control::idle("Search", self.authenticated && self.pending.load.is_none())
    }
  }

  pub fn logout_control(&self) -> Control {
    if self.pending.logout.is_some() {
      Control::busy("Logging out…")
    } else {
      Control::idle("Log out", self.authenticated)
    }
  }

  pub fn unsubscribe_control(&self, channel_id: &str) -> Control {
    if self.pending.unsubscribe.contains_key(channel_id) {
      Control::busy("Unsubscribing…")
    } else {
      Control::idle("Unsubscribe", self.subscriptions.get(channel_id).is_some())
    }
  }

  // --- Notices ---

  pub fn notice(&self) -> Option<&Notice> {
    self.notices.front()
  }

  pub fn dismiss_notice(&mut self) {
    self.notices.pop_front();
  }

  /// Surface an error to the operator.
  pub fn report(&mut self, err: AppError) {
    if err.is_validation() {
      debug!(err = %err, "rejected locally");
    } else if !matches!(err, AppError::Transport(_)) {
      warn!(err = %err, "backend reported failure");
    }
    self.notices.push_back(Notice { level: NoticeLevel::Error, message: err.to_string() });
  }

  fn inform(&mut self, message: impl Into<String>) {
    self.notices.push_back(Notice { level: NoticeLevel::Info, message: message.into() });
  }

  // --- Command handlers ---

  /// Query the session again. A query already in flight is superseded.
  pub fn check_status(&mut self) -> Result<(), AppError> {
    let backend = self.backend.clone();
    self.pending.status = Some(spawn_op(async move { backend.check_status().await }));
    Ok(())
  }

  pub fn on_open_setup(&mut self) -> Result<(), AppError> {
    if self.authenticated {
      return Err(AppError::validation("Log out before changing API settings."));
    }
    if self.pending.current_config.is_some() {
      return Ok(());
    }
    let backend = self.backend.clone();
    self.pending.current_config = Some(spawn_op(async move { backend.get_current_config().await }));
    Ok(())
  }

  pub fn on_save_config(&mut self, credentials: &Credentials) -> Result<(), AppError> {
    if self.pending.save.is_some() {
      return Err(AppError::validation("Settings are already being saved."));
    }
    let credentials = validate_credentials(credentials)?;
    info!(client_id = %credentials.client_id, has_api_key = credentials.api_key.is_some(), "saving API settings");
    let backend = self.backend.clone();
    self.pending.save = Some(spawn_op(async move { backend.save_config(credentials).await }));
    Ok(())
  }

  pub fn on_login_clicked(&mut self) -> Result<(), AppError> {
    match self.phase() {
      Phase::Configured => {}
      Phase::Unconfigured => return Err(AppError::validation("Set up API settings before logging in.")),
      Phase::Authenticating => return Err(AppError::validation("Login is already in progress.")),
      _ => return Err(AppError::validation("Already logged in.")),
    }
    info!("login requested");
    let backend = self.backend.clone();
    self.pending.login = Some(spawn_op(async move { backend.login().await }));
    Ok(())
  }

  pub fn on_logout_clicked(&mut self) -> Result<(), AppError> {
    if !self.authenticated {
      return Err(AppError::validation("Not logged in."));
    }
    if self.pending.logout.is_some() {
      return Err(AppError::validation("Logout is already in progress."));
    }
    info!("logout requested");
    let backend = self.backend.clone();
    self.pending.logout = Some(spawn_op(async move { backend.logout().await }));
    Ok(())
  }

  pub fn on_load_clicked(&mut self, force: bool) -> Result<(), AppError> {
    if !self.authenticated {
      return Err(AppError::validation("Log in first."));
    }
    if self.pending.load.is_some() {
      return Err(AppError::validation("Channels are already loading."));
    }
    if self.pending.search.is_some() {
      return Err(AppError::validation("Wait for the search to finish."));
    }
    self.start_load(force);
    Ok(())
  }

  pub fn on_unsubscribe_clicked(&mut self, channel_id: &str) -> Result<(), AppError> {
    if self.pending.unsubscribe.contains_key(channel_id) {
      return Err(AppError::validation("Already unsubscribing from this channel."));
    }
    let Some(entry) = self.subscriptions.get(channel_id) else {
      return Err(AppError::validation("That channel is not in the list."));
    };
    info!(channel = %entry.title, id = channel_id, "unsubscribe requested");
    let backend = self.backend.clone();
    let id = channel_id.to_string();
    let rx = spawn_op(async move { backend.unsubscribe(id).await });
    self.pending.unsubscribe.insert(channel_id.to_string(), rx);
    Ok(())
  }

  pub fn on_search_clicked(&mut self, filter: FilterConfig) -> Result<(), AppError> {
    if !self.authenticated {
      return Err(AppError::validation("Log in first."));
    }
    if !self.subscriptions.is_loaded() {
      return Err(AppError::validation("Load your subscribed channels first."));
    }
    if self.pending.search.is_some() {
      return Err(AppError::validation("A search is already running."));
    }
    if self.pending.load.is_some() {
      return Err(AppError::validation("Wait for the channel list to finish loading."));
    }
    info!(
      filter_type = filter.filter_type.label(),
      max_subscribers = filter.max_subscribers,
      min_views = filter.min_views,
      days_within = filter.days_within,
      mutation_ratio = filter.mutation_ratio,
      "search requested"
    );
    self.results = None;
    let progress = self.progress.attach();
    let backend = self.backend.clone();
    self.pending.search = Some(spawn_op(async move { backend.search(filter, progress).await }));
    Ok(())
  }

  fn start_load(&mut self, force: bool) {
    info!(force, "loading subscriptions");
    let backend = self.backend.clone();
    let rx = spawn_op(async move { backend.load_subscriptions(force).await });
    self.pending.load = Some(PendingLoad { force, rx });
  }

  /// Drop every in-flight receiver and all session data, then re-query the
  /// session. Late results from before the reset are discarded.
  pub fn reset(&mut self) {
    self.pending = PendingOps::default();
    self.authenticated = false;
    if let Some(session) = self.session.as_mut() {
      session.is_authenticated = false;
    }
    self.subscriptions.clear();
    self.results = None;
    self.progress.detach();
    let _ = self.check_status();
  }

  // --- Completion ---

  /// Apply every operation that finished since the last call.
  pub fn check_pending(&mut self) -> Vec<Outcome> {
    let mut outcomes = Vec::new();

    if let Some(result) = poll_op(&mut self.pending.status) {
      match result {
        Ok(session) => self.apply_session(session, &mut outcomes),
        Err(e) => {
          self.status_failed = true;
          self.report(AppError::transport(Operation::CheckStatus, &e));
        }
      }
    }

    if let Some(result) = poll_op(&mut self.pending.current_config) {
      let credentials = result.unwrap_or_else(|e| {
        warn!(op = Operation::CurrentConfig.label(), err = %format!("{:#}", e), "could not read current settings");
        Credentials::default()
      });
      outcomes.push(Outcome::CurrentConfig(credentials));
    }

    if let Some(result) = poll_op(&mut self.pending.save) {
      match result
        .map_err(|e| AppError::transport(Operation::SaveConfig, &e))
        .and_then(|reply| reply.into_result(Operation::SaveConfig))
      {
        Ok(()) => {
          info!("API settings saved");
          self.inform("API settings saved");
          outcomes.push(Outcome::ConfigSaved);
          let _ = self.check_status();
        }
        Err(e) => {
          self.report(e);
          outcomes.push(Outcome::ConfigFailed);
        }
      }
    }

    if let Some(result) = poll_op(&mut self.pending.login) {
      match result.map_err(|e| AppError::transport(Operation::Login, &e)).and_then(|r| r.into_result(Operation::Login)) {
        Ok(()) => {
          info!("login succeeded");
          // A status query sent before the login would report the old session.
          self.pending.status = None;
          self.authenticated = true;
          if let Some(session) = self.session.as_mut() {
            session.is_authenticated = true;
          }
          self.start_load(false);
        }
        Err(e) => self.report(e),
      }
    }

    if let Some(result) = poll_op(&mut self.pending.logout) {
      if let Err(e) = result {
        warn!(op = Operation::Logout.label(), err = %format!("{:#}", e), "call failed, clearing local state anyway");
      }
      info!("logged out");
      self.reset();
      outcomes.push(Outcome::LoggedOut);
    }

    if let Some(load) = self.pending.load.as_mut()
      && let Some(result) = poll_rx(&mut load.rx)
    {
      let force = load.force;
      self.pending.load = None;
      match result.map_err(|e| AppError::transport(Operation::LoadSubscriptions, &e)).and_then(LoadReply::into_result) {
        Ok(loaded) => {
          info!(count = loaded.entries.len(), from_cache = loaded.from_cache, force, "subscriptions loaded");
          self.subscriptions.replace(loaded, force);
        }
        Err(e) => {
          self.subscriptions.mark_failed();
          self.report(e);
        }
      }
    }

    let in_flight: Vec<String> = self.pending.unsubscribe.keys().cloned().collect();
    for id in in_flight {
      let Some(rx) = self.pending.unsubscribe.get_mut(&id) else { continue };
      let Some(result) = poll_rx(rx) else { continue };
      self.pending.unsubscribe.remove(&id);
      match result
        .map_err(|e| AppError::transport(Operation::Unsubscribe, &e))
        .and_then(|r| r.into_result(Operation::Unsubscribe))
      {
        Ok(()) => {
          if let Some(entry) = self.subscriptions.remove(&id) {
            info!(channel = %entry.title, remaining = self.subscriptions.len(), "unsubscribed");
            outcomes.push(Outcome::Unsubscribed(entry));
          }
        }
        Err(e) => self.report(e),
      }
    }

    // Progress first, so pushes that raced the result are applied and then
    // hidden together with it.
    self.progress.drain();
    if let Some(result) = poll_op(&mut self.pending.search) {
      self.progress.detach();
      match result.map_err(|e| AppError::transport(Operation::Search, &e)).and_then(SearchReply::into_result) {
        Ok((videos, stats)) => {
          info!(videos = videos.len(), total = stats.total, filtered = stats.filtered, "search finished");
          self.results = Some(ResultSet::new(videos, stats));
        }
        Err(e) => self.report(e),
      }
    }

    outcomes
  }

  fn apply_session(&mut self, session: Session, outcomes: &mut Vec<Outcome>) {
    info!(configured = session.is_configured, authenticated = session.is_authenticated, "session status");
    self.session = Some(session);
    self.status_failed = false;
    if !session.is_authenticated {
      if self.authenticated {
        warn!("backend no longer reports an authenticated session");
        self.reset_data();
        outcomes.push(Outcome::LoggedOut);
      }
      self.authenticated = false;
      return;
    }
    self.authenticated = true;
    if self.pending.load.is_none() && self.pending.search.is_none() {
      self.start_load(false);
    }
  }

  fn reset_data(&mut self) {
    self.pending.load = None;
    self.pending.search = None;
    self.pending.unsubscribe.clear();
    self.subscriptions.clear();
    self.results = None;
    self.progress.detach();
  }

  /// Poll until nothing is in flight, or until only gated calls remain.
  #[cfg(test)]
  pub async fn settle(&mut self) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    for _ in 0..100 {
      tokio::task::yield_now().await;
      outcomes.extend(self.check_pending());
      if !self.has_pending() {
        break;
      }
    }
    outcomes
  }
}
