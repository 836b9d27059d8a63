use std::str::FromStr;
use std::time::Instant;

use ratatui::widgets::ListState;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::Config;
use crate::constants::constants;
use crate::desktop;
use crate::error::AppError;
use crate::gate::PrimaryAction;
use crate::model::{Credentials, FilterConfig, FilterType, SubscriptionEntry, VideoResult};
use crate::subscriptions::FadeOut;
use crate::theme::{self, THEMES, Theme};
use crate::workflow::{Outcome, Phase, Workflow};

// --- Filter form ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  MaxSubscribers,
  MinViews,
  MutationRatio,
  DaysWithin,
}

impl FilterField {
  pub fn label(self) -> &'static str {
    match self {
      FilterField::MaxSubscribers => "Max subscribers",
      FilterField::MinViews => "Min views",
      FilterField::MutationRatio => "Min ratio",
      FilterField::DaysWithin => "Within days",
    }
  }
}

/// Raw text of the filter inputs. Parsed into a `FilterConfig` only when a
/// search starts.
#[derive(Debug, Clone)]
pub struct FilterForm {
  pub filter_type: FilterType,
  pub max_subscribers: String,
  pub min_views: String,
  pub days_within: String,
  pub mutation_ratio: String,
  field: usize,
}

impl Default for FilterForm {
  fn default() -> Self {
    let d = FilterConfig::default();
    Self {
      filter_type: d.filter_type,
      max_subscribers: d.max_subscribers.to_string(),
      min_views: d.min_views.to_string(),
      days_within: d.days_within.to_string(),
      mutation_ratio: format!("{:.1}", d.mutation_ratio),
      field: 0,
    }
  }
}

impl FilterForm {
  /// `daysWithin` applies to both modes.
  pub fn visible_fields(&self) -> &'static [FilterField] {
    match self.filter_type {
      FilterType::Normal => &[FilterField::MaxSubscribers, FilterField::MinViews, FilterField::DaysWithin],
      FilterType::Mutation => &[FilterField::MutationRatio, FilterField::DaysWithin],
    }
  }

  pub fn active_field(&self) -> FilterField {
    let fields = self.visible_fields();
    fields[self.field.min(fields.len() - 1)]
  }

  pub fn next_field(&mut self) {
    self.field = (self.field + 1) % self.visible_fields().len();
  }

  pub fn prev_field(&mut self) {
    let n = self.visible_fields().len();
    self.field = (self.field + n - 1) % n;
  }

  pub fn toggle_type(&mut self) {
    self.filter_type = self.filter_type.toggled();
    self.field = 0;
  }

  pub fn value(&self, field: FilterField) -> &str {
    match field {
      FilterField::MaxSubscribers => &self.max_subscribers,
      FilterField::MinViews => &self.min_views,
      FilterField::MutationRatio => &self.mutation_ratio,
      FilterField::DaysWithin => &self.days_within,
    }
  }

  fn value_mut(&mut self, field: FilterField) -> &mut String {
    match field {
      FilterField::MaxSubscribers => &mut self.max_subscribers,
      FilterField::MinViews => &mut self.min_views,
      FilterField::MutationRatio => &mut self.mutation_ratio,
      FilterField::DaysWithin => &mut self.days_within,
    }
  }

  /// Digits everywhere, one decimal point in the ratio.
  pub fn push_char(&mut self, c: char) {
    let field = self.active_field();
    let value = self.value_mut(field);
    let allowed = c.is_ascii_digit() || (c == '.' && field == FilterField::MutationRatio && !value.contains('.'));
    if allowed {
      value.push(c);
    }
  }

  pub fn backspace(&mut self) {
    let field = self.active_field();
    self.value_mut(field).pop();
  }

  /// Empty, unparsable or zero inputs fall back to the defaults.
  pub fn to_config(&self) -> FilterConfig {
    let d = FilterConfig::default();
    FilterConfig {
      filter_type: self.filter_type,
      max_subscribers: parse_or(&self.max_subscribers, d.max_subscribers),
      min_views: parse_or(&self.min_views, d.min_views),
      days_within: parse_or(&self.days_within, d.days_within),
      mutation_ratio: parse_ratio(&self.mutation_ratio, d.mutation_ratio),
    }
  }
}

fn parse_or<T: FromStr + PartialEq + Default>(raw: &str, fallback: T) -> T {
  match raw.trim().parse::<T>() {
    Ok(v) if v != T::default() => v,
    _ => fallback,
  }
}

fn parse_ratio(raw: &str, fallback: f64) -> f64 {
  match raw.trim().parse::<f64>() {
    Ok(v) if v.is_finite() && v != 0.0 => v,
    _ => fallback,
  }
}

// --- Setup form ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupForm {
  pub client_id: String,
  pub client_secret: String,
  pub api_key: String,
  pub field: usize,
}

impl SetupForm {
  pub const LABELS: [&'static str; 3] = ["Client ID", "Client Secret", "API Key (optional)"];

  pub fn from_credentials(c: Credentials) -> Self {
    Self { client_id: c.client_id, client_secret: c.client_secret, api_key: c.api_key.unwrap_or_default(), field: 0 }
  }

  pub fn to_credentials(&self) -> Credentials {
    Credentials {
      client_id: self.client_id.clone(),
      client_secret: self.client_secret.clone(),
      api_key: Some(self.api_key.clone()),
    }
  }

  pub fn values(&self) -> [&str; 3] {
    [&self.client_id, &self.client_secret, &self.api_key]
  }

  pub fn active_mut(&mut self) -> &mut String {
    match self.field {
      0 => &mut self.client_id,
      1 => &mut self.client_secret,
      _ => &mut self.api_key,
    }
  }

  pub fn next_field(&mut self) {
    self.field = (self.field + 1) % Self::LABELS.len();
  }

  pub fn prev_field(&mut self) {
    self.field = (self.field + Self::LABELS.len() - 1) % Self::LABELS.len();
  }
}

// --- Overlays ---

pub enum Modal {
  Setup(SetupForm),
  Subscriptions(ListState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
  Logout,
  Unsubscribe { id: String, title: String },
}

impl Confirm {
  pub fn prompt(&self) -> String {
    match self {
      Confirm::Logout => "Log out? Cached data will also be cleared.".to_string(),
      Confirm::Unsubscribe { title, .. } => format!("Unsubscribe from \"{}\"?", title),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Filters,
  Results,
}

// --- App ---

pub struct App<B: Backend> {
  pub workflow: Workflow<B>,
  pub theme_index: usize,
  pub filters: FilterForm,
  pub focus: Focus,
  pub results_state: ListState,
  pub modal: Option<Modal>,
  pub confirm: Option<Confirm>,
  pub fading: FadeOut,
  /// Video whose title was just copied, and when.
  pub copied: Option<(String, Instant)>,
  pub should_quit: bool,
  config: Config,
}

impl<B: Backend> App<B> {
  pub fn new(workflow: Workflow<B>, config: Config) -> Self {
    Self {
      workflow,
      theme_index: theme::index_of(config.theme_name.as_deref()),
      filters: FilterForm::default(),
      focus: Focus::Filters,
      results_state: ListState::default(),
      modal: None,
      confirm: None,
      fading: FadeOut::default(),
      copied: None,
      should_quit: false,
      config,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn phase(&self) -> Phase {
    self.workflow.phase()
  }

  fn run(&mut self, result: Result<(), AppError>) {
    if let Err(e) = result {
      self.workflow.report(e);
    }
  }

  // --- Frame tick ---

  /// Apply finished backend calls and expire cosmetic timers.
  pub fn tick(&mut self, now: Instant) {
    for outcome in self.workflow.check_pending() {
      self.apply(outcome, now);
    }
    self.fading.expire(now);
    if let Some((_, at)) = &self.copied
      && now.duration_since(*at) >= constants().copy_feedback()
    {
      self.copied = None;
    }
    self.clamp_results_selection();
  }

  fn apply(&mut self, outcome: Outcome, now: Instant) {
    match outcome {
      Outcome::CurrentConfig(credentials) => {
        self.modal = Some(Modal::Setup(SetupForm::from_credentials(credentials)));
      }
      Outcome::ConfigSaved => {
        if matches!(self.modal, Some(Modal::Setup(_))) {
          self.modal = None;
        }
      }
      // The form stays open with what the operator typed.
      Outcome::ConfigFailed => {}
      Outcome::Unsubscribed(entry) => {
        self.fading.push(entry, now, constants().unsubscribe_fade());
      }
      Outcome::LoggedOut => {
        self.modal = None;
        self.confirm = None;
        self.fading.clear();
        self.copied = None;
        self.focus = Focus::Filters;
        self.results_state.select(None);
      }
    }
  }

  fn clamp_results_selection(&mut self) {
    let len = self.workflow.results().map_or(0, |r| r.len());
    if len == 0 {
      self.results_state.select(None);
      if self.focus == Focus::Results {
        self.focus = Focus::Filters;
      }
    } else {
      let sel = self.results_state.selected().unwrap_or(0).min(len - 1);
      self.results_state.select(Some(sel));
    }
  }

  // --- Login pane ---

  pub fn primary_action(&mut self) {
    let result = match self.workflow.primary_action() {
      Some(PrimaryAction::Configure) => self.workflow.on_open_setup(),
      Some(PrimaryAction::Login) => self.workflow.on_login_clicked(),
      Some(PrimaryAction::Retry) if self.workflow.retry_control().enabled => self.workflow.check_status(),
      Some(PrimaryAction::Retry) | None => Ok(()),
    };
    self.run(result);
  }

  pub fn open_setup(&mut self) {
    let result = self.workflow.on_open_setup();
    self.run(result);
  }

  pub fn save_setup(&mut self) {
    let Some(Modal::Setup(form)) = &self.modal else { return };
    let credentials = form.to_credentials();
    let result = self.workflow.on_save_config(&credentials);
    self.run(result);
  }

  pub fn close_modal(&mut self) {
    self.modal = None;
  }

  // --- Confirmations ---

  pub fn request_logout(&mut self) {
    if self.workflow.logout_control().enabled {
      self.confirm = Some(Confirm::Logout);
    }
  }

  pub fn confirm_yes(&mut self) {
    let result = match self.confirm.take() {
      Some(Confirm::Logout) => self.workflow.on_logout_clicked(),
      Some(Confirm::Unsubscribe { id, .. }) => self.workflow.on_unsubscribe_clicked(&id),
      None => Ok(()),
    };
    self.run(result);
  }

  pub fn confirm_no(&mut self) {
    self.confirm = None;
  }

  // --- Search pane ---

  pub fn load(&mut self, force: bool) {
    let result = self.workflow.on_load_clicked(force);
    self.run(result);
  }

  pub fn search(&mut self) {
    let filter = self.filters.to_config();
    match self.workflow.on_search_clicked(filter) {
      Ok(()) => self.results_state.select(None),
      // The old results stay on screen, and so does the selection.
      Err(e) => self.workflow.report(e),
    }
  }

  pub fn toggle_filter_type(&mut self) {
    self.filters.toggle_type();
  }

  /// Current results in the order of the selected filter type.
  pub fn ordered_results(&self) -> Vec<&VideoResult> {
    self.workflow.results().map(|r| r.ordered(self.filters.filter_type)).unwrap_or_default()
  }

  pub fn selected_video(&self) -> Option<&VideoResult> {
    let idx = self.results_state.selected()?;
    self.ordered_results().get(idx).copied()
  }

  pub fn move_selection(&mut self, down: bool) {
    let count = self.workflow.results().map_or(0, |r| r.len());
    step(&mut self.results_state, count, down);
  }

  pub fn open_selected(&mut self) {
    let Some(url) = self.selected_video().map(VideoResult::watch_url) else { return };
    if let Err(e) = desktop::open_in_browser(&url) {
      warn!(err = %format!("{:#}", e), "open failed");
      self.workflow.report(AppError::Transport("Could not open the browser.".into()));
    }
  }

  pub fn copy_selected(&mut self) {
    let Some((id, title)) = self.selected_video().map(|v| (v.video_id.clone(), v.title.clone())) else { return };
    match desktop::copy_to_clipboard(&title) {
      Ok(()) => self.copied = Some((id, Instant::now())),
      Err(e) => {
        warn!(err = %format!("{:#}", e), "copy failed");
        self.workflow.report(AppError::Transport("Copy failed.".into()));
      }
    }
  }

  pub fn is_copied(&self, video_id: &str) -> bool {
    self.copied.as_ref().is_some_and(|(id, _)| id == video_id)
  }

  // --- Subscriptions modal ---

  pub fn view_subscriptions(&mut self) {
    if !self.workflow.subscriptions().is_loaded() {
      self.workflow.report(AppError::validation("Load your subscribed channels first."));
      return;
    }
    let mut state = ListState::default();
    if self.workflow.subscriptions().len() > 0 {
      state.select(Some(0));
    }
    self.modal = Some(Modal::Subscriptions(state));
  }

  /// Live channels plus rows still fading out, most subscribers first.
  pub fn subscription_rows(&self) -> Vec<SubscriptionEntry> {
    self.fading.merged(self.workflow.subscriptions())
  }

  pub fn move_subscription_selection(&mut self, down: bool) {
    let count = self.subscription_rows().len();
    if let Some(Modal::Subscriptions(state)) = &mut self.modal {
      step(state, count, down);
    }
  }

  pub fn request_unsubscribe(&mut self) {
    let Some(Modal::Subscriptions(state)) = &self.modal else { return };
    let Some(idx) = state.selected() else { return };
    let Some(entry) = self.subscription_rows().into_iter().nth(idx) else { return };
    if self.fading.contains(&entry.id) || !self.workflow.unsubscribe_control(&entry.id).enabled {
      return;
    }
    info!(channel = %entry.title, "confirm unsubscribe");
    self.confirm = Some(Confirm::Unsubscribe { id: entry.id, title: entry.title });
  }
}

/// Wrap-around list navigation.
fn step(state: &mut ListState, count: usize, down: bool) {
  if count == 0 {
    state.select(None);
    return;
  }
  let i = match state.selected() {
    None => 0,
    Some(i) if down => (i + 1) % count,
    Some(0) => count - 1,
    Some(i) => (i - 1).min(count - 1),
  };
  state.select(Some(i));
}
