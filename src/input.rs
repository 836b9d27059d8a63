use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus, Modal};
use crate::backend::Backend;

/// What a key does while the results list has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
  Open,
  CopyTitle,
  Up,
  Down,
  ToggleMode,
  Back,
}

/// Copy and open live on different keys, so copying never opens the video.
pub fn result_action_for_key(code: KeyCode) -> Option<ResultAction> {
  match code {
    KeyCode::Enter => Some(ResultAction::Open),
    KeyCode::Char('y') | KeyCode::Char('c') => Some(ResultAction::CopyTitle),
    KeyCode::Up | KeyCode::Char('k') => Some(ResultAction::Up),
    KeyCode::Down | KeyCode::Char('j') => Some(ResultAction::Down),
    KeyCode::Char('m') => Some(ResultAction::ToggleMode),
    KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab => Some(ResultAction::Back),
    _ => None,
  }
}

// --- Event Handling ---

pub fn handle_key_event<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  // Notices block everything else until dismissed.
  if app.workflow.notice().is_some() {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
      app.workflow.dismiss_notice();
    }
    return;
  }

  if app.confirm.is_some() {
    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => app.confirm_yes(),
      KeyCode::Char('n') | KeyCode::Esc => app.confirm_no(),
      _ => {}
    }
    return;
  }

  if matches!(app.modal, Some(Modal::Setup(_))) {
    handle_setup_key(app, key);
    return;
  }
  if matches!(app.modal, Some(Modal::Subscriptions(_))) {
    handle_subscriptions_key(app, key);
    return;
  }

  if !app.phase().is_signed_in() {
    handle_login_key(app, key);
    return;
  }

  match app.focus {
    Focus::Filters => handle_filter_key(app, key),
    Focus::Results => handle_results_key(app, key),
  }
}

fn handle_setup_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  match key.code {
    KeyCode::Esc => return app.close_modal(),
    KeyCode::Enter => return app.save_setup(),
    _ => {}
  }
  let Some(Modal::Setup(form)) = &mut app.modal else { return };
  match key.code {
    KeyCode::Tab | KeyCode::Down => form.next_field(),
    KeyCode::BackTab | KeyCode::Up => form.prev_field(),
    KeyCode::Backspace => {
      form.active_mut().pop();
    }
    KeyCode::Char(c) => form.active_mut().push(c),
    _ => {}
  }
}

fn handle_subscriptions_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => app.close_modal(),
    KeyCode::Down | KeyCode::Char('j') => app.move_subscription_selection(true),
    KeyCode::Up | KeyCode::Char('k') => app.move_subscription_selection(false),
    KeyCode::Char('u') | KeyCode::Delete => app.request_unsubscribe(),
    _ => {}
  }
}

fn handle_login_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  match key.code {
    KeyCode::Enter => app.primary_action(),
    KeyCode::Char('s') => app.open_setup(),
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_filter_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  match key.code {
    KeyCode::Enter => app.search(),
    KeyCode::Tab => {
      if app.workflow.results().is_some_and(|r| !r.is_empty()) {
        app.focus = Focus::Results;
      }
    }
    KeyCode::Down => app.filters.next_field(),
    KeyCode::Up => app.filters.prev_field(),
    KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('m') => app.toggle_filter_type(),
    KeyCode::Backspace => app.filters.backspace(),
    KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => app.filters.push_char(c),
    KeyCode::Char('l') => app.load(false),
    KeyCode::Char('r') => app.load(true),
    KeyCode::Char('v') => app.view_subscriptions(),
    KeyCode::Char('x') => app.request_logout(),
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_results_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
  let Some(action) = result_action_for_key(key.code) else { return };
  match action {
    ResultAction::Open => app.open_selected(),
    ResultAction::CopyTitle => app.copy_selected(),
    ResultAction::Up => app.move_selection(false),
    ResultAction::Down => app.move_selection(true),
    ResultAction::ToggleMode => app.toggle_filter_type(),
    ResultAction::Back => app.focus = Focus::Filters,
  }
}
