//! Decides what the login pane offers and whether credentials may be sent.

use crate::error::AppError;
use crate::model::{Credentials, Session};

/// The single primary action of the login pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
  Configure,
  Login,
  /// The backend could not be reached; query the session again.
  Retry,
}

impl PrimaryAction {
  pub fn for_session(session: Session) -> Self {
    if session.is_configured { PrimaryAction::Login } else { PrimaryAction::Configure }
  }
}

/// Status line under the primary action.
pub fn status_text(session: Option<Session>, status_failed: bool) -> &'static str {
  match session {
    None if status_failed => "Could not reach backend",
    None => "Checking status…",
    Some(s) if s.is_configured => "API settings ready",
    Some(_) => "Configure API settings first",
  }
}

/// Trim and check the form before any backend call.
pub fn validate_credentials(credentials: &Credentials) -> Result<Credentials, AppError> {
  let trimmed = credentials.trimmed();
  if trimmed.client_id.is_empty() || trimmed.client_secret.is_empty() {
    return Err(AppError::validation("Client ID and Client Secret are required."));
  }
  Ok(trimmed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primary_action_follows_configured_flag() {
    let unconfigured = Session { is_configured: false, is_authenticated: false };
    let configured = Session { is_configured: true, is_authenticated: false };
    assert_eq!(PrimaryAction::for_session(unconfigured), PrimaryAction::Configure);
    assert_eq!(PrimaryAction::for_session(configured), PrimaryAction::Login);
  }

  #[test]
  fn blank_fields_are_rejected() {
    let creds = Credentials { client_id: "  ".into(), client_secret: "s".into(), api_key: None };
    assert!(validate_credentials(&creds).unwrap_err().is_validation());
    let creds = Credentials { client_id: "id".into(), client_secret: "".into(), api_key: None };
    assert!(validate_credentials(&creds).is_err());
  }

  #[test]
  fn api_key_is_optional() {
    let creds = Credentials { client_id: " id".into(), client_secret: "secret ".into(), api_key: None };
    let ok = validate_credentials(&creds).unwrap();
    assert_eq!(ok.client_id, "id");
    assert_eq!(ok.client_secret, "secret");
  }

  #[test]
  fn status_text_before_first_check() {
    assert_eq!(status_text(None, false), "Checking status…");
    assert_eq!(status_text(None, true), "Could not reach backend");
    assert_eq!(status_text(Some(Session::default()), false), "Configure API settings first");
  }
}
