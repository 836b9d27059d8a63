//! Error taxonomy for operator-facing failures.
//!
//! `Validation` is raised locally and never reaches the backend. The other
//! variants wrap a failure the backend reported (or, for `Transport`, a call
//! that never produced a structured reply).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
  /// A client-side precondition failed; no backend call was made.
  #[error("{0}")]
  Validation(String),

  #[error("Saving settings failed: {0}")]
  Config(String),

  #[error("Login failed: {0}")]
  Auth(String),

  #[error("Loading channels failed: {0}")]
  Load(String),

  #[error("Unsubscribe failed: {0}")]
  Unsubscribe(String),

  #[error("Search failed: {0}")]
  Search(String),

  /// The backend call itself errored instead of returning a reply.
  #[error("{0}")]
  Transport(String),
}

/// Which backend operation a structured failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  CheckStatus,
  CurrentConfig,
  SaveConfig,
  Login,
  Logout,
  LoadSubscriptions,
  Unsubscribe,
  Search,
}

impl Operation {
  pub fn label(self) -> &'static str {
    match self {
      Operation::CheckStatus => "check status",
      Operation::CurrentConfig => "read settings",
      Operation::SaveConfig => "save settings",
      Operation::Login => "login",
      Operation::Logout => "logout",
      Operation::LoadSubscriptions => "load channels",
      Operation::Unsubscribe => "unsubscribe",
      Operation::Search => "search",
    }
  }
}

impl AppError {
  pub fn validation(msg: impl Into<String>) -> Self {
    AppError::Validation(msg.into())
  }

  /// Wrap a backend-reported failure message for `op`.
  ///
  /// A reply with `success: false` and no message still gets a readable text.
  pub fn reported(op: Operation, message: Option<String>) -> Self {
    let msg = message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| "unknown error".to_string());
    match op {
      Operation::SaveConfig | Operation::CurrentConfig => AppError::Config(msg),
      Operation::Login | Operation::CheckStatus | Operation::Logout => AppError::Auth(msg),
      Operation::LoadSubscriptions => AppError::Load(msg),
      Operation::Unsubscribe => AppError::Unsubscribe(msg),
      Operation::Search => AppError::Search(msg),
    }
  }

  /// Turn a thrown/rejected backend call into the generic notification.
  pub fn transport(op: Operation, err: &anyhow::Error) -> Self {
    tracing::error!(op = op.label(), err = %format!("{:#}", err), "backend call failed");
    AppError::Transport(format!("Something went wrong during {}. Please try again.", op.label()))
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, AppError::Validation(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reported_maps_operation_to_variant() {
    assert_eq!(
      AppError::reported(Operation::LoadSubscriptions, Some("quota exceeded".into())),
      AppError::Load("quota exceeded".into())
    );
    assert_eq!(AppError::reported(Operation::Search, None), AppError::Search("unknown error".into()));
    assert_eq!(AppError::reported(Operation::Login, Some("  ".into())), AppError::Auth("unknown error".into()));
  }

  #[test]
  fn display_includes_message() {
    let err = AppError::Unsubscribe("not found".into());
    assert_eq!(err.to_string(), "Unsubscribe failed: not found");
  }

  #[test]
  fn transport_message_is_generic() {
    let err = AppError::transport(Operation::Search, &anyhow::anyhow!("connection refused"));
    assert!(matches!(err, AppError::Transport(_)));
    assert!(!err.to_string().contains("connection refused"));
  }
}
