//! Session records and errors.

use std::fmt;

use hugscape_core::UserProfile;
use secrecy::SecretString;
use thiserror::Error;

use crate::api::ApiError;

/// Errors reported by session operations that return a `Result`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation needs a bearer token and none is held.
    #[error("not signed in")]
    NoToken,

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Where the session stands, derived from user, token, loading flag and
/// last error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    /// A persisted token is being validated.
    Authenticating,
    Authenticated,
    /// Sign-in failed; carries the user-facing message.
    Failed(String),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Read-only view of the session.
///
/// `Debug` never prints the token.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub token: Option<SecretString>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Authenticated iff both user and token are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Authenticated
        } else if let Some(message) = &self.error {
            SessionStatus::Failed(message.clone())
        } else if self.loading {
            SessionStatus::Authenticating
        } else {
            SessionStatus::Unauthenticated
        }
    }
}

/// Result of a profile update, carrying a user-facing message either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdateOutcome {
    Updated { message: String },
    Failed { message: String },
}

impl ProfileUpdateOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Updated { message } | Self::Failed { message } => message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user() -> UserProfile {
        serde_json::from_value(json!({ "id": 1, "email": "kid@example.com" })).unwrap()
    }

    #[test]
    fn test_status_requires_user_and_token() {
        let mut snapshot = SessionSnapshot {
            user: Some(user()),
            ..SessionSnapshot::default()
        };
        assert_eq!(snapshot.status(), SessionStatus::Unauthenticated);

        snapshot.token = Some(SecretString::from("abc"));
        assert_eq!(snapshot.status(), SessionStatus::Authenticated);

        snapshot.user = None;
        snapshot.loading = true;
        assert_eq!(snapshot.status(), SessionStatus::Authenticating);
    }

    #[test]
    fn test_error_wins_over_loading() {
        let snapshot = SessionSnapshot {
            loading: true,
            error: Some("Access was denied".to_string()),
            ..SessionSnapshot::default()
        };
        assert_eq!(
            snapshot.status(),
            SessionStatus::Failed("Access was denied".to_string())
        );
        assert_eq!(snapshot.status().to_string(), "failed: Access was denied");
    }

    #[test]
    fn test_snapshot_debug_hides_token() {
        let snapshot = SessionSnapshot {
            token: Some(SecretString::from("very-secret")),
            ..SessionSnapshot::default()
        };
        assert!(!format!("{snapshot:?}").contains("very-secret"));
    }

    #[test]
    fn test_profile_outcome_accessors() {
        let ok = ProfileUpdateOutcome::Updated {
            message: "Profile updated successfully".to_string(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.message(), "Profile updated successfully");

        let failed = ProfileUpdateOutcome::Failed {
            message: "Failed to update profile".to_string(),
        };
        assert!(!failed.is_success());
    }
}
