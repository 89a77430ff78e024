//! OAuth redirect completion.
//!
//! The identity provider sends the browser back with either `error`, or
//! `token` plus a URL-encoded `user` record. [`resolve_callback`] turns those
//! parameters into a session transition and a navigation instruction
//! without touching any state; `SessionManager::complete_oauth` applies
//! the result.

use std::time::Duration;

use hugscape_core::UserProfile;
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedSender;
use url::form_urlencoded;

/// Default view navigated to after a callback.
pub const HOME: &str = "/";

const FAILURE_DELAY: Duration = Duration::from_secs(3);
const SUCCESS_DELAY: Duration = Duration::from_secs(2);

const ACCESS_DENIED: &str = "access_denied";
const ACCESS_DENIED_MESSAGE: &str = "Access was denied";
const SIGNED_IN_MESSAGE: &str = "Successfully signed in!";
const DECODE_FAILED_MESSAGE: &str = "Failed to process authentication data";

/// Instruction to move the presentation layer to `target` after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: String,
    pub delay: Duration,
}

impl Navigation {
    #[must_use]
    pub fn immediate(target: impl Into<String>) -> Self {
        Self::after(target, Duration::ZERO)
    }

    #[must_use]
    pub fn after(target: impl Into<String>, delay: Duration) -> Self {
        Self {
            target: target.into(),
            delay,
        }
    }
}

/// Capability to move the presentation layer elsewhere.
pub trait Navigator {
    fn navigate(&self, navigation: Navigation);
}

impl Navigator for UnboundedSender<Navigation> {
    fn navigate(&self, navigation: Navigation) {
        if self.send(navigation).is_err() {
            tracing::debug!("Navigation receiver dropped");
        }
    }
}

/// Parameters the identity provider appended to the callback URL.
///
/// Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub error: Option<String>,
    pub token: Option<String>,
    /// Still percent-encoded JSON user record.
    pub user: Option<String>,
}

impl CallbackParams {
    /// Parse a callback query string, with or without the leading `?`.
    ///
    /// When a parameter repeats, the first occurrence wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "error" => &mut params.error,
                "token" => &mut params.token,
                "user" => &mut params.user,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }

        params
    }
}

/// Session change requested by a callback.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Not a real callback; leave the session alone.
    None,
    /// Record a sign-in failure with this message.
    Fail(String),
    SignIn {
        user: UserProfile,
        token: SecretString,
    },
}

/// Everything a callback resolves to.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub transition: Transition,
    pub navigation: Navigation,
    /// User-facing message, absent when nothing happened.
    pub message: Option<String>,
}

impl CallbackOutcome {
    fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            transition: Transition::Fail(message.clone()),
            navigation: Navigation::after(HOME, FAILURE_DELAY),
            message: Some(message),
        }
    }
}

/// Decode the `user` parameter: one more round of percent-decoding, then JSON.
fn decode_user(payload: &str) -> Option<UserProfile> {
    let json = urlencoding::decode(payload).ok()?;
    serde_json::from_str(&json).ok()
}

/// Resolve callback parameters into a transition and a navigation.
///
/// `error` takes precedence; `token` and `user` must both be present for a
/// sign-in; anything else navigates home immediately.
#[must_use]
pub fn resolve_callback(params: &CallbackParams) -> CallbackOutcome {
    if let Some(error) = &params.error {
        let message = if error == ACCESS_DENIED {
            ACCESS_DENIED_MESSAGE
        } else {
            error.as_str()
        };
        return CallbackOutcome::failed(message);
    }

    let (Some(token), Some(payload)) = (&params.token, &params.user) else {
        return CallbackOutcome {
            transition: Transition::None,
            navigation: Navigation::immediate(HOME),
            message: None,
        };
    };

    match decode_user(payload) {
        Some(user) => CallbackOutcome {
            transition: Transition::SignIn {
                user,
                token: SecretString::from(token.as_str()),
            },
            navigation: Navigation::after(HOME, SUCCESS_DELAY),
            message: Some(SIGNED_IN_MESSAGE.to_string()),
        },
        None => CallbackOutcome::failed(DECODE_FAILED_MESSAGE),
    }
}
