//! Authenticated session state.
//!
//! [`SessionManager`] owns the signed-in user and bearer token. It is the
//! only writer of the shared [`AuthHeader`](crate::api::AuthHeader): the
//! header is set whenever a token is held and cleared on logout or a failed
//! refresh, so every `ApiClient` sharing that header picks up the change on
//! its next request.
//!
//! # Lifecycle
//!
//! ```text
//! new() ── token persisted? ──yes──► Authenticating ── restore() ──ok──► Authenticated
//!                │                                       └──err──► logout ► Unauthenticated
//!                └──no──► Unauthenticated
//! ```
//!
//! Authentication failures (expired or rejected tokens) always end in a
//! forced logout rather than a retry.

mod oauth;
mod state;

pub use oauth::{
    CallbackOutcome, CallbackParams, HOME, Navigation, Navigator, Transition, resolve_callback,
};
pub use state::{ProfileUpdateOutcome, SessionError, SessionSnapshot, SessionStatus};

use std::sync::{Mutex, MutexGuard, PoisonError};

use hugscape_core::{ProfileUpdate, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, Transport, endpoints};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{KeyValueStore, TOKEN_KEY};

const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully";
const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile";

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct ProfileUpdateResponse {
    user: UserProfile,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Token saved by an earlier sign-in, if any. Read failures count as none.
pub fn persisted_token<S: KeyValueStore + ?Sized>(storage: &S) -> Option<SecretString> {
    match storage.load(TOKEN_KEY) {
        Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
        Err(e) => {
            warn!(error = %e, "Failed to read persisted token");
            None
        }
    }
}

/// Session state manager.
pub struct SessionManager<T, S> {
    api: ApiClient<T>,
    storage: S,
    state: Mutex<SessionSnapshot>,
}

impl<T: Transport, S: KeyValueStore> SessionManager<T, S> {
    /// Create a manager, picking up a persisted token if there is one.
    ///
    /// With a token the session starts `Authenticating` and the token is
    /// attached to outgoing requests; call [`restore`](Self::restore) to
    /// validate it. Without one it starts `Unauthenticated`.
    #[must_use]
    pub fn new(api: ApiClient<T>, storage: S) -> Self {
        let token = persisted_token(&storage);

        match &token {
            Some(token) => api.auth().set(token.clone()),
            None => api.auth().clear(),
        }

        let state = SessionSnapshot {
            user: None,
            loading: token.is_some(),
            token,
            error: None,
        };

        Self {
            api,
            storage,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_token(&self, token: &SecretString) {
        if let Err(e) = self.storage.save(TOKEN_KEY, token.expose_secret()) {
            tracing::error!(error = %e, "Failed to persist session token");
        }
    }

    /// Validate a persisted token by fetching the profile.
    ///
    /// Does nothing when no token is held. A rejected token forces a logout.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        if self.lock().token.is_none() {
            self.lock().loading = false;
            return;
        }
        if let Err(e) = self.fetch_profile().await {
            debug!(error = %e, "Persisted token not restored");
        }
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoToken`] without a request when no token is
    /// held, or the API error after forcing a logout.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile, SessionError> {
        if self.lock().token.is_none() {
            self.lock().loading = false;
            return Err(SessionError::NoToken);
        }

        match self
            .api
            .get::<ProfileResponse>(endpoints::PROFILE)
            .await
        {
            Ok(ProfileResponse { user }) => {
                set_sentry_user(&user.id, Some(&user.email));
                let mut state = self.lock();
                state.user = Some(user.clone());
                state.error = None;
                state.loading = false;
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch user profile, signing out");
                self.logout();
                Err(e.into())
            }
        }
    }

    /// Hand control to the identity provider.
    pub fn begin_oauth_login(&self, navigator: &impl Navigator) {
        info!("Starting OAuth sign-in");
        navigator.navigate(Navigation::immediate(endpoints::OAUTH_LOGIN));
    }

    /// Apply an OAuth redirect and issue the resulting navigation.
    #[instrument(skip(self, params, navigator))]
    pub fn complete_oauth(
        &self,
        params: &CallbackParams,
        navigator: &impl Navigator,
    ) -> CallbackOutcome {
        let outcome = resolve_callback(params);

        match &outcome.transition {
            Transition::None => {}
            Transition::Fail(message) => self.handle_oauth_error(message),
            Transition::SignIn { user, token } => self.sign_in(user.clone(), token.clone()),
        }

        navigator.navigate(outcome.navigation.clone());
        outcome
    }

    fn sign_in(&self, user: UserProfile, token: SecretString) {
        self.persist_token(&token);
        self.api.auth().set(token.clone());
        set_sentry_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "Signed in");

        let mut state = self.lock();
        state.user = Some(user);
        state.token = Some(token);
        state.error = None;
        state.loading = false;
    }

    /// Record a sign-in failure. User and token are left as they are.
    pub fn handle_oauth_error(&self, message: &str) {
        warn!(message, "OAuth sign-in failed");
        let mut state = self.lock();
        state.error = Some(message.to_string());
        state.loading = false;
    }

    /// Exchange the current token for a new one.
    ///
    /// # Errors
    ///
    /// Returns the API error after forcing a logout.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        match self.api.post::<RefreshResponse>(endpoints::REFRESH_TOKEN).await {
            Ok(RefreshResponse { token, user }) => {
                let token = SecretString::from(token);
                self.persist_token(&token);
                self.api.auth().set(token.clone());

                let mut state = self.lock();
                state.token = Some(token);
                if let Some(user) = user {
                    state.user = Some(user);
                }
                info!("Session token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, signing out");
                self.logout();
                Err(e.into())
            }
        }
    }

    /// Clear the session, the persisted token and the shared header.
    ///
    /// Always ends `Unauthenticated`, whatever was pending or failed before.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        {
            let mut state = self.lock();
            state.user = None;
            state.token = None;
            state.loading = false;
            state.error = None;
        }
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            tracing::error!(error = %e, "Failed to remove persisted token");
        }
        self.api.auth().clear();
        clear_sentry_user();
        info!("Signed out");
    }

    /// Send profile changes. Session state only changes on success.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ProfileUpdateOutcome {
        match self
            .api
            .put::<_, ProfileUpdateResponse>(endpoints::PROFILE, update)
            .await
        {
            Ok(ProfileUpdateResponse { user, message }) => {
                self.lock().user = Some(user);
                ProfileUpdateOutcome::Updated {
                    message: message.unwrap_or_else(|| PROFILE_UPDATED_MESSAGE.to_string()),
                }
            }
            Err(e) => {
                warn!(error = %e, "Profile update failed");
                ProfileUpdateOutcome::Failed {
                    message: e
                        .server_message()
                        .unwrap_or(PROFILE_UPDATE_FAILED_MESSAGE)
                        .to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    /// No role model exists yet: every authenticated user has every role.
    #[must_use]
    pub fn has_role(&self, _role: &str) -> bool {
        self.is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().clone()
    }
}
