//! Sign-in and profile commands.
//!
//! # Usage
//!
//! ```bash
//! # Prints the identity-provider URL to open in a browser
//! hugscape login
//!
//! # Paste the query string the browser was redirected with
//! hugscape callback '?token=eyJ...&user=%7B...%7D'
//!
//! hugscape whoami
//! hugscape profile --given-name Sam
//! hugscape logout
//! ```

use hugscape_core::ProfileUpdate;
use hugscape_storefront::session::{
    CallbackParams, Navigation, ProfileUpdateOutcome, SessionStatus, Transition,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{CommandError, Context};

pub fn login(context: &Context) {
    let (navigator, mut navigations) = mpsc::unbounded_channel::<Navigation>();
    context.session().begin_oauth_login(&navigator);

    if let Ok(navigation) = navigations.try_recv() {
        info!(
            "Open {} in a browser to sign in",
            context.config().url_for(&navigation.target)
        );
    }
}

/// Complete sign-in from the redirect query string.
pub fn callback(context: &Context, query: &str) -> Result<(), CommandError> {
    let (navigator, mut navigations) = mpsc::unbounded_channel::<Navigation>();
    let outcome = context
        .session()
        .complete_oauth(&CallbackParams::from_query(query), &navigator);

    if let Ok(navigation) = navigations.try_recv() {
        debug!(path = %navigation.target, delay = ?navigation.delay, "Callback navigation");
    }

    match outcome.transition {
        Transition::Fail(message) => Err(CommandError::Failed(message)),
        Transition::SignIn { user, .. } => {
            info!(
                "{} Welcome, {}",
                outcome.message.unwrap_or_default(),
                user.display_name()
            );
            Ok(())
        }
        Transition::None => {
            info!("No sign-in parameters found; nothing changed");
            Ok(())
        }
    }
}

pub async fn whoami(context: &Context) -> Result<(), CommandError> {
    let session = context.session();
    session.restore().await;

    match session.status() {
        SessionStatus::Authenticated => {
            if let Some(user) = session.user() {
                info!("Signed in as {} <{}>", user.display_name(), user.email);
            }
        }
        SessionStatus::Failed(message) => return Err(CommandError::Failed(message)),
        SessionStatus::Unauthenticated | SessionStatus::Authenticating => {
            info!("Not signed in");
        }
    }
    Ok(())
}

pub async fn refresh(context: &Context) -> Result<(), CommandError> {
    context.session().refresh_token().await?;
    info!("Session token refreshed");
    Ok(())
}

pub fn logout(context: &Context) {
    context.session().logout();
    info!("Signed out");
}

pub async fn update_profile(
    context: &Context,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
) -> Result<(), CommandError> {
    let update = ProfileUpdate {
        name,
        given_name,
        family_name,
    };

    match context.session().update_profile(&update).await {
        ProfileUpdateOutcome::Updated { message } => {
            info!("{message}");
            Ok(())
        }
        ProfileUpdateOutcome::Failed { message } => Err(CommandError::Failed(message)),
    }
}
