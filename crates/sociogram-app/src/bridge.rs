//! Client-to-Application translation layer.
//!
//! The [`Bridge`] wraps the shared [`SessionClient`] and adapts it to the
//! application lifecycle.
//!
//! # Responsibilities
//!
//! - Executes remote [`crate::AppAction`]s as client operations.
//! - Interprets results and errors from the client and converts them back
//!   into [`crate::AppEvent`]s to update the UI.
//! - Stamps accepted sends with the environment's wall clock, so simulation
//!   and production share one code path.

use std::sync::Arc;

use sociogram_client::{Environment, Platform, RedirectParams, SessionClient};

use crate::{AppAction, AppEvent};

/// Bridge between App and the session client.
///
/// Cheap to clone; clones share the client, so remote actions can run on
/// separate tasks.
pub struct Bridge<P: Platform, E: Environment> {
    client: Arc<SessionClient<P, E>>,
}

impl<P: Platform, E: Environment> Clone for Bridge<P, E> {
    fn clone(&self) -> Self {
        Self { client: Arc::clone(&self.client) }
    }
}

impl<P: Platform, E: Environment> Bridge<P, E> {
    /// Create a new Bridge over a shared client.
    pub fn new(client: Arc<SessionClient<P, E>>) -> Self {
        Self { client }
    }

    /// Shared client.
    pub fn client(&self) -> &Arc<SessionClient<P, E>> {
        &self.client
    }

    /// Execute an App action and return resulting App events.
    ///
    /// Local actions (render, quit, open wallet) produce no events.
    pub async fn process_app_action(&self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Initialize => match self.client.initialize().await {
                Ok(_) => vec![AppEvent::Initialized { account: self.client.current_account().await }],
                Err(err) => vec![AppEvent::ConnectFailed { message: err.to_string() }],
            },
            AppAction::RequestSignIn => match self.client.request_sign_in().await {
                Ok(redirect) => vec![AppEvent::SignInStarted { url: redirect.url }],
                Err(err) => vec![AppEvent::SignInFailed { message: err.to_string() }],
            },
            AppAction::CompleteSignIn { redirect } => {
                let params = match RedirectParams::parse(&redirect) {
                    Ok(params) => params,
                    Err(err) => return vec![AppEvent::SignInFailed { message: err.to_string() }],
                };
                match self.client.complete_sign_in(&params).await {
                    Ok(account) => vec![AppEvent::SignedIn { account }],
                    Err(err) => vec![AppEvent::SignInFailed { message: err.to_string() }],
                }
            },
            AppAction::SignOut => {
                self.client.sign_out().await;
                vec![AppEvent::SignedOut]
            },
            AppAction::RegisterUsername { username } => {
                match self.client.register_username(&username).await {
                    Ok(_) => vec![AppEvent::Registered { username }],
                    Err(error) => vec![AppEvent::RegisterFailed { error }],
                }
            },
            AppAction::LoadUsers => vec![AppEvent::UsersLoaded { users: self.client.list_users().await }],
            AppAction::LoadMessages { account, peer } => {
                let messages = self.client.get_messages(&account).await;
                vec![AppEvent::MessagesLoaded { peer, messages }]
            },
            AppAction::SendMessage { receiver, content } => {
                match self.client.send_message(&receiver, &content).await {
                    Ok(_) => {
                        let timestamp = self.client.env().wall_clock_nanos();
                        vec![AppEvent::MessageSent { receiver, content, timestamp }]
                    },
                    Err(error) => {
                        tracing::debug!(%receiver, %error, "send failed");
                        vec![AppEvent::SendFailed { receiver, error }]
                    },
                }
            },
            AppAction::Render | AppAction::Quit | AppAction::OpenWallet { .. } => vec![],
        }
    }
}
