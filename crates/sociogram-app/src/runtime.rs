//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: remote calls through the session client
//! - [`Driver`]: Platform-specific I/O
//!
//! Remote actions run on their own tasks so a slow contract call never blocks
//! input. Their results come back as [`AppEvent`]s over a channel and are fed
//! to the App in arrival order.

use sociogram_client::{Environment, Platform};
use tokio::sync::mpsc;

use crate::{App, AppAction, AppEvent, Bridge, Driver};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `P`: Contract platform used by the client
/// - `E`: Environment for time and randomness
pub struct Runtime<D, P, E>
where
    D: Driver,
    P: Platform,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<P, E>,
    completions_tx: mpsc::UnboundedSender<AppEvent>,
    completions_rx: mpsc::UnboundedReceiver<AppEvent>,
}

/// What woke the loop.
enum Next {
    Input(Option<AppEvent>),
    Completion(AppEvent),
}

impl<D, P, E> Runtime<D, P, E>
where
    D: Driver,
    P: Platform,
    E: Environment,
{
    /// Create a new runtime.
    pub fn new(driver: D, app: App, bridge: Bridge<P, E>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self { driver, app, bridge, completions_tx, completions_rx }
    }

    /// Run the main event loop until the App asks to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;
        let startup = self.app.start();
        if self.process_actions(startup)? {
            self.driver.stop();
            return Ok(());
        }

        loop {
            let next = tokio::select! {
                event = self.driver.poll_event() => Next::Input(event?),
                Some(event) = self.completions_rx.recv() => Next::Completion(event),
            };

            let event = match next {
                Next::Input(Some(event)) | Next::Completion(event) => event,
                Next::Input(None) => continue,
            };

            let actions = self.app.handle(event);
            if self.process_actions(actions)? {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Dispatch actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(true),
                AppAction::OpenWallet { url } => self.driver.open_url(&url)?,
                remote => self.spawn_remote(remote),
            }
        }
        Ok(false)
    }

    /// Run a remote action on its own task, reporting back over the channel.
    fn spawn_remote(&self, action: AppAction) {
        let bridge = self.bridge.clone();
        let completions = self.completions_tx.clone();
        tracing::trace!(?action, "dispatching remote action");

        tokio::spawn(async move {
            for event in bridge.process_app_action(action).await {
                if completions.send(event).is_err() {
                    break;
                }
            }
        });
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
