//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`sociogram_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Input is scripted: each poll waits one step of (virtual) time, then yields
//! the next queued event. Once the script runs dry the driver presses Esc, so
//! a runtime under test always terminates.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use sociogram_app::{App, AppEvent, Driver, KeyInput};

use crate::invariants::{InvariantRegistry, SystemSnapshot, ViewSnapshot};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection and inspection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AppEvent>,
    renders: usize,
    opened_urls: Vec<String>,
    last_view: Option<ViewSnapshot>,
    last_status: Option<String>,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Cloning yields a handle to the same shared state, so a test can keep one
/// clone for injection and inspection while the runtime owns the other.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
    step: Duration,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a new simulation driver polling every 10ms.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            invariants: None,
            step: Duration::from_millis(10),
        }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Time waited before each scripted event.
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.shared().pending_events.push_back(event);
    }

    /// Inject a key press.
    pub fn inject_key(&self, key: KeyInput) {
        self.inject_event(AppEvent::Key(key));
    }

    /// Inject a typed line followed by Enter.
    pub fn inject_line(&self, line: &str) {
        let mut state = self.shared();
        state.pending_events.extend(line.chars().map(|c| AppEvent::Key(KeyInput::Char(c))));
        state.pending_events.push_back(AppEvent::Key(KeyInput::Enter));
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        !self.shared().pending_events.is_empty()
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.shared().renders
    }

    /// Wallet URLs the App asked to present.
    pub fn opened_urls(&self) -> Vec<String> {
        self.shared().opened_urls.clone()
    }

    /// View captured at the last render.
    pub fn last_view(&self) -> Option<ViewSnapshot> {
        self.shared().last_view.clone()
    }

    /// Status line at the last render.
    pub fn last_status(&self) -> Option<String> {
        self.shared().last_status.clone()
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.shared().stopped
    }

    fn shared(&self) -> std::sync::MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::time::sleep(self.step).await;
        let next = self.shared().pending_events.pop_front();
        Ok(Some(next.unwrap_or(AppEvent::Key(KeyInput::Esc))))
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let view = ViewSnapshot::from_app("sim", app);
        if let Some(registry) = &self.invariants {
            registry
                .check_all(&SystemSnapshot::single(view.clone()))
                .map_err(|violations| SimDriverError(violations.to_string()))?;
        }

        let mut state = self.shared();
        state.renders += 1;
        state.last_view = Some(view);
        state.last_status = app.status_message().map(str::to_owned);
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<(), Self::Error> {
        self.shared().opened_urls.push(url.to_owned());
        Ok(())
    }

    fn stop(&mut self) {
        self.shared().stopped = true;
    }
}
