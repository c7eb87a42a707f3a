//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use crate::{App, AppEvent};

/// Abstracts local I/O for the application runtime.
///
/// Remote calls never go through the driver; they run on the
/// [`Bridge`](crate::Bridge). The driver only feeds input and presents
/// state.
///
/// # Implementations
///
/// - **TUI**: crossterm events, ratatui rendering
/// - **Simulation**: scripted events, recorded renders
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input event.
    ///
    /// Returns `None` if no event is ready yet. Implementations should wait a
    /// short while before returning `None` so the runtime does not spin.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Present the wallet page the user must visit.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be presented.
    fn open_url(&mut self, url: &str) -> Result<(), Self::Error>;

    /// Restore the platform and clean up resources.
    fn stop(&mut self);
}
