//! Application layer for Sociogram
//!
//! Pure state machines and generic runtime for the chat view, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: view state machine (session, contacts, selection, thread,
//!   compose line, commands)
//! - [`Bridge`]: executes remote actions on the session client and reports
//!   results as events
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
pub mod commands;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use commands::Command;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::{ComposeBuffer, KeyInput};
pub use runtime::Runtime;
pub use state::{AfterConnect, Delivery, InFlight, SessionState, ThreadMessage};
