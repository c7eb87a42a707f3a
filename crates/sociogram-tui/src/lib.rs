//! Terminal UI for Sociogram
//!
//! A thin shell over [`sociogram_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`sociogram_app::Runtime`]
//! and every remote call goes through [`sociogram_app::Bridge`].
//!
//! This crate only handles terminal input and rendering, plus the seeded
//! network behind `--simulate`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod demo;
pub mod terminal;
pub mod ui;

pub use sociogram_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
