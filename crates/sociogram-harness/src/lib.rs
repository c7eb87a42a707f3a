//! Deterministic simulation harness for Sociogram testing.
//!
//! In-memory implementations of the Environment, Platform and Driver traits
//! for deterministic, reproducible testing of the session client and the chat
//! view, including fault injection (unreachable network, slow connect,
//! expired sessions, failing views).
//!
//! # Simulation
//!
//! - [`SimNetwork`]: the chat contract's storage plus fault switches, shared
//!   by every simulated user
//! - [`SimPlatform`]: a [`sociogram_client::Platform`] over a [`SimNetwork`]
//!   with its own wallet storage
//! - [`SimEnv`]: virtual wall clock and seeded RNG
//! - [`SimUser`]: App and Bridge driven inline to quiescence
//! - [`SimDriver`]: scripted [`sociogram_app::Driver`] for full runtime tests
//!
//! # Invariant Testing
//!
//! The `invariants` module holds the chat view rules every simulated step
//! must satisfy; [`InvariantRegistry::standard()`] bundles them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_network;
pub mod sim_user;

pub use invariants::{
    ConfirmedMessagesStored, ContractSnapshot, Invariant, InvariantRegistry, InvariantResult,
    SelectedPeerInContacts, SelfNotInContacts, SignedOutHasEmptyView, SystemSnapshot,
    ThreadMatchesSelection, ViewSnapshot, Violation, Violations,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_network::{
    CallCounts, SimContract, SimNetwork, SimPlatform, SimWallet, approve_redirect,
};
pub use sim_user::{SimClient, SimUser};
