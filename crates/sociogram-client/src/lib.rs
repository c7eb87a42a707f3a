//! Client
//!
//! Session and contract client for the Sociogram chat contract. Mediates
//! every call to the external contract platform and owns the connection,
//! wallet session and contract proxy handles.
//!
//! # Architecture
//!
//! The client is generic over a [`Platform`] (how to reach the network and
//! the wallet) and an [`Environment`] (time, sleep, randomness), so the same
//! lifecycle code runs against the NEAR JSON-RPC network and against the
//! in-memory simulation harness.
//!
//! # Components
//!
//! - [`SessionClient`]: lifecycle state machine and contract operations
//! - [`ClientError`]: error taxonomy, with [`REJECTION_PATTERNS`] as the single
//!   place remote messages are classified
//! - [`ClientConfig`]: network/wallet/contract settings from the environment
//! - [`thread_between`]: unordered-pair conversation filter
//!
//! # RPC (optional)
//!
//! With the `rpc` feature enabled, [`rpc::NearPlatform`] implements the
//! platform over NEAR JSON-RPC with a file-backed key store.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod env;
mod error;
mod platform;
mod types;

#[cfg(feature = "rpc")]
pub mod rpc;

pub use client::{ClientState, SessionClient};
pub use config::{CHANGE_METHODS, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_GAS, VIEW_METHODS};
pub use env::{Environment, SystemEnv};
pub use error::{
    Classification, ClientError, REJECTION_PATTERNS, RejectionKind, RemoteError, classify,
};
pub use platform::{
    ContractProxy, Platform, RedirectParams, SignInRedirect, SignInRequest, Wallet,
};
pub use types::{AccountId, CallOutcome, Message, User, thread_between};
