//! ledger-api: Core library for the ledger console - shared types, config, and API client.
//!
//! This crate provides the foundation for the `ledger` console and the
//! `ledger-smoke` harness, including:
//! - The `{success, data, error}` result envelope
//! - Typed request bodies and response payloads
//! - A blocking HTTP client that never surfaces transport faults as errors
//! - Configuration and config path discovery

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod paths;
pub mod types;

pub use client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, LedgerClient};
pub use config::{AppConfig, ConsoleConfig};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use paths::AppPaths;
pub use types::{DeliveryMethod, DeliveryMode, Folder};
