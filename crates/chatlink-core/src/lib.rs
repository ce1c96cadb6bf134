//! Core domain + application logic for VIP chat activation.
//!
//! This crate is intentionally framework-agnostic. The Telegram Bot API and the
//! record store live behind ports (traits) implemented in adapter crates.

pub mod activation;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod store;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use errors::{Error, Result};
