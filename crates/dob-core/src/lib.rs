//! Core of the DevOps learning bot: interaction dispatch and usage tracking.
//!
//! This crate is framework-agnostic. Telegram, MySQL and Redis live behind
//! ports (traits) implemented in adapter crates.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod memory;
pub mod messaging;
pub mod ports;
pub mod replies;
pub mod stats;

pub use errors::{Error, Result};
