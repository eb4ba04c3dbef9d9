//! Core domain + application logic for the Herald broadcast bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP
//! trigger live behind ports (traits) implemented in adapter crates.

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod registry;

pub use errors::{Error, Result};
