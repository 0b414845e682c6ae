//! Core domain + application logic for the Bryx CRM bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the CRM HTTP
//! API live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod crm;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod router;
pub mod security;
pub mod texts;

pub use errors::{Error, Result};
