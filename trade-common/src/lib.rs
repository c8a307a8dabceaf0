//! # Trade Common Library
//!
//! Shared code for the trade data services:
//! - Error and result types
//! - Configuration resolution (CLI → ENV → TOML → default)
//! - Event types and the broadcast event bus
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
