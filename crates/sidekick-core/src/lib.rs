//! # sidekick-core
//!
//! Core types, traits, configuration, and error handling for the Sidekick bot.

pub mod config;
pub mod error;
pub mod jid;
pub mod message;
pub mod service;
pub mod traits;

pub use config::shellexpand;
