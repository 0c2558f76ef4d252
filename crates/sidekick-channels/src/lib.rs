//! # sidekick-channels
//!
//! Messaging transports for Sidekick.

mod echo;
pub mod whatsapp;

pub use whatsapp::WhatsAppBridge;
