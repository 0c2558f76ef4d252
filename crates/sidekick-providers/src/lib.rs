//! # sidekick-providers
//!
//! External AI service clients for Sidekick.

pub mod http;

pub use http::HttpAiService;
