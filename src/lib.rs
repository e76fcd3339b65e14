//! HMS Access - session-governed authorization for a hospital management front-end
//!
//! This library provides the role/permission registry, the time-boxed session
//! lifecycle and the access guard that the presentation layer consults.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
