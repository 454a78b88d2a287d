//! # SiteGPT Domain
//!
//! Shared types for the TR-SiteGPT dashboard API client.
//!
//! This crate contains:
//! - The workspace error type and `Result` alias
//! - Configuration structures (API transport and session behaviour)
//! - Wire DTOs for the session endpoints (login, users)
//! - Domain constants (storage keys, endpoint paths, defaults)
//!
//! ## Architecture
//! - No dependencies on other SiteGPT crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
