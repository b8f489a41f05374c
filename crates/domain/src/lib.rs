//! # StreamGate Domain
//!
//! Data types shared by every StreamGate crate.
//!
//! This crate contains:
//! - Platform, credential and authorization outcome types
//! - EventSub subscription records and the websocket envelope
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other StreamGate crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
