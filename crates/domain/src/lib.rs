//! Shared types for chatmux: modes, context DTOs, conversations, config,
//! the error taxonomy and structured trace events.

pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod mode;
pub mod trace;

pub use error::{Error, Result};
