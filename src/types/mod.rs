//! Core types for threadloop.

pub mod message;
pub mod state;

pub use message::*;
pub use state::*;
