//! Application layer - Use cases and orchestration
//!
//! This layer contains:
//! - Errors: error types shared across layers
//! - Messaging: parsing, authorization, cooldowns, dispatching
//! - Services: the connection supervisor
//! - Format: small text helpers used by handlers

pub mod errors;
pub mod format;
pub mod messaging;
pub mod services;
