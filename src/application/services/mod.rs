//! Application services - long-running orchestration

pub mod supervisor;

pub use supervisor::{ConnectionSupervisor, ReconnectPolicy};
