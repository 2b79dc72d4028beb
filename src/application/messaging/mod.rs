//! Message handling - from decoded inbound message to one handler invocation

pub mod authorize;
pub mod context;
pub mod cooldown;
pub mod dispatcher;
pub mod parser;

pub use authorize::{authorize, AccessFacts, Denial};
pub use context::Context;
pub use cooldown::CooldownTracker;
pub use dispatcher::{CommandDispatcher, DispatchOutcome, IgnoreReason};
pub use parser::{CommandParser, ParsedCommand};
