//! Plugin system for mahachi-bot
//!
//! Handlers are compiled in and registered in a `HandlerCatalog` by id.
//! Manifests on disk decide which handlers are reachable, under which
//! command names, and with which restrictions.

pub mod builtin;
pub mod catalog;
pub mod trait_def;

pub use catalog::HandlerCatalog;
pub use trait_def::{CommandHandler, MessageObserver, ObservedMessage, ParticipantObserver, ParticipantUpdate};
