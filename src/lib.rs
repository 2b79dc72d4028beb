//! mahachi-bot - a plugin-driven WhatsApp command bot
//!
//! Inbound messages from a [`domain::traits::Connection`] are parsed against
//! the configured prefix, matched to a plugin from the manifest directory,
//! checked for access and cooldown, and handed to the bound handler.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

#[cfg(test)]
mod test_support;
