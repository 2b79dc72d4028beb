//! Adapters - Connection implementations

pub mod console;

pub use console::ConsoleAdapter;
