//! Console for compose-backed projects and the nodes that run them.
//!
//! [`transport`] speaks the backend's envelope protocol, [`cache`] sits in
//! front of it for reads, and [`console`] exposes the typed operations.

pub mod actions;
pub mod cache;
pub mod commands;
pub mod compose;
pub mod config;
pub mod console;
pub mod logging;
pub mod notify;
pub mod render;
pub mod session;
pub mod shell;
#[cfg(test)]
mod testing;
pub mod transport;
