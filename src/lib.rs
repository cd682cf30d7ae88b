//! Webpage change monitoring.
//!
//! Each `check` invocation runs one cycle: fetch every configured target,
//! extract its visible text, compare against the last stored snapshot,
//! persist and notify on change, then apply the retention bound. Durable
//! state lives only in the snapshot store; the cycle itself is stateless.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod monitor;
pub mod notify;
pub mod store;
