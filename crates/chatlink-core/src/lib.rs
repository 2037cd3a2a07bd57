//! Pure domain logic for the chatlink bridge.
//!
//! Everything in this crate is synchronous and side-effect free: log-entry
//! parsing, high-water-mark deduplication, chat classification, sanitizing,
//! outbound command formatting, and the group/topology model. I/O lives in
//! `chatlink-panel`, `chatlink-sink`, and `chatlink-runtime`.

pub mod command;
pub mod failure;
pub mod filter;
pub mod format;
pub mod sanitize;
pub mod topology;
pub mod types;
pub mod watermark;
