//! Remote control-panel boundary.
//!
//! The engine only sees [`PanelApi`]; [`HttpPanel`] is the production
//! implementation over the panel's JSON HTTP API with cached per-instance
//! sessions. Session invalidation is the hook the engine's failure-healing
//! path uses to force a re-login.

pub mod client;
pub mod error;
pub mod session;

pub use client::{DEFAULT_REQUEST_TIMEOUT, HttpPanel, InstanceRef, PanelApi, PanelCredentials};
pub use error::PanelError;
pub use session::SessionStore;
