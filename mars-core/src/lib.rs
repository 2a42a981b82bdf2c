//! mars-core: transport-agnostic pieces of the Explorer/Mars job client.
//!
//! - [`StatusMessage`]: one entry of a status-poll response.
//! - [`MessageBroker`]: named channels that receive messages nobody is waiting for.
//! - [`MarsConfig`]: a string key/value configuration store with env overrides.

pub mod broker;
pub mod config;
pub mod message;

pub use broker::{handler_fn, FnHandler, MessageBroker, MessageHandler, MessageRouter};
pub use config::{MarsConfig, MarsConfigSnapshot};
pub use message::StatusMessage;
