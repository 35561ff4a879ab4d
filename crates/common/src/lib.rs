//! Common utilities and types shared across the thumbar bridge workspace.

pub mod error;

pub use error::{BridgeError, BridgeResult};
