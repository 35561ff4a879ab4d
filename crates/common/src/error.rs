//! Common error types.

use thiserror::Error;

/// Main error type for the thumbar bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Selector error: {0}")]
    Selector(String),

    #[error("Host capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Host invocation failed: {0}")]
    Invoke(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::CapabilityUnavailable(msg.into())
    }

    pub fn invoke(msg: impl Into<String>) -> Self {
        Self::Invoke(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NodeNotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error means the system keeps running with reduced capability.
    pub fn is_degraded_mode(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::invoke("channel closed");
        assert_eq!(err.to_string(), "Host invocation failed: channel closed");
    }

    #[test]
    fn test_degraded_mode() {
        assert!(BridgeError::unavailable("event surface").is_degraded_mode());
        assert!(!BridgeError::internal("boom").is_degraded_mode());
    }

    #[test]
    fn test_json_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: BridgeError = parse.unwrap_err().into();
        assert!(matches!(err, BridgeError::Json(_)));
    }
}
