//! Error types for the TeleSABRE routing scheduler.

use thiserror::Error;

/// Unified error type for `ts_core` and its dependents.
#[derive(Error, Debug)]
pub enum TsError {
    // ============ Device Errors ============
    /// Generic device construction error
    #[error("Device error: {0}")]
    Device(String),

    /// Physical qubit id out of range
    #[error("Invalid physical qubit {0}, device has {1} qubits")]
    InvalidPhysicalQubit(i32, usize),

    /// Core id out of range
    #[error("Invalid core {0}, device has {1} cores")]
    InvalidCore(i32, usize),

    // ============ Circuit Errors ============
    /// Generic circuit error
    #[error("Circuit error: {0}")]
    Circuit(String),

    /// Virtual qubit id out of range
    #[error("Invalid virtual qubit {0}, circuit has {1} qubits")]
    InvalidVirtualQubit(i32, usize),

    // ============ Layout Errors ============
    /// A precondition of `apply_swap`/`apply_teleport` was violated.
    ///
    /// Returned rather than panicking so the caller can attach a
    /// diagnostic. Should never be reachable from a correctly generated
    /// candidate op.
    #[error("Layout precondition violated: {0}")]
    Layout(String),

    // ============ Config Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Qasm Errors ============
    /// QASM parse error
    #[error("QASM parse error: {0}")]
    Qasm(String),

    // ============ I/O Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for TeleSABRE operations.
pub type Result<T> = std::result::Result<T, TsError>;

impl TsError {
    /// Creates a device error with the given message.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Creates a circuit error with the given message.
    pub fn circuit(msg: impl Into<String>) -> Self {
        Self::Circuit(msg.into())
    }

    /// Creates a layout error with the given message.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Creates a config error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a QASM error with the given message.
    pub fn qasm(msg: impl Into<String>) -> Self {
        Self::Qasm(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TsError::InvalidPhysicalQubit(7, 4);
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('4'));
    }

    #[test]
    fn test_result_type() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }
        fn returns_err() -> Result<i32> {
            Err(TsError::layout("teleport target occupied"))
        }
        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
