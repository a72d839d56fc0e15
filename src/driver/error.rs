use thiserror::Error;

/// A native library call reported failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{call} failed: {message}")]
pub struct NativeError {
    /// Name of the native operation that failed
    pub call: &'static str,
    /// Last error string reported by the native library
    pub message: String,
}

impl NativeError {
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }

    pub fn unsupported(call: &'static str) -> Self {
        Self::new(call, "not supported by this device")
    }
}

/// Trigger effect codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    /// A parameter was outside the range the firmware accepts
    #[error("{parameter} must be {requirement}")]
    InvalidArgument {
        parameter: String,
        requirement: String,
    },
}

/// Errors surfaced by drivers
#[derive(Debug, Error)]
pub enum DriverError {
    /// The caller broke the driver contract, or the native library returned
    /// a value outside its documented enumeration
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Native error: {0}")]
    Native(#[from] NativeError),

    #[error("Trigger effect error: {0}")]
    Effect(#[from] EffectError),
}

impl DriverError {
    pub fn illegal_state(message: impl Into<String>) -> Self {
        DriverError::IllegalState(message.into())
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, DriverError::IllegalState(_))
    }
}
