//! Error handling for Podmix
//!
//! Every failure of the composition engine is returned as a typed
//! [`PodmixError`]. Nothing is retried or swallowed inside the engine;
//! callers map errors to their own status records via [`PodmixError::error_code`].

use thiserror::Error;

/// Result type alias for Podmix operations
pub type Result<T> = std::result::Result<T, PodmixError>;

/// Main error type for Podmix operations
#[derive(Error, Debug)]
pub enum PodmixError {
    // Engine Errors
    #[error(
        "Format mismatch: expected {expected_rate} Hz / {expected_channels} ch, \
         found {found_rate} Hz / {found_channels} ch"
    )]
    FormatMismatch {
        expected_rate: u32,
        expected_channels: usize,
        found_rate: u32,
        found_channels: usize,
    },

    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error("Insufficient source: {reason} (required {required_ms} ms, available {available_ms} ms)")]
    InsufficientSource {
        required_ms: u64,
        available_ms: u64,
        reason: String,
    },

    #[error("Invalid buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("Invalid composition request: {reason}")]
    InvalidRequest { reason: String },

    // Codec Errors
    #[error("Decode error: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Encode error: {reason}")]
    Encode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PodmixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PodmixError::FormatMismatch { .. } => "FORMAT_MISMATCH",
            PodmixError::InvalidRange { .. } => "INVALID_RANGE",
            PodmixError::InsufficientSource { .. } => "INSUFFICIENT_SOURCE",
            PodmixError::InvalidBuffer { .. } => "INVALID_BUFFER",
            PodmixError::InvalidRequest { .. } => "INVALID_REQUEST",
            PodmixError::Decode { .. } => "DECODE_ERROR",
            PodmixError::Encode { .. } => "ENCODE_ERROR",
            PodmixError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            PodmixError::Io(_) => "IO_ERROR",
            PodmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check whether this error came out of the composition engine itself
    ///
    /// These are the failures a caller may choose to paper over by shipping
    /// the unmixed narration.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            PodmixError::FormatMismatch { .. }
                | PodmixError::InvalidRange { .. }
                | PodmixError::InsufficientSource { .. }
        )
    }

    /// Shorthand for a decode failure with an underlying cause
    pub(crate) fn decode<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PodmixError::Decode {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for an encode failure with an underlying cause
    pub(crate) fn encode<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PodmixError::Encode {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}
