//! Capability error types
//!
//! The registry core has exactly one recognized failure mode: the display
//! capability declining to produce a preview handle for a stream. It is
//! caught at its single call site and degraded to an entry without a url.

/// Error type for media capability operations
#[derive(Debug, Clone)]
pub enum CapabilityError {
    /// No displayable handle could be derived for the stream
    DisplayUnavailable(String),
}

impl std::fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityError::DisplayUnavailable(stream_id) => {
                write!(f, "No display handle for stream: {}", stream_id)
            }
        }
    }
}

impl std::error::Error for CapabilityError {}
