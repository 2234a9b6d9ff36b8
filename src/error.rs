//! Operational errors for the content validation pass.
//!
//! Conformance problems are never returned as errors; they are reported as
//! [`crate::diagnostics::ValidationDiagnostic`] values. A [`ContentError`]
//! means the pass itself could not run to completion.

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Error returned when a content document cannot be driven through the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentError {
    /// The XML reader rejected the input.
    Xml {
        /// Reader error description.
        message: String,
        /// Byte offset where the reader stopped.
        offset: usize,
    },
    /// An element or attribute name could not be decoded.
    Decode {
        /// Decoder error description.
        message: String,
        /// Byte offset of the offending token.
        offset: usize,
    },
    /// A configured [`crate::ContentLimits`] bound was exceeded.
    LimitExceeded {
        /// Name of the limit field.
        kind: &'static str,
        /// Observed value.
        actual: usize,
        /// Configured bound.
        limit: usize,
    },
    /// Reading the document from disk failed.
    #[cfg(feature = "std")]
    Io(String),
}

impl ContentError {
    pub(crate) fn limit(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self::LimitExceeded {
            kind,
            actual,
            limit,
        }
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml { message, offset } => {
                write!(f, "content XML parse error at byte {}: {}", offset, message)
            }
            Self::Decode { message, offset } => {
                write!(f, "content decode error at byte {}: {}", offset, message)
            }
            Self::LimitExceeded {
                kind,
                actual,
                limit,
            } => write!(
                f,
                "content limit exceeded: {} (actual={} limit={})",
                kind, actual, limit
            ),
            #[cfg(feature = "std")]
            Self::Io(msg) => write!(f, "content I/O error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ContentError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for ContentError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
