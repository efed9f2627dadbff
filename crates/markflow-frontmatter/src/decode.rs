//! Decoder outcomes and errors.

use std::any::{Any, TypeId, type_name};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error recorded while decoding a front matter section.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{decoder_id}: {message}{}", position(self.line, self.column))]
pub struct FrontMatterError {
    /// Id of the decoder that reported the error.
    pub decoder_id: String,
    /// Human-readable message.
    pub message: String,
    /// 1-based document line.
    pub line: Option<usize>,
    /// 1-based column.
    pub column: Option<usize>,
    /// Underlying error.
    #[source]
    pub cause: Option<Arc<dyn Error + Send + Sync>>,
}

fn position(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" (line {line}, column {column})"),
        (Some(line), None) => format!(" (line {line})"),
        _ => String::new(),
    }
}

impl FrontMatterError {
    pub(crate) fn from_failure(decoder_id: &str, failure: DecodeFailure) -> Self {
        Self {
            decoder_id: decoder_id.to_owned(),
            message: failure.message,
            line: failure.line,
            column: failure.column,
            cause: failure.cause,
        }
    }
}

/// Target type of a decode request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeRequest {
    /// Requested type.
    pub type_id: TypeId,
    /// Requested type name, for messages.
    pub type_name: &'static str,
}

impl DecodeRequest {
    /// Request for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Check whether the request targets `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Failed decode attempt.
#[derive(Clone, Debug)]
pub struct DecodeFailure {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub cause: Option<Arc<dyn Error + Send + Sync>>,
    /// Stop trying further decoders.
    pub abort: bool,
}

impl DecodeFailure {
    /// Non-aborting failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            cause: None,
            abort: false,
        }
    }

    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn caused_by(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Mark the failure as fatal for the whole decode.
    #[must_use]
    pub fn aborting(mut self) -> Self {
        self.abort = true;
        self
    }
}

/// Result of one decoder invocation.
pub enum DecodeOutcome {
    /// Decoded value. Must be an instance of the requested type.
    Success(Box<dyn Any + Send + Sync>),
    /// The decoder recognized the section but could not decode it.
    Failure(DecodeFailure),
    /// The decoder does not apply to this section.
    Skip,
}

impl DecodeOutcome {
    /// Successful outcome holding `value`.
    #[must_use]
    pub fn success<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Success(Box::new(value))
    }
}

impl From<DecodeFailure> for DecodeOutcome {
    fn from(failure: DecodeFailure) -> Self {
        Self::Failure(failure)
    }
}

impl fmt::Debug for DecodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(_) => f.write_str("Success(..)"),
            Self::Failure(failure) => f.debug_tuple("Failure").field(failure).finish(),
            Self::Skip => f.write_str("Skip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_error_display_with_position() {
        let error = FrontMatterError::from_failure("toml", DecodeFailure::new("bad value").at(3, 7));
        assert_eq!(error.to_string(), "toml: bad value (line 3, column 7)");
    }

    #[test]
    fn test_error_display_without_position() {
        let error = FrontMatterError::from_failure("custom", DecodeFailure::new("nope"));
        assert_eq!(error.to_string(), "custom: nope");
    }

    #[test]
    fn test_error_source_is_cause() {
        let io = std::io::Error::other("disk");
        let error = FrontMatterError::from_failure("x", DecodeFailure::new("read").caused_by(io));
        assert_eq!(error.source().unwrap().to_string(), "disk");
    }

    #[test]
    fn test_request_type_check() {
        let request = DecodeRequest::of::<String>();
        assert!(request.is::<String>());
        assert!(!request.is::<u32>());
        assert!(request.type_name.ends_with("String"));
    }
}
