//! Pipeline error type.

/// Boxed error raised by collaborators (renderers, content producers, decoders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure raised while executing a pipeline.
///
/// The engine never catches these: an interceptor returning `Err` aborts the
/// whole chain and the error surfaces from [`Pipeline::execute`](crate::Pipeline::execute)
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An interceptor rejected its subject.
    #[error("interceptor failed: {0}")]
    Interceptor(String),
    /// A render thunk failed to produce output.
    #[error("render failed: {0}")]
    Render(String),
    /// Error raised by an external collaborator.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl PipelineError {
    /// Create an interceptor error from a message.
    #[must_use]
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor(message.into())
    }

    /// Create a render error from a message.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interceptor_message() {
        let err = PipelineError::interceptor("bad subject");
        assert_eq!(err.to_string(), "interceptor failed: bad subject");
    }

    #[test]
    fn test_other_is_transparent() {
        let io = std::io::Error::other("disk gone");
        let err = PipelineError::from(Box::new(io) as BoxError);
        assert_eq!(err.to_string(), "disk gone");
    }
}
