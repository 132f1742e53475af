//! Error types for Tubegate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Client errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid format id: {0}")]
    InvalidFormat(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    // Server errors
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Internal error: {0}")]
    InternalFailure(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::InvalidFormat(_)
                | Error::RateLimitExceeded { .. }
                | Error::ExtractionFailure(_)
        )
    }

    /// Fold infrastructure variants into the request-facing taxonomy.
    pub fn into_request_error(self) -> Self {
        match self {
            Error::Io(e) => Error::InternalFailure(e.to_string()),
            Error::Serialization(msg) => Error::InternalFailure(msg),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failure reported by an extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine ran but could not retrieve the media.
    #[error("{0}")]
    Extraction(String),

    #[error("engine timed out after {0}s")]
    Timeout(u64),

    /// The engine could not be started at all.
    #[error("extraction engine unavailable: {0}")]
    Unavailable(String),

    /// The engine exited cleanly without naming a file.
    #[error("engine did not report an output file")]
    NoOutput,
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Extraction(detail) => Error::ExtractionFailure(detail),
            EngineError::Timeout(secs) => {
                Error::ExtractionFailure(format!("engine timed out after {}s", secs))
            }
            EngineError::Unavailable(detail) => Error::InternalFailure(detail),
            EngineError::NoOutput => Error::ArtifactMissing(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        assert!(matches!(
            Error::from(EngineError::Extraction("Video unavailable".into())),
            Error::ExtractionFailure(d) if d == "Video unavailable"
        ));
        assert!(matches!(
            Error::from(EngineError::Timeout(30)),
            Error::ExtractionFailure(_)
        ));
        assert!(matches!(
            Error::from(EngineError::Unavailable("yt-dlp".into())),
            Error::InternalFailure(_)
        ));
        assert!(matches!(
            Error::from(EngineError::NoOutput),
            Error::ArtifactMissing(_)
        ));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidUrl("x".into()).is_client_error());
        assert!(Error::ExtractionFailure("x".into()).is_client_error());
        assert!(!Error::ArtifactMissing("x".into()).is_client_error());
        assert!(!Error::InternalFailure("x".into()).is_client_error());
    }

    #[test]
    fn test_into_request_error_folds_io() {
        let err = Error::Io(std::io::Error::other("disk gone")).into_request_error();
        assert!(matches!(err, Error::InternalFailure(d) if d.contains("disk gone")));
    }
}
