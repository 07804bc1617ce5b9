use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the HTTP transport or reply decoding.
///
/// Backend-reported failures (`success: false`) are not errors at this
/// layer; they travel inside the reply types and the controller decides
/// what to do with them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connect, I/O, or protocol failure).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        source: BoxError,
    },
    /// A reply arrived but was not the JSON shape the endpoint documents.
    #[error("malformed reply from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        source: BoxError,
    },
}

impl ApiError {
    pub fn transport(endpoint: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            endpoint,
            source: source.into(),
        }
    }

    pub fn decode(endpoint: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            endpoint,
            source: source.into(),
        }
    }

    /// Endpoint path the failing request was addressed to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Transport { endpoint, .. } | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}
