use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected {service} response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("Trading pair not found: {0}")]
    UnknownPair(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("{service} returned no completion choices")]
    EmptyCompletion { service: &'static str },

    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl UpstreamError {
    pub(crate) fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            message: message.into(),
        }
    }
}
