use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the api client and its helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// Network level failure, surfaced immediately and never retried.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-200 http status.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    /// The json envelope carried a non-zero platform code.
    #[error("unexpected response code: {code}, cause: {message}")]
    Status { code: i64, message: String },

    /// Malformed or too-short content identifier, caught before any
    /// network call.
    #[error("invalid characters in id")]
    InvalidId,

    /// The response body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The envelope reported success but carried no payload.
    #[error("response carried no payload")]
    EmptyPayload,

    /// Session store or qr sink i/o failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The login url could not be rendered as a qr code.
    #[error("qr code rendering failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    /// No home directory to place the session store in.
    #[error("home directory not found")]
    NoHomeDir,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn status(code: i64, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }
}
