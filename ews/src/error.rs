//! # Error
//!
//! Module dedicated to EWS errors. It contains an [`Error`] enum
//! based on [`thiserror::Error`] and a type alias [`Result`].

use std::error;

use base64::DecodeError;
use http::ureq::http::Uri;
use thiserror::Error;

/// The global `Result` alias of the library.
pub type Result<T> = std::result::Result<T, Error>;

/// The boxed error returned by external collaborators, like body
/// builders.
pub type AnyBoxedError = Box<dyn error::Error + Send + Sync + 'static>;

/// The global `Error` enum of the library.
///
/// HTTP error statuses are not part of it: they are returned as
/// regular responses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty identity, please provide a valid email or domain\\account")]
    EmptyIdentityError,
    #[error("empty endpoint, please provide a valid EWS server address")]
    EmptyEndpointError,
    #[error("empty access token, please provide a valid access token")]
    MissingAccessTokenError,
    #[error("invalid identity {0}: expected email or domain\\account")]
    InvalidIdentityFormatError(String),

    #[error("cannot build request to {1}")]
    BuildRequestError(#[source] http::ureq::http::Error, String),
    #[error("cannot build message body")]
    BuildBodyError(#[source] AnyBoxedError),
    #[error("cannot send request to {1}")]
    SendRequestError(#[source] http::Error, Uri),

    #[error("cannot find NTLM challenge in server response")]
    MissingNtlmChallengeError,
    #[error("cannot decode NTLM challenge")]
    DecodeNtlmChallengeError(#[source] DecodeError),
    #[error("cannot parse NTLM challenge: {0}")]
    ParseNtlmChallengeError(&'static str),
    #[error("cannot read NTLM challenge response body")]
    ReadNtlmChallengeBodyError(#[source] http::Error),

    #[error(transparent)]
    HttpError(#[from] http::Error),
}
