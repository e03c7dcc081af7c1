//! # Error
//!
//! Module dedicated to HTTP client errors. It contains an [`Error`]
//! enum based on [`thiserror::Error`] and a type alias [`Result`].

use thiserror::Error;
use ureq::http::{Method, Uri};

/// The global `Result` alias of the library.
pub type Result<T> = std::result::Result<T, Error>;

/// The global `Error` enum of the library.
///
/// Only transport failures end up here: HTTP error statuses are
/// returned as regular responses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot send {1} request to {2}")]
    SendRequestError(#[source] ureq::Error, Method, Uri),
    #[error("cannot read response body")]
    ReadBodyError(#[source] ureq::Error),

    #[cfg(feature = "tokio")]
    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}
