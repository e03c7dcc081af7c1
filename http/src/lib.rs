#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
//! High-level API around [`ureq`].
//!
//! The [`Client`] wraps a ureq agent configured from a
//! [`ClientConfig`]: global timeout, redirect policy and TLS
//! certificate verification. HTTP error statuses are never turned
//! into errors, they are returned as regular responses so that
//! callers can inspect them.
//!
//! Requests can be executed either on the current thread with
//! [`Client::execute`], or on a blocking task of the selected async
//! runtime with [`Client::send`].

mod error;

use std::time::Duration;

use tracing::{debug, trace};
pub use ureq;
use ureq::{
    config::Config,
    http::{Request, Response},
    tls::{RootCerts, TlsConfig, TlsProvider},
    Agent, AsSendBody, Body,
};

#[doc(inline)]
pub use crate::error::{Error, Result};

#[cfg(all(feature = "tokio", feature = "async-std"))]
compile_error!("Features `tokio` and `async-std` cannot be enabled at the same time.");

#[cfg(any(
    all(feature = "rustls", feature = "native-tls"),
    not(any(feature = "rustls", feature = "native-tls"))
))]
compile_error!("Either feature `rustls` or `native-tls` must be enabled for this crate.");

/// The default global timeout of a request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The HTTP client configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// The global timeout of a request, from connection to the end
    /// of the response headers.
    pub timeout: Duration,

    /// Accept any server certificate.
    ///
    /// Only meant for servers using self-signed certificates.
    pub insecure_skip_verify: bool,

    /// Follow redirections.
    ///
    /// When disabled, the first 3xx response is returned as-is.
    pub follow_redirects: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            insecure_skip_verify: false,
            follow_redirects: true,
        }
    }
}

/// The HTTP client structure.
///
/// This structure wraps a HTTP agent, which is used by the
/// [`Client::execute`] and [`Client::send`] functions.
#[derive(Clone, Debug)]
pub struct Client {
    /// The HTTP agent used to perform calls.
    agent: Agent,
}

impl Client {
    /// Creates a new HTTP client with sane defaults.
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a new HTTP client from the given configuration.
    pub fn with_config(config: &ClientConfig) -> Self {
        debug!(
            timeout = ?config.timeout,
            insecure = config.insecure_skip_verify,
            follow_redirects = config.follow_redirects,
            "build http agent"
        );

        let tls = TlsConfig::builder()
            .root_certs(RootCerts::PlatformVerifier)
            .disable_verification(config.insecure_skip_verify)
            .provider(
                #[cfg(feature = "native-tls")]
                TlsProvider::NativeTls,
                #[cfg(feature = "rustls")]
                TlsProvider::Rustls,
            );

        let max_redirects = if config.follow_redirects { 10 } else { 0 };

        let config = Config::builder()
            .tls_config(tls.build())
            .timeout_global(Some(config.timeout))
            .max_redirects(max_redirects)
            .http_status_as_error(false)
            .build();

        let agent = config.new_agent();

        Self { agent }
    }

    /// Executes the given request on the current thread.
    pub fn execute(&self, request: Request<impl AsSendBody>) -> Result<Response<Body>> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(%method, %uri, "execute http request");

        let response = self
            .agent
            .run(request)
            .map_err(|err| Error::SendRequestError(err, method, uri))?;

        trace!(status = %response.status(), "received http response");
        Ok(response)
    }

    /// Sends the given request from a blocking task of the async
    /// runtime.
    #[cfg(any(feature = "tokio", feature = "async-std"))]
    pub async fn send<B>(&self, request: Request<B>) -> Result<Response<Body>>
    where
        B: AsSendBody + Send + 'static,
    {
        let client = self.clone();
        spawn_blocking(move || client.execute(request)).await?
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the whole body of the given response, leaving the
/// connection ready to be reused by the agent.
pub fn read_body(response: &mut Response<Body>) -> Result<Vec<u8>> {
    response
        .body_mut()
        .read_to_vec()
        .map_err(Error::ReadBodyError)
}

/// Spawns a blocking task using [`async_std`].
#[cfg(feature = "async-std")]
pub async fn spawn_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(async_std::task::spawn_blocking(f).await)
}

/// Spawns a blocking task using [`tokio`].
#[cfg(feature = "tokio")]
pub async fn spawn_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}
