//! # Client
//!
//! Module dedicated to the EWS client, which validates the
//! configuration, wraps bodies into SOAP envelopes and hands the
//! resulting requests over to a [`Transport`].

use http::ureq::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Request,
};
use tracing::{debug, info};

use crate::{
    envelope,
    message::{BodyBuilder, TextMessageBuilder},
    EwsConfig, Error, HttpTransport, Identity, Result, Transport,
};

/// The EWS client.
///
/// The client owns its configuration and never mutates it, so it can
/// be shared between threads as long as its transport can.
#[derive(Clone, Debug)]
pub struct Client<T = HttpTransport> {
    config: EwsConfig,
    transport: T,
}

impl Client<HttpTransport> {
    /// Creates a new client sending requests over HTTP.
    pub fn new(config: EwsConfig) -> Self {
        let transport = HttpTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a new client sending requests with the given
    /// transport.
    pub fn with_transport(config: EwsConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &EwsConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a plain-text email from the configured identity to the
    /// configured endpoint.
    pub fn send_mail(
        &self,
        to: &[String],
        cc: &[String],
        subject: &str,
        content: &str,
    ) -> Result<T::Response> {
        self.send_mail_with(&TextMessageBuilder, to, cc, subject, content)
    }

    /// Same as [`Client::send_mail`], using a custom body builder.
    pub fn send_mail_with(
        &self,
        builder: &impl BodyBuilder,
        to: &[String],
        cc: &[String],
        subject: &str,
        content: &str,
    ) -> Result<T::Response> {
        let body = builder
            .build(&self.config.identity, to, cc, subject, content.as_bytes())
            .map_err(Error::BuildBodyError)?;

        self.send(&self.config.endpoint, &self.config.identity, body)
    }

    /// Wraps the given SOAP body into an envelope then sends it to
    /// the given endpoint.
    ///
    /// The identity, the endpoint and the configured access token are
    /// checked in this order, before any request is built. The
    /// response is returned whatever its status.
    pub fn send(&self, endpoint: &str, identity: &str, body: impl AsRef<[u8]>) -> Result<T::Response> {
        if identity.is_empty() {
            return Err(Error::EmptyIdentityError);
        }

        if endpoint.is_empty() {
            return Err(Error::EmptyEndpointError);
        }

        if self.config.access_token.is_empty() {
            return Err(Error::MissingAccessTokenError);
        }

        let identity = Identity::parse(identity)?;
        debug!(%identity, scheme = identity.scheme(), "parsed identity");

        let envelope = envelope::assemble(body);

        // NOTE: the bearer token is also sent along NTLM requests
        let request = Request::post(endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .header(AUTHORIZATION, format!("Bearer {}", self.config.access_token))
            .body(envelope)
            .map_err(|err| Error::BuildRequestError(err, endpoint.to_owned()))?;

        info!(endpoint, len = request.body().len(), "send soap envelope");

        self.transport.send(&identity, request)
    }
}

#[cfg(any(feature = "tokio", feature = "async-std"))]
impl<T> Client<T>
where
    T: Transport + Clone + Send + 'static,
    T::Response: Send + 'static,
{
    /// Same as [`Client::send_mail`], running from a blocking task of
    /// the async runtime.
    pub async fn send_mail_async(
        &self,
        to: Vec<String>,
        cc: Vec<String>,
        subject: String,
        content: String,
    ) -> Result<T::Response> {
        let client = self.clone();
        http::spawn_blocking(move || client.send_mail(&to, &cc, &subject, &content)).await?
    }
}
