//! # Transport
//!
//! Module dedicated to the HTTP transports. The [`Transport`] trait
//! is the seam between the dispatcher and the network: the
//! [`HttpTransport`] talks to a real server, tests plug their own.

use std::fmt;

use http::ureq::{
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderValue, Request, Response, StatusCode,
    },
    Body,
};
use tracing::{debug, info};

use crate::{
    ntlm::{self, Challenge, Credentials},
    EwsConfig, Error, Identity, Result,
};

/// Sends a prepared request for the given identity.
pub trait Transport {
    /// The response type returned to callers.
    type Response;

    /// Sends the request, authenticating with the scheme the identity
    /// leads to: bearer only for emails, NTLM for `domain\account`.
    ///
    /// The request already carries its `Authorization: Bearer`
    /// header. HTTP error statuses are not errors.
    fn send(&self, identity: &Identity, request: Request<Vec<u8>>) -> Result<Self::Response>;
}

/// The HTTP transport, based on a ureq agent.
#[derive(Clone)]
pub struct HttpTransport {
    client: http::Client,
    ntlm_password: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &EwsConfig) -> Self {
        Self {
            client: http::Client::with_config(&config.http_client_config()),
            ntlm_password: config.ntlm_password.clone().unwrap_or_default(),
        }
    }

    fn send_bearer(&self, request: Request<Vec<u8>>) -> Result<Response<Body>> {
        let uri = request.uri().clone();
        self.client
            .execute(request)
            .map_err(|err| Error::SendRequestError(err, uri))
    }

    /// Performs the NTLM handshake then sends the request.
    ///
    /// The handshake starts with a bodyless GET probe. If the server
    /// does not answer the probe with a 401 challenge, the probe
    /// response is returned as-is. Otherwise the request is sent with
    /// its `Authorization` header replaced by the NTLM authenticate
    /// message.
    fn send_ntlm(
        &self,
        domain: &str,
        account: &str,
        mut request: Request<Vec<u8>>,
    ) -> Result<Response<Body>> {
        let uri = request.uri().clone();

        let probe = Request::get(uri.clone())
            .header(AUTHORIZATION, ntlm::negotiate_header())
            .body(())
            .map_err(|err| Error::BuildRequestError(err, uri.to_string()))?;

        let mut res = self
            .client
            .execute(probe)
            .map_err(|err| Error::SendRequestError(err, uri.clone()))?;

        if res.status() != StatusCode::UNAUTHORIZED {
            debug!(status = %res.status(), "ntlm probe not challenged, returning its response");
            return Ok(res);
        }

        // the handshake must go on with the same connection
        http::read_body(&mut res).map_err(Error::ReadNtlmChallengeBodyError)?;

        let challenge = Challenge::from_headers(
            res.headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )?;

        debug!(flags = challenge.flags, "received ntlm challenge");

        let creds = Credentials {
            domain,
            account,
            password: &self.ntlm_password,
        };

        let auth = HeaderValue::from_str(&creds.authenticate_header(&challenge))
            .map_err(|err| Error::BuildRequestError(err.into(), uri.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        self.client
            .execute(request)
            .map_err(|err| Error::SendRequestError(err, uri))
    }
}

impl Transport for HttpTransport {
    type Response = Response<Body>;

    fn send(&self, identity: &Identity, request: Request<Vec<u8>>) -> Result<Self::Response> {
        info!(uri = %request.uri(), scheme = identity.scheme(), "send ews request");

        let res = match identity {
            Identity::Email { .. } => self.send_bearer(request),
            Identity::DomainAccount { domain, account } => {
                self.send_ntlm(domain, account, request)
            }
        }?;

        debug!(status = %res.status(), "received ews response");
        Ok(res)
    }
}
