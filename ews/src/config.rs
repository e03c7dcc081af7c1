//! # Configuration
//!
//! Module dedicated to the EWS client configuration.

use std::{fmt, time::Duration};

/// The EWS client configuration.
///
/// Values are not validated when the configuration is built, but on
/// every request.
#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case", default)
)]
pub struct EwsConfig {
    /// The identity of the sender.
    ///
    /// Either an email address (bearer authentication) or a
    /// `domain\account` pair (NTLM authentication).
    pub identity: String,

    /// The access token sent as `Authorization: Bearer` header.
    pub access_token: String,

    /// The EWS endpoint URL, for example
    /// `https://mail.example.com/EWS/Exchange.asmx`.
    pub endpoint: String,

    /// The password used by the NTLM handshake.
    ///
    /// Defaults to an empty password.
    pub ntlm_password: Option<String>,

    /// Accept any server certificate.
    pub insecure_skip_verify: bool,

    /// Follow redirections instead of returning the first 3xx
    /// response.
    pub follow_redirects: bool,

    /// The global timeout of a request.
    pub timeout: Duration,
}

impl EwsConfig {
    pub fn new(
        identity: impl ToString,
        access_token: impl ToString,
        endpoint: impl ToString,
    ) -> Self {
        Self {
            identity: identity.to_string(),
            access_token: access_token.to_string(),
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn with_ntlm_password(mut self, password: impl ToString) -> Self {
        self.ntlm_password = Some(password.to_string());
        self
    }

    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the configuration of the underlying HTTP client.
    pub fn http_client_config(&self) -> http::ClientConfig {
        http::ClientConfig {
            timeout: self.timeout,
            insecure_skip_verify: self.insecure_skip_verify,
            follow_redirects: self.follow_redirects,
        }
    }
}

impl Default for EwsConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            access_token: String::new(),
            endpoint: String::new(),
            ntlm_password: None,
            insecure_skip_verify: false,
            follow_redirects: false,
            timeout: http::DEFAULT_TIMEOUT,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for EwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EwsConfig")
            .field("identity", &self.identity)
            .field("access_token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("ntlm_password", &self.ntlm_password.as_ref().map(|_| "<redacted>"))
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("follow_redirects", &self.follow_redirects)
            .field("timeout", &self.timeout)
            .finish()
    }
}
