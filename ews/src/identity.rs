//! # Identity
//!
//! Module dedicated to the identity used to authenticate against the
//! EWS server. An identity is either an email address, which leads
//! to bearer authentication, or a `domain\account` pair, which leads
//! to NTLM authentication.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// The identity of the account sending requests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Identity {
    /// The email variant, authenticated with a bearer token only.
    Email { address: String },

    /// The `domain\account` variant, authenticated with NTLM.
    DomainAccount { domain: String, account: String },
}

impl Identity {
    /// Parses the given identity string.
    ///
    /// The email shape is checked first, so an email address is never
    /// split. Otherwise the string is split on `\`: the first segment
    /// is the domain, the second one the account. Extra segments are
    /// ignored. The domain must not be empty, the account may be.
    pub fn parse(identity: impl AsRef<str>) -> Result<Self> {
        let identity = identity.as_ref();

        if identity.is_empty() {
            return Err(Error::EmptyIdentityError);
        }

        if EMAIL.is_match(identity) {
            return Ok(Self::Email {
                address: identity.to_owned(),
            });
        }

        let mut segments = identity.split('\\');

        match (segments.next(), segments.next()) {
            (Some(domain), Some(account)) if !domain.is_empty() => {
                Ok(Self::DomainAccount {
                    domain: domain.to_owned(),
                    account: account.to_owned(),
                })
            }
            _ => Err(Error::InvalidIdentityFormatError(identity.to_owned())),
        }
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Self::Email { .. })
    }

    /// Returns the email address, if any.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Email { address } => Some(address),
            Self::DomainAccount { .. } => None,
        }
    }

    /// Returns a short name of the authentication scheme the identity
    /// leads to, used in logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Email { .. } => "bearer",
            Self::DomainAccount { .. } => "ntlm",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email { address } => write!(f, "{address}"),
            Self::DomainAccount { domain, account } => write!(f, "{domain}\\{account}"),
        }
    }
}
