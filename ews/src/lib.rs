#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
//! Rust library to send emails through Exchange Web Services.
//!
//! The [`Client`] wraps SOAP bodies into envelopes and POSTs them to
//! an EWS endpoint. The way it authenticates depends on the shape of
//! the configured [`Identity`]:
//!
//! - an email address leads to bearer authentication, using the
//!   configured access token,
//! - a `domain\account` pair leads to NTLM authentication, see the
//!   [`ntlm`] module.
//!
//! Responses are returned as-is, whatever their status: the library
//! does not parse them.
//!
//! ```rust,no_run
//! use ews::{Client, EwsConfig};
//!
//! let config = EwsConfig::new(
//!     "alice@example.com",
//!     "access-token",
//!     "https://mail.example.com/EWS/Exchange.asmx",
//! );
//!
//! let client = Client::new(config);
//! let res = client
//!     .send_mail(&["bob@example.com".into()], &[], "Hello", "Hello, world!")
//!     .unwrap();
//!
//! println!("{}", res.status());
//! ```

pub mod client;
pub mod config;
pub mod envelope;
mod error;
pub mod identity;
pub mod message;
pub mod ntlm;
pub mod transport;

pub use http;
#[doc(inline)]
pub use crate::{
    client::Client,
    config::EwsConfig,
    error::{AnyBoxedError, Error, Result},
    identity::Identity,
    message::{BodyBuilder, TextMessageBuilder},
    transport::{HttpTransport, Transport},
};
