//! # Message
//!
//! Module dedicated to the SOAP body fragments sent inside the
//! envelope. The [`BodyBuilder`] trait is the seam used by
//! [`Client::send_mail_with`](crate::Client::send_mail_with), and
//! [`TextMessageBuilder`] is the default plain-text implementation.

use std::str;

use thiserror::Error;
use tracing::debug;

use crate::{AnyBoxedError, Identity};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build message without recipient")]
    MissingRecipientError,
    #[error("cannot read message content as utf-8")]
    ParseContentAsUtf8Error(#[source] str::Utf8Error),
}

/// Builds the SOAP body fragment of a message.
pub trait BodyBuilder {
    /// Builds the body fragment for the given sender, recipients,
    /// subject and content.
    fn build(
        &self,
        sender: &str,
        to: &[String],
        cc: &[String],
        subject: &str,
        content: &[u8],
    ) -> Result<Vec<u8>, AnyBoxedError>;
}

/// Builds a `CreateItem` operation that sends a plain-text message
/// and saves a copy of it in the sent items folder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TextMessageBuilder;

impl BodyBuilder for TextMessageBuilder {
    fn build(
        &self,
        sender: &str,
        to: &[String],
        cc: &[String],
        subject: &str,
        content: &[u8],
    ) -> Result<Vec<u8>, AnyBoxedError> {
        if to.is_empty() {
            return Err(Error::MissingRecipientError.into());
        }

        let content = str::from_utf8(content).map_err(Error::ParseContentAsUtf8Error)?;

        debug!(to = to.len(), cc = cc.len(), "build plain-text create item body");

        let mut body = String::new();
        body.push_str(r#"    <m:CreateItem MessageDisposition="SendAndSaveCopy">"#);
        body.push('\n');
        body.push_str("      <m:SavedItemFolderId>\n");
        body.push_str(r#"        <t:DistinguishedFolderId Id="sentitems" />"#);
        body.push('\n');
        body.push_str("      </m:SavedItemFolderId>\n");
        body.push_str("      <m:Items>\n");
        body.push_str("        <t:Message>\n");
        body.push_str(&format!("          <t:Subject>{}</t:Subject>\n", escape(subject)));
        body.push_str(&format!(
            "          <t:Body BodyType=\"Text\">{}</t:Body>\n",
            escape(content)
        ));
        body.push_str(&mailboxes("ToRecipients", to));

        if !cc.is_empty() {
            body.push_str(&mailboxes("CcRecipients", cc));
        }

        // a domain\account sender is resolved by the server
        if Identity::parse(sender).is_ok_and(|identity| identity.is_email()) {
            body.push_str("          <t:From>\n");
            body.push_str(&mailbox(sender));
            body.push_str("          </t:From>\n");
        }

        body.push_str("        </t:Message>\n");
        body.push_str("      </m:Items>\n");
        body.push_str("    </m:CreateItem>");

        Ok(body.into_bytes())
    }
}

fn mailboxes(tag: &str, addrs: &[String]) -> String {
    let mut xml = format!("          <t:{tag}>\n");
    for addr in addrs {
        xml.push_str(&mailbox(addr));
    }
    xml.push_str(&format!("          </t:{tag}>\n"));
    xml
}

fn mailbox(addr: &str) -> String {
    format!(
        "            <t:Mailbox><t:EmailAddress>{}</t:EmailAddress></t:Mailbox>\n",
        escape(addr)
    )
}

/// Escapes special characters for XML content.
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
