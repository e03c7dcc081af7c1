//! # SOAP envelope
//!
//! Module dedicated to the SOAP envelope wrapping every EWS request
//! body. The inner fragment is neither parsed nor validated.

/// The fixed envelope header, declaring the SOAP and EWS namespaces
/// and the requested server version.
pub const SOAP_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Header>
    <t:RequestServerVersion Version="Exchange2007_SP1" />
  </soap:Header>
  <soap:Body>
"#;

/// The fixed envelope footer.
pub const SOAP_FOOTER: &str = "\n  </soap:Body>\n</soap:Envelope>";

/// Wraps the given SOAP body fragment into a complete envelope.
pub fn assemble(body: impl AsRef<[u8]>) -> Vec<u8> {
    let body = body.as_ref();
    let mut envelope = Vec::with_capacity(SOAP_HEADER.len() + body.len() + SOAP_FOOTER.len());
    envelope.extend_from_slice(SOAP_HEADER.as_bytes());
    envelope.extend_from_slice(body);
    envelope.extend_from_slice(SOAP_FOOTER.as_bytes());
    envelope
}
