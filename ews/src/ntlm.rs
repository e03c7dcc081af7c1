//! # NTLM
//!
//! Module dedicated to the NTLMv2 messages exchanged during the HTTP
//! NTLM handshake:
//!
//! 1. the client sends a negotiate message (type 1),
//! 2. the server answers a challenge message (type 2) in the
//!    `WWW-Authenticate` header of a 401 response,
//! 3. the client sends an authenticate message (type 3) with the
//!    actual request.
//!
//! Only connection-oriented NTLMv2 without signing or sealing is
//! supported, which is what HTTP authentication needs.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;

use crate::{Error, Result};

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

/// Size of the NTLMv2 response without its target info, whose length
/// must fit a `u16` field of the authenticate message.
const NTLMV2_RESPONSE_OVERHEAD: usize = 48;

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const NEGOTIATE_OEM: u32 = 0x0000_0002;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSION_SECURITY: u32 = 0x0008_0000;
const NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;
const NEGOTIATE_128: u32 = 0x2000_0000;
const NEGOTIATE_56: u32 = 0x8000_0000;

const NEGOTIATE_FLAGS: u32 = NEGOTIATE_UNICODE
    | NEGOTIATE_OEM
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSION_SECURITY
    | NEGOTIATE_128
    | NEGOTIATE_56;

const AUTHENTICATE_FLAGS: u32 = NEGOTIATE_UNICODE
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSION_SECURITY
    | NEGOTIATE_TARGET_INFO
    | NEGOTIATE_128
    | NEGOTIATE_56;

/// Target info AV pair identifiers.
const MSV_AV_EOL: u16 = 0;
const MSV_AV_TIMESTAMP: u16 = 7;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET: u64 = 11_644_473_600;

/// Authentication scheme prefix of NTLM HTTP headers.
pub const SCHEME: &str = "NTLM";

/// Builds the negotiate message (type 1).
pub fn negotiate() -> Vec<u8> {
    let mut msg = Vec::with_capacity(32);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&1u32.to_le_bytes());
    msg.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());
    // empty domain and workstation
    msg.extend_from_slice(&[0; 16]);
    msg
}

/// Builds the `Authorization` header value carrying the negotiate
/// message.
pub fn negotiate_header() -> String {
    format!("{SCHEME} {}", STANDARD.encode(negotiate()))
}

/// The challenge message (type 2) sent back by the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Challenge {
    pub flags: u32,
    pub server_challenge: [u8; 8],
    pub target_info: Vec<u8>,
}

impl Challenge {
    /// Parses a raw challenge message.
    pub fn parse(msg: &[u8]) -> Result<Self> {
        if msg.len() < 32 {
            return Err(Error::ParseNtlmChallengeError("message too short"));
        }

        if &msg[..8] != SIGNATURE {
            return Err(Error::ParseNtlmChallengeError("invalid signature"));
        }

        if read_u32(msg, 8) != 2 {
            return Err(Error::ParseNtlmChallengeError("not a challenge message"));
        }

        let flags = read_u32(msg, 20);

        let mut server_challenge = [0; 8];
        server_challenge.copy_from_slice(&msg[24..32]);

        // target info fields are absent from old servers messages
        let target_info = if msg.len() >= 48 {
            let len = read_u16(msg, 40) as usize;
            let offset = read_u32(msg, 44) as usize;

            if len > u16::MAX as usize - NTLMV2_RESPONSE_OVERHEAD {
                return Err(Error::ParseNtlmChallengeError("target info too large"));
            }

            msg.get(offset..offset + len)
                .ok_or(Error::ParseNtlmChallengeError("target info out of bounds"))?
                .to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            flags,
            server_challenge,
            target_info,
        })
    }

    /// Finds and decodes the challenge among the given
    /// `WWW-Authenticate` header values.
    pub fn from_headers<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let token = values
            .into_iter()
            .find_map(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case(SCHEME).then_some(token)
            })
            .ok_or(Error::MissingNtlmChallengeError)?;

        let msg = STANDARD
            .decode(token.trim())
            .map_err(Error::DecodeNtlmChallengeError)?;

        Self::parse(&msg)
    }

    /// Returns the server timestamp from the target info, if any.
    fn timestamp(&self) -> Option<u64> {
        let info = &self.target_info;
        let mut pos = 0;

        while pos + 4 <= info.len() {
            let id = read_u16(info, pos);
            let len = read_u16(info, pos + 2) as usize;
            pos += 4;

            if id == MSV_AV_EOL {
                break;
            }

            if id == MSV_AV_TIMESTAMP && len == 8 && pos + 8 <= info.len() {
                let mut ts = [0; 8];
                ts.copy_from_slice(&info[pos..pos + 8]);
                return Some(u64::from_le_bytes(ts));
            }

            pos += len;
        }

        None
    }
}

/// The credentials used to answer a challenge.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials<'a> {
    pub domain: &'a str,
    pub account: &'a str,
    pub password: &'a str,
}

impl Credentials<'_> {
    /// Builds the authenticate message (type 3) answering the given
    /// challenge, with a random client challenge.
    pub fn authenticate(&self, challenge: &Challenge) -> Vec<u8> {
        let timestamp = challenge.timestamp().unwrap_or_else(filetime_now);
        self.authenticate_with(challenge, rand::random(), timestamp)
    }

    /// Builds the `Authorization` header value carrying the
    /// authenticate message.
    pub fn authenticate_header(&self, challenge: &Challenge) -> String {
        format!("{SCHEME} {}", STANDARD.encode(self.authenticate(challenge)))
    }

    fn authenticate_with(
        &self,
        challenge: &Challenge,
        client_challenge: [u8; 8],
        timestamp: u64,
    ) -> Vec<u8> {
        let key = ntowfv2(self.password, self.account, self.domain);

        let lm_response = lmv2_response(&key, &challenge.server_challenge, &client_challenge);
        let nt_response = ntlmv2_response(
            &key,
            &challenge.server_challenge,
            &client_challenge,
            timestamp,
            &challenge.target_info,
        );

        let domain = utf16le(self.domain);
        let account = utf16le(self.account);

        let payloads: [&[u8]; 5] = [&lm_response, &nt_response, &domain, &account, &[]];

        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&3u32.to_le_bytes());

        let mut offset = 64u32;
        for payload in payloads {
            let len = payload.len() as u16;
            msg.extend_from_slice(&len.to_le_bytes());
            msg.extend_from_slice(&len.to_le_bytes());
            msg.extend_from_slice(&offset.to_le_bytes());
            offset += len as u32;
        }

        // no session key exchange
        msg.extend_from_slice(&0u16.to_le_bytes());
        msg.extend_from_slice(&0u16.to_le_bytes());
        msg.extend_from_slice(&offset.to_le_bytes());

        msg.extend_from_slice(&AUTHENTICATE_FLAGS.to_le_bytes());

        for payload in payloads {
            msg.extend_from_slice(payload);
        }

        msg
    }
}

/// Computes the NTLMv2 response key from the password, account and
/// domain.
pub fn ntowfv2(password: &str, account: &str, domain: &str) -> [u8; 16] {
    let nt_hash = Md4::digest(utf16le(password));
    let identity = utf16le(&(account.to_uppercase() + domain));
    hmac_md5(&nt_hash, &[&identity[..]])
}

fn lmv2_response(key: &[u8; 16], server_challenge: &[u8; 8], client_challenge: &[u8; 8]) -> Vec<u8> {
    let mut response = hmac_md5(key, &[&server_challenge[..], &client_challenge[..]]).to_vec();
    response.extend_from_slice(client_challenge);
    response
}

fn ntlmv2_response(
    key: &[u8; 16],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
    timestamp: u64,
    target_info: &[u8],
) -> Vec<u8> {
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.extend_from_slice(&[0x01, 0x01, 0, 0, 0, 0, 0, 0]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0; 4]);

    let mut response = hmac_md5(key, &[&server_challenge[..], &blob[..]]).to_vec();
    response.extend_from_slice(&blob);
    response
}

fn hmac_md5(key: &[u8], parts: &[&[u8]]) -> [u8; 16] {
    let mut mac = Hmac::<Md5>::new_from_slice(key).expect("hmac should accept keys of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0; 16];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn read_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

fn read_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

/// Returns the current time as a Windows FILETIME (100 ns intervals
/// since 1601-01-01).
fn filetime_now() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() + FILETIME_UNIX_OFFSET) * 10_000_000 + u64::from(now.subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_CHALLENGE: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
    const CLIENT_CHALLENGE: [u8; 8] = [0xaa; 8];

    fn target_info() -> Vec<u8> {
        let mut info = Vec::new();
        info.extend_from_slice(&[0x02, 0x00, 0x0c, 0x00]);
        info.extend_from_slice(&utf16le("Domain"));
        info.extend_from_slice(&[0x01, 0x00, 0x0c, 0x00]);
        info.extend_from_slice(&utf16le("Server"));
        info.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        info
    }

    /// Builds a raw challenge message carrying the given target info.
    fn challenge_msg(target_info: &[u8]) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&2u32.to_le_bytes());
        // target name: empty, right after the header
        msg.extend_from_slice(&0u16.to_le_bytes());
        msg.extend_from_slice(&0u16.to_le_bytes());
        msg.extend_from_slice(&48u32.to_le_bytes());
        msg.extend_from_slice(&0xe288_8215u32.to_le_bytes());
        msg.extend_from_slice(&SERVER_CHALLENGE);
        msg.extend_from_slice(&[0; 8]);
        msg.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
        msg.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
        msg.extend_from_slice(&48u32.to_le_bytes());
        msg.extend_from_slice(target_info);
        msg
    }

    #[test]
    fn negotiate_message() {
        let msg = negotiate();
        assert_eq!(msg.len(), 32);
        assert_eq!(&msg[..8], b"NTLMSSP\0");
        assert_eq!(read_u32(&msg, 8), 1);
        assert_eq!(read_u32(&msg, 12), NEGOTIATE_FLAGS);
        assert!(negotiate_header().starts_with("NTLM TlRMTVNTUAAB"));
    }

    #[test]
    fn nt_hash() {
        let hash = Md4::digest(utf16le("Password"));
        assert_eq!(
            hash.as_slice(),
            [
                0xa4, 0xf4, 0x9c, 0x40, 0x65, 0x10, 0xbd, 0xca, 0xb6, 0x82, 0x4e, 0xe7, 0xc3, 0x0f,
                0xd8, 0x52
            ]
        );
    }

    #[test]
    fn response_key() {
        assert_eq!(
            ntowfv2("Password", "User", "Domain"),
            [
                0x0c, 0x86, 0x8a, 0x40, 0x3b, 0xfd, 0x7a, 0x93, 0xa3, 0x00, 0x1e, 0xf2, 0x2e, 0xf0,
                0x2e, 0x3f
            ]
        );
    }

    #[test]
    fn lmv2() {
        let key = ntowfv2("Password", "User", "Domain");
        let response = lmv2_response(&key, &SERVER_CHALLENGE, &CLIENT_CHALLENGE);
        assert_eq!(
            response,
            [
                0x86, 0xc3, 0x50, 0x97, 0xac, 0x9c, 0xec, 0x10, 0x25, 0x54, 0x76, 0x4a, 0x57, 0xcc,
                0xcc, 0x19, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa
            ]
        );
    }

    #[test]
    fn ntlmv2_proof() {
        let key = ntowfv2("Password", "User", "Domain");
        let response = ntlmv2_response(&key, &SERVER_CHALLENGE, &CLIENT_CHALLENGE, 0, &target_info());
        assert_eq!(
            &response[..16],
            [
                0x68, 0xcd, 0x0a, 0xb8, 0x51, 0xe5, 0x1c, 0x96, 0xaa, 0xbc, 0x92, 0x7b, 0xeb, 0xef,
                0x6a, 0x1c
            ]
        );
        assert_eq!(&response[16..18], [0x01, 0x01]);
        assert!(response.ends_with(&[0; 4]));
    }

    #[test]
    fn parse_challenge() {
        let info = target_info();
        let challenge = Challenge::parse(&challenge_msg(&info)).unwrap();

        assert_eq!(challenge.server_challenge, SERVER_CHALLENGE);
        assert_eq!(challenge.flags, 0xe288_8215);
        assert_eq!(challenge.target_info, info);
        assert_eq!(challenge.timestamp(), None);
    }

    #[test]
    fn parse_challenge_timestamp() {
        let mut info = Vec::new();
        info.extend_from_slice(&[0x07, 0x00, 0x08, 0x00]);
        info.extend_from_slice(&42u64.to_le_bytes());
        info.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let challenge = Challenge::parse(&challenge_msg(&info)).unwrap();
        assert_eq!(challenge.timestamp(), Some(42));
    }

    #[test]
    fn parse_invalid_challenges() {
        let valid = challenge_msg(&target_info());

        let mut bad_signature = valid.clone();
        bad_signature[0] = b'X';

        let mut bad_type = valid.clone();
        bad_type[8] = 3;

        let mut bad_info = valid.clone();
        bad_info[44] = 0xff;

        let large_info = challenge_msg(&vec![0; u16::MAX as usize - NTLMV2_RESPONSE_OVERHEAD + 1]);

        for (msg, reason) in [
            (&valid[..16], "message too short"),
            (&bad_signature[..], "invalid signature"),
            (&bad_type[..], "not a challenge message"),
            (&bad_info[..], "target info out of bounds"),
            (&large_info[..], "target info too large"),
        ] {
            match Challenge::parse(msg) {
                Err(Error::ParseNtlmChallengeError(r)) => assert_eq!(r, reason),
                res => panic!("unexpected result: {res:?}"),
            }
        }
    }

    #[test]
    fn largest_target_info_fits_authenticate_message() {
        let info = vec![0; u16::MAX as usize - NTLMV2_RESPONSE_OVERHEAD];
        let challenge = Challenge::parse(&challenge_msg(&info)).unwrap();

        let creds = Credentials {
            domain: "Domain",
            account: "User",
            password: "Password",
        };
        let msg = creds.authenticate_with(&challenge, CLIENT_CHALLENGE, 0);

        // nt response length
        assert_eq!(read_u16(&msg, 20), u16::MAX);
        assert_eq!(msg.len(), read_u32(&msg, 24) as usize + u16::MAX as usize + 12 + 8);
    }

    #[test]
    fn challenge_from_headers() {
        let encoded = STANDARD.encode(challenge_msg(&target_info()));
        let ntlm = format!("NTLM {encoded}");

        let challenge = Challenge::from_headers(["Negotiate", "Basic realm=\"x\"", ntlm.as_str()]).unwrap();
        assert_eq!(challenge.server_challenge, SERVER_CHALLENGE);

        assert!(matches!(
            Challenge::from_headers(["Negotiate"]),
            Err(Error::MissingNtlmChallengeError)
        ));
        assert!(matches!(
            Challenge::from_headers(["NTLM !!!"]),
            Err(Error::DecodeNtlmChallengeError(_))
        ));
    }

    #[test]
    fn authenticate_message() {
        let challenge = Challenge::parse(&challenge_msg(&target_info())).unwrap();
        let creds = Credentials {
            domain: "CONTOSO",
            account: "jdoe",
            password: "",
        };

        let msg = creds.authenticate_with(&challenge, CLIENT_CHALLENGE, 0);

        assert_eq!(&msg[..8], b"NTLMSSP\0");
        assert_eq!(read_u32(&msg, 8), 3);
        assert_eq!(read_u32(&msg, 60), AUTHENTICATE_FLAGS);

        let field = |pos: usize| {
            let len = read_u16(&msg, pos) as usize;
            let offset = read_u32(&msg, pos + 4) as usize;
            &msg[offset..offset + len]
        };

        assert_eq!(field(12).len(), 24);
        assert_eq!(&field(12)[16..], CLIENT_CHALLENGE);
        assert_eq!(field(20).len(), 16 + 32 + target_info().len());
        assert_eq!(field(28), utf16le("CONTOSO"));
        assert_eq!(field(36), utf16le("jdoe"));
        assert!(field(44).is_empty());
        assert_eq!(read_u32(&msg, 56) as usize, msg.len());
    }
}
