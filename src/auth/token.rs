// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 SiteWarden

//! Raw signed-token handling: segment splitting and base64url decoding.
//!
//! A signed token is three base64url segments joined by dots:
//! `header.payload.signature`. This module splits and decodes; it performs
//! no cryptographic or claim validation.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;

use super::error::AuthError;

/// Decoded token header.
///
/// Only the fields the verifier inspects are modeled; unknown header fields
/// are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm name, e.g. `RS256`
    pub alg: String,
    /// Key id selecting the verification key
    #[serde(default)]
    pub kid: Option<String>,
}

/// A token split into its three raw segments.
///
/// `signing_input` is the exact byte string the signature covers
/// (`header.payload`, still base64url-encoded).
#[derive(Debug)]
pub struct RawToken<'a> {
    pub header_b64: &'a str,
    pub payload_b64: &'a str,
    pub signature_b64: &'a str,
}

impl<'a> RawToken<'a> {
    /// Split a compact token into exactly three segments.
    pub fn split(token: &'a str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                    (h, p, s)
                }
                _ => return Err(AuthError::MalformedToken),
            };
        Ok(Self { header_b64, payload_b64, signature_b64 })
    }

    /// The bytes the signature was computed over.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_b64, self.payload_b64)
    }

    /// Decode and parse the header segment.
    pub fn header(&self) -> Result<TokenHeader, AuthError> {
        let bytes = decode_segment(self.header_b64)?;
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
    }

    /// Decode the payload segment to raw JSON bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, AuthError> {
        decode_segment(self.payload_b64)
    }

    /// Decode the signature segment to raw bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, AuthError> {
        decode_segment(self.signature_b64)
    }
}

/// Decode one base64url (unpadded) segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn encode(s: &str) -> String {
        URL_SAFE_NO_PAD.encode(s.as_bytes())
    }

    #[test]
    fn splits_three_segments() {
        let token = format!("{}.{}.{}", encode("a"), encode("b"), encode("c"));
        let raw = RawToken::split(&token).unwrap();
        assert_eq!(raw.signing_input(), format!("{}.{}", encode("a"), encode("b")));
    }

    #[test]
    fn rejects_two_segments() {
        let token = format!("{}.{}", encode("a"), encode("b"));
        assert_eq!(RawToken::split(&token).unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn rejects_four_segments() {
        let token = "a.b.c.d";
        assert_eq!(RawToken::split(token).unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn rejects_empty_segment() {
        assert_eq!(RawToken::split("a..c").unwrap_err(), AuthError::MalformedToken);
        assert_eq!(RawToken::split(".b.c").unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn parses_header() {
        let header = encode(r#"{"alg":"RS256","typ":"JWT","kid":"key-1"}"#);
        let token = format!("{header}.{}.{}", encode("{}"), encode("sig"));
        let raw = RawToken::split(&token).unwrap();
        let parsed = raw.header().unwrap();
        assert_eq!(parsed.alg, "RS256");
        assert_eq!(parsed.kid.as_deref(), Some("key-1"));
    }

    #[test]
    fn header_without_kid_parses_as_none() {
        let header = encode(r#"{"alg":"RS256"}"#);
        let token = format!("{header}.{}.{}", encode("{}"), encode("sig"));
        let raw = RawToken::split(&token).unwrap();
        assert!(raw.header().unwrap().kid.is_none());
    }

    #[test]
    fn undecodable_segment_is_malformed() {
        let token = format!("!!!.{}.{}", encode("{}"), encode("sig"));
        let raw = RawToken::split(&token).unwrap();
        assert_eq!(raw.header().unwrap_err(), AuthError::MalformedToken);
    }
}
