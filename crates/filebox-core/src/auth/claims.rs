//! Best-effort extraction of display fields from a bearer token.
//!
//! The token stays opaque to everything except this module. Whatever is
//! decoded here is for display only and never feeds an authorization
//! decision; the backend alone decides whether a token is valid.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;

/// URL-safe alphabet, accepting claim segments with or without padding.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("token is not a three-part dot-delimited value")]
    Malformed,

    #[error("claims segment is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("claims segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("claims carry no display name")]
    MissingName,
}

#[derive(Debug, Deserialize)]
struct DisplayClaims {
    #[serde(default)]
    preferred_username: Option<String>,
}

/// Decode the middle segment of `header.claims.signature` and return its
/// `preferred_username`.
pub fn display_name(token: &str) -> Result<String, ClaimsError> {
    let mut segments = token.split('.');
    let claims = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(claims), Some(_), None) if !claims.is_empty() => claims,
        _ => return Err(ClaimsError::Malformed),
    };

    let bytes = CLAIMS_ENGINE.decode(claims)?;
    let parsed: DisplayClaims = serde_json::from_slice(&bytes)?;

    parsed
        .preferred_username
        .filter(|name| !name.trim().is_empty())
        .ok_or(ClaimsError::MissingName)
}
