//! Encoding of a [`CrumbTrail`] as a session attribute value.
//!
//! The stored form is a JSON array of canonical `realm/resource` strings.

use crumbtrail_core::CrumbTrail;
use thiserror::Error;

/// Session key holding the encoded trail.
pub const TRAIL_KEY: &str = "breadcrumbs_list";

/// The stored value could not be read back as a trail.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("stored trail is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("stored trail is not a list of realm/resource strings: {0}")]
    Format(#[from] serde_json::Error),
}

pub fn encode(trail: &CrumbTrail) -> Vec<u8> {
    // A list of strings always serializes.
    serde_json::to_vec(trail).unwrap_or_else(|_| b"[]".to_vec())
}

/// Decode a stored trail. Duplicate entries are collapsed, keeping the
/// most recent.
pub fn decode(bytes: &[u8]) -> Result<CrumbTrail, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(serde_json::from_str(text)?)
}
