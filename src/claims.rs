//! Display-only decoding of session token claims.
//!
//! Nothing here verifies a signature. The decoded mapping is good enough for
//! picking a display name and nothing else; trust decisions belong to the
//! provider.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// Claim mapping decoded from a token payload.
pub type Claims = Map<String, Value>;

/// Decode the payload segment of `token` without verifying it.
///
/// Splits on `.`, base64url-decodes the second segment, and parses it as a
/// JSON object. Returns `None` for any malformed input — missing segment,
/// bad encoding, or a payload that is not an object.
pub fn decode(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    // Tokens arrive both padded and unpadded in the wild.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Best-effort display name from decoded claims: `name`, then `given_name`,
/// then the pool's `cognito:username`.
pub fn display_name(claims: &Claims) -> Option<&str> {
    first_string(claims, &["name", "given_name", "cognito:username"])
}

/// First claim among `keys` that holds a non-empty string.
pub(crate) fn first_string<'a>(claims: &'a Claims, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| claims.get(*key).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
}
