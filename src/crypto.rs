//! Credential validation.
//!
//! The core never hashes or signs anything itself beyond this narrow predicate; the cryptographic primitives
//! themselves stay out of this module's concern. `hmac_sha256` is grounded in the logon nonce/challenge scheme used by
//! real FIX bridges: the gateway signs `raw_data` (a per-logon nonce, typically `RawData`/96) with the shared
//! secret and the client must present the same signature as its password.

//local shortcuts

//third-party shortcuts
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

//standard shortcuts
use core::fmt::Debug;
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

/// Selects how [`validate`] interprets the `password` field of an inbound `Logon`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod
{
    /// `password` must equal `secret` exactly (`validate("x", "x", _) = true`).
    #[default]
    Passthrough,
    /// `password` must equal `base64(HMAC-SHA256(secret, raw_data))`.
    HmacSha256,
    /// Like [`AuthMethod::HmacSha256`], but `raw_data` must be `"<unix_millis>:<nonce>"` and the embedded
    /// timestamp must fall within the configured tolerance of the time [`validate`] runs, so a captured
    /// logon can't be replayed once the window has passed.
    HmacSha256Timestamped,
}

impl AuthMethod
{
    pub fn parse(value: &str) -> Result<Self, crate::errors::ConfigError>
    {
        match value
        {
            "" => Ok(AuthMethod::Passthrough),
            "hmac_sha256" => Ok(AuthMethod::HmacSha256),
            "hmac_sha256_ts" => Ok(AuthMethod::HmacSha256Timestamped),
            other => Err(crate::errors::ConfigError::UnknownAuthMethod{ value: other.to_string() }),
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Validate a presented `password` against `secret` under the given method, using `raw_data` as the signing
/// payload for HMAC methods. `timestamp_tolerance` bounds the age of the embedded timestamp for
/// [`AuthMethod::HmacSha256Timestamped`] and is ignored by the other methods. Never panics on malformed input;
/// a malformed signature or timestamp simply fails to validate.
pub fn validate(method: AuthMethod, password: &str, secret: &str, raw_data: &str, timestamp_tolerance: Duration) -> bool
{
    match method
    {
        AuthMethod::Passthrough => password == secret,
        AuthMethod::HmacSha256 => hmac_matches(password, secret, raw_data),
        AuthMethod::HmacSha256Timestamped =>
        {
            within_tolerance(raw_data, timestamp_tolerance) && hmac_matches(password, secret, raw_data)
        }
    }
}

fn hmac_matches(password: &str, secret: &str, raw_data: &str) -> bool
{
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else { return false; };
    mac.update(raw_data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    expected == password
}

/// `raw_data` must be `"<unix_millis>:<nonce>"`; the embedded timestamp must be within `tolerance` of now in
/// either direction, which also bounds clock skew between the proxy and the client signing the logon.
fn within_tolerance(raw_data: &str, tolerance: Duration) -> bool
{
    let Some((millis_str, _nonce)) = raw_data.split_once(':') else { return false; };
    let Ok(sent_millis) = millis_str.parse::<i64>() else { return false; };

    let now_millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    now_millis.saturating_sub(sent_millis).unsigned_abs() <= tolerance.as_millis() as u64
}

//-------------------------------------------------------------------------------------------------------------------
