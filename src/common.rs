//local shortcuts

//third-party shortcuts

//standard shortcuts

//-------------------------------------------------------------------------------------------------------------------

/// Identifier for a downstream client session, allocated monotonically by [`crate::shared::Shared`] on accept.
pub type SessionId = u64;

//-------------------------------------------------------------------------------------------------------------------

/// Validate that `value` uses only the Base64 web-safe alphabet (`[A-Za-z0-9_-]`).
///
/// An empty string is not a valid request id.
pub fn is_base64_web_safe(value: &str) -> bool
{
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

//-------------------------------------------------------------------------------------------------------------------


//-------------------------------------------------------------------------------------------------------------------
