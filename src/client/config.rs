//local shortcuts
use crate::crypto::AuthMethod;
use crate::rate_limiter::RateLimitConfig;

//third-party shortcuts

//standard shortcuts
use std::net::SocketAddr;
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

/// Settings for the downstream-facing listener and every [`super::session::ClientSession`] it spawns
/// (`--client.*`).
#[derive(Debug, Clone)]
pub struct ClientConfig
{
    pub listen_address: SocketAddr,
    /// `sender_comp_id` the proxy presents to downstream clients (their `target_comp_id`).
    pub comp_id: String,
    /// Grace period after TCP accept before a `Logon` must arrive.
    pub logon_timeout: Duration,
    pub heartbeat_freq: Duration,
    pub logon_heartbeat_min: Duration,
    pub logon_heartbeat_max: Duration,
    /// How long the client session waits for the router's `UserResponse` before forcing logout.
    pub request_timeout: Duration,
    pub auth_method: AuthMethod,
    /// Replay window for [`AuthMethod::HmacSha256Timestamped`]; ignored by every other `auth_method`.
    pub auth_timestamp_tolerance: Duration,
    pub decode_buffer_size: usize,
    /// Caps how fast a single downstream session may feed frames into the decode loop before it is treated as a
    /// protocol violation.
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig
{
    fn default() -> Self
    {
        Self{
            listen_address: "0.0.0.0:9878".parse().expect("static address is valid"),
            comp_id: "PROXY".to_string(),
            logon_timeout: Duration::from_secs(10),
            heartbeat_freq: Duration::from_secs(30),
            logon_heartbeat_min: Duration::from_secs(1),
            logon_heartbeat_max: Duration::from_secs(120),
            request_timeout: Duration::from_secs(5),
            auth_method: AuthMethod::Passthrough,
            auth_timestamp_tolerance: Duration::from_secs(30),
            decode_buffer_size: 64 * 1024,
            rate_limit: RateLimitConfig{ period: Duration::from_secs(1), max_count: 100 },
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------
