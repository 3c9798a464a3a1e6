//local shortcuts

//third-party shortcuts

//standard shortcuts
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

/// Settings for the single upstream [`super::session::ServerSession`] (`--server.*`).
#[derive(Debug, Clone)]
pub struct ServerConfig
{
    pub username: String,
    pub password: String,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    pub ping_freq: Duration,
    pub request_timeout: Duration,
    pub decode_buffer_size: usize,
    pub debug: bool,
}

impl Default for ServerConfig
{
    fn default() -> Self
    {
        Self{
            username: String::new(),
            password: String::new(),
            sender_comp_id: "PROXY".to_string(),
            target_comp_id: "BRIDGE".to_string(),
            ping_freq: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
            decode_buffer_size: 64 * 1024,
            debug: false,
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------
