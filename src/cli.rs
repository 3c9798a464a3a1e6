//! Command-line flag surface, parsed with `clap`'s derive API — adopted from `unicity-astrid-astrid`'s
//! own `clap` usage. `main.rs` merges these overrides onto the parsed TOML file: CLI flags win wherever both
//! specify the same setting.

//local shortcuts
use crate::authfeed::AuthFeedConfig;
use crate::client::config::ClientConfig;
use crate::crypto::AuthMethod;
use crate::errors::ConfigError;
use crate::router::RouterConfig;
use crate::server::config::ServerConfig;

//third-party shortcuts
use clap::Parser;

//standard shortcuts
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "fix-proxy", about = "FIX 4.4 order-flow proxy")]
pub struct Cli
{
    /// Path to the TOML config file.
    pub config_path: PathBuf,

    /// Upstream bridge URI, `scheme://host:port`.
    pub upstream_uri: String,

    #[arg(long = "client.listen_address")]
    client_listen_address: Option<String>,
    #[arg(long = "client.comp_id")]
    client_comp_id: Option<String>,
    #[arg(long = "client.logon_timeout")]
    client_logon_timeout: Option<u64>,
    #[arg(long = "client.heartbeat_freq")]
    client_heartbeat_freq: Option<u64>,
    #[arg(long = "client.logon_heartbeat_min")]
    client_logon_heartbeat_min: Option<u64>,
    #[arg(long = "client.logon_heartbeat_max")]
    client_logon_heartbeat_max: Option<u64>,
    #[arg(long = "client.request_timeout")]
    client_request_timeout: Option<u64>,
    #[arg(long = "client.auth_method")]
    client_auth_method: Option<String>,
    #[arg(long = "client.auth_timestamp_tolerance")]
    client_auth_timestamp_tolerance: Option<u64>,
    #[arg(long = "client.decode_buffer_size")]
    client_decode_buffer_size: Option<usize>,

    #[arg(long = "server.username")]
    server_username: Option<String>,
    #[arg(long = "server.password")]
    server_password: Option<String>,
    #[arg(long = "server.sender_comp_id")]
    server_sender_comp_id: Option<String>,
    #[arg(long = "server.target_comp_id")]
    server_target_comp_id: Option<String>,
    #[arg(long = "server.ping_freq")]
    server_ping_freq: Option<u64>,
    #[arg(long = "server.request_timeout")]
    server_request_timeout: Option<u64>,
    #[arg(long = "server.decode_buffer_size")]
    server_decode_buffer_size: Option<usize>,
    #[arg(long = "server.debug")]
    server_debug: bool,

    #[arg(long = "auth.uri")]
    auth_uri: Option<String>,
    #[arg(long = "auth.ping_freq", default_value_t = 30)]
    auth_ping_freq: u64,
    #[arg(long = "auth.decode_buffer_size", default_value_t = 64 * 1024)]
    auth_decode_buffer_size: usize,
    #[arg(long = "auth.encode_buffer_size", default_value_t = 64 * 1024)]
    auth_encode_buffer_size: usize,

    #[arg(long = "test.enable_order_mass_cancel")]
    test_enable_order_mass_cancel: bool,
    #[arg(long = "test.disable_remove_cl_ord_id")]
    test_disable_remove_cl_ord_id: bool,
    #[arg(long = "test.fix_debug")]
    test_fix_debug: bool,
}

impl Cli
{
    /// Apply the `--client.*` overrides onto a base config parsed from defaults.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError>
    {
        let mut config = ClientConfig::default();

        if let Some(value) = &self.client_listen_address
        {
            config.listen_address = parse_socket_addr("client.listen_address", value)?;
        }
        if let Some(value) = &self.client_comp_id { config.comp_id = value.clone(); }
        if let Some(secs) = self.client_logon_timeout { config.logon_timeout = Duration::from_secs(secs); }
        if let Some(secs) = self.client_heartbeat_freq { config.heartbeat_freq = Duration::from_secs(secs); }
        if let Some(secs) = self.client_logon_heartbeat_min
        {
            config.logon_heartbeat_min = Duration::from_secs(secs);
        }
        if let Some(secs) = self.client_logon_heartbeat_max
        {
            config.logon_heartbeat_max = Duration::from_secs(secs);
        }
        if let Some(secs) = self.client_request_timeout { config.request_timeout = Duration::from_secs(secs); }
        if let Some(value) = &self.client_auth_method { config.auth_method = AuthMethod::parse(value)?; }
        if let Some(secs) = self.client_auth_timestamp_tolerance
        {
            config.auth_timestamp_tolerance = Duration::from_secs(secs);
        }
        if let Some(size) = self.client_decode_buffer_size { config.decode_buffer_size = size; }

        Ok(config)
    }

    /// Apply the `--server.*` overrides onto a base config parsed from defaults.
    pub fn server_config(&self) -> ServerConfig
    {
        let mut config = ServerConfig::default();

        if let Some(value) = &self.server_username { config.username = value.clone(); }
        if let Some(value) = &self.server_password { config.password = value.clone(); }
        if let Some(value) = &self.server_sender_comp_id { config.sender_comp_id = value.clone(); }
        if let Some(value) = &self.server_target_comp_id { config.target_comp_id = value.clone(); }
        if let Some(secs) = self.server_ping_freq { config.ping_freq = Duration::from_secs(secs); }
        if let Some(secs) = self.server_request_timeout { config.request_timeout = Duration::from_secs(secs); }
        if let Some(size) = self.server_decode_buffer_size { config.decode_buffer_size = size; }
        config.debug = self.server_debug;

        config
    }

    /// `--test.*` policy flags.
    pub fn router_config(&self) -> RouterConfig
    {
        RouterConfig{
            disable_remove_cl_ord_id: self.test_disable_remove_cl_ord_id,
            enable_order_mass_cancel: self.test_enable_order_mass_cancel,
            fix_debug: self.test_fix_debug,
        }
    }

    /// `--auth.*` flags. `uri` is `None` unless an external auth feed was configured.
    pub fn auth_feed_config(&self) -> AuthFeedConfig
    {
        AuthFeedConfig{
            uri: self.auth_uri.clone(),
            ping_freq: Duration::from_secs(self.auth_ping_freq),
            decode_buffer_size: self.auth_decode_buffer_size,
            encode_buffer_size: self.auth_encode_buffer_size,
        }
    }

    /// Parsed `scheme://host:port` upstream URI (exactly one is required).
    pub fn upstream_address(&self) -> Result<SocketAddr, ConfigError>
    {
        parse_upstream_uri(&self.upstream_uri)
    }
}

fn parse_socket_addr(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError>
{
    value.parse().map_err(|source| ConfigError::BadSocketAddr{ field, value: value.to_string(), source })
}

/// Strip the `scheme://` prefix from an upstream URI and parse the remainder as a socket address. FIX bridges are
/// addressed by host:port; the scheme is accepted but not otherwise interpreted.
fn parse_upstream_uri(value: &str) -> Result<SocketAddr, ConfigError>
{
    let host_port = value.split_once("://").map(|(_, rest)| rest).unwrap_or(value);
    parse_socket_addr("upstream_uri", host_port)
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_a_scheme_prefixed_upstream_uri()
    {
        let addr = parse_upstream_uri("fix://127.0.0.1:9001").expect("should parse");
        assert_eq!(addr.port(), 9001);
    }

    #[test]
    fn client_config_applies_only_the_overrides_that_were_set()
    {
        let cli = Cli::parse_from([
            "fix-proxy",
            "config.toml",
            "fix://127.0.0.1:9001",
            "--client.comp_id",
            "CUSTOM",
        ]);

        let config = cli.client_config().expect("should build");
        assert_eq!(config.comp_id, "CUSTOM");
        assert_eq!(config.listen_address, ClientConfig::default().listen_address);
    }
}

//-------------------------------------------------------------------------------------------------------------------
