//local shortcuts

//third-party shortcuts

//standard shortcuts
use core::fmt::Debug;

//-------------------------------------------------------------------------------------------------------------------

/// Symbolic protocol-level error kinds.
///
/// Wire text for `Reject`/`Logout`/`BusinessMessageReject` free-text fields is produced by [`ErrorKind::as_str`]
/// rather than by stringifying the variant name, so the wire vocabulary stays decoupled from however this enum
/// happens to be named or ordered internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{
    InvalidUsername,
    InvalidComponent,
    InvalidPassword,
    AlreadyLoggedOn,
    InvalidTargetCompId,
    InvalidEncryptMethod,
    InvalidHeartBtInt,
    ResetSeqNumRequired,
    NoLogon,
    InvalidReqId,
    InvalidOrigClOrdId,
    UnsupportedPartyIds,
    SymbolNotAllowed,
    UnknownOrder,
    NotReady,
    UserResponseTimeout,
    MissingHeartbeat,
    Unsupported,
    Goodbye,
    RateLimited,
}

impl ErrorKind
{
    /// The text placed on the wire for this error kind.
    pub const fn as_str(self) -> &'static str
    {
        match self
        {
            ErrorKind::InvalidUsername      => "INVALID_USERNAME",
            ErrorKind::InvalidComponent      => "INVALID_COMPONENT",
            ErrorKind::InvalidPassword       => "INVALID_PASSWORD",
            ErrorKind::AlreadyLoggedOn       => "ALREADY_LOGGED_ON",
            ErrorKind::InvalidTargetCompId   => "INVALID_TARGET_COMP_ID",
            ErrorKind::InvalidEncryptMethod  => "INVALID_ENCRYPT_METHOD",
            ErrorKind::InvalidHeartBtInt     => "INVALID_HEARTBT_INT",
            ErrorKind::ResetSeqNumRequired   => "RESET_SEQ_NUM_REQUIRED",
            ErrorKind::NoLogon               => "NO_LOGON",
            ErrorKind::InvalidReqId          => "INVALID_REQ_ID",
            ErrorKind::InvalidOrigClOrdId    => "INVALID_ORIG_CL_ORD_ID",
            ErrorKind::UnsupportedPartyIds   => "UNSUPPORTED_PARTY_IDS",
            ErrorKind::SymbolNotAllowed      => "SYMBOL_NOT_ALLOWED",
            ErrorKind::UnknownOrder          => "UNKNOWN_ORDER",
            ErrorKind::NotReady              => "NOT_READY",
            ErrorKind::UserResponseTimeout   => "USER_RESPONSE_TIMEOUT",
            ErrorKind::MissingHeartbeat      => "MISSING_HEARTBEAT",
            ErrorKind::Unsupported           => "UNSUPPORTED",
            ErrorKind::Goodbye               => "GOODBYE",
            ErrorKind::RateLimited           => "RATE_LIMITED",
        }
    }
}

impl std::fmt::Display for ErrorKind
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.as_str()) }
}

//-------------------------------------------------------------------------------------------------------------------

/// Errors emitted by [`ClientSession`](crate::ClientSession) and [`ServerSession`](crate::ServerSession) while
/// handling inbound traffic. Most variants map 1:1 onto an [`ErrorKind`] that gets written to the wire.
#[derive(Debug, Clone, Copy)]
pub enum ProtocolError
{
    /// The peer sent something invalid for the session's current state; carries the wire error kind.
    Rejected(ErrorKind),
    /// A forward was attempted while the server session was not `Ready`.
    NotReady,
    /// The session is a zombie and must not be driven further.
    Zombie,
}

impl std::fmt::Display for ProtocolError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        let _ = write!(f, "ProtocolError::");
        match self
        {
            ProtocolError::Rejected(kind) => write!(f, "Rejected({kind})"),
            ProtocolError::NotReady       => write!(f, "NotReady"),
            ProtocolError::Zombie         => write!(f, "Zombie"),
        }
    }
}
impl std::error::Error for ProtocolError {}

impl From<ErrorKind> for ProtocolError
{
    fn from(kind: ErrorKind) -> Self { ProtocolError::Rejected(kind) }
}

//-------------------------------------------------------------------------------------------------------------------

/// Fatal configuration errors. These are reported to the operator with a full cause chain and terminate the
/// process; they never occur once the proxy has started serving connections.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError
{
    #[error("failed to read config file {path}: {source}")]
    Io
    {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}: {source}")]
    Toml
    {
        path: std::path::PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid regex pattern {pattern:?} in [symbols]: {source}")]
    BadSymbolPattern
    {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("exactly one upstream URI is required, got {count}")]
    UpstreamUriCount { count: usize },

    #[error("invalid socket address {value:?} for {field}: {source}")]
    BadSocketAddr
    {
        field: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("unknown auth method {value:?}, expected one of: (unset), hmac_sha256, hmac_sha256_ts")]
    UnknownAuthMethod { value: String },
}

//-------------------------------------------------------------------------------------------------------------------
