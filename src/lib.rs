//! Core protocol logic for a FIX 4.4 order-flow proxy: a downstream multiplexer ([`client`]), a single upstream
//! bridge session ([`server`]), and the hub tying them together ([`router`]). Transport, CLI, and process wiring
//! live behind the `transport` feature so the protocol core stays usable as a plain library with no I/O pulled in.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//module tree
pub mod codec;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod ids;
pub mod message;
pub mod rate_limiter;
pub mod shared;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

#[cfg(all(feature = "client", feature = "server"))]
pub mod router;

#[cfg(feature = "transport")]
pub mod authfeed;
#[cfg(feature = "transport")]
pub mod cli;
#[cfg(feature = "transport")]
pub mod scheduler;
#[cfg(feature = "transport")]
pub mod transport;

//API exports
pub use codec::{decode, encode, DecodeError};
pub use common::SessionId;
pub use config::{ConfigFile, SymbolAllowList, UserRecord, UserTable};
pub use crypto::AuthMethod;
pub use errors::{ConfigError, ErrorKind, ProtocolError};
pub use ids::{IdTranslationTable, RequestIdGenerator, RequestIdKind, RouteEntry};
pub use message::{FixMessage, Header, MsgType, OrdStatus};
pub use rate_limiter::RateLimitConfig;
pub use shared::Shared;

#[cfg(feature = "client")]
pub use client::{ClientConfig, ClientManager, ClientSession, ClientSessionEvent, ClientSessionOutcome};

#[cfg(feature = "server")]
pub use server::{ServerConfig, ServerSession, ServerSessionEvent, ServerSessionOutcome};

#[cfg(all(feature = "client", feature = "server"))]
pub use router::{Router, RouterAction, RouterConfig};

mod common;
