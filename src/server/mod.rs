//local shortcuts

//third-party shortcuts

//standard shortcuts

//-------------------------------------------------------------------------------------------------------------------

pub mod config;
pub mod session;

pub use config::ServerConfig;
pub use session::{ServerSession, ServerSessionEvent, ServerSessionOutcome, ServerSessionState};

//-------------------------------------------------------------------------------------------------------------------
