//local shortcuts

//third-party shortcuts

//standard shortcuts

//-------------------------------------------------------------------------------------------------------------------

pub mod config;
pub mod manager;
pub mod session;

pub use config::ClientConfig;
pub use manager::ClientManager;
pub use session::{ClientSession, ClientSessionEvent, ClientSessionOutcome, ClientSessionState};

//-------------------------------------------------------------------------------------------------------------------
