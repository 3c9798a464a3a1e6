//! Adapter interface for the optional external auth feed (`--auth.uri`): a JSON/WebSocket source that
//! announces dynamic user add/remove. The transport for that source is out of scope here; this
//! module is only the narrow interface the scheduler polls on each tick, matching the "core exposes `insert_user`
//! / `remove_user` and does not care about the transport" contract.

//local shortcuts
use crate::config::UserRecord;
use crate::shared::Shared;

//third-party shortcuts

//standard shortcuts
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

/// A single user-table mutation announced by the auth feed.
#[derive(Debug, Clone)]
pub enum AuthFeedEvent
{
    InsertUser(UserRecord),
    RemoveUser(String),
}

impl AuthFeedEvent
{
    pub fn apply(self, shared: &mut Shared)
    {
        match self
        {
            AuthFeedEvent::InsertUser(record) => shared.insert_user(record),
            AuthFeedEvent::RemoveUser(username) => shared.remove_user(&username),
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// Something the scheduler can poll once per tick for freshly arrived [`AuthFeedEvent`]s. No implementation ships
/// with this crate; a websocket/JSON client that announces user changes would implement this trait and be handed
/// to [`crate::scheduler::run`].
pub trait AuthFeedSource
{
    /// Drain whatever events have arrived since the last poll. Must not block.
    fn poll(&mut self) -> Vec<AuthFeedEvent>;
}

/// An [`AuthFeedSource`] that never produces events, used when `--auth.uri` is not configured.
#[derive(Debug, Default)]
pub struct NoAuthFeed;

impl AuthFeedSource for NoAuthFeed
{
    fn poll(&mut self) -> Vec<AuthFeedEvent> { Vec::new() }
}

//-------------------------------------------------------------------------------------------------------------------

/// Settings for the optional auth feed connection (`--auth.*`). Only meaningful when `uri` is set.
#[derive(Debug, Clone, Default)]
pub struct AuthFeedConfig
{
    pub uri: Option<String>,
    pub ping_freq: Duration,
    pub decode_buffer_size: usize,
    pub encode_buffer_size: usize,
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::{SymbolAllowList, UserTable};

    #[test]
    fn insert_and_remove_round_trip_through_shared()
    {
        let mut shared = Shared::new(UserTable::default(), SymbolAllowList::allow_all(), 1);

        AuthFeedEvent::InsertUser(UserRecord{
            component: "ALICE_CO".to_string(),
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            strategy_id: 42,
            accounts: Vec::new(),
        })
        .apply(&mut shared);
        assert!(shared.user("alice").is_some());

        AuthFeedEvent::RemoveUser("alice".to_string()).apply(&mut shared);
        assert!(shared.user("alice").is_none());
    }

    #[test]
    fn no_auth_feed_never_produces_events()
    {
        let mut feed = NoAuthFeed;
        assert!(feed.poll().is_empty());
    }
}

//-------------------------------------------------------------------------------------------------------------------
