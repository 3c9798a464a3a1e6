//! Shared state: the user table, symbol allow-list, session↔user binding, pending-removal set, and request-id
//! generator. Exclusively owned by the [`crate::router::Router`]; sessions hold only a non-owning reference.

//local shortcuts
use crate::common::SessionId;
use crate::config::{SymbolAllowList, UserRecord, UserTable};
use crate::ids::RequestIdGenerator;

//third-party shortcuts

//standard shortcuts
use std::collections::{HashMap, HashSet};

//-------------------------------------------------------------------------------------------------------------------

/// State that outlives any individual session and is touched from more than one component: client sessions
/// (login/logout bookkeeping) and the auth-feed adapter (user add/remove). Safe without locks because the whole
/// proxy runs on one logical thread.
#[derive(Debug)]
pub struct Shared
{
    users: UserTable,
    symbols: SymbolAllowList,
    /// `username -> session_id` half of the bidirectional user/session map (at most one
    /// non-zombie session per username).
    session_of_user: HashMap<String, SessionId>,
    next_session_id: SessionId,
    pub(crate) sessions_to_remove: HashSet<SessionId>,
    pub(crate) request_ids: RequestIdGenerator,
}

impl Shared
{
    pub fn new(users: UserTable, symbols: SymbolAllowList, seed_nanos: u128) -> Self
    {
        Self{
            users,
            symbols,
            session_of_user: HashMap::new(),
            next_session_id: 1,
            sessions_to_remove: HashSet::new(),
            request_ids: RequestIdGenerator::new(seed_nanos),
        }
    }

    pub fn allocate_session_id(&mut self) -> SessionId
    {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    pub fn user(&self, username: &str) -> Option<&UserRecord>
    {
        self.users.get(username)
    }

    pub fn symbols(&self) -> &SymbolAllowList
    {
        &self.symbols
    }

    /// Bind `username` to `session_id`, enforcing "at most one session per username".
    /// Returns `false` if the username is already bound to a different, presumably-still-live session.
    pub fn bind_session(&mut self, username: &str, session_id: SessionId) -> bool
    {
        if self.session_of_user.contains_key(username) { return false; }
        self.session_of_user.insert(username.to_string(), session_id);
        true
    }

    pub fn session_for_user(&self, username: &str) -> Option<SessionId>
    {
        self.session_of_user.get(username).copied()
    }

    /// Release the username↔session binding (per-session teardown).
    pub fn unbind_session(&mut self, username: &str)
    {
        self.session_of_user.remove(username);
    }

    /// Add `session_id` to the pending-removal set (per-session teardown). The only reader
    /// of this set is [`crate::client::manager::ClientManager`]'s 1s tick.
    pub fn schedule_removal(&mut self, session_id: SessionId)
    {
        self.sessions_to_remove.insert(session_id);
    }

    pub fn drain_removals(&mut self) -> Vec<SessionId>
    {
        self.sessions_to_remove.drain().collect()
    }

    /// Insert or overwrite a user record.
    pub fn insert_user(&mut self, record: UserRecord)
    {
        tracing::info!(username = %record.username, "user inserted");
        self.users.insert(record);
    }

    /// Remove a user record. Does not forcibly disconnect an already-logged-in session using that username; the
    /// router will simply reject that user's next logon attempt.
    pub fn remove_user(&mut self, username: &str)
    {
        tracing::info!(username, "user removed");
        self.users.remove(username);
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;

    fn shared() -> Shared
    {
        Shared::new(UserTable::default(), SymbolAllowList::allow_all(), 1)
    }

    #[test]
    fn session_ids_increase_monotonically()
    {
        let mut shared = shared();
        assert_eq!(shared.allocate_session_id(), 1);
        assert_eq!(shared.allocate_session_id(), 2);
    }

    #[test]
    fn bind_session_rejects_second_concurrent_session_for_same_user()
    {
        let mut shared = shared();
        assert!(shared.bind_session("alice", 1));
        assert!(!shared.bind_session("alice", 2));

        shared.unbind_session("alice");
        assert!(shared.bind_session("alice", 2));
    }

    #[test]
    fn removal_set_drains_exactly_once()
    {
        let mut shared = shared();
        shared.schedule_removal(5);
        shared.schedule_removal(6);

        let mut drained = shared.drain_removals();
        drained.sort();
        assert_eq!(drained, vec![5, 6]);
        assert!(shared.drain_removals().is_empty());
    }
}
