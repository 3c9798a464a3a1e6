//! Owns every downstream [`ClientSession`] by `session_id`. Dispatches the scheduler's tick to all of
//! them and, on a 1 s cadence, is the single driver that drains [`crate::shared::Shared`]'s pending-removal set
//! (the single GC driver for the whole process).

//local shortcuts
use crate::client::config::ClientConfig;
use crate::client::session::{ClientSession, ClientSessionOutcome};
use crate::common::SessionId;
use crate::shared::Shared;

//third-party shortcuts

//standard shortcuts
use std::collections::HashMap;
use std::time::{Duration, Instant};

//-------------------------------------------------------------------------------------------------------------------

const GC_INTERVAL: Duration = Duration::from_secs(1);

//-------------------------------------------------------------------------------------------------------------------

pub struct ClientManager
{
    config: ClientConfig,
    sessions: HashMap<SessionId, ClientSession>,
    last_gc: Instant,
}

impl ClientManager
{
    pub fn new(config: ClientConfig, now: Instant) -> Self
    {
        Self{ config, sessions: HashMap::new(), last_gc: now }
    }

    /// Accept a new connection: allocate a session and start it in `WaitingLogon`.
    pub fn accept(&mut self, session_id: SessionId, now: Instant) -> &mut ClientSession
    {
        let session = ClientSession::new(session_id, self.config.clone(), now);
        self.sessions.entry(session_id).or_insert(session)
    }

    pub fn get_mut(&mut self, session_id: SessionId) -> Option<&mut ClientSession>
    {
        self.sessions.get_mut(&session_id)
    }

    pub fn remove(&mut self, session_id: SessionId) -> Option<ClientSession>
    {
        self.sessions.remove(&session_id)
    }

    pub fn len(&self) -> usize { self.sessions.len() }
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    /// Every tracked session id, for sweeps that must touch all of them ("force every client to log on
    /// again" when the upstream bridge drops).
    pub fn session_ids(&self) -> Vec<SessionId>
    {
        self.sessions.keys().copied().collect()
    }

    /// Dispatch the 100 ms scheduler tick to every session, then (at most once per second) garbage-collect
    /// sessions `Shared` has marked for removal.
    pub fn on_tick(&mut self, now: Instant, shared: &mut Shared) -> Vec<(SessionId, ClientSessionOutcome)>
    {
        let mut outcomes: Vec<(SessionId, ClientSessionOutcome)> = self
            .sessions
            .iter_mut()
            .map(|(&id, session)| (id, session.on_tick(now)))
            .collect();

        if now.duration_since(self.last_gc) >= GC_INTERVAL
        {
            self.last_gc = now;
            for session_id in shared.drain_removals()
            {
                if let Some(removed) = self.sessions.remove(&session_id)
                {
                    tracing::debug!(session_id, state = ?removed.state(), "garbage collected session");
                }
            }
        }

        outcomes.retain(|(_, outcome)| !outcome.outbound.is_empty() || outcome.event.is_some() || outcome.close);
        outcomes
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::{SymbolAllowList, UserTable};

    #[test]
    fn accept_allocates_and_tracks_a_session()
    {
        let now = Instant::now();
        let mut manager = ClientManager::new(ClientConfig::default(), now);
        manager.accept(1, now);
        assert_eq!(manager.len(), 1);
        assert!(manager.get_mut(1).is_some());
    }

    #[test]
    fn gc_only_runs_once_the_interval_elapses_and_clears_marked_sessions()
    {
        let now = Instant::now();
        let mut manager = ClientManager::new(ClientConfig::default(), now);
        manager.accept(1, now);

        let mut shared = Shared::new(UserTable::default(), SymbolAllowList::allow_all(), 1);
        shared.schedule_removal(1);

        // before the GC interval elapses the session survives
        manager.on_tick(now + Duration::from_millis(100), &mut shared);
        assert_eq!(manager.len(), 1);

        manager.on_tick(now + Duration::from_secs(2), &mut shared);
        assert_eq!(manager.len(), 0);
    }
}

//-------------------------------------------------------------------------------------------------------------------
