//! Request-id translation tables.
//!
//! The router rewrites every request-id field listed below before forwarding a client request upstream, and
//! rewrites it back on the matching response.

//local shortcuts
use crate::common::SessionId;

//third-party shortcuts

//standard shortcuts
use std::collections::HashMap;

//-------------------------------------------------------------------------------------------------------------------

/// The ten request-id kinds the router translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestIdKind
{
    SecurityReqId,
    SecurityStatusReqId,
    TradSesReqId,
    MdReqId,
    OrdStatusReqId,
    MassStatusReqId,
    PosReqId,
    TradeRequestId,
    ClOrdId,
    MassCancelClOrdId,
}

impl RequestIdKind
{
    pub const ALL: [RequestIdKind; 10] = [
        RequestIdKind::SecurityReqId,
        RequestIdKind::SecurityStatusReqId,
        RequestIdKind::TradSesReqId,
        RequestIdKind::MdReqId,
        RequestIdKind::OrdStatusReqId,
        RequestIdKind::MassStatusReqId,
        RequestIdKind::PosReqId,
        RequestIdKind::TradeRequestId,
        RequestIdKind::ClOrdId,
        RequestIdKind::MassCancelClOrdId,
    ];

    /// The FIX tag carrying this kind's identifier.
    pub fn tag(self) -> u32
    {
        use crate::message::tags;
        match self
        {
            RequestIdKind::SecurityReqId => tags::SECURITY_REQ_ID,
            RequestIdKind::SecurityStatusReqId => tags::SECURITY_STATUS_REQ_ID,
            RequestIdKind::TradSesReqId => tags::TRAD_SES_REQ_ID,
            RequestIdKind::MdReqId => tags::MD_REQ_ID,
            RequestIdKind::OrdStatusReqId => tags::ORD_STATUS_REQ_ID,
            RequestIdKind::MassStatusReqId => tags::MASS_STATUS_REQ_ID,
            RequestIdKind::PosReqId => tags::POS_REQ_ID,
            RequestIdKind::TradeRequestId => tags::TRADE_REQUEST_ID,
            RequestIdKind::ClOrdId => tags::CL_ORD_ID,
            RequestIdKind::MassCancelClOrdId => tags::CL_ORD_ID,
        }
    }

    /// Whether a mapping of this kind should survive past its first response (subscriptions that expect repeated
    /// unsolicited updates) or be removed immediately after the first response is routed back (one-shot acks).
    pub fn default_keep_alive(self) -> bool
    {
        matches!(
            self,
            RequestIdKind::MdReqId | RequestIdKind::PosReqId | RequestIdKind::SecurityReqId
        )
    }

    /// The request message type to reissue, with `SubscriptionRequestType` = Disable, to cancel a live
    /// `keep_alive` subscription of this kind upstream. `None` for kinds with no standing subscription.
    pub fn cancel_msg_type(self) -> Option<crate::message::MsgType>
    {
        use crate::message::MsgType;
        match self
        {
            RequestIdKind::SecurityReqId => Some(MsgType::SecurityListRequest),
            RequestIdKind::MdReqId => Some(MsgType::MarketDataRequest),
            RequestIdKind::PosReqId => Some(MsgType::RequestForPositions),
            _ => None,
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// One routing entry: which client, on which session, a server-side id resolves to.
#[derive(Debug, Clone)]
pub struct RouteEntry
{
    pub session_id: SessionId,
    pub client_id: String,
    pub keep_alive: bool,
}

//-------------------------------------------------------------------------------------------------------------------

/// Bidirectional translation table for a single [`RequestIdKind`].
///
/// `server_to_client` is the primary routing table consulted when an upstream response arrives.
/// `client_to_server` is the reverse lookup used for idempotent re-request detection and per-session teardown.
#[derive(Debug, Default)]
pub struct IdTranslationTable
{
    server_to_client: HashMap<String, RouteEntry>,
    client_to_server: HashMap<SessionId, HashMap<String, String>>,
}

impl IdTranslationTable
{
    /// Record a new translation. Invariant: inserting here must always be paired with the
    /// matching reverse entry, which this method maintains atomically.
    pub fn insert(&mut self, server_id: String, session_id: SessionId, client_id: String, keep_alive: bool)
    {
        self.client_to_server
            .entry(session_id)
            .or_default()
            .insert(client_id.clone(), server_id.clone());
        self.server_to_client.insert(server_id, RouteEntry{ session_id, client_id, keep_alive });
    }

    pub fn resolve(&self, server_id: &str) -> Option<&RouteEntry>
    {
        self.server_to_client.get(server_id)
    }

    /// Look up the server-side id already assigned to a given client-side id on a given session, if any (used to
    /// detect idempotent re-requests rather than minting a fresh server id every time).
    pub fn existing_server_id(&self, session_id: SessionId, client_id: &str) -> Option<&str>
    {
        self.client_to_server.get(&session_id)?.get(client_id).map(String::as_str)
    }

    /// Remove a mapping once it is no longer needed (one-shot response routed, or terminal order status observed).
    pub fn remove(&mut self, server_id: &str) -> Option<RouteEntry>
    {
        let entry = self.server_to_client.remove(server_id)?;
        if let Some(by_client) = self.client_to_server.get_mut(&entry.session_id)
        {
            by_client.retain(|_, sid| sid != server_id);
        }
        Some(entry)
    }

    /// Remove every mapping belonging to a session (client teardown).
    pub fn remove_session(&mut self, session_id: SessionId) -> Vec<(String, RouteEntry)>
    {
        let Some(by_client) = self.client_to_server.remove(&session_id) else { return Vec::new(); };
        by_client
            .into_values()
            .filter_map(|server_id| self.server_to_client.remove(&server_id).map(|entry| (server_id, entry)))
            .collect()
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// Generates fresh server-side request ids: `"proxy-" + (++counter)`, seeded from realtime so ids never collide
/// across proxy restarts sharing the same upstream session.
#[derive(Debug)]
pub struct RequestIdGenerator
{
    next: u64,
}

impl RequestIdGenerator
{
    pub fn new(seed_nanos: u128) -> Self
    {
        Self{ next: (seed_nanos % (u64::MAX as u128)) as u64 }
    }

    pub fn next_id(&mut self) -> String
    {
        self.next = self.next.wrapping_add(1);
        format!("proxy-{}", self.next)
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn insert_maintains_reverse_lookup()
    {
        let mut table = IdTranslationTable::default();
        table.insert("proxy-1".to_string(), 7, "abc_01".to_string(), false);

        assert_eq!(table.resolve("proxy-1").unwrap().client_id, "abc_01");
        assert_eq!(table.existing_server_id(7, "abc_01"), Some("proxy-1"));
    }

    #[test]
    fn remove_clears_both_directions()
    {
        let mut table = IdTranslationTable::default();
        table.insert("proxy-1".to_string(), 7, "abc_01".to_string(), false);
        table.remove("proxy-1");

        assert!(table.resolve("proxy-1").is_none());
        assert_eq!(table.existing_server_id(7, "abc_01"), None);
    }

    #[test]
    fn remove_session_clears_all_entries_for_that_session_only()
    {
        let mut table = IdTranslationTable::default();
        table.insert("proxy-1".to_string(), 7, "abc_01".to_string(), true);
        table.insert("proxy-2".to_string(), 8, "xyz_01".to_string(), true);

        let removed = table.remove_session(7);
        assert_eq!(removed.len(), 1);
        assert!(table.resolve("proxy-1").is_none());
        assert!(table.resolve("proxy-2").is_some());
    }

    #[test]
    fn request_id_generator_produces_unique_increasing_ids()
    {
        let mut gen = RequestIdGenerator::new(1000);
        let a = gen.next_id();
        let b = gen.next_id();
        assert_ne!(a, b);
        assert!(a.starts_with("proxy-"));
    }
}
