//! The hub: authentication, request-id translation, party-id injection bookkeeping, order-state
//! tracking, and per-session teardown. Exclusively owns [`Shared`], the [`ServerSession`], and the
//! [`ClientManager`].

//local shortcuts
use crate::client::config::ClientConfig;
use crate::client::manager::ClientManager;
use crate::client::session::{ClientSessionEvent, ClientSessionOutcome};
use crate::common::SessionId;
use crate::errors::{ErrorKind, ProtocolError};
use crate::ids::{IdTranslationTable, RequestIdKind};
use crate::message::{tags, FixMessage, MsgType, OrdStatus};
use crate::server::config::ServerConfig;
use crate::server::session::{ServerSession, ServerSessionEvent, ServerSessionOutcome};
use crate::shared::Shared;

//third-party shortcuts

//standard shortcuts
use std::collections::HashMap;
use std::time::Instant;

//-------------------------------------------------------------------------------------------------------------------

/// `--test.*` policy flags.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig
{
    pub disable_remove_cl_ord_id: bool,
    pub enable_order_mass_cancel: bool,
    pub fix_debug: bool,
}

//-------------------------------------------------------------------------------------------------------------------

/// Something that must leave the process: a frame addressed to a specific client, a frame addressed upstream, or
/// an instruction to close a client socket. The transport layer ([`crate::transport`]) is the only consumer.
#[derive(Debug, Clone)]
pub enum RouterAction
{
    ToClient{ session_id: SessionId, msg: FixMessage },
    ToServer(FixMessage),
    CloseClient{ session_id: SessionId },
}

//-------------------------------------------------------------------------------------------------------------------

pub struct Router
{
    shared: Shared,
    client_manager: ClientManager,
    server_session: ServerSession,
    client_config: ClientConfig,
    router_config: RouterConfig,
    tables: HashMap<RequestIdKind, IdTranslationTable>,
    /// `cl_ord_id(server) -> OrdStatus`.
    order_status: HashMap<String, OrdStatus>,
}

impl Router
{
    pub fn new(
        shared: Shared,
        client_config: ClientConfig,
        server_config: ServerConfig,
        router_config: RouterConfig,
        now: Instant,
    ) -> Self
    {
        let mut tables = HashMap::new();
        for kind in RequestIdKind::ALL { tables.insert(kind, IdTranslationTable::default()); }

        Self{
            shared,
            client_manager: ClientManager::new(client_config.clone(), now),
            server_session: ServerSession::new(server_config),
            client_config,
            router_config,
            tables,
            order_status: HashMap::new(),
        }
    }

    pub fn client_manager(&self) -> &ClientManager { &self.client_manager }
    pub fn shared(&self) -> &Shared { &self.shared }

    /// Mutable access for the adapters that write into `Shared` from outside the router's own message handling:
    /// the auth-feed adapter (user add/remove) is the only caller.
    pub fn shared_mut(&mut self) -> &mut Shared { &mut self.shared }

    /// Allocate the next `session_id` for a freshly accepted connection. Session-id allocation stays with `Shared`
    /// even though the transport layer is what observes the TCP accept.
    pub fn allocate_session_id(&mut self) -> SessionId { self.shared.allocate_session_id() }

    //-------------------------------------------------------------------------------------------------------------
    // client-facing entry points

    pub fn on_client_connected(&mut self, session_id: SessionId, now: Instant)
    {
        self.client_manager.accept(session_id, now);
    }

    pub fn on_client_message(&mut self, session_id: SessionId, msg: FixMessage, now: Instant) -> Vec<RouterAction>
    {
        let Some(session) = self.client_manager.get_mut(session_id) else {
            tracing::warn!(session_id, "message for unknown client session, dropping");
            return Vec::new();
        };
        let outcome = session.on_message(msg, now);
        self.handle_client_outcome(session_id, outcome, now)
    }

    /// The listener lost the socket out from under a session. Treated like any other protocol violation: tear
    /// the session down.
    pub fn on_client_disconnected(&mut self, session_id: SessionId) -> Vec<RouterAction>
    {
        self.teardown_session(session_id)
    }

    //-------------------------------------------------------------------------------------------------------------
    // server-facing entry points

    pub fn on_server_connected(&mut self, now: Instant) -> Vec<RouterAction>
    {
        let outcome = self.server_session.on_connected();
        self.apply_server_outcome(outcome, now)
    }

    pub fn on_server_disconnected(&mut self, now: Instant) -> Vec<RouterAction>
    {
        let outcome = self.server_session.on_disconnected();
        self.apply_server_outcome(outcome, now)
    }

    pub fn on_server_message(&mut self, msg: FixMessage, now: Instant) -> Vec<RouterAction>
    {
        // business messages carrying a translated req-id are routed here directly; the state-machine outcome
        // below only ever carries session-level frames (Heartbeat/TestRequest/Logout) or a `Ready` event.
        let mut actions = Vec::new();

        if msg.msg_type.req_id_kind().is_some()
        {
            actions.extend(self.route_server_response(&msg, now));
        }

        let outcome = self.server_session.on_message(msg);
        actions.extend(self.apply_server_outcome(outcome, now));
        actions
    }

    pub fn on_scheduler_tick(&mut self, now: Instant) -> Vec<RouterAction>
    {
        let tick_outcome = self.server_session.on_tick(now);
        let mut actions = self.apply_server_outcome(tick_outcome, now);

        let client_outcomes = self.client_manager.on_tick(now, &mut self.shared);
        for (session_id, outcome) in client_outcomes
        {
            actions.extend(self.handle_client_outcome(session_id, outcome, now));
        }
        actions
    }

    //-------------------------------------------------------------------------------------------------------------
    // internals

    fn apply_server_outcome(&mut self, outcome: ServerSessionOutcome, now: Instant) -> Vec<RouterAction>
    {
        let mut actions: Vec<RouterAction> = outcome.outbound.into_iter().map(RouterAction::ToServer).collect();

        match outcome.event
        {
            Some(ServerSessionEvent::Ready) =>
            {
                tracing::info!("upstream bridge session ready");
            }
            Some(ServerSessionEvent::Disconnected) =>
            {
                // force every Ready (or pending) client session to log on again.
                for session_id in self.all_client_session_ids()
                {
                    actions.push(RouterAction::CloseClient{ session_id });
                    actions.extend(self.teardown_session(session_id));
                }
                let _ = now;
            }
            None => {}
        }
        actions
    }

    fn all_client_session_ids(&self) -> Vec<SessionId>
    {
        // `ClientManager` doesn't expose iteration directly to keep session ownership encapsulated; route through
        // the one place that needs a full sweep.
        self.client_manager.session_ids()
    }

    fn handle_client_outcome(
        &mut self,
        session_id: SessionId,
        outcome: ClientSessionOutcome,
        now: Instant,
    ) -> Vec<RouterAction>
    {
        let mut actions: Vec<RouterAction> = outcome
            .outbound
            .into_iter()
            .map(|msg| RouterAction::ToClient{ session_id, msg })
            .collect();

        if outcome.close
        {
            actions.push(RouterAction::CloseClient{ session_id });
        }

        match outcome.event
        {
            Some(ClientSessionEvent::LogonAttempt{ username, password, raw_data, component }) =>
            {
                let result = self.authenticate(session_id, &username, &password, &raw_data, &component);
                if let Some(session) = self.client_manager.get_mut(session_id)
                {
                    let follow_up = session.complete_logon(result, now);
                    actions.extend(self.handle_client_outcome(session_id, follow_up, now));
                }
            }
            Some(ClientSessionEvent::LogoutRequested) =>
            {
                if let Some(username) = self.client_manager.get_mut(session_id).and_then(|s| s.username.clone())
                {
                    self.shared.unbind_session(&username);
                }
                if let Some(session) = self.client_manager.get_mut(session_id)
                {
                    let follow_up = session.complete_logout();
                    actions.extend(self.handle_client_outcome(session_id, follow_up, now));
                }
            }
            Some(ClientSessionEvent::Forward(msg)) =>
            {
                actions.extend(self.forward_to_server(session_id, msg));
            }
            Some(ClientSessionEvent::BecameZombie) =>
            {
                actions.extend(self.teardown_session(session_id));
            }
            None => {}
        }

        actions
    }

    fn authenticate(
        &mut self,
        session_id: SessionId,
        username: &str,
        password: &str,
        raw_data: &str,
        component: &str,
    ) -> Result<u32, ErrorKind>
    {
        let Some(record) = self.shared.user(username).cloned() else { return Err(ErrorKind::InvalidUsername); };
        if record.component != component { return Err(ErrorKind::InvalidComponent); }
        if !crate::crypto::validate(
            self.client_config.auth_method,
            password,
            &record.password,
            raw_data,
            self.client_config.auth_timestamp_tolerance,
        )
        {
            return Err(ErrorKind::InvalidPassword);
        }
        if !self.shared.bind_session(username, session_id) { return Err(ErrorKind::AlreadyLoggedOn); }
        Ok(record.strategy_id)
    }

    /// Translate every req-id field a forwarded request carries, then hand it to the server session.
    fn forward_to_server(&mut self, session_id: SessionId, mut msg: FixMessage) -> Vec<RouterAction>
    {
        let ref_msg_type = msg.msg_type;

        if self.router_config.fix_debug
        {
            tracing::debug!(session_id, msg_type = ?ref_msg_type, "fix_debug: client request");
        }

        if ref_msg_type == MsgType::OrderMassCancelRequest && !self.router_config.enable_order_mass_cancel
        {
            return self.reject_client(session_id, ref_msg_type, ErrorKind::Unsupported);
        }

        if let Some(symbol) = msg.field(tags::SYMBOL)
        {
            if !self.shared.symbols().is_allowed(symbol)
            {
                return self.reject_client(session_id, ref_msg_type, ErrorKind::SymbolNotAllowed);
            }
        }

        if let Some(kind) = msg.msg_type.req_id_kind()
        {
            if let Err(kind_err) = self.translate_outbound_req_id(session_id, kind, &mut msg)
            {
                return self.reject_client(session_id, ref_msg_type, kind_err);
            }
        }

        match self.server_session.forward(msg)
        {
            Ok(stamped) => vec![RouterAction::ToServer(stamped)],
            Err(ProtocolError::Rejected(kind)) => self.reject_client(session_id, ref_msg_type, kind),
            Err(_) => Vec::new(),
        }
    }

    fn reject_client(&mut self, session_id: SessionId, ref_msg_type: MsgType, kind: ErrorKind) -> Vec<RouterAction>
    {
        let Some(session) = self.client_manager.get_mut(session_id) else { return Vec::new(); };
        let reject = session.business_reject(ref_msg_type, kind);
        vec![RouterAction::ToClient{ session_id, msg: reject }]
    }

    /// Rewrite the outbound request's req-id field(s) to a fresh server-side id, recording the translation.
    /// `OrigClOrdID` (41), present on cancel/replace requests, is translated by look-up rather than by minting a
    /// new id: an unknown original id means the order was already torn down (`UNKNOWN_ORDER`).
    fn translate_outbound_req_id(
        &mut self,
        session_id: SessionId,
        kind: RequestIdKind,
        msg: &mut FixMessage,
    ) -> Result<(), ErrorKind>
    {
        if let Some(orig) = msg.field(tags::ORIG_CL_ORD_ID).map(str::to_string)
        {
            let table = self.tables.get(&kind).expect("all kinds pre-populated");
            let Some(server_orig) = table.existing_server_id(session_id, &orig).map(str::to_string) else
            {
                return Err(ErrorKind::UnknownOrder);
            };
            msg.set_field(tags::ORIG_CL_ORD_ID, server_orig);
        }

        let Some(client_id) = msg.req_id().map(str::to_string) else { return Ok(()); };
        let keep_alive = kind.default_keep_alive();

        let table = self.tables.get_mut(&kind).expect("all kinds pre-populated");
        let server_id = match table.existing_server_id(session_id, &client_id)
        {
            Some(existing) => existing.to_string(),
            None =>
            {
                let fresh = self.shared.request_ids.next_id();
                table.insert(fresh.clone(), session_id, client_id.clone(), keep_alive);
                fresh
            }
        };
        msg.set_req_id(server_id);
        Ok(())
    }

    /// Route an upstream response/update back to its originating client, undoing the req-id translation.
    fn route_server_response(&mut self, msg: &FixMessage, now: Instant) -> Vec<RouterAction>
    {
        if self.router_config.fix_debug
        {
            tracing::debug!(msg_type = ?msg.msg_type, "fix_debug: upstream response");
        }

        let Some(kind) = msg.msg_type.req_id_kind() else { return Vec::new(); };
        let Some(server_id) = msg.req_id().map(str::to_string) else { return Vec::new(); };

        if kind == RequestIdKind::ClOrdId || kind == RequestIdKind::MassCancelClOrdId
        {
            self.track_order_state(&server_id, msg);
        }

        let Some(entry) = self.tables.get(&kind).and_then(|t| t.resolve(&server_id)).cloned() else
        {
            tracing::warn!(server_id, ?kind, "undeliverable response, dropping");
            return Vec::new();
        };

        let mut reply = msg.clone();
        reply.set_req_id(entry.client_id.clone());

        // Order mappings live until a terminal `OrdStatus` is observed, not until the first response;
        // every other kind is either a one-shot ack or a standing subscription per `default_keep_alive`.
        let should_release = if kind == RequestIdKind::ClOrdId || kind == RequestIdKind::MassCancelClOrdId
        {
            !self.router_config.disable_remove_cl_ord_id
                && self.order_status.get(&server_id).is_some_and(|status| status.is_terminal())
        }
        else
        {
            !entry.keep_alive
        };
        if should_release
        {
            self.tables.get_mut(&kind).expect("kind present").remove(&server_id);
            self.order_status.remove(&server_id);
        }

        if self.client_manager.get_mut(entry.session_id).is_none()
        {
            tracing::warn!(session_id = entry.session_id, "undeliverable response, target session gone");
            return Vec::new();
        }

        let session = self.client_manager.get_mut(entry.session_id).expect("checked above");
        let outcome = session.deliver(reply);
        self.handle_client_outcome(entry.session_id, outcome, now)
    }

    fn track_order_state(&mut self, server_cl_ord_id: &str, msg: &FixMessage)
    {
        if msg.msg_type != MsgType::ExecutionReport { return; }
        if let Some(status) = msg.ord_status()
        {
            self.order_status.insert(server_cl_ord_id.to_string(), status);
        }
    }

    /// Build the upstream unsubscribe request for a released `keep_alive` mapping, if `kind` names a request
    /// type that supports one (`SubscriptionRequestType` (263) = "2", Disable previous Snapshot + Updates Request).
    fn cancel_message(kind: RequestIdKind, server_id: &str) -> Option<FixMessage>
    {
        let msg_type = kind.cancel_msg_type()?;
        let mut msg = FixMessage::new(msg_type);
        msg.set_field(tags::SUBSCRIPTION_REQUEST_TYPE, "2");
        msg.set_req_id(server_id.to_string());
        Some(msg)
    }

    /// Per-session teardown: clear req-id mappings, best-effort-cancel keep-alive subscriptions,
    /// release the user binding, and mark the session for GC.
    fn teardown_session(&mut self, session_id: SessionId) -> Vec<RouterAction>
    {
        let mut actions = Vec::new();

        if let Some(username) = self.client_manager.get_mut(session_id).and_then(|s| s.username.clone())
        {
            self.shared.unbind_session(&username);
        }

        for kind in RequestIdKind::ALL
        {
            let Some(table) = self.tables.get_mut(&kind) else { continue; };
            for (server_id, entry) in table.remove_session(session_id)
            {
                self.order_status.remove(&server_id);
                if entry.keep_alive && self.server_session.is_ready()
                {
                    if let Some(cancel) = Self::cancel_message(kind, &server_id)
                    {
                        if let Ok(stamped) = self.server_session.forward(cancel)
                        {
                            actions.push(RouterAction::ToServer(stamped));
                        }
                    }
                }
            }
        }

        self.shared.schedule_removal(session_id);
        actions
    }
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::{SymbolAllowList, UserRecord, UserTable};

    fn router() -> Router
    {
        let mut users = UserTable::default();
        users.insert(UserRecord{
            component: "ALICE_CO".to_string(),
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            strategy_id: 42,
            accounts: Vec::new(),
        });
        let shared = Shared::new(users, SymbolAllowList::allow_all(), 1);
        Router::new(
            shared,
            ClientConfig::default(),
            ServerConfig::default(),
            RouterConfig::default(),
            Instant::now(),
        )
    }

    fn logon_msg(username: &str, password: &str, component: &str) -> FixMessage
    {
        let mut msg = FixMessage::new(MsgType::Logon);
        msg.header.msg_seq_num = 1;
        msg.header.sender_comp_id = component.to_string();
        msg.header.target_comp_id = "PROXY".to_string();
        msg.set_field(tags::ENCRYPT_METHOD, "0");
        msg.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");
        msg.set_field(tags::HEART_BT_INT, "30");
        msg.set_field(tags::USERNAME, username);
        msg.set_field(tags::PASSWORD, password);
        msg
    }

    fn bring_server_ready(router: &mut Router, now: Instant)
    {
        router.on_server_connected(now);
        let mut logon_reply = FixMessage::new(MsgType::Logon);
        logon_reply.header.msg_seq_num = 1;
        router.on_server_message(logon_reply, now);
    }

    #[test]
    fn happy_path_logon_binds_strategy_id_and_allows_order() // S1
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);

        router.on_client_connected(1, now);
        let actions = router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);
        assert!(actions.iter().any(|a| matches!(a, RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::Logon)));

        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 2;
        order.set_field(tags::CL_ORD_ID, "abc_01");
        let actions = router.on_client_message(1, order, now);

        let forwarded = actions.iter().find_map(|a| match a {
            RouterAction::ToServer(msg) => Some(msg.clone()),
            _ => None,
        }).expect("order should be forwarded upstream");
        assert!(forwarded.field(tags::CL_ORD_ID).unwrap().starts_with("proxy-"));
        assert_eq!(forwarded.field(tags::PARTY_ID), Some("42"));
    }

    #[test]
    fn invalid_password_is_rejected() // S2
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);

        router.on_client_connected(1, now);
        let actions = router.on_client_message(1, logon_msg("alice", "wrong", "ALICE_CO"), now);

        let logout = actions.iter().find_map(|a| match a {
            RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::Logout => Some(msg.clone()),
            _ => None,
        }).expect("expected a logout rejection");
        assert_eq!(logout.field(tags::TEXT), Some(ErrorKind::InvalidPassword.as_str()));
        assert!(actions.iter().any(|a| matches!(a, RouterAction::CloseClient{ session_id: 1 })));
    }

    #[test]
    fn duplicate_login_rejects_second_session_without_disturbing_first() // S4
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);

        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        router.on_client_connected(2, now);
        let actions = router.on_client_message(2, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let logout = actions.iter().find_map(|a| match a {
            RouterAction::ToClient{ session_id: 2, msg } if msg.msg_type == MsgType::Logout => Some(msg.clone()),
            _ => None,
        }).expect("session B should be rejected");
        assert_eq!(logout.field(tags::TEXT), Some(ErrorKind::AlreadyLoggedOn.as_str()));
    }

    #[test]
    fn upstream_reconnect_forces_ready_clients_to_log_on_again() // S3
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);

        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let actions = router.on_server_disconnected(now);
        assert!(actions.iter().any(|a| matches!(a, RouterAction::CloseClient{ session_id: 1 })));
    }

    #[test]
    fn terminal_execution_report_releases_cl_ord_id_mapping() // S6
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);
        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 2;
        order.set_field(tags::CL_ORD_ID, "abc_01");
        let actions = router.on_client_message(1, order, now);
        let server_cl_ord_id = actions.iter().find_map(|a| match a {
            RouterAction::ToServer(msg) => msg.field(tags::CL_ORD_ID).map(str::to_string),
            _ => None,
        }).unwrap();

        let mut exec = FixMessage::new(MsgType::ExecutionReport);
        exec.header.msg_seq_num = 2;
        exec.set_field(tags::CL_ORD_ID, server_cl_ord_id.clone());
        exec.set_field(tags::ORD_STATUS, "2"); // Filled
        router.on_server_message(exec, now);

        assert!(router.tables.get(&RequestIdKind::ClOrdId).unwrap().resolve(&server_cl_ord_id).is_none());
    }

    #[test]
    fn order_mass_cancel_is_rejected_unless_explicitly_enabled()
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);
        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let mut mass_cancel = FixMessage::new(MsgType::OrderMassCancelRequest);
        mass_cancel.header.msg_seq_num = 2;
        mass_cancel.set_field(tags::CL_ORD_ID, "abc_01");
        let actions = router.on_client_message(1, mass_cancel, now);

        let reject = actions.iter().find_map(|a| match a {
            RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::BusinessMessageReject => Some(msg.clone()),
            _ => None,
        }).expect("mass cancel should be rejected by default");
        assert_eq!(reject.field(tags::TEXT), Some(ErrorKind::Unsupported.as_str()));
        assert!(!actions.iter().any(|a| matches!(a, RouterAction::ToServer(_))));
    }

    #[test]
    fn symbol_outside_the_allow_list_is_rejected()
    {
        let mut users = UserTable::default();
        users.insert(UserRecord{
            component: "ALICE_CO".to_string(),
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            strategy_id: 42,
            accounts: Vec::new(),
        });
        let symbols = SymbolAllowList::compile(&["^ES.*".to_string()]).unwrap();
        let shared = Shared::new(users, symbols, 1);
        let mut router = Router::new(
            shared,
            ClientConfig::default(),
            ServerConfig::default(),
            RouterConfig::default(),
            Instant::now(),
        );
        let now = Instant::now();
        bring_server_ready(&mut router, now);
        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 2;
        order.set_field(tags::CL_ORD_ID, "abc_01");
        order.set_field(tags::SYMBOL, "CLU24");
        let actions = router.on_client_message(1, order, now);

        let reject = actions.iter().find_map(|a| match a {
            RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::BusinessMessageReject => Some(msg.clone()),
            _ => None,
        }).expect("disallowed symbol should be rejected");
        assert_eq!(reject.field(tags::TEXT), Some(ErrorKind::SymbolNotAllowed.as_str()));
    }

    #[test]
    fn malformed_orig_cl_ord_id_is_rejected_before_reaching_the_router()
    {
        let mut router = router();
        let now = Instant::now();
        bring_server_ready(&mut router, now);
        router.on_client_connected(1, now);
        router.on_client_message(1, logon_msg("alice", "s3cret", "ALICE_CO"), now);

        let mut cancel = FixMessage::new(MsgType::OrderCancelRequest);
        cancel.header.msg_seq_num = 2;
        cancel.set_field(tags::CL_ORD_ID, "abc_02");
        cancel.set_field(tags::ORIG_CL_ORD_ID, "has spaces/slash");
        let actions = router.on_client_message(1, cancel, now);

        let reject = actions.iter().find_map(|a| match a {
            RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::BusinessMessageReject => Some(msg.clone()),
            _ => None,
        }).expect("malformed OrigClOrdID should be rejected client-side");
        assert_eq!(reject.field(tags::TEXT), Some(ErrorKind::InvalidOrigClOrdId.as_str()));
        assert!(!actions.iter().any(|a| matches!(a, RouterAction::ToServer(_))));
    }
}

//-------------------------------------------------------------------------------------------------------------------
