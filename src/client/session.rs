//! Per-downstream FIX session: the acceptor side of the proxy.
//!
//! As with [`crate::server::session::ServerSession`], a `ClientSession` never holds a reference back into its
//! owner. Every driving method returns a [`ClientSessionOutcome`] describing what to send on the wire, whether the
//! connection should be closed, and (at most one) event the [`crate::router::Router`] must react to.

//local shortcuts
use crate::client::config::ClientConfig;
use crate::common::{is_base64_web_safe, SessionId};
use crate::errors::ErrorKind;
use crate::message::{tags, FixMessage, MsgType};
use crate::rate_limiter::RateLimitTracker;

//third-party shortcuts

//standard shortcuts
use std::time::Instant;

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSessionState
{
    WaitingLogon,
    WaitingCreateRoute,
    Ready,
    WaitingRemoveRoute,
    Zombie,
}

//-------------------------------------------------------------------------------------------------------------------

/// Something the router must act on as a result of driving a client session.
#[derive(Debug, Clone)]
pub enum ClientSessionEvent
{
    /// The peer presented credentials; the router should authenticate them and call
    /// [`ClientSession::complete_logon`] with the result.
    LogonAttempt
    {
        username: String,
        password: String,
        raw_data: String,
        component: String,
    },
    /// The peer logged out; the router should release the user binding, tear down req-id mappings for this
    /// session, and call [`ClientSession::complete_logout`].
    LogoutRequested,
    /// A validated, party-injected business request ready for req-id translation and upstream forwarding.
    Forward(FixMessage),
    /// The session became a zombie; the router must run per-session teardown and the transport must
    /// close the socket.
    BecameZombie,
}

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ClientSessionOutcome
{
    pub outbound: Vec<FixMessage>,
    pub event: Option<ClientSessionEvent>,
    pub close: bool,
}

impl ClientSessionOutcome
{
    fn none() -> Self { Self::default() }

    fn send(msg: FixMessage) -> Self { Self{ outbound: vec![msg], ..Self::default() } }

    fn event_only(event: ClientSessionEvent) -> Self
    {
        Self{ outbound: Vec::new(), event: Some(event), close: false }
    }

    fn close_with(msg: FixMessage) -> Self { Self{ outbound: vec![msg], event: None, close: true } }

    fn close_with_event(msg: FixMessage, event: ClientSessionEvent) -> Self
    {
        Self{ outbound: vec![msg], event: Some(event), close: true }
    }
}

//-------------------------------------------------------------------------------------------------------------------

pub struct ClientSession
{
    session_id: SessionId,
    config: ClientConfig,
    state: ClientSessionState,
    comp_id: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) party_id: Option<String>,
    inbound_seq: u64,
    outbound_seq: u64,
    last_activity: Instant,
    waiting_for_heartbeat: bool,
    user_response_deadline: Option<Instant>,
    logon_deadline: Instant,
    rate_limiter: RateLimitTracker,
}

impl ClientSession
{
    pub fn new(session_id: SessionId, config: ClientConfig, now: Instant) -> Self
    {
        let logon_deadline = now + config.logon_timeout;
        let rate_limiter = RateLimitTracker::new(config.rate_limit);
        Self{
            session_id,
            config,
            state: ClientSessionState::WaitingLogon,
            comp_id: None,
            username: None,
            party_id: None,
            inbound_seq: 0,
            outbound_seq: 0,
            last_activity: now,
            waiting_for_heartbeat: false,
            user_response_deadline: None,
            logon_deadline,
            rate_limiter,
        }
    }

    pub fn session_id(&self) -> SessionId { self.session_id }
    pub fn state(&self) -> ClientSessionState { self.state }
    pub fn is_zombie(&self) -> bool { self.state == ClientSessionState::Zombie }

    fn stamp(&mut self, mut msg: FixMessage) -> FixMessage
    {
        self.outbound_seq += 1;
        msg.header.msg_seq_num = self.outbound_seq;
        msg.header.sender_comp_id = self.config.comp_id.clone();
        msg.header.target_comp_id = self.comp_id.clone().unwrap_or_default();
        msg.header.sending_time = realtime_now_millis();
        msg
    }

    fn reject(&mut self, text: &str) -> FixMessage
    {
        let mut msg = FixMessage::new(MsgType::Reject);
        msg.set_field(tags::TEXT, text);
        self.stamp(msg)
    }

    /// Build and sequence-stamp a `BusinessMessageReject` for `ref_msg_type`. Exposed beyond this module so the
    /// router can report `NOT_READY` when the upstream session can't take a forward right now.
    pub(crate) fn business_reject(&mut self, ref_msg_type: MsgType, kind: ErrorKind) -> FixMessage
    {
        let mut msg = FixMessage::new(MsgType::BusinessMessageReject);
        msg.set_field(tags::REF_MSG_TYPE, ref_msg_type.as_wire());
        msg.set_field(tags::BUSINESS_REJECT_REASON, "0");
        msg.set_field(tags::TEXT, kind.as_str());
        self.stamp(msg)
    }

    fn logout(&mut self, text: &str) -> FixMessage
    {
        let mut msg = FixMessage::new(MsgType::Logout);
        msg.set_field(tags::TEXT, text);
        self.stamp(msg)
    }

    fn zombie_event() -> Option<ClientSessionEvent> { Some(ClientSessionEvent::BecameZombie) }

    /// An inbound frame arrived. Sequence numbers are tracked but never recovered.
    pub fn on_message(&mut self, msg: FixMessage, now: Instant) -> ClientSessionOutcome
    {
        if self.state == ClientSessionState::Zombie { return ClientSessionOutcome::none(); }

        if !self.rate_limiter.try_count_msg()
        {
            let logout = self.logout(ErrorKind::RateLimited.as_str());
            self.state = ClientSessionState::Zombie;
            return ClientSessionOutcome::close_with_event(logout, Self::zombie_event().unwrap());
        }

        if self.comp_id.is_none()
        {
            self.comp_id = Some(msg.header.sender_comp_id.clone());
        }
        if msg.header.msg_seq_num != self.inbound_seq + 1
        {
            tracing::warn!(
                session_id = self.session_id,
                expected = self.inbound_seq + 1,
                got = msg.header.msg_seq_num,
                "client session sequence gap/replay"
            );
        }
        self.inbound_seq = msg.header.msg_seq_num;
        self.last_activity = now;

        match self.state
        {
            ClientSessionState::WaitingLogon => self.handle_waiting_logon(msg),
            ClientSessionState::WaitingCreateRoute => self.handle_unexpected_while_pending(msg),
            ClientSessionState::Ready => self.handle_ready(msg),
            ClientSessionState::WaitingRemoveRoute => self.handle_waiting_remove_route(),
            ClientSessionState::Zombie => ClientSessionOutcome::none(),
        }
    }

    fn handle_waiting_logon(&mut self, msg: FixMessage) -> ClientSessionOutcome
    {
        if msg.msg_type != MsgType::Logon
        {
            let reject = self.reject(ErrorKind::NoLogon.as_str());
            self.state = ClientSessionState::Zombie;
            return ClientSessionOutcome::close_with_event(reject, Self::zombie_event().unwrap());
        }

        if let Err(kind) = self.validate_logon_fields(&msg)
        {
            let reject = self.reject(kind.as_str());
            self.state = ClientSessionState::Zombie;
            return ClientSessionOutcome::close_with_event(reject, Self::zombie_event().unwrap());
        }

        let username = msg.field(tags::USERNAME).unwrap_or_default().to_string();
        let password = msg.field(tags::PASSWORD).unwrap_or_default().to_string();
        let raw_data = msg.field(tags::RAW_DATA).unwrap_or_default().to_string();
        let component = msg.header.sender_comp_id.clone();

        self.username = Some(username.clone());
        self.user_response_deadline = Some(self.last_activity + self.config.request_timeout);
        self.state = ClientSessionState::WaitingCreateRoute;

        ClientSessionOutcome::event_only(ClientSessionEvent::LogonAttempt{ username, password, raw_data, component })
    }

    fn validate_logon_fields(&self, msg: &FixMessage) -> Result<(), ErrorKind>
    {
        if msg.header.target_comp_id != self.config.comp_id
        {
            return Err(ErrorKind::InvalidTargetCompId);
        }
        if msg.field(tags::ENCRYPT_METHOD) != Some("0")
        {
            return Err(ErrorKind::InvalidEncryptMethod);
        }
        if msg.field(tags::RESET_SEQ_NUM_FLAG) != Some("Y")
        {
            return Err(ErrorKind::ResetSeqNumRequired);
        }
        let heart_bt_int: u64 = msg.field(tags::HEART_BT_INT).and_then(|v| v.parse().ok()).unwrap_or(0);
        let min = self.config.logon_heartbeat_min.as_secs();
        let max = self.config.logon_heartbeat_max.as_secs();
        if heart_bt_int < min || heart_bt_int > max
        {
            return Err(ErrorKind::InvalidHeartBtInt);
        }
        Ok(())
    }

    fn handle_unexpected_while_pending(&mut self, _msg: FixMessage) -> ClientSessionOutcome
    {
        // Business traffic arriving before the router has answered the logon is ignored; the peer will either
        // get its `Logon` reply or be timed out via `user_response_deadline`.
        ClientSessionOutcome::none()
    }

    fn handle_ready(&mut self, mut msg: FixMessage) -> ClientSessionOutcome
    {
        match msg.msg_type
        {
            MsgType::Heartbeat =>
            {
                self.waiting_for_heartbeat = false;
                ClientSessionOutcome::none()
            }
            MsgType::TestRequest =>
            {
                let test_req_id = msg.field(tags::TEST_REQ_ID).unwrap_or_default().to_string();
                let mut heartbeat = FixMessage::new(MsgType::Heartbeat);
                heartbeat.set_field(tags::TEST_REQ_ID, test_req_id);
                ClientSessionOutcome::send(self.stamp(heartbeat))
            }
            MsgType::Logout =>
            {
                self.user_response_deadline = Some(self.last_activity + self.config.request_timeout);
                self.state = ClientSessionState::WaitingRemoveRoute;
                ClientSessionOutcome::event_only(ClientSessionEvent::LogoutRequested)
            }
            MsgType::TradingSessionStatusRequest =>
            {
                let reject = self.business_reject(msg.msg_type, ErrorKind::Unsupported);
                ClientSessionOutcome::send(reject)
            }
            _ if msg.msg_type.req_id_kind().is_some() || msg.msg_type.wants_party_injection() =>
            {
                if let Some(req_id) = msg.req_id()
                {
                    if !is_base64_web_safe(req_id)
                    {
                        let reject = self.business_reject(msg.msg_type, ErrorKind::InvalidReqId);
                        return ClientSessionOutcome::send(reject);
                    }
                }

                if matches!(msg.msg_type, MsgType::OrderCancelRequest | MsgType::OrderCancelReplaceRequest)
                {
                    if let Some(orig) = msg.field(tags::ORIG_CL_ORD_ID)
                    {
                        if !is_base64_web_safe(orig)
                        {
                            let reject = self.business_reject(msg.msg_type, ErrorKind::InvalidOrigClOrdId);
                            return ClientSessionOutcome::send(reject);
                        }
                    }
                }

                if msg.msg_type.wants_party_injection()
                {
                    if msg.has_party_ids()
                    {
                        let reject = self.business_reject(msg.msg_type, ErrorKind::UnsupportedPartyIds);
                        return ClientSessionOutcome::send(reject);
                    }
                    let party_id = self.party_id.clone().unwrap_or_default();
                    msg.inject_party(&party_id);
                }

                ClientSessionOutcome::event_only(ClientSessionEvent::Forward(msg))
            }
            _ =>
            {
                // opaque business message with no req-id/party semantics; pass through untouched.
                ClientSessionOutcome::event_only(ClientSessionEvent::Forward(msg))
            }
        }
    }

    fn handle_waiting_remove_route(&mut self) -> ClientSessionOutcome
    {
        // any business message while waiting for logoff confirmation is a zombie
        // transition, no fallthrough.
        self.state = ClientSessionState::Zombie;
        ClientSessionOutcome::event_only(Self::zombie_event().unwrap())
    }

    /// The router finished authenticating a [`ClientSessionEvent::LogonAttempt`] (WaitingCreateRoute
    /// row). `Ok(strategy_id)` completes the logon; `Err(kind)` rejects it.
    pub fn complete_logon(&mut self, result: Result<u32, ErrorKind>, now: Instant) -> ClientSessionOutcome
    {
        if self.state != ClientSessionState::WaitingCreateRoute { return ClientSessionOutcome::none(); }
        self.user_response_deadline = None;

        match result
        {
            Ok(strategy_id) =>
            {
                self.party_id = Some(strategy_id.to_string());
                self.state = ClientSessionState::Ready;
                self.last_activity = now;

                let mut logon = FixMessage::new(MsgType::Logon);
                logon.set_field(tags::ENCRYPT_METHOD, "0");
                logon.set_field(tags::HEART_BT_INT, self.config.heartbeat_freq.as_secs().to_string());
                logon.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");
                ClientSessionOutcome::send(self.stamp(logon))
            }
            Err(kind) =>
            {
                let logout = self.logout(kind.as_str());
                self.state = ClientSessionState::Zombie;
                ClientSessionOutcome::close_with_event(logout, Self::zombie_event().unwrap())
            }
        }
    }

    /// The router finished tearing down a [`ClientSessionEvent::LogoutRequested`].
    pub fn complete_logout(&mut self) -> ClientSessionOutcome
    {
        if self.state != ClientSessionState::WaitingRemoveRoute { return ClientSessionOutcome::none(); }

        let logout = self.logout(ErrorKind::Goodbye.as_str());
        self.state = ClientSessionState::Zombie;
        ClientSessionOutcome::close_with(logout)
    }

    /// A response (or unsolicited update) arrived from upstream, already translated back to this session's
    /// `client_id`. Delivered verbatim; `Ready`-state sessions are the only legal recipients.
    pub fn deliver(&mut self, msg: FixMessage) -> ClientSessionOutcome
    {
        if self.state != ClientSessionState::Ready { return ClientSessionOutcome::none(); }
        ClientSessionOutcome::send(self.stamp(msg))
    }

    /// 100 ms scheduler tick: logon timeout, heartbeat supervision, user-response timeout.
    pub fn on_tick(&mut self, now: Instant) -> ClientSessionOutcome
    {
        match self.state
        {
            ClientSessionState::WaitingLogon =>
            {
                if now >= self.logon_deadline
                {
                    self.state = ClientSessionState::Zombie;
                    return ClientSessionOutcome{
                        outbound: Vec::new(),
                        event: Self::zombie_event(),
                        close: true,
                    };
                }
                ClientSessionOutcome::none()
            }
            ClientSessionState::WaitingCreateRoute | ClientSessionState::WaitingRemoveRoute =>
            {
                let Some(deadline) = self.user_response_deadline else { return ClientSessionOutcome::none(); };
                if now < deadline { return ClientSessionOutcome::none(); }

                let logout = self.logout(ErrorKind::UserResponseTimeout.as_str());
                self.state = ClientSessionState::Zombie;
                ClientSessionOutcome::close_with_event(logout, Self::zombie_event().unwrap())
            }
            ClientSessionState::Ready =>
            {
                if now.duration_since(self.last_activity) < self.config.heartbeat_freq
                {
                    return ClientSessionOutcome::none();
                }

                if self.waiting_for_heartbeat
                {
                    let logout = self.logout(ErrorKind::MissingHeartbeat.as_str());
                    self.state = ClientSessionState::Zombie;
                    return ClientSessionOutcome::close_with_event(logout, Self::zombie_event().unwrap());
                }

                self.waiting_for_heartbeat = true;
                self.last_activity = now;
                ClientSessionOutcome::send(self.stamp(FixMessage::new(MsgType::TestRequest)))
            }
            ClientSessionState::Zombie => ClientSessionOutcome::none(),
        }
    }
}

fn realtime_now_millis() -> i64
{
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;
    use std::time::Duration;

    fn config() -> ClientConfig
    {
        ClientConfig{
            comp_id: "PROXY".to_string(),
            logon_heartbeat_min: Duration::from_secs(1),
            logon_heartbeat_max: Duration::from_secs(60),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn a_flood_of_inbound_frames_trips_the_rate_limiter_and_zombifies()
    {
        use crate::rate_limiter::RateLimitConfig;

        let now = Instant::now();
        let mut session = ClientSession::new(
            1,
            ClientConfig{ rate_limit: RateLimitConfig{ period: Duration::from_secs(3600), max_count: 2 }, ..config() },
            now,
        );

        session.on_message(valid_logon(), now);
        let mut heartbeat = FixMessage::new(MsgType::Heartbeat);
        heartbeat.header.msg_seq_num = 2;
        let outcome = session.on_message(heartbeat, now);

        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::RateLimited.as_str()));
    }

    fn valid_logon() -> FixMessage
    {
        let mut msg = FixMessage::new(MsgType::Logon);
        msg.header.msg_seq_num = 1;
        msg.header.target_comp_id = "PROXY".to_string();
        msg.set_field(tags::ENCRYPT_METHOD, "0");
        msg.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");
        msg.set_field(tags::HEART_BT_INT, "30");
        msg.set_field(tags::USERNAME, "alice");
        msg.set_field(tags::PASSWORD, "s3cret");
        msg
    }

    #[test]
    fn valid_logon_requests_auth_and_moves_to_waiting_create_route()
    {
        let now = Instant::now();
        let mut session = ClientSession::new(1, config(), now);
        let outcome = session.on_message(valid_logon(), now);

        assert_eq!(session.state(), ClientSessionState::WaitingCreateRoute);
        match outcome.event
        {
            Some(ClientSessionEvent::LogonAttempt{ username, .. }) => assert_eq!(username, "alice"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn bad_heartbeat_interval_is_rejected_and_zombified()
    {
        let now = Instant::now();
        let mut session = ClientSession::new(1, config(), now);
        let mut msg = valid_logon();
        msg.set_field(tags::HEART_BT_INT, "9999");

        let outcome = session.on_message(msg, now);
        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert!(outcome.close);
        assert_eq!(outcome.outbound[0].msg_type, MsgType::Reject);
    }

    #[test]
    fn non_logon_while_waiting_logon_is_rejected()
    {
        let now = Instant::now();
        let mut session = ClientSession::new(1, config(), now);
        let mut msg = FixMessage::new(MsgType::Heartbeat);
        msg.header.msg_seq_num = 1;

        let outcome = session.on_message(msg, now);
        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::NoLogon.as_str()));
    }

    #[test]
    fn logon_timeout_closes_connection_without_reply()
    {
        let now = Instant::now();
        let mut session = ClientSession::new(1, config(), now);
        let later = now + Duration::from_secs(3600);

        let outcome = session.on_tick(later);
        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert!(outcome.close);
        assert!(outcome.outbound.is_empty());
    }

    fn ready_session() -> (ClientSession, Instant)
    {
        let now = Instant::now();
        let mut session = ClientSession::new(1, config(), now);
        session.on_message(valid_logon(), now);
        session.complete_logon(Ok(42), now);
        (session, now)
    }

    #[test]
    fn ready_session_has_nonempty_party_id()
    {
        let (session, _) = ready_session();
        assert_eq!(session.state(), ClientSessionState::Ready);
        assert_eq!(session.party_id.as_deref(), Some("42"));
    }

    #[test]
    fn new_order_without_parties_gets_party_injected_and_forwarded()
    {
        let (mut session, now) = ready_session();
        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 2;
        order.set_field(tags::CL_ORD_ID, "abc_01");

        let outcome = session.on_message(order, now);
        match outcome.event
        {
            Some(ClientSessionEvent::Forward(msg)) =>
            {
                assert_eq!(msg.field(tags::PARTY_ID), Some("42"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn new_order_with_existing_parties_is_rejected()
    {
        let (mut session, now) = ready_session();
        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 2;
        order.set_field(tags::NO_PARTY_IDS, "1");
        order.set_field(tags::CL_ORD_ID, "abc_01");

        let outcome = session.on_message(order, now);
        assert!(outcome.event.is_none());
        assert_eq!(outcome.outbound[0].msg_type, MsgType::BusinessMessageReject);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::UnsupportedPartyIds.as_str()));
    }

    #[test]
    fn non_base64_req_id_is_rejected()
    {
        let (mut session, now) = ready_session();
        let mut request = FixMessage::new(MsgType::MarketDataRequest);
        request.header.msg_seq_num = 2;
        request.set_field(tags::MD_REQ_ID, "has spaces/slash");

        let outcome = session.on_message(request, now);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::InvalidReqId.as_str()));
    }

    #[test]
    fn trading_session_status_request_is_always_unsupported()
    {
        let (mut session, now) = ready_session();
        let mut request = FixMessage::new(MsgType::TradingSessionStatusRequest);
        request.header.msg_seq_num = 2;

        let outcome = session.on_message(request, now);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::Unsupported.as_str()));
    }

    #[test]
    fn missed_heartbeat_after_test_request_becomes_zombie()
    {
        let (mut session, now) = ready_session();
        let armed = now + Duration::from_secs(120);
        let outcome = session.on_tick(armed);
        assert_eq!(outcome.outbound[0].msg_type, MsgType::TestRequest);

        let later = armed + Duration::from_secs(120);
        let outcome = session.on_tick(later);
        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::MissingHeartbeat.as_str()));
    }

    #[test]
    fn logout_from_ready_waits_for_remove_route_then_zombifies()
    {
        let (mut session, now) = ready_session();
        let mut logout = FixMessage::new(MsgType::Logout);
        logout.header.msg_seq_num = 2;

        let outcome = session.on_message(logout, now);
        assert_eq!(session.state(), ClientSessionState::WaitingRemoveRoute);
        assert!(matches!(outcome.event, Some(ClientSessionEvent::LogoutRequested)));

        let outcome = session.complete_logout();
        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert!(outcome.close);
        assert_eq!(outcome.outbound[0].field(tags::TEXT), Some(ErrorKind::Goodbye.as_str()));
    }

    #[test]
    fn business_message_while_waiting_remove_route_is_zombie_with_no_fallthrough()
    {
        let (mut session, now) = ready_session();
        session.on_message(FixMessage::new(MsgType::Logout), now);

        let mut order = FixMessage::new(MsgType::NewOrderSingle);
        order.header.msg_seq_num = 3;
        let outcome = session.on_message(order, now);

        assert_eq!(session.state(), ClientSessionState::Zombie);
        assert!(matches!(outcome.event, Some(ClientSessionEvent::BecameZombie)));
    }
}

//-------------------------------------------------------------------------------------------------------------------
