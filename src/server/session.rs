//! The single upstream FIX session. A singleton: there is exactly one per proxy process (no support for more than
//! one upstream bridge).
//!
//! Sessions never hold a reference back into the [`crate::router::Router`] that drives them: rather than a
//! callback pointer the router would have to alias mutably, every `on_*` method returns the outbound frames
//! and/or event the router needs to act on.

//local shortcuts
use crate::errors::{ErrorKind, ProtocolError};
use crate::message::{tags, FixMessage, MsgType};
use crate::server::config::ServerConfig;

//third-party shortcuts

//standard shortcuts
use std::time::Instant;

//-------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSessionState
{
    Disconnected,
    LogonSent,
    Ready,
}

//-------------------------------------------------------------------------------------------------------------------

/// Something the router must react to as a result of driving the server session.
#[derive(Debug, Clone)]
pub enum ServerSessionEvent
{
    /// The upstream logon handshake completed; the router may start forwarding client requests.
    Ready,
    /// The upstream connection is gone (either end hung up, or we received `Logout`); any `Ready` downstream
    /// session must be force-disconnected and told to log on again.
    Disconnected,
}

//-------------------------------------------------------------------------------------------------------------------

/// Outbound frames plus an optional event, returned by every driving method.
#[derive(Debug, Clone, Default)]
pub struct ServerSessionOutcome
{
    pub outbound: Vec<FixMessage>,
    pub event: Option<ServerSessionEvent>,
}

impl ServerSessionOutcome
{
    fn send(msg: FixMessage) -> Self { Self{ outbound: vec![msg], event: None } }
    fn event(event: ServerSessionEvent) -> Self { Self{ outbound: Vec::new(), event: Some(event) } }
    fn send_and_event(msg: FixMessage, event: ServerSessionEvent) -> Self
    {
        Self{ outbound: vec![msg], event: Some(event) }
    }
    fn none() -> Self { Self::default() }
}

//-------------------------------------------------------------------------------------------------------------------

pub struct ServerSession
{
    config: ServerConfig,
    state: ServerSessionState,
    inbound_seq: u64,
    outbound_seq: u64,
    last_activity: Instant,
    waiting_for_heartbeat: bool,
}

impl ServerSession
{
    pub fn new(config: ServerConfig) -> Self
    {
        Self{
            config,
            state: ServerSessionState::Disconnected,
            inbound_seq: 0,
            outbound_seq: 0,
            last_activity: Instant::now(),
            waiting_for_heartbeat: false,
        }
    }

    pub fn state(&self) -> ServerSessionState { self.state }

    pub fn is_ready(&self) -> bool { self.state == ServerSessionState::Ready }

    fn stamp(&mut self, mut msg: FixMessage) -> FixMessage
    {
        self.outbound_seq += 1;
        msg.header.msg_seq_num = self.outbound_seq;
        msg.header.sender_comp_id = self.config.sender_comp_id.clone();
        msg.header.target_comp_id = self.config.target_comp_id.clone();
        msg.header.sending_time = realtime_now_millis();
        self.trace("out", &msg);
        msg
    }

    /// `--server.debug`: log every frame exchanged with the upstream bridge at debug level.
    fn trace(&self, direction: &'static str, msg: &FixMessage)
    {
        if self.config.debug
        {
            tracing::debug!(direction, msg_type = ?msg.msg_type, seq = msg.header.msg_seq_num, "upstream fix frame");
        }
    }

    /// The underlying TCP connection completed: `Disconnected` -> `LogonSent`.
    pub fn on_connected(&mut self) -> ServerSessionOutcome
    {
        self.inbound_seq = 0;
        self.outbound_seq = 0;
        self.last_activity = Instant::now();
        self.waiting_for_heartbeat = false;

        let mut logon = FixMessage::new(MsgType::Logon);
        logon.set_field(tags::ENCRYPT_METHOD, "0");
        logon.set_field(tags::HEART_BT_INT, self.config.ping_freq.as_secs().to_string());
        logon.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");
        logon.set_field(tags::NEXT_EXPECTED_MSG_SEQ_NUM, (self.inbound_seq + 1).to_string());
        logon.set_field(tags::USERNAME, self.config.username.clone());
        logon.set_field(tags::PASSWORD, self.config.password.clone());

        self.state = ServerSessionState::LogonSent;
        let logon = self.stamp(logon);
        ServerSessionOutcome::send(logon)
    }

    /// The underlying TCP connection dropped; emit `Disconnected` to the router and reset counters.
    pub fn on_disconnected(&mut self) -> ServerSessionOutcome
    {
        self.state = ServerSessionState::Disconnected;
        self.inbound_seq = 0;
        self.outbound_seq = 0;
        ServerSessionOutcome::event(ServerSessionEvent::Disconnected)
    }

    /// An inbound frame arrived from the bridge. Sequence-number gaps/replays are logged but never recovered.
    pub fn on_message(&mut self, msg: FixMessage) -> ServerSessionOutcome
    {
        self.trace("in", &msg);
        if msg.header.msg_seq_num != self.inbound_seq + 1
        {
            tracing::warn!(
                expected = self.inbound_seq + 1,
                got = msg.header.msg_seq_num,
                "server session sequence gap/replay"
            );
        }
        self.inbound_seq = msg.header.msg_seq_num;
        self.last_activity = Instant::now();

        match (self.state, msg.msg_type)
        {
            (ServerSessionState::LogonSent, MsgType::Logon) =>
            {
                self.state = ServerSessionState::Ready;
                ServerSessionOutcome::event(ServerSessionEvent::Ready)
            }
            (ServerSessionState::Ready, MsgType::TestRequest) =>
            {
                let test_req_id = msg.field(tags::TEST_REQ_ID).unwrap_or_default().to_string();
                let mut heartbeat = FixMessage::new(MsgType::Heartbeat);
                heartbeat.set_field(tags::TEST_REQ_ID, test_req_id);
                ServerSessionOutcome::send(self.stamp(heartbeat))
            }
            (ServerSessionState::Ready, MsgType::Heartbeat) =>
            {
                self.waiting_for_heartbeat = false;
                ServerSessionOutcome::none()
            }
            (ServerSessionState::Ready, MsgType::Logout) =>
            {
                let response = self.stamp(FixMessage::new(MsgType::Logout));
                self.state = ServerSessionState::Disconnected;
                ServerSessionOutcome::send_and_event(response, ServerSessionEvent::Disconnected)
            }
            (ServerSessionState::Ready, _) =>
            {
                // business message; the router inspects `msg` directly rather than via this outcome
                ServerSessionOutcome::none()
            }
            (state, msg_type) =>
            {
                tracing::warn!(?state, ?msg_type, "unexpected message on server session, ignoring");
                ServerSessionOutcome::none()
            }
        }
    }

    /// 100 ms scheduler tick. Drives `ping_freq` heartbeat supervision.
    pub fn on_tick(&mut self, now: Instant) -> ServerSessionOutcome
    {
        if self.state != ServerSessionState::Ready { return ServerSessionOutcome::none(); }

        if now.duration_since(self.last_activity) < self.config.ping_freq
        {
            return ServerSessionOutcome::none();
        }

        if self.waiting_for_heartbeat
        {
            tracing::warn!("upstream bridge missed heartbeat, treating as disconnected");
            self.state = ServerSessionState::Disconnected;
            self.waiting_for_heartbeat = false;
            return ServerSessionOutcome::event(ServerSessionEvent::Disconnected);
        }

        self.waiting_for_heartbeat = true;
        self.last_activity = now;
        ServerSessionOutcome::send(self.stamp(FixMessage::new(MsgType::TestRequest)))
    }

    /// Forward an already-translated client request upstream. Fails with [`ProtocolError::NotReady`] while the
    /// session is not `Ready`.
    pub fn forward(&mut self, msg: FixMessage) -> Result<FixMessage, ProtocolError>
    {
        if self.state != ServerSessionState::Ready
        {
            return Err(ProtocolError::Rejected(ErrorKind::NotReady));
        }
        Ok(self.stamp(msg))
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


//-------------------------------------------------------------------------------------------------------------------
