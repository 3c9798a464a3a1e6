//! FIX 4.4 message model.
//!
//! The wire codec (see [`crate::codec`]) decodes a raw frame into a [`FixMessage`]: a header plus a closed
//! [`MsgType`] tag plus a field map for everything the proxy does not need typed access to. Session and router
//! logic reach into the field map only for the handful of tags this proxy actually interprets (sequence numbers,
//! comp ids, request ids, party ids, order state); every other tag rides through untouched.

//local shortcuts

//third-party shortcuts

//standard shortcuts
use std::collections::BTreeMap;

//-------------------------------------------------------------------------------------------------------------------

/// Well-known FIX 4.4 tag numbers used by proxy logic.
pub mod tags
{
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const MSG_TYPE: u32 = 35;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const SENDING_TIME: u32 = 52;
    pub const CHECK_SUM: u32 = 10;

    pub const ENCRYPT_METHOD: u32 = 98;
    pub const HEART_BT_INT: u32 = 108;
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    pub const NEXT_EXPECTED_MSG_SEQ_NUM: u32 = 789;
    pub const USERNAME: u32 = 553;
    pub const PASSWORD: u32 = 554;
    pub const RAW_DATA: u32 = 96;
    pub const RAW_DATA_LENGTH: u32 = 95;
    pub const TEST_REQ_ID: u32 = 112;
    pub const TEXT: u32 = 58;
    pub const SUBSCRIPTION_REQUEST_TYPE: u32 = 263;

    pub const REF_SEQ_NUM: u32 = 45;
    pub const REF_MSG_TYPE: u32 = 372;
    pub const SESSION_REJECT_REASON: u32 = 373;
    pub const BUSINESS_REJECT_REASON: u32 = 380;
    pub const BUSINESS_REJECT_REF_ID: u32 = 379;
    pub const REF_TAG_ID: u32 = 371;

    pub const SYMBOL: u32 = 55;
    pub const CL_ORD_ID: u32 = 11;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const ORD_STATUS: u32 = 39;
    pub const MASS_CANCEL_REQUEST_TYPE: u32 = 530;

    pub const NO_PARTY_IDS: u32 = 453;
    pub const PARTY_ID: u32 = 448;
    pub const PARTY_ID_SOURCE: u32 = 447;
    pub const PARTY_ROLE: u32 = 452;

    pub const SECURITY_REQ_ID: u32 = 320;
    pub const SECURITY_STATUS_REQ_ID: u32 = 324;
    pub const TRAD_SES_REQ_ID: u32 = 335;
    pub const MD_REQ_ID: u32 = 262;
    pub const ORD_STATUS_REQ_ID: u32 = 790;
    pub const MASS_STATUS_REQ_ID: u32 = 584;
    pub const POS_REQ_ID: u32 = 710;
    pub const TRADE_REQUEST_ID: u32 = 568;

    pub const USER_REQUEST_ID: u32 = 923;
    pub const USER_REQUEST_TYPE: u32 = 924;
    pub const USER_STATUS: u32 = 926;
    pub const USER_STATUS_TEXT: u32 = 927;
    pub const USERNAME_ECHO: u32 = 553;
}

//-------------------------------------------------------------------------------------------------------------------

/// Party identifier source used when the proxy injects its own party block.
///
/// "Proprietary/Custom code" per the FIX 4.4 `PartyIDSource` (448/447) value set.
pub const PARTY_ID_SOURCE_PROPRIETARY_CUSTOM_CODE: &str = "D";

/// Party role used when the proxy injects its own party block ("Client ID").
pub const PARTY_ROLE_CLIENT_ID: &str = "3";

//-------------------------------------------------------------------------------------------------------------------

/// The closed set of message types this proxy understands, per the wire protocol surface.
///
/// Anything decoded with an unrecognized `MsgType` (35) value becomes [`MsgType::Other`] and is treated as an
/// opaque business message: forwarded without req-id translation, and the proxy does not interpret its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MsgType
{
    Logon,
    Logout,
    Heartbeat,
    TestRequest,
    ResendRequest,
    Reject,
    BusinessMessageReject,
    UserRequest,
    UserResponse,
    SecurityListRequest,
    SecurityList,
    SecurityDefinitionRequest,
    SecurityDefinition,
    SecurityStatusRequest,
    SecurityStatus,
    TradingSessionStatusRequest,
    TradingSessionStatus,
    MarketDataRequest,
    MarketDataRequestReject,
    MarketDataSnapshotFullRefresh,
    MarketDataIncrementalRefresh,
    NewOrderSingle,
    OrderCancelRequest,
    OrderCancelReplaceRequest,
    OrderMassCancelRequest,
    OrderMassCancelReport,
    OrderStatusRequest,
    OrderMassStatusRequest,
    ExecutionReport,
    OrderCancelReject,
    RequestForPositions,
    RequestForPositionsAck,
    PositionReport,
    TradeCaptureReportRequest,
    TradeCaptureReportRequestAck,
    TradeCaptureReport,
    MassQuote,
    MassQuoteAck,
    QuoteCancel,
    QuoteStatusReport,
    /// Any other recognized-by-the-exchange but proxy-opaque business message.
    Other,
}

impl MsgType
{
    /// The FIX 4.4 wire value for this message type (tag 35).
    pub fn as_wire(self) -> &'static str
    {
        match self
        {
            MsgType::Logon => "A",
            MsgType::Logout => "5",
            MsgType::Heartbeat => "0",
            MsgType::TestRequest => "1",
            MsgType::ResendRequest => "2",
            MsgType::Reject => "3",
            MsgType::BusinessMessageReject => "j",
            MsgType::UserRequest => "BE",
            MsgType::UserResponse => "BF",
            MsgType::SecurityListRequest => "x",
            MsgType::SecurityList => "y",
            MsgType::SecurityDefinitionRequest => "c",
            MsgType::SecurityDefinition => "d",
            MsgType::SecurityStatusRequest => "e",
            MsgType::SecurityStatus => "f",
            MsgType::TradingSessionStatusRequest => "g",
            MsgType::TradingSessionStatus => "h",
            MsgType::MarketDataRequest => "V",
            MsgType::MarketDataRequestReject => "Y",
            MsgType::MarketDataSnapshotFullRefresh => "W",
            MsgType::MarketDataIncrementalRefresh => "X",
            MsgType::NewOrderSingle => "D",
            MsgType::OrderCancelRequest => "F",
            MsgType::OrderCancelReplaceRequest => "G",
            MsgType::OrderMassCancelRequest => "q",
            MsgType::OrderMassCancelReport => "r",
            MsgType::OrderStatusRequest => "H",
            MsgType::OrderMassStatusRequest => "AF",
            MsgType::ExecutionReport => "8",
            MsgType::OrderCancelReject => "9",
            MsgType::RequestForPositions => "AN",
            MsgType::RequestForPositionsAck => "AO",
            MsgType::PositionReport => "AP",
            MsgType::TradeCaptureReportRequest => "AD",
            MsgType::TradeCaptureReportRequestAck => "AQ",
            MsgType::TradeCaptureReport => "AE",
            MsgType::MassQuote => "i",
            MsgType::MassQuoteAck => "b",
            MsgType::QuoteCancel => "Z",
            MsgType::QuoteStatusReport => "AI",
            MsgType::Other => "",
        }
    }

    /// Parse a tag-35 wire value. Unrecognized values yield `Ok(MsgType::Other)`, not an error, since the proxy
    /// must be able to forward business messages it doesn't interpret.
    pub fn from_wire(value: &str) -> MsgType
    {
        match value
        {
            "A" => MsgType::Logon,
            "5" => MsgType::Logout,
            "0" => MsgType::Heartbeat,
            "1" => MsgType::TestRequest,
            "2" => MsgType::ResendRequest,
            "3" => MsgType::Reject,
            "j" => MsgType::BusinessMessageReject,
            "BE" => MsgType::UserRequest,
            "BF" => MsgType::UserResponse,
            "x" => MsgType::SecurityListRequest,
            "y" => MsgType::SecurityList,
            "c" => MsgType::SecurityDefinitionRequest,
            "d" => MsgType::SecurityDefinition,
            "e" => MsgType::SecurityStatusRequest,
            "f" => MsgType::SecurityStatus,
            "g" => MsgType::TradingSessionStatusRequest,
            "h" => MsgType::TradingSessionStatus,
            "V" => MsgType::MarketDataRequest,
            "Y" => MsgType::MarketDataRequestReject,
            "W" => MsgType::MarketDataSnapshotFullRefresh,
            "X" => MsgType::MarketDataIncrementalRefresh,
            "D" => MsgType::NewOrderSingle,
            "F" => MsgType::OrderCancelRequest,
            "G" => MsgType::OrderCancelReplaceRequest,
            "q" => MsgType::OrderMassCancelRequest,
            "r" => MsgType::OrderMassCancelReport,
            "H" => MsgType::OrderStatusRequest,
            "AF" => MsgType::OrderMassStatusRequest,
            "8" => MsgType::ExecutionReport,
            "9" => MsgType::OrderCancelReject,
            "AN" => MsgType::RequestForPositions,
            "AO" => MsgType::RequestForPositionsAck,
            "AP" => MsgType::PositionReport,
            "AD" => MsgType::TradeCaptureReportRequest,
            "AQ" => MsgType::TradeCaptureReportRequestAck,
            "AE" => MsgType::TradeCaptureReport,
            "i" => MsgType::MassQuote,
            "b" => MsgType::MassQuoteAck,
            "Z" => MsgType::QuoteCancel,
            "AI" => MsgType::QuoteStatusReport,
            _ => MsgType::Other,
        }
    }

    /// The request-id kind this message type carries, if any.
    pub fn req_id_kind(self) -> Option<crate::ids::RequestIdKind>
    {
        use crate::ids::RequestIdKind::*;
        match self
        {
            MsgType::SecurityListRequest | MsgType::SecurityList => Some(SecurityReqId),
            MsgType::SecurityStatusRequest | MsgType::SecurityStatus => Some(SecurityStatusReqId),
            MsgType::TradingSessionStatusRequest | MsgType::TradingSessionStatus => Some(TradSesReqId),
            MsgType::MarketDataRequest
            | MsgType::MarketDataRequestReject
            | MsgType::MarketDataSnapshotFullRefresh
            | MsgType::MarketDataIncrementalRefresh => Some(MdReqId),
            MsgType::OrderStatusRequest => Some(OrdStatusReqId),
            MsgType::OrderMassStatusRequest => Some(MassStatusReqId),
            MsgType::RequestForPositions | MsgType::RequestForPositionsAck | MsgType::PositionReport => {
                Some(PosReqId)
            }
            MsgType::TradeCaptureReportRequest
            | MsgType::TradeCaptureReportRequestAck
            | MsgType::TradeCaptureReport => Some(TradeRequestId),
            MsgType::NewOrderSingle
            | MsgType::OrderCancelRequest
            | MsgType::OrderCancelReplaceRequest
            | MsgType::ExecutionReport
            | MsgType::OrderCancelReject => Some(ClOrdId),
            MsgType::OrderMassCancelRequest | MsgType::OrderMassCancelReport => Some(MassCancelClOrdId),
            _ => None,
        }
    }

    /// Whether this message type requires party-id injection when the proxy forwards it upstream.
    pub fn wants_party_injection(self) -> bool
    {
        matches!(
            self,
            MsgType::NewOrderSingle
                | MsgType::OrderCancelRequest
                | MsgType::OrderCancelReplaceRequest
                | MsgType::OrderMassCancelRequest
                | MsgType::OrderStatusRequest
                | MsgType::OrderMassStatusRequest
                | MsgType::RequestForPositions
                | MsgType::TradeCaptureReportRequest
        )
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// Standard FIX header fields common to every message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header
{
    pub msg_seq_num: u64,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    /// `SendingTime` (52), UTC milliseconds since epoch.
    pub sending_time: i64,
}

//-------------------------------------------------------------------------------------------------------------------

/// A decoded FIX message: a typed header and message type, plus every body field keyed by tag.
///
/// Fields the proxy rewrites (req-ids, party blocks) are read and written through the `tags` constants; everything
/// else passes through the `fields` map untouched on forward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixMessage
{
    pub header: Header,
    pub msg_type: MsgType,
    pub fields: BTreeMap<u32, String>,
}

impl Default for MsgType
{
    fn default() -> Self { MsgType::Other }
}

impl FixMessage
{
    pub fn new(msg_type: MsgType) -> Self
    {
        Self{ header: Header::default(), msg_type, fields: BTreeMap::new() }
    }

    pub fn field(&self, tag: u32) -> Option<&str>
    {
        self.fields.get(&tag).map(String::as_str)
    }

    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) -> &mut Self
    {
        self.fields.insert(tag, value.into());
        self
    }

    pub fn remove_field(&mut self, tag: u32) -> Option<String>
    {
        self.fields.remove(&tag)
    }

    /// Read the request-id field appropriate to this message's `req_id_kind`, if any.
    pub fn req_id(&self) -> Option<&str>
    {
        let tag = self.msg_type.req_id_kind()?.tag();
        self.field(tag)
    }

    pub fn set_req_id(&mut self, value: impl Into<String>) -> Option<&mut Self>
    {
        let tag = self.msg_type.req_id_kind()?.tag();
        Some(self.set_field(tag, value))
    }

    /// `OrdStatus` (39), present on `ExecutionReport`.
    pub fn ord_status(&self) -> Option<OrdStatus>
    {
        self.field(tags::ORD_STATUS).and_then(OrdStatus::from_wire)
    }

    /// Whether the request carries its own `NoPartyIDs` (453) block (any count, including zero written explicitly).
    pub fn has_party_ids(&self) -> bool
    {
        self.field(tags::NO_PARTY_IDS).is_some()
    }

    /// Inject a single-element party block identifying `party_id` as the proxy's own client identifier.
    pub fn inject_party(&mut self, party_id: &str)
    {
        self.set_field(tags::NO_PARTY_IDS, "1");
        self.set_field(tags::PARTY_ID, party_id);
        self.set_field(tags::PARTY_ID_SOURCE, PARTY_ID_SOURCE_PROPRIETARY_CUSTOM_CODE);
        self.set_field(tags::PARTY_ROLE, PARTY_ROLE_CLIENT_ID);
    }
}

//-------------------------------------------------------------------------------------------------------------------

/// `OrdStatus` (39) value set, restricted to the values this proxy needs to recognize (terminal vs. open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdStatus
{
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Replaced,
    PendingCancel,
    Rejected,
    Suspended,
    PendingNew,
    Expired,
    DoneForDay,
    CalculatedCanceled,
    Other(char),
}

impl OrdStatus
{
    pub fn from_wire(value: &str) -> Option<Self>
    {
        let c = value.chars().next()?;
        Some(match c
        {
            '0' => OrdStatus::New,
            '1' => OrdStatus::PartiallyFilled,
            '2' => OrdStatus::Filled,
            '4' => OrdStatus::Canceled,
            '5' => OrdStatus::Replaced,
            '6' => OrdStatus::PendingCancel,
            '8' => OrdStatus::Rejected,
            '9' => OrdStatus::Suspended,
            'A' => OrdStatus::PendingNew,
            'C' => OrdStatus::Expired,
            '3' => OrdStatus::DoneForDay,
            'D' => OrdStatus::CalculatedCanceled,
            other => OrdStatus::Other(other),
        })
    }

    /// Terminal statuses release the order's `cl_ord_id` mapping once observed.
    pub fn is_terminal(self) -> bool
    {
        matches!(
            self,
            OrdStatus::Filled
                | OrdStatus::Canceled
                | OrdStatus::Rejected
                | OrdStatus::Expired
                | OrdStatus::DoneForDay
                | OrdStatus::CalculatedCanceled
        )
    }
}

//-------------------------------------------------------------------------------------------------------------------
