//! End-to-end scenario coverage (happy-path logon/order, bad credentials, upstream reconnect, duplicate logon,
//! logon timeout, terminal order-id release), driven purely through the public `Router` API — no internal
//! fields touched (no `#[tokio::test]`: the core engine has no I/O of its own, so plain function calls exercise
//! it).

use fix_order_proxy::config::{SymbolAllowList, UserRecord, UserTable};
use fix_order_proxy::message::tags;
use fix_order_proxy::router::{Router, RouterAction, RouterConfig};
use fix_order_proxy::shared::Shared;
use fix_order_proxy::{ClientConfig, ErrorKind, FixMessage, MsgType, ServerConfig};

use std::time::{Duration, Instant};

fn router_with_alice() -> Router
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
    Router::new(shared, ClientConfig::default(), ServerConfig::default(), RouterConfig::default(), Instant::now())
}

fn logon(username: &str, password: &str, component: &str, seq: u64) -> FixMessage
{
    let mut msg = FixMessage::new(MsgType::Logon);
    msg.header.msg_seq_num = seq;
    msg.header.sender_comp_id = component.to_string();
    msg.header.target_comp_id = "PROXY".to_string();
    msg.set_field(tags::ENCRYPT_METHOD, "0");
    msg.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");
    msg.set_field(tags::HEART_BT_INT, "30");
    msg.set_field(tags::USERNAME, username);
    msg.set_field(tags::PASSWORD, password);
    msg
}

fn bring_upstream_ready(router: &mut Router, now: Instant)
{
    router.on_server_connected(now);
    let mut reply = FixMessage::new(MsgType::Logon);
    reply.header.msg_seq_num = 1;
    router.on_server_message(reply, now);
}

fn to_client_logon(actions: &[RouterAction]) -> Option<&FixMessage>
{
    actions.iter().find_map(|a| match a
    {
        RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::Logon => Some(msg),
        _ => None,
    })
}

fn to_client_logout(actions: &[RouterAction], session_id: u64) -> Option<&FixMessage>
{
    actions.iter().find_map(|a| match a
    {
        RouterAction::ToClient{ session_id: s, msg } if *s == session_id && msg.msg_type == MsgType::Logout => {
            Some(msg)
        }
        _ => None,
    })
}

fn closed(actions: &[RouterAction], session_id: u64) -> bool
{
    actions.iter().any(|a| matches!(a, RouterAction::CloseClient{ session_id: s } if *s == session_id))
}

//-------------------------------------------------------------------------------------------------------------------

#[test]
fn s1_happy_path_order_round_trips_through_both_translation_directions()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);
    let actions = router.on_client_message(1, logon("alice", "s3cret", "ALICE_CO", 1), now);
    assert!(to_client_logon(&actions).is_some());

    let mut order = FixMessage::new(MsgType::NewOrderSingle);
    order.header.msg_seq_num = 2;
    order.set_field(tags::CL_ORD_ID, "abc_01");
    let actions = router.on_client_message(1, order, now);

    let upstream = actions
        .iter()
        .find_map(|a| match a { RouterAction::ToServer(msg) => Some(msg.clone()), _ => None })
        .expect("order forwarded upstream");
    let server_cl_ord_id = upstream.field(tags::CL_ORD_ID).unwrap().to_string();
    assert!(server_cl_ord_id.starts_with("proxy-"));
    assert_eq!(upstream.field(tags::PARTY_ID), Some("42"));

    let mut exec = FixMessage::new(MsgType::ExecutionReport);
    exec.header.msg_seq_num = 2;
    exec.set_field(tags::CL_ORD_ID, server_cl_ord_id);
    exec.set_field(tags::ORD_STATUS, "0"); // New
    let actions = router.on_server_message(exec, now);

    let delivered = actions
        .iter()
        .find_map(|a| match a { RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::ExecutionReport => Some(msg), _ => None })
        .expect("execution report delivered downstream");
    assert_eq!(delivered.field(tags::CL_ORD_ID), Some("abc_01"));
}

#[test]
fn s2_invalid_credentials_are_rejected_and_the_session_closes()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);
    let actions = router.on_client_message(1, logon("alice", "wrong", "ALICE_CO", 1), now);

    let logout = to_client_logout(&actions, 1).expect("invalid password should be rejected");
    assert_eq!(logout.field(tags::TEXT), Some(ErrorKind::InvalidPassword.as_str()));
    assert!(closed(&actions, 1));
}

#[test]
fn s3_upstream_disconnect_force_closes_every_ready_client()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);
    router.on_client_message(1, logon("alice", "s3cret", "ALICE_CO", 1), now);

    let actions = router.on_server_disconnected(now);
    assert!(closed(&actions, 1));
}

#[test]
fn s4_duplicate_login_rejects_the_second_session_and_leaves_the_first_alone()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);
    let first = router.on_client_message(1, logon("alice", "s3cret", "ALICE_CO", 1), now);
    assert!(to_client_logon(&first).is_some());

    router.on_client_connected(2, now);
    let second = router.on_client_message(2, logon("alice", "s3cret", "ALICE_CO", 1), now);

    let logout = to_client_logout(&second, 2).expect("second session should be rejected");
    assert_eq!(logout.field(tags::TEXT), Some(ErrorKind::AlreadyLoggedOn.as_str()));
    assert!(closed(&second, 2));
    assert!(!closed(&second, 1));
}

#[test]
fn s5_logon_timeout_closes_the_connection_without_emitting_anything_downstream()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);

    let past_timeout = now + ClientConfig::default().logon_timeout + Duration::from_millis(1);
    let actions = router.on_scheduler_tick(past_timeout);

    assert!(closed(&actions, 1));
    assert!(actions.iter().all(|a| !matches!(a, RouterAction::ToClient{ .. })));
}

#[test]
fn s6_terminal_execution_report_frees_the_cl_ord_id_so_a_later_cancel_is_unknown_order()
{
    let mut router = router_with_alice();
    let now = Instant::now();
    bring_upstream_ready(&mut router, now);

    router.on_client_connected(1, now);
    router.on_client_message(1, logon("alice", "s3cret", "ALICE_CO", 1), now);

    let mut order = FixMessage::new(MsgType::NewOrderSingle);
    order.header.msg_seq_num = 2;
    order.set_field(tags::CL_ORD_ID, "abc_01");
    let actions = router.on_client_message(1, order, now);
    let server_cl_ord_id = actions
        .iter()
        .find_map(|a| match a { RouterAction::ToServer(msg) => msg.field(tags::CL_ORD_ID).map(str::to_string), _ => None })
        .unwrap();

    let mut exec = FixMessage::new(MsgType::ExecutionReport);
    exec.header.msg_seq_num = 2;
    exec.set_field(tags::CL_ORD_ID, server_cl_ord_id);
    exec.set_field(tags::ORD_STATUS, "2"); // Filled
    router.on_server_message(exec, now);

    let mut cancel = FixMessage::new(MsgType::OrderCancelRequest);
    cancel.header.msg_seq_num = 3;
    cancel.set_field(tags::CL_ORD_ID, "abc_02");
    cancel.set_field(tags::ORIG_CL_ORD_ID, "abc_01");
    let actions = router.on_client_message(1, cancel, now);

    let reject = actions
        .iter()
        .find_map(|a| match a { RouterAction::ToClient{ msg, .. } if msg.msg_type == MsgType::BusinessMessageReject => Some(msg), _ => None })
        .expect("cancel referencing a freed cl_ord_id should be rejected");
    assert_eq!(reject.field(tags::TEXT), Some(ErrorKind::UnknownOrder.as_str()));
}
