//! Event loop: a 100 ms tick, `SIGTERM`/`SIGINT` graceful shutdown, and dispatch of transport events into
//! the [`Router`] and [`RouterAction`]s back out to the transport's writer channels. Generalized from an
//! axum/tokio HTTP server loop into a plain tick+signal `select!` loop (the single-threaded cooperative model
//! maps onto a `current_thread` runtime).

//local shortcuts
use crate::authfeed::AuthFeedSource;
use crate::common::SessionId;
use crate::router::{Router, RouterAction};
use crate::transport::{self, TransportEvent};

//third-party shortcuts
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::interval;

//standard shortcuts
use std::collections::HashMap;
use std::time::{Duration, Instant};

//-------------------------------------------------------------------------------------------------------------------

const TICK: Duration = Duration::from_millis(100);

//-------------------------------------------------------------------------------------------------------------------

/// Drive `router` until `SIGTERM`/`SIGINT` arrives or the transport event channel closes. `auth_feed` is polled on
/// every tick alongside the server session and client manager.
pub async fn run(
    mut router: Router,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    mut auth_feed: Box<dyn AuthFeedSource + Send>,
) -> std::io::Result<()>
{
    let mut client_writers: HashMap<SessionId, mpsc::UnboundedSender<Vec<u8>>> = HashMap::new();
    let mut server_writer: Option<mpsc::UnboundedSender<Vec<u8>>> = None;
    let mut ticker = interval(TICK);
    let mut sigterm = signal(SignalKind::terminate())?;

    tracing::info!("scheduler started");

    loop
    {
        tokio::select! {
            _ = ticker.tick() =>
            {
                for event in auth_feed.poll() { event.apply(router.shared_mut()); }
                let actions = router.on_scheduler_tick(Instant::now());
                dispatch(actions, &mut client_writers, &mut server_writer);
            }
            _ = tokio::signal::ctrl_c() =>
            {
                tracing::info!("received SIGINT, stopping");
                break;
            }
            _ = sigterm.recv() =>
            {
                tracing::info!("received SIGTERM, stopping");
                break;
            }
            maybe_event = events.recv() =>
            {
                let Some(event) = maybe_event else { break; };
                let actions = handle_event(&mut router, event, &mut client_writers, &mut server_writer);
                dispatch(actions, &mut client_writers, &mut server_writer);
            }
        }
    }

    // `Stop` is dispatched once after the loop exits. There is no explicit draining protocol; once this
    // function returns, dropping `client_writers`/`server_writer` closes every socket, which is the proxy's entire
    // "suppress outbound traffic" story.
    tracing::info!("scheduler stopped");
    Ok(())
}

fn handle_event(
    router: &mut Router,
    event: TransportEvent,
    client_writers: &mut HashMap<SessionId, mpsc::UnboundedSender<Vec<u8>>>,
    server_writer: &mut Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> Vec<RouterAction>
{
    let now = Instant::now();
    match event
    {
        TransportEvent::ClientConnected{ writer, assign } =>
        {
            let session_id = router.allocate_session_id();
            client_writers.insert(session_id, writer);
            let _ = assign.send(session_id);
            router.on_client_connected(session_id, now);
            Vec::new()
        }
        TransportEvent::ClientMessage{ session_id, msg } => router.on_client_message(session_id, msg, now),
        TransportEvent::ClientDisconnected{ session_id } =>
        {
            client_writers.remove(&session_id);
            router.on_client_disconnected(session_id)
        }
        TransportEvent::ServerConnected{ writer } =>
        {
            *server_writer = Some(writer);
            router.on_server_connected(now)
        }
        TransportEvent::ServerMessage(msg) => router.on_server_message(msg, now),
        TransportEvent::ServerDisconnected =>
        {
            *server_writer = None;
            router.on_server_disconnected(now)
        }
    }
}

fn dispatch(
    actions: Vec<RouterAction>,
    client_writers: &mut HashMap<SessionId, mpsc::UnboundedSender<Vec<u8>>>,
    server_writer: &mut Option<mpsc::UnboundedSender<Vec<u8>>>,
)
{
    for action in actions
    {
        match action
        {
            RouterAction::ToClient{ session_id, msg } =>
            {
                if let Some(writer) = client_writers.get(&session_id)
                {
                    let _ = writer.send(transport::encode_message(&msg));
                }
            }
            RouterAction::ToServer(msg) =>
            {
                if let Some(writer) = server_writer.as_ref()
                {
                    let _ = writer.send(transport::encode_message(&msg));
                }
            }
            RouterAction::CloseClient{ session_id } =>
            {
                client_writers.remove(&session_id);
            }
        }
    }
}

//-------------------------------------------------------------------------------------------------------------------
