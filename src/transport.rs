//! TCP transport glue for the `fix-proxy` binary (the connection-manager piece, out of scope for the core
//! but supplied here so the proxy is an actually runnable program). No protocol or routing logic lives here: each
//! task only frames bytes off the wire into [`FixMessage`]s and ships them to the scheduler over a channel, or
//! writes already-encoded bytes back out.

//local shortcuts
use crate::codec;
use crate::common::SessionId;
use crate::message::FixMessage;

//third-party shortcuts
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

//standard shortcuts
use std::net::SocketAddr;
use std::time::Duration;

//-------------------------------------------------------------------------------------------------------------------

pub const BEGIN_STRING: &str = "FIX.4.4";

const INITIAL_RECONNECT_BACKOFF: Duration = Duration::from_millis(200);
const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

//-------------------------------------------------------------------------------------------------------------------

/// Events the transport layer hands to the scheduler, mirroring the `Read`/`Connected`/`Disconnected` callbacks
/// connection managers issuing `Read`/`Connected`/`Disconnected` callbacks into sessions.
pub enum TransportEvent
{
    /// A downstream peer connected. Session-id allocation stays with `Shared`, not the listener, so the accepting
    /// task waits on `assign` for the id the scheduler hands back before it starts reading frames.
    ClientConnected{ writer: mpsc::UnboundedSender<Vec<u8>>, assign: oneshot::Sender<SessionId> },
    ClientMessage{ session_id: SessionId, msg: FixMessage },
    ClientDisconnected{ session_id: SessionId },
    ServerConnected{ writer: mpsc::UnboundedSender<Vec<u8>> },
    ServerMessage(FixMessage),
    ServerDisconnected,
}

//-------------------------------------------------------------------------------------------------------------------

pub fn encode_message(msg: &FixMessage) -> Vec<u8>
{
    codec::encode(msg, BEGIN_STRING)
}

//-------------------------------------------------------------------------------------------------------------------

/// Bind `listen_address` and spawn one task per accepted connection for the lifetime of the listener.
pub async fn run_client_listener(
    listen_address: SocketAddr,
    decode_buffer_size: usize,
    events: mpsc::UnboundedSender<TransportEvent>,
) -> std::io::Result<()>
{
    let listener = TcpListener::bind(listen_address).await?;
    tracing::info!(%listen_address, "client listener bound");

    loop
    {
        let (stream, peer_addr) = listener.accept().await?;
        tracing::debug!(%peer_addr, "accepted downstream connection");
        let events = events.clone();
        tokio::spawn(async move { handle_client_connection(stream, decode_buffer_size, events).await });
    }
}

async fn handle_client_connection(
    stream: TcpStream,
    decode_buffer_size: usize,
    events: mpsc::UnboundedSender<TransportEvent>,
)
{
    let _ = stream.set_nodelay(true);
    let (read_half, mut write_half) = stream.into_split();
    let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (assign_tx, assign_rx) = oneshot::channel();

    if events.send(TransportEvent::ClientConnected{ writer: writer_tx, assign: assign_tx }).is_err() { return; }
    let Ok(session_id) = assign_rx.await else { return; };

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = writer_rx.recv().await
        {
            if write_half.write_all(&bytes).await.is_err() { break; }
        }
    });

    read_frames(read_half, decode_buffer_size, |msg| {
        let _ = events.send(TransportEvent::ClientMessage{ session_id, msg });
    })
    .await;

    let _ = events.send(TransportEvent::ClientDisconnected{ session_id });
    writer_task.abort();
}

//-------------------------------------------------------------------------------------------------------------------

/// Dial the upstream bridge, reconnecting with exponential backoff whenever the connection drops (
/// `always_reconnect = true`). Runs forever; intended to be spawned as its own task.
pub async fn run_server_dialer(
    upstream: SocketAddr,
    decode_buffer_size: usize,
    events: mpsc::UnboundedSender<TransportEvent>,
)
{
    let mut backoff = INITIAL_RECONNECT_BACKOFF;
    loop
    {
        match TcpStream::connect(upstream).await
        {
            Ok(stream) =>
            {
                tracing::info!(%upstream, "connected to upstream bridge");
                backoff = INITIAL_RECONNECT_BACKOFF;
                handle_server_connection(stream, decode_buffer_size, &events).await;
                if events.send(TransportEvent::ServerDisconnected).is_err() { return; }
            }
            Err(err) =>
            {
                tracing::warn!(%upstream, %err, "upstream connect failed, retrying");
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_RECONNECT_BACKOFF);
    }
}

async fn handle_server_connection(
    stream: TcpStream,
    decode_buffer_size: usize,
    events: &mpsc::UnboundedSender<TransportEvent>,
)
{
    let _ = stream.set_nodelay(true);
    let (read_half, mut write_half) = stream.into_split();
    let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    if events.send(TransportEvent::ServerConnected{ writer: writer_tx }).is_err() { return; }

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = writer_rx.recv().await
        {
            if write_half.write_all(&bytes).await.is_err() { break; }
        }
    });

    read_frames(read_half, decode_buffer_size, |msg| {
        let _ = events.send(TransportEvent::ServerMessage(msg));
    })
    .await;

    writer_task.abort();
}

//-------------------------------------------------------------------------------------------------------------------

/// Read off `reader` until EOF or error, decoding complete frames as they accumulate and calling `on_message` for
/// each one. Partial frames survive to the next read: "frame buffers drain after each
/// successful parse; partial frames survive to the next `Read`."
async fn read_frames<R, F>(mut reader: R, decode_buffer_size: usize, mut on_message: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(FixMessage),
{
    let mut buf: Vec<u8> = Vec::with_capacity(decode_buffer_size);
    let mut chunk = vec![0u8; decode_buffer_size];

    loop
    {
        let read = match reader.read(&mut chunk).await
        {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..read]);

        while let Some(end) = scan_frame_end(&buf)
        {
            let frame: Vec<u8> = buf.drain(..end).collect();
            match codec::decode(&frame)
            {
                Ok(msg) => on_message(msg),
                Err(err) =>
                {
                    tracing::warn!(?err, frame = %String::from_utf8_lossy(&frame), "dropping undecodable frame");
                }
            }
        }
    }
}

/// Locate the end (exclusive) of the first complete frame in `buf`, scanning for a `CheckSum` (10) field whose
/// three digits are followed by SOH and which starts either at the buffer's beginning or right after an SOH.
fn scan_frame_end(buf: &[u8]) -> Option<usize>
{
    let marker = b"10=";
    let mut start = 0usize;

    while let Some(rel) = find_subsequence(&buf[start..], marker)
    {
        let pos = start + rel;
        let starts_field = pos == 0 || buf[pos - 1] == codec::SOH;
        let value_start = pos + marker.len();

        if starts_field && buf.len() >= value_start + 4 && buf[value_start + 3] == codec::SOH
        {
            return Some(value_start + 4);
        }
        start = pos + marker.len();
    }
    None
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize>
{
    haystack.windows(needle.len()).position(|window| window == needle)
}

//-------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::message::{tags, MsgType};

    fn framed(cl_ord_id: &str) -> Vec<u8>
    {
        let mut msg = FixMessage::new(MsgType::NewOrderSingle);
        msg.header.sender_comp_id = "CLIENT".to_string();
        msg.header.target_comp_id = "PROXY".to_string();
        msg.set_field(tags::CL_ORD_ID, cl_ord_id);
        encode_message(&msg)
    }

    #[test]
    fn scan_frame_end_finds_exactly_one_frame_in_a_concatenated_pair()
    {
        let mut both = framed("abc_01");
        both.extend(framed("abc_02"));

        let first_end = scan_frame_end(&both).expect("first frame should be found");
        assert!(first_end < both.len());

        let first = codec::decode(&both[..first_end]).unwrap();
        assert_eq!(first.field(tags::CL_ORD_ID), Some("abc_01"));

        let second = codec::decode(&both[first_end..]).unwrap();
        assert_eq!(second.field(tags::CL_ORD_ID), Some("abc_02"));
    }

    #[test]
    fn scan_frame_end_returns_none_on_a_partial_frame()
    {
        let full = framed("abc_01");
        let partial = &full[..full.len() - 5];
        assert_eq!(scan_frame_end(partial), None);
    }
}

//-------------------------------------------------------------------------------------------------------------------
