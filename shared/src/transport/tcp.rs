//! TCP transport on tokio.
//!
//! Each connection gets a reader task and a writer task. The reader turns
//! length-prefixed frames into `TransportEvent`s on an unbounded channel;
//! the writer drains an unbounded channel of outgoing payloads. The
//! cooperative loop only ever calls `try_recv` and `send` on those channels,
//! so it never waits on the socket.
//!
//! A peer that stays silent for `DISCONNECT_TIMEOUT` is reported as
//! disconnected. Both ends send at 10 Hz once a session is up, so silence
//! that long means the peer is gone.

use super::{ClientTransport, ConnectionId, ServerTransport, TransportEvent};
use crate::error::TransportError;
use crate::framing::{read_frame, write_frame};
use crate::DISCONNECT_TIMEOUT;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

struct Link {
    events: UnboundedReceiver<TransportEvent>,
    outbound: UnboundedSender<Vec<u8>>,
    reader: JoinHandle<()>,
}

impl Link {
    fn spawn(stream: TcpStream, timeout: Duration) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(read_half, event_tx, timeout));
        tokio::spawn(write_loop(write_half, outbound_rx));

        Link {
            events,
            outbound,
            reader,
        }
    }
}

/// Reads frames until the stream ends, errors, or goes quiet, then reports
/// a single `Disconnect`.
async fn read_loop(
    read_half: OwnedReadHalf,
    events: UnboundedSender<TransportEvent>,
    timeout: Duration,
) {
    let mut reader = BufReader::new(read_half);
    loop {
        match tokio::time::timeout(timeout, read_frame(&mut reader)).await {
            Ok(Ok(payload)) => {
                if events.send(TransportEvent::Data(payload)).is_err() {
                    return;
                }
            }
            Ok(Err(e)) => {
                debug!("Connection closed: {}", e);
                break;
            }
            Err(_) => {
                warn!("No data for {:?}, dropping connection", timeout);
                break;
            }
        }
    }
    let _ = events.send(TransportEvent::Disconnect);
}

/// Writes queued payloads in order. Ends when the sending side is dropped,
/// after flushing whatever was already queued.
async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: UnboundedReceiver<Vec<u8>>) {
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = write_frame(&mut writer, &payload).await {
            debug!("Write failed: {}", e);
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn accept_loop(listener: TcpListener, incoming: UnboundedSender<Link>, timeout: Duration) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("Incoming connection from {}", peer);
                let _ = stream.set_nodelay(true);
                if incoming.send(Link::spawn(stream, timeout)).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

pub struct TcpServerTransport {
    local_addr: SocketAddr,
    incoming: UnboundedReceiver<Link>,
    links: HashMap<ConnectionId, Link>,
    next_id: u32,
    accept_task: JoinHandle<()>,
}

impl TcpServerTransport {
    /// Binds and starts accepting in the background. Must be called inside a
    /// tokio runtime.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_timeout(addr, DISCONNECT_TIMEOUT).await
    }

    pub async fn bind_with_timeout(addr: &str, timeout: Duration) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr)
                .await
                .map_err(|source| TransportError::BindFailure {
                    addr: addr.to_string(),
                    source,
                })?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (incoming_tx, incoming) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, incoming_tx, timeout));

        Ok(Self {
            local_addr,
            incoming,
            links: HashMap::new(),
            next_id: 0,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl ServerTransport for TcpServerTransport {
    fn accept(&mut self) -> Option<ConnectionId> {
        let link = self.incoming.try_recv().ok()?;
        let conn = ConnectionId(self.next_id);
        self.next_id += 1;
        self.links.insert(conn, link);
        Some(conn)
    }

    fn pop_event(&mut self, conn: ConnectionId) -> TransportEvent {
        let Some(link) = self.links.get_mut(&conn) else {
            return TransportEvent::Empty;
        };

        match link.events.try_recv() {
            Ok(TransportEvent::Disconnect) | Err(TryRecvError::Disconnected) => {
                self.links.remove(&conn);
                TransportEvent::Disconnect
            }
            Ok(event) => event,
            Err(TryRecvError::Empty) => TransportEvent::Empty,
        }
    }

    fn send(&mut self, conn: ConnectionId, payload: &[u8]) -> Result<(), TransportError> {
        let link = self
            .links
            .get(&conn)
            .ok_or(TransportError::NotConnected(conn))?;
        link.outbound
            .send(payload.to_vec())
            .map_err(|_| TransportError::NotConnected(conn))
    }

    fn is_live(&self, conn: ConnectionId) -> bool {
        self.links.contains_key(&conn)
    }

    fn disconnect(&mut self, conn: ConnectionId) {
        // Dropping the outbound sender lets the writer flush and close.
        if let Some(link) = self.links.remove(&conn) {
            link.reader.abort();
        }
    }
}

impl Drop for TcpServerTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
        for link in self.links.values() {
            link.reader.abort();
        }
    }
}

pub struct TcpClientTransport {
    events: UnboundedReceiver<TransportEvent>,
    outbound: Option<UnboundedSender<Vec<u8>>>,
    live: bool,
    task: JoinHandle<()>,
}

impl TcpClientTransport {
    /// Starts connecting to `addr` on `runtime` and returns immediately.
    /// The outcome arrives as a `Connect` or `Disconnect` event. Payloads
    /// sent before the connection is up are queued.
    pub fn connect(addr: impl Into<String>, runtime: &Handle) -> Self {
        Self::connect_with_timeout(addr, runtime, DISCONNECT_TIMEOUT)
    }

    pub fn connect_with_timeout(
        addr: impl Into<String>,
        runtime: &Handle,
        timeout: Duration,
    ) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_client(addr.into(), event_tx, outbound_rx, timeout));

        Self {
            events,
            outbound: Some(outbound),
            live: true,
            task,
        }
    }
}

async fn run_client(
    addr: String,
    events: UnboundedSender<TransportEvent>,
    outbound: UnboundedReceiver<Vec<u8>>,
    timeout: Duration,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to connect to {}: {}", addr, e);
            let _ = events.send(TransportEvent::Disconnect);
            return;
        }
    };
    let _ = stream.set_nodelay(true);
    if events.send(TransportEvent::Connect).is_err() {
        return;
    }

    let (read_half, write_half) = stream.into_split();
    tokio::spawn(write_loop(write_half, outbound));
    read_loop(read_half, events, timeout).await;
}

impl ClientTransport for TcpClientTransport {
    fn pop_event(&mut self) -> TransportEvent {
        if !self.live {
            return TransportEvent::Empty;
        }

        match self.events.try_recv() {
            Ok(TransportEvent::Disconnect) | Err(TryRecvError::Disconnected) => {
                self.live = false;
                self.outbound = None;
                TransportEvent::Disconnect
            }
            Ok(event) => event,
            Err(TryRecvError::Empty) => TransportEvent::Empty,
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound
            .send(payload.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn disconnect(&mut self) {
        self.live = false;
        // The writer flushes what is queued, then closes its half.
        self.outbound = None;
        self.task.abort();
    }
}

impl Drop for TcpClientTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}
