//! Multi-tenant RADIUS server over UDP and TCP.
//!
//! A [`Server`] owns per-peer [`Secrets`] and [`Dictionaries`] registries
//! keyed by the canonical peer IP literal, a code→handler map, and one
//! receive path shared between the transports: Accounting-Request
//! authenticity pre-check, decode against the peer's secret and
//! dictionary, then a spawned handler task per request.

use dashmap::DashMap;
use radius_proto::auth;
use radius_proto::{Coder, Dictionary, Packet, PacketCode, MAX_PACKET_LEN};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reserved registry key matched when no peer-specific entry exists.
pub const META_DEFAULT: &str = "*default";

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("unsupported network: <{0}>")]
    UnsupportedNetwork(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Packet(#[from] radius_proto::PacketError),
}

/// Error type handlers may return; it is flattened into the Reply-Message
/// of a negative reply.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Option<Packet>, HandlerError>> + Send>>;

/// Asynchronous per-code request handler.
///
/// Returning `Ok(None)` sends nothing (logged as a warning); an error is
/// converted into the request's negative reply.
pub type RequestHandler = Arc<dyn Fn(Packet) -> HandlerFuture + Send + Sync>;

/// Wraps an async function as a [`RequestHandler`].
pub fn handler_fn<F, Fut>(f: F) -> RequestHandler
where
    F: Fn(Packet) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Packet>, HandlerError>> + Send + 'static,
{
    Arc::new(move |pkt| Box::pin(f(pkt)))
}

/// The canonical peer identifier of a remote address: the bare IP literal,
/// without port or IPv6 brackets.
pub fn peer_identifier(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

/// Shared secrets keyed by peer identifier, with a `*default` fallback.
#[derive(Debug, Default)]
pub struct Secrets {
    secrets: DashMap<String, String>,
}

impl Secrets {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Secrets {
            secrets: secrets.into_iter().collect(),
        }
    }

    /// The secret for a peer, falling back to `*default`, then to the
    /// empty string.
    pub fn get(&self, instance_id: &str) -> String {
        self.secrets
            .get(instance_id)
            .or_else(|| self.secrets.get(META_DEFAULT))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Inserts or replaces the secret for a peer.
    pub fn set(&self, instance_id: impl Into<String>, secret: impl Into<String>) {
        self.secrets.insert(instance_id.into(), secret.into());
    }
}

/// Dictionaries keyed by peer identifier, with a `*default` fallback.
#[derive(Debug, Default)]
pub struct Dictionaries {
    dicts: DashMap<String, Arc<Dictionary>>,
}

impl Dictionaries {
    pub fn new(dicts: HashMap<String, Arc<Dictionary>>) -> Self {
        Dictionaries {
            dicts: dicts.into_iter().collect(),
        }
    }

    /// The dictionary for a peer, falling back to `*default`.
    pub fn get(&self, instance_id: &str) -> Option<Arc<Dictionary>> {
        self.dicts
            .get(instance_id)
            .or_else(|| self.dicts.get(META_DEFAULT))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Inserts or replaces the dictionary for a peer.
    pub fn set(&self, instance_id: impl Into<String>, dict: Arc<Dictionary>) {
        self.dicts.insert(instance_id.into(), dict);
    }
}

/// Writes replies back to the peer a request arrived from.
#[derive(Clone)]
enum ReplySink {
    Udp {
        socket: Arc<UdpSocket>,
        peer: SocketAddr,
    },
    Tcp {
        writer: Arc<tokio::sync::Mutex<OwnedWriteHalf>>,
        peer: SocketAddr,
    },
}

impl ReplySink {
    fn peer(&self) -> SocketAddr {
        match self {
            ReplySink::Udp { peer, .. } | ReplySink::Tcp { peer, .. } => *peer,
        }
    }

    async fn write(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            ReplySink::Udp { socket, peer } => {
                socket.send_to(buf, peer).await?;
            }
            ReplySink::Tcp { writer, .. } => {
                writer.lock().await.write_all(buf).await?;
            }
        }
        Ok(())
    }
}

async fn send_reply(sink: &ReplySink, rply: &mut Packet) -> Result<(), ServerError> {
    let mut buf = [0u8; MAX_PACKET_LEN];
    let n = rply.encode(&mut buf)?;
    sink.write(&buf[..n]).await?;
    Ok(())
}

/// A single RADIUS listener on one transport and address.
pub struct Server {
    net: String,
    addr: String,
    secrets: Arc<Secrets>,
    dicts: Arc<Dictionaries>,
    handlers: RwLock<HashMap<PacketCode, RequestHandler>>,
    coder: Coder,
}

impl Server {
    /// Creates a server for `net` (`"udp"` or `"tcp"`) on `addr`, serving
    /// the given per-peer registries and handler map. Extra codecs extend
    /// the RFC 2865 registry.
    pub fn new(
        net: &str,
        addr: &str,
        secrets: Arc<Secrets>,
        dicts: Arc<Dictionaries>,
        handlers: HashMap<PacketCode, RequestHandler>,
        extra_codecs: HashMap<String, Arc<dyn radius_proto::AvpCodec>>,
    ) -> Self {
        let mut coder = Coder::new();
        for (attr_type, codec) in extra_codecs {
            coder.register(attr_type, codec);
        }
        Server {
            net: net.to_string(),
            addr: addr.to_string(),
            secrets,
            dicts,
            handlers: RwLock::new(handlers),
            coder,
        }
    }

    /// Registers a handler after construction, e.g. for live reloads.
    pub fn register_handler(&self, code: PacketCode, handler: RequestHandler) {
        let mut handlers = match self.handlers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handlers.insert(code, handler);
    }

    /// Binds the configured address and serves until the token is
    /// cancelled.
    pub async fn listen_and_serve(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        match self.net.as_str() {
            "udp" => {
                let socket = UdpSocket::bind(&self.addr).await?;
                info!(addr = %self.addr, "RADIUS server listening on udp");
                self.serve_udp(socket, shutdown).await
            }
            "tcp" => {
                let listener = TcpListener::bind(&self.addr).await?;
                info!(addr = %self.addr, "RADIUS server listening on tcp");
                self.serve_tcp(listener, shutdown).await
            }
            net => Err(ServerError::UnsupportedNetwork(net.to_string())),
        }
    }

    /// Serves datagrams from a pre-bound UDP socket until cancellation.
    /// Length mismatches are logged and the socket stays open.
    pub async fn serve_udp(
        self: Arc<Self>,
        socket: UdpSocket,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        let socket = Arc::new(socket);
        let mut buf = vec![0u8; MAX_PACKET_LEN];
        loop {
            let (n, peer) = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                received = socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(err) => {
                        error!(error = %err, "error when reading packets over udp");
                        continue;
                    }
                },
            };
            if n < 4 {
                warn!(received = n, "datagram shorter than a RADIUS header");
                continue;
            }
            let advertised = u16::from_be_bytes([buf[2], buf[3]]);
            if usize::from(advertised) != n {
                warn!(
                    received = n,
                    advertised,
                    "unexpected packet length received over udp"
                );
            }
            self.handle_received(
                &buf[..n],
                ReplySink::Udp {
                    socket: Arc::clone(&socket),
                    peer,
                },
            );
        }
    }

    /// Serves connections from a pre-bound TCP listener until cancellation.
    /// Each accepted connection gets its own task.
    pub async fn serve_tcp(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        error!(error = %err, "error when establishing new connection");
                        continue;
                    }
                },
            };
            let server = Arc::clone(&self);
            let token = shutdown.clone();
            tokio::spawn(async move {
                server.handle_tcp_conn(stream, peer, token).await;
            });
        }
    }

    /// Reads packets from one TCP connection. A read error or a mismatch
    /// between received and advertised length closes the connection.
    async fn handle_tcp_conn(
        self: Arc<Self>,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown: CancellationToken,
    ) {
        let (mut read_half, write_half) = stream.into_split();
        let writer = Arc::new(tokio::sync::Mutex::new(write_half));
        let mut buf = vec![0u8; MAX_PACKET_LEN];
        loop {
            let n = tokio::select! {
                _ = shutdown.cancelled() => return,
                read = read_half.read(&mut buf) => match read {
                    Ok(0) => {
                        debug!(peer = %peer, "connection closed by peer");
                        return;
                    }
                    Ok(n) => n,
                    Err(err) => {
                        error!(peer = %peer, error = %err, "error when reading packets, disconnecting");
                        return;
                    }
                },
            };
            if n < 4 || usize::from(u16::from_be_bytes([buf[2], buf[3]])) != n {
                error!(peer = %peer, received = n, "unexpected packet length, disconnecting");
                return;
            }
            self.handle_received(
                &buf[..n],
                ReplySink::Tcp {
                    writer: Arc::clone(&writer),
                    peer,
                },
            );
        }
    }

    /// Receive path shared between UDP and TCP.
    fn handle_received(&self, rcv: &[u8], sink: ReplySink) {
        let conn_id = peer_identifier(&sink.peer());
        let secret = self.secrets.get(&conn_id);
        if !auth::is_authentic_request(rcv, &secret) {
            debug!(peer = %conn_id, "dropping request that failed the authenticity check");
            return;
        }
        let Some(dict) = self.dicts.get(&conn_id) else {
            warn!(peer = %conn_id, "no dictionary for peer");
            return;
        };
        let pkt = match Packet::decode(rcv, dict, self.coder.clone(), secret) {
            Ok(pkt) => pkt.with_remote_addr(sink.peer()),
            Err(err) => {
                warn!(peer = %conn_id, error = %err, "error when decoding packet");
                return;
            }
        };
        let handler = {
            let handlers = match self.handlers.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            handlers.get(&pkt.code).cloned()
        };
        let Some(handler) = handler else {
            error!(code = %pkt.code, "no handler for packet");
            let mut rply = pkt.negative_reply("no handler");
            tokio::spawn(async move {
                if let Err(err) = send_reply(&sink, &mut rply).await {
                    error!(error = %err, "error sending reply");
                }
            });
            return;
        };
        tokio::spawn(async move {
            let mut rply = match handler(pkt.clone()).await {
                Ok(Some(rply)) => rply,
                Ok(None) => {
                    warn!(code = %pkt.code, "empty reply received from handler");
                    return;
                }
                Err(err) => pkt.negative_reply(&err.to_string()),
            };
            if let Err(err) = send_reply(&sink, &mut rply).await {
                error!(error = %err, "error sending reply");
            }
        });
    }
}
