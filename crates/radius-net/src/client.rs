//! Async RADIUS client.
//!
//! A [`Client`] owns one dialled connection (UDP or TCP), a pending-request
//! table keyed by packet identifier, and a background reader task that
//! correlates replies, verifies their authenticator against the original
//! request, and delivers them through single-use channels. Failed dials
//! back off along the Fibonacci sequence.

use radius_proto::auth::{self, generate_request_authenticator};
use radius_proto::{AvpCodec, Coder, Dictionary, Packet, PacketCode, PacketError};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hard deadline for a reply to an outstanding request.
const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Read/write buffer size, one maximum-size packet.
const BUF_SIZE: usize = 4096;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("unsupported network: <{0}>")]
    UnsupportedNetwork(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("invalid packet")]
    InvalidPacket,
    #[error("not connected")]
    NotConnected,
}

/// Successive Fibonacci numbers, used as reconnect delays in seconds.
fn fib() -> impl Iterator<Item = u64> {
    let mut pair = (0u64, 1u64);
    std::iter::from_fn(move || {
        pair = (pair.1, pair.0.saturating_add(pair.1));
        Some(pair.0)
    })
}

/// Caches the original request and the channel its reply is published on.
#[derive(Debug)]
struct PendingRequest {
    pkt: Packet,
    reply_tx: oneshot::Sender<Option<Packet>>,
}

#[derive(Debug)]
enum WriteConn {
    Udp(Arc<UdpSocket>),
    Tcp(Arc<tokio::sync::Mutex<OwnedWriteHalf>>),
}

impl WriteConn {
    async fn write(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            WriteConn::Udp(socket) => {
                socket.send(buf).await?;
            }
            WriteConn::Tcp(writer) => {
                use tokio::io::AsyncWriteExt;
                writer.lock().await.write_all(buf).await?;
            }
        }
        Ok(())
    }
}

enum ReadConn {
    Udp(Arc<UdpSocket>),
    Tcp(OwnedReadHalf),
}

impl ReadConn {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ReadConn::Udp(socket) => socket.recv(buf).await,
            ReadConn::Tcp(reader) => reader.read(buf).await,
        }
    }
}

#[derive(Debug)]
struct Connection {
    writer: WriteConn,
    stop_reading: CancellationToken,
}

/// State shared between the client handle and its reader task.
#[derive(Debug)]
struct Shared {
    pending: Mutex<HashMap<u8, PendingRequest>>,
    conn: tokio::sync::Mutex<Option<Connection>>,
}

impl Shared {
    /// Drops the live connection and answers every pending request with a
    /// negative "connection lost" reply.
    async fn teardown(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.stop_reading.cancel();
        }
        let drained: Vec<PendingRequest> = {
            let mut pending = lock_pending(&self.pending);
            pending.drain().map(|(_, entry)| entry).collect()
        };
        for entry in drained {
            let rply = entry.pkt.negative_reply("connection lost");
            let _ = entry.reply_tx.send(Some(rply));
        }
    }
}

fn lock_pending(
    pending: &Mutex<HashMap<u8, PendingRequest>>,
) -> std::sync::MutexGuard<'_, HashMap<u8, PendingRequest>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Thread-safe RADIUS client for one server address.
#[derive(Debug)]
pub struct Client {
    net: String,
    address: String,
    secret: String,
    dict: Arc<Dictionary>,
    coder: Coder,
    shared: Arc<Shared>,
}

impl Client {
    /// Creates a client and dials the server.
    ///
    /// `net` is `"udp"` or `"tcp"`. `conn_attempts` of 0 is promoted to a
    /// single attempt; -1 retries forever with Fibonacci backoff between
    /// dials. Extra codecs extend the RFC 2865 registry.
    pub async fn new(
        net: &str,
        address: &str,
        secret: &str,
        dict: Arc<Dictionary>,
        conn_attempts: i32,
        extra_codecs: HashMap<String, Arc<dyn AvpCodec>>,
    ) -> Result<Client, ClientError> {
        if net != "udp" && net != "tcp" {
            return Err(ClientError::UnsupportedNetwork(net.to_string()));
        }
        let mut coder = Coder::new();
        for (attr_type, codec) in extra_codecs {
            coder.register(attr_type, codec);
        }
        let client = Client {
            net: net.to_string(),
            address: address.to_string(),
            secret: secret.to_string(),
            dict,
            coder,
            shared: Arc::new(Shared {
                pending: Mutex::new(HashMap::new()),
                conn: tokio::sync::Mutex::new(None),
            }),
        };
        let conn_attempts = if conn_attempts == 0 { 1 } else { conn_attempts };
        client.connect(conn_attempts).await?;
        Ok(client)
    }

    /// Dials the server, retrying up to `conn_attempts` times (-1 forever)
    /// and sleeping along the Fibonacci sequence between attempts. Any
    /// existing connection is torn down first.
    pub async fn connect(&self, conn_attempts: i32) -> Result<(), ClientError> {
        if conn_attempts == 0 {
            return Ok(());
        }
        self.disconnect().await;
        let mut delays = fib();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.dial().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if conn_attempts != -1 && attempt >= conn_attempts {
                        return Err(err);
                    }
                    let delay = delays.next().unwrap_or(1);
                    debug!(
                        address = %self.address,
                        attempt,
                        delay_secs = delay,
                        "dial failed, backing off"
                    );
                    sleep(Duration::from_secs(delay)).await;
                }
            }
        }
    }

    async fn dial(&self) -> Result<(), ClientError> {
        let stop_reading = CancellationToken::new();
        let (writer, reader) = match self.net.as_str() {
            "udp" => {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(&self.address).await?;
                let socket = Arc::new(socket);
                (
                    WriteConn::Udp(Arc::clone(&socket)),
                    ReadConn::Udp(socket),
                )
            }
            "tcp" => {
                let stream = TcpStream::connect(&self.address).await?;
                let (read_half, write_half) = stream.into_split();
                (
                    WriteConn::Tcp(Arc::new(tokio::sync::Mutex::new(write_half))),
                    ReadConn::Tcp(read_half),
                )
            }
            net => return Err(ClientError::UnsupportedNetwork(net.to_string())),
        };
        *self.shared.conn.lock().await = Some(Connection {
            writer,
            stop_reading: stop_reading.clone(),
        });
        tokio::spawn(read_replies(
            reader,
            stop_reading,
            Arc::clone(&self.shared),
            self.secret.clone(),
            Arc::clone(&self.dict),
            self.coder.clone(),
        ));
        Ok(())
    }

    /// Tears down the connection; every pending request receives a negative
    /// "connection lost" reply.
    pub async fn disconnect(&self) {
        self.shared.teardown().await;
    }

    /// Produces a new request with a random authenticator, bound to the
    /// client's dictionary and codec registry.
    pub fn new_request(&self, code: PacketCode, identifier: u8) -> Packet {
        let mut req = Packet::new(
            code,
            identifier,
            Arc::clone(&self.dict),
            self.coder.clone(),
            self.secret.clone(),
        );
        req.authenticator = generate_request_authenticator();
        req
    }

    /// Dispatches a request and awaits its reply for up to one second.
    ///
    /// A timeout, an authenticator mismatch, or a missing reply surfaces as
    /// [`ClientError::InvalidPacket`].
    pub async fn send_request(&self, req: &mut Packet) -> Result<Packet, ClientError> {
        req.set_secret(self.secret.clone());
        let mut buf = [0u8; BUF_SIZE];
        let n = req.encode(&mut buf)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        lock_pending(&self.shared.pending).insert(
            req.identifier,
            PendingRequest {
                pkt: req.clone(),
                reply_tx,
            },
        );

        {
            let conn = self.shared.conn.lock().await;
            let Some(conn) = conn.as_ref() else {
                lock_pending(&self.shared.pending).remove(&req.identifier);
                return Err(ClientError::NotConnected);
            };
            conn.writer.write(&buf[..n]).await?;
        }

        match timeout(REPLY_TIMEOUT, reply_rx).await {
            Ok(Ok(Some(rply))) => Ok(rply),
            // Timed out, the reader delivered nothing, or the authenticator
            // check failed.
            _ => Err(ClientError::InvalidPacket),
        }
    }
}

/// Reader task: decodes replies, correlates them by identifier, verifies
/// authenticity against the original request, and delivers them. A read
/// error tears the connection down.
async fn read_replies(
    mut conn: ReadConn,
    stop_reading: CancellationToken,
    shared: Arc<Shared>,
    secret: String,
    dict: Arc<Dictionary>,
    coder: Coder,
) {
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = tokio::select! {
            _ = stop_reading.cancelled() => return,
            read = conn.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("connection closed while reading replies");
                    shared.teardown().await;
                    return;
                }
                Ok(n) => n,
                Err(err) => {
                    debug!(error = %err, "error when reading connection");
                    shared.teardown().await;
                    return;
                }
            },
        };
        if n < 4 || usize::from(u16::from_be_bytes([buf[2], buf[3]])) != n {
            warn!("unexpected packet length received");
            shared.teardown().await;
            return;
        }
        let rply = match Packet::decode(
            &buf[..n],
            Arc::clone(&dict),
            coder.clone(),
            secret.clone(),
        ) {
            Ok(rply) => rply,
            Err(err) => {
                warn!(error = %err, "error when decoding packet");
                continue;
            }
        };
        let Some(entry) = lock_pending(&shared.pending).remove(&rply.identifier) else {
            warn!(code = %rply.code, identifier = rply.identifier, "no handler for reply");
            continue;
        };
        let rply = if auth::is_authentic(&buf[..n], &secret, &entry.pkt.authenticator) {
            Some(rply)
        } else {
            None
        };
        let _ = entry.reply_tx.send(rply);
    }
}
