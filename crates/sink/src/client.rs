use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::{Endpoint, Scheme, SinkError};

/// Default wait between background reconnection attempts.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Idle time before TCP keepalive probes start.
const KEEPALIVE_TIME: Duration = Duration::from_secs(60);

/// Client for the remote ingestion endpoint.
///
/// Cheap to clone; all clones share one connection and writes from
/// concurrent callers are serialized. A failed write flips the client
/// into a reconnecting state and wakes a single background task that
/// re-establishes the connection; the failed payload is not retried
/// here, the caller decides what happens to it.
#[derive(Clone)]
pub struct SinkClient {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: Endpoint,
    io_timeout: Duration,
    reconnect_interval: Duration,
    conn: Mutex<Option<Transport>>,
    reconnecting: AtomicBool,
    closed: AtomicBool,
}

enum Transport {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Transport {
    async fn open(endpoint: &Endpoint) -> io::Result<Self> {
        match endpoint.scheme {
            Scheme::Tcp => {
                let stream = TcpStream::connect(endpoint.authority()).await?;
                configure_tcp(&stream);
                Ok(Self::Tcp(stream))
            }
            Scheme::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(endpoint.authority()).await?;
                Ok(Self::Udp(socket))
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.write_all(payload).await?;
                stream.flush().await
            }
            Self::Udp(socket) => socket.send(payload).await.map(|_| ()),
        }
    }
}

impl SinkClient {
    /// Connect to `endpoint`, applying `io_timeout` to the connect and to
    /// every subsequent write.
    ///
    /// The initial connection attempt is best-effort: on failure the
    /// client is returned unconnected and the first write retries before
    /// reporting an error.
    pub async fn connect(endpoint: Endpoint, io_timeout: Duration) -> Self {
        Self::with_reconnect_interval(endpoint, io_timeout, RECONNECT_INTERVAL).await
    }

    /// Like [`SinkClient::connect`] with a custom reconnect cadence.
    pub async fn with_reconnect_interval(
        endpoint: Endpoint,
        io_timeout: Duration,
        reconnect_interval: Duration,
    ) -> Self {
        let client = Self {
            inner: Arc::new(Inner {
                endpoint,
                io_timeout,
                reconnect_interval,
                conn: Mutex::new(None),
                reconnecting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        };

        let mut conn = client.inner.conn.lock().await;
        match client.inner.open().await {
            Ok(transport) => *conn = Some(transport),
            Err(e) => tracing::warn!(
                endpoint = %client.inner.endpoint,
                error = %e,
                "initial connection failed, will retry on first write"
            ),
        }
        drop(conn);

        client
    }

    /// Endpoint this client ships to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Write one payload to the endpoint.
    ///
    /// Blocks until the payload is handed to the transport or the
    /// configured timeout elapses. On failure the connection is dropped,
    /// the client enters the reconnecting state, and the error is
    /// returned without retrying the payload.
    pub async fn write(&self, payload: &[u8]) -> Result<(), SinkError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }

        let mut conn = self.inner.conn.lock().await;
        if conn.is_none() {
            if self.reconnecting() {
                return Err(SinkError::Reconnecting);
            }
            match self.inner.open().await {
                Ok(transport) => *conn = Some(transport),
                Err(e) => {
                    drop(conn);
                    self.begin_reconnect();
                    return Err(e);
                }
            }
        }
        let Some(transport) = conn.as_mut() else {
            return Err(SinkError::Reconnecting);
        };

        match timeout(self.inner.io_timeout, transport.send(payload)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                *conn = None;
                drop(conn);
                self.begin_reconnect();
                Err(SinkError::Write(e))
            }
            Err(_) => {
                *conn = None;
                drop(conn);
                self.begin_reconnect();
                Err(SinkError::Timeout)
            }
        }
    }

    /// True from the first failed write until a background reconnect
    /// succeeds.
    pub fn reconnecting(&self) -> bool {
        self.inner.reconnecting.load(Ordering::Acquire)
    }

    /// Close the connection. Terminal: subsequent writes fail with
    /// [`SinkError::Closed`] and any reconnect task winds down.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let mut conn = self.inner.conn.lock().await;
        if let Some(Transport::Tcp(mut stream)) = conn.take() {
            let _ = stream.shutdown().await;
        }
    }

    /// Wake the single background reconnect task, unless one is running.
    fn begin_reconnect(&self) {
        if self
            .inner
            .reconnecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tracing::debug!(endpoint = %inner.endpoint, "connection lost, reconnecting");
            loop {
                tokio::time::sleep(inner.reconnect_interval).await;
                if inner.closed.load(Ordering::Acquire) {
                    return;
                }
                match inner.open().await {
                    Ok(transport) => {
                        let mut conn = inner.conn.lock().await;
                        *conn = Some(transport);
                        inner.reconnecting.store(false, Ordering::Release);
                        drop(conn);
                        tracing::debug!(endpoint = %inner.endpoint, "reconnected");
                        return;
                    }
                    Err(e) => {
                        tracing::trace!(
                            endpoint = %inner.endpoint,
                            error = %e,
                            "reconnect attempt failed"
                        );
                    }
                }
            }
        });
    }
}

impl Inner {
    async fn open(&self) -> Result<Transport, SinkError> {
        match timeout(self.io_timeout, Transport::open(&self.endpoint)).await {
            Ok(Ok(transport)) => Ok(transport),
            Ok(Err(e)) => Err(SinkError::Connect {
                endpoint: self.endpoint.to_string(),
                source: e,
            }),
            Err(_) => Err(SinkError::Timeout),
        }
    }
}

/// Apply the socket options we want on every sink connection. Failures
/// are logged and ignored, the connection still works without them.
fn configure_tcp(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(error = %e, "failed to set TCP_NODELAY");
    }

    let sock_ref = SockRef::from(stream);
    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_TIME);
    if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
        tracing::debug!(error = %e, "failed to set TCP keepalive");
    }
}
