//! Common test utilities for LiveFeed integration tests.
//!
//! Provides an in-process mock feed gateway that accepts WebSocket
//! connections on any path and lets tests push frames to, or close, the
//! sockets of a given channel path.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::Notify;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Commands a test can push into a live mock connection.
#[derive(Debug)]
enum ServerOp {
    Send(String),
    Close,
}

struct Connection {
    tx: UnboundedSender<ServerOp>,
}

type ConnectionMap = Arc<Mutex<HashMap<String, Vec<Connection>>>>;
type ReceivedMap = Arc<Mutex<HashMap<String, Vec<String>>>>;

/// A mock feed gateway for testing.
pub struct MockFeedServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    connections: ConnectionMap,
    received: ReceivedMap,
    handshake_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockFeedServer {
    /// Create and start a new mock gateway on an ephemeral port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let connections: ConnectionMap = Arc::new(Mutex::new(HashMap::new()));
        let received: ReceivedMap = Arc::new(Mutex::new(HashMap::new()));
        let handshake_delay: Arc<Mutex<Option<Duration>>> = Arc::new(Mutex::new(None));

        let shutdown_accept = shutdown.clone();
        let connections_accept = connections.clone();
        let received_accept = received.clone();
        let delay_accept = handshake_delay.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let connections = connections_accept.clone();
                                let received = received_accept.clone();
                                let delay = *delay_accept.lock();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, connections, received, delay)
                                        .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_accept.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            connections,
            received,
            handshake_delay,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        connections: ConnectionMap,
        received: ReceivedMap,
        handshake_delay: Option<Duration>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
        use tokio_tungstenite::tungstenite::Message;

        // Stall the WebSocket upgrade so tests can observe the client in its
        // connecting phase.
        if let Some(delay) = handshake_delay {
            tokio::time::sleep(delay).await;
        }

        let mut path = String::new();
        let ws_stream = match accept_hdr_async(stream, |request: &Request, response: Response| {
            path = request.uri().path().to_string();
            Ok(response)
        })
        .await
        {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (tx, mut rx) = unbounded_channel();
        connections.lock().entry(path.clone()).or_default().push(Connection { tx });

        let (mut write, mut read) = ws_stream.split();
        loop {
            tokio::select! {
                op = rx.recv() => match op {
                    Some(ServerOp::Send(text)) => {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(ServerOp::Close) | None => {
                        let _ = write.close().await;
                        break;
                    }
                },
                msg = read.next() => match msg {
                    Some(Ok(msg)) => {
                        if msg.is_text() {
                            let text = msg.into_text().unwrap();
                            received.lock().entry(path.clone()).or_default().push(text);
                        } else if msg.is_close() {
                            break;
                        }
                    }
                    Some(Err(_)) | None => break,
                },
            }
        }
    }

    /// Base WebSocket URL for this gateway.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Delay the WebSocket upgrade of every subsequent connection, keeping
    /// clients in their connecting phase for `delay`.
    pub fn set_handshake_delay(&self, delay: Duration) {
        *self.handshake_delay.lock() = Some(delay);
    }

    /// Number of sockets ever opened against `path` (including closed ones).
    pub fn total_connections(&self, path: &str) -> usize {
        self.connections.lock().get(path).map_or(0, |conns| conns.len())
    }

    /// Number of currently live sockets on `path`.
    pub fn live_connections(&self, path: &str) -> usize {
        self.connections
            .lock()
            .get(path)
            .map_or(0, |conns| conns.iter().filter(|c| !c.tx.is_closed()).count())
    }

    /// Push a text frame to every live socket on `path`.
    pub fn send_to(&self, path: &str, text: impl Into<String>) {
        let text = text.into();
        if let Some(conns) = self.connections.lock().get(path) {
            for conn in conns {
                let _ = conn.tx.send(ServerOp::Send(text.clone()));
            }
        }
    }

    /// Close every live socket on `path` from the server side.
    pub fn close_path(&self, path: &str) {
        if let Some(conns) = self.connections.lock().get(path) {
            for conn in conns {
                let _ = conn.tx.send(ServerOp::Close);
            }
        }
    }

    /// Text frames the gateway received on `path`, in arrival order.
    pub fn received(&self, path: &str) -> Vec<String> {
        self.received.lock().get(path).cloned().unwrap_or_default()
    }

    /// Poll until `path` has seen at least `count` connections in total.
    pub async fn wait_for_connections(&self, path: &str, count: usize) {
        for _ in 0..300 {
            if self.total_connections(path) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "timed out waiting for {} connection(s) on {} (saw {})",
            count,
            path,
            self.total_connections(path)
        );
    }

    /// Stop accepting new connections (existing sockets stay up).
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockFeedServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
