use crate::core::channel::FeedChannel;
use crate::core::config::FeedConfig;
use crate::core::connection_state::{
    AtomicConnectionState, ChannelMetrics, ConnectionState, FeedMetrics,
};
use crate::core::event::{FeedEvent, InboundMessage};
use crate::core::listeners::ListenerDirectory;
use crate::traits::{ExponentialBackoff, FeedError, ReconnectionStrategy, Result};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Commands accepted by a channel's socket task.
#[derive(Debug)]
enum SocketCommand {
    /// Write a serialized frame to the socket.
    Send(String),
    /// Close the socket and end the task.
    Close,
}

/// Per-channel connection slot.
///
/// Every logical channel owns exactly one slot for the lifetime of the
/// manager. The socket task, the reconnect timer and the retry counter all
/// hang off it. The generation counter lets a superseded socket task detect
/// that a newer connection owns the slot and turn its teardown into a no-op.
struct ChannelSlot {
    state: AtomicConnectionState,
    metrics: ChannelMetrics,
    retries: AtomicUsize,
    /// Set immediately before a user-initiated close so the close path can
    /// tell it apart from a transport-initiated one and skip reconnect
    /// arming.
    intentional_close: AtomicBool,
    generation: AtomicU64,
    writer: Mutex<Option<UnboundedSender<SocketCommand>>>,
    reconnect_timer: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ChannelSlot {
    fn new() -> Self {
        Self {
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            metrics: ChannelMetrics::new(),
            retries: AtomicUsize::new(0),
            intentional_close: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            writer: Mutex::new(None),
            reconnect_timer: Mutex::new(None),
        }
    }
}

/// Multi-channel feed client: the only surface dashboard code depends on.
///
/// One manager owns every channel's socket, lifecycle state, retry counter
/// and reconnect timer. It is cheap to clone (clones share the slots) and is
/// explicitly constructed from a [`FeedConfig`], so tests can spin up
/// isolated instances instead of sharing process-wide state.
#[derive(Clone)]
pub struct FeedManager {
    config: Arc<FeedConfig>,
    strategy: Arc<dyn ReconnectionStrategy>,
    listeners: Arc<ListenerDirectory>,
    slots: Arc<[ChannelSlot; FeedChannel::ALL.len()]>,
}

impl FeedManager {
    pub fn new(config: FeedConfig) -> Self {
        let strategy = ExponentialBackoff::bounded(
            config.reconnect_interval,
            config.max_reconnect_attempts,
        );
        Self {
            config: Arc::new(config),
            strategy: Arc::new(strategy),
            listeners: Arc::new(ListenerDirectory::new()),
            slots: Arc::new(std::array::from_fn(|_| ChannelSlot::new())),
        }
    }

    fn slot(&self, channel: FeedChannel) -> &ChannelSlot {
        &self.slots[channel.index()]
    }

    /// Open the channel's socket unless one is already open or opening.
    ///
    /// Resolves once the transport reports open; errors when the handshake
    /// fails (which also arms the reconnect path while listeners remain).
    /// Calling this against an exhausted channel resets its retry counter,
    /// so manual reconnection always gets a fresh backoff budget.
    pub async fn connect(&self, channel: FeedChannel) -> Result<()> {
        self.slot(channel).retries.store(0, Ordering::Release);
        self.open_channel(channel).await
    }

    async fn open_channel(&self, channel: FeedChannel) -> Result<()> {
        let slot = self.slot(channel);

        // Claim the slot before the first await; a concurrent caller finding
        // it claimed resolves immediately instead of opening a second socket.
        if slot
            .state
            .compare_exchange(ConnectionState::Disconnected, ConnectionState::Connecting)
            .is_err()
        {
            debug!(%channel, "connect: socket already open or opening");
            return Ok(());
        }
        slot.intentional_close.store(false, Ordering::Release);
        let generation = slot.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let url = self.config.url_for(channel);
        debug!(%channel, %url, "opening feed socket");

        let ws_stream = match connect_async(&url).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                error!(%channel, error = %e, "failed to open feed socket");
                if slot.generation.load(Ordering::Acquire) == generation {
                    slot.state.set(ConnectionState::Disconnected);
                    self.schedule_reconnect(channel);
                }
                return Err(FeedError::WebSocket(e.to_string()));
            }
        };

        // Commit under the writer lock so a concurrent disconnect (which
        // stores the flag before taking the same lock) either beats the whole
        // commit or tears down the installed writer through the normal close
        // path; it can never interleave with a half-committed socket.
        let (writer_tx, writer_rx) = unbounded_channel();
        let committed = {
            let mut writer = slot.writer.lock();
            if slot.intentional_close.load(Ordering::Acquire)
                || slot.generation.load(Ordering::Acquire) != generation
                || slot
                    .state
                    .compare_exchange(ConnectionState::Connecting, ConnectionState::Connected)
                    .is_err()
            {
                false
            } else {
                *writer = Some(writer_tx);
                true
            }
        };

        if !committed {
            // disconnect() or a newer connect took the slot while the
            // handshake was in flight; this attempt resolves as a no-op.
            debug!(%channel, "connect superseded, dropping fresh socket");
            if slot.generation.load(Ordering::Acquire) == generation {
                let _ = slot
                    .state
                    .compare_exchange(ConnectionState::Connecting, ConnectionState::Disconnected);
            }
            tokio::spawn(async move {
                let mut ws_stream = ws_stream;
                let _ = ws_stream.close(None).await;
            });
            return Ok(());
        }

        slot.retries.store(0, Ordering::Release);
        info!(%channel, "feed channel connected");
        self.listeners.notify(channel, &FeedEvent::connected(channel));

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_socket(channel, generation, ws_stream, writer_rx).await;
        });

        Ok(())
    }

    /// Drive one socket until it dies: inbound frames are parsed and fanned
    /// out in arrival order, outbound commands are written as they come.
    async fn run_socket(
        &self,
        channel: FeedChannel,
        generation: u64,
        ws_stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        mut commands: UnboundedReceiver<SocketCommand>,
    ) {
        let slot = self.slot(channel);
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        slot.metrics.increment_received();
                        self.route_frame(channel, &text);
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        slot.metrics.increment_received();
                        match std::str::from_utf8(&bytes) {
                            Ok(text) => self.route_frame(channel, text),
                            Err(e) => warn!(%channel, error = %e, "dropping non-UTF-8 binary frame"),
                        }
                    }
                    // Ping/pong/close control frames are handled by the transport
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(%channel, error = %e, "feed socket error");
                        break;
                    }
                    None => {
                        warn!(%channel, "feed socket stream ended");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(SocketCommand::Send(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            error!(%channel, error = %e, "feed socket write failed");
                            break;
                        }
                        slot.metrics.increment_sent();
                    }
                    Some(SocketCommand::Close) | None => {
                        debug!(%channel, "closing feed socket");
                        let _ = write.close().await;
                        break;
                    }
                },
            }
        }

        self.finish_socket(channel, generation);
    }

    /// Close-path bookkeeping shared by every way a socket can die.
    fn finish_socket(&self, channel: FeedChannel, generation: u64) {
        let slot = self.slot(channel);
        if slot.generation.load(Ordering::Acquire) != generation {
            // A newer connection owns the slot; this teardown is stale.
            debug!(%channel, "skipping teardown of superseded socket");
            return;
        }

        *slot.writer.lock() = None;
        slot.state.set(ConnectionState::Disconnected);
        self.listeners.notify(channel, &FeedEvent::disconnected(channel));

        if slot.intentional_close.load(Ordering::Acquire) {
            debug!(%channel, "user-initiated close, reconnect suppressed");
            return;
        }
        self.schedule_reconnect(channel);
    }

    /// Parse one raw frame and fan it out.
    ///
    /// A malformed frame is dropped with a log line and never touches
    /// connection state. The payload's own `channel` field wins over the
    /// socket the frame arrived on, which lets the unified live stream carry
    /// events belonging to the other logical channels.
    fn route_frame(&self, socket_channel: FeedChannel, raw: &str) {
        let message: InboundMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(channel = %socket_channel, error = %e, "dropping malformed feed frame");
                return;
            }
        };

        let target = match message.channel.as_deref() {
            Some(id) => match id.parse::<FeedChannel>() {
                Ok(target) => target,
                Err(_) => {
                    debug!(
                        channel = %socket_channel,
                        payload_channel = id,
                        "unknown payload channel, routing to socket channel"
                    );
                    socket_channel
                }
            },
            None => socket_channel,
        };

        let event = FeedEvent::from_inbound(target, message);
        self.listeners.notify(target, &event);
    }

    /// Arm the channel's reconnect timer after an unexpected close.
    ///
    /// No timer is armed when nobody is listening or when the retry ceiling
    /// has been hit; in the latter case the channel stays down until an
    /// explicit `connect` or `subscribe`.
    fn schedule_reconnect(&self, channel: FeedChannel) {
        let slot = self.slot(channel);

        if self.listeners.is_empty(channel) {
            debug!(%channel, "no listeners remain, reconnect suppressed");
            return;
        }

        let attempt = slot.retries.load(Ordering::Acquire);
        let Some(delay) = self.strategy.next_delay(attempt) else {
            warn!(
                %channel,
                attempts = attempt,
                "reconnect attempts exhausted, channel stays down until reconnected explicitly"
            );
            return;
        };

        let mut timer = slot.reconnect_timer.lock();
        if timer.is_some() {
            debug!(%channel, "reconnect timer already armed");
            return;
        }

        info!(%channel, ?delay, attempt = attempt + 1, "scheduling reconnect");
        let manager = self.clone();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let slot = manager.slot(channel);
            slot.reconnect_timer.lock().take();
            if slot.intentional_close.load(Ordering::Acquire) {
                debug!(%channel, "reconnect cancelled by explicit disconnect");
                return;
            }

            slot.retries.fetch_add(1, Ordering::AcqRel);
            slot.metrics.increment_reconnects();
            if let Err(e) = manager.open_channel(channel).await {
                warn!(%channel, error = %e, "reconnect attempt failed");
            }
        }));
    }

    /// Register a listener and auto-connect the channel when no socket is
    /// open or opening.
    ///
    /// The auto-connect is fire-and-forget: failures are logged and handed to
    /// the reconnect scheduler rather than surfaced to the subscriber.
    pub fn subscribe(
        &self,
        channel: FeedChannel,
        listener: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.listeners.add(channel, Arc::new(listener));
        debug!(%channel, listener = id, "listener subscribed");

        let slot = self.slot(channel);
        if slot.state.is_disconnected() {
            slot.retries.store(0, Ordering::Release);
            let manager = self.clone();
            tokio::spawn(async move {
                if let Err(e) = manager.open_channel(channel).await {
                    warn!(%channel, error = %e, "auto-connect for new subscriber failed");
                }
            });
        }

        Subscription {
            channel,
            id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Tear the channel down and cancel any pending reconnect.
    ///
    /// Safe to call at any time, including while a `connect` is still in
    /// flight or when the channel was never connected. The synthetic
    /// `disconnected` event is emitted by the socket's close path, not here,
    /// so it fires exactly once per live socket.
    pub fn disconnect(&self, channel: FeedChannel) {
        let slot = self.slot(channel);
        slot.intentional_close.store(true, Ordering::Release);

        if let Some(timer) = slot.reconnect_timer.lock().take() {
            debug!(%channel, "cancelling pending reconnect timer");
            timer.abort();
        }
        if let Some(writer) = slot.writer.lock().take() {
            info!(%channel, "disconnecting feed channel");
            let _ = writer.send(SocketCommand::Close);
        }
        slot.state.set(ConnectionState::Disconnected);
    }

    /// Apply [`FeedManager::disconnect`] to every channel.
    pub fn disconnect_all(&self) {
        info!("disconnecting all feed channels");
        for channel in FeedChannel::ALL {
            self.disconnect(channel);
        }
    }

    /// Best-effort write. Serializes `{channel, data, timestamp}` and writes
    /// it only when the channel is currently connected; otherwise returns
    /// `false` without queuing or buffering.
    pub fn send(&self, channel: FeedChannel, data: Value) -> bool {
        let slot = self.slot(channel);
        if !slot.state.is_connected() {
            debug!(%channel, "send dropped, channel not connected");
            return false;
        }

        let frame = json!({
            "channel": channel,
            "data": data,
            "timestamp": Utc::now(),
        });

        match slot.writer.lock().as_ref() {
            Some(writer) => writer.send(SocketCommand::Send(frame.to_string())).is_ok(),
            None => false,
        }
    }

    pub fn connection_state(&self, channel: FeedChannel) -> ConnectionState {
        self.slot(channel).state.get()
    }

    /// Snapshot of every channel's lifecycle state.
    pub fn connection_states(&self) -> HashMap<FeedChannel, ConnectionState> {
        FeedChannel::ALL
            .iter()
            .map(|&channel| (channel, self.connection_state(channel)))
            .collect()
    }

    pub fn metrics(&self, channel: FeedChannel) -> FeedMetrics {
        let slot = self.slot(channel);
        slot.metrics.snapshot(slot.state.get())
    }

    pub fn listener_count(&self, channel: FeedChannel) -> usize {
        self.listeners.count(channel)
    }
}

/// Handle returned by [`FeedManager::subscribe`].
///
/// Dropping the handle does not remove the listener; call
/// [`Subscription::unsubscribe`] explicitly. Live connections persist after
/// the last listener leaves, but reconnect arming stops.
pub struct Subscription {
    channel: FeedChannel,
    id: u64,
    listeners: Arc<ListenerDirectory>,
}

impl Subscription {
    pub fn channel(&self) -> FeedChannel {
        self.channel
    }

    /// Remove exactly the listener this subscription registered.
    pub fn unsubscribe(self) {
        if self.listeners.remove(self.channel, self.id) {
            debug!(channel = %self.channel, listener = self.id, "listener unsubscribed");
        }
    }
}
