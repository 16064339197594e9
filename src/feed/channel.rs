use super::config::FeedConfig;
use super::protocol::{self, InboundMessage};
use super::state::{ConnectionState, FeedAction, FeedEvent, FeedStateMachine};
use crate::vehicle::VehicleUpdate;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receives everything the feed surfaces.
///
/// Called from the channel's driver task, strictly in the order messages
/// arrive. Implementations must not block.
pub trait FeedHandler: Send + 'static {
    /// A validated `vehicle_update` payload
    fn on_vehicle_update(&mut self, update: VehicleUpdate);

    /// Transition to Open
    fn on_connect(&mut self) {}

    /// Transition to Closed, or an explicit disconnect of an open connection
    fn on_disconnect(&mut self) {}

    /// A reconnect was scheduled after `delay`
    fn on_reconnect_scheduled(&mut self, _attempt: u32, _delay: Duration) {}
}

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Send(String),
    Shutdown,
}

/// Cloneable control handle for a running feed channel
#[derive(Clone)]
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl FeedHandle {
    /// Start connecting. No-op while already Connecting or Open; cancels a
    /// pending reconnect timer and connects immediately when Closed.
    pub fn connect(&self) {
        self.command(Command::Connect);
    }

    /// Cancel any pending reconnect, close the connection and go Idle.
    /// Auto-reconnect stays off until the next `connect()`.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Send a JSON message. Dropped with a warning unless the feed is Open;
    /// nothing is queued.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        if self.state() != ConnectionState::Open {
            warn!(state = %self.state(), "Cannot send message, feed not connected");
            return;
        }

        match protocol::encode_outbound(message) {
            Ok(text) => self.command(Command::Send(text)),
            Err(e) => warn!(error = %e, "Failed to serialize outbound message, dropping"),
        }
    }

    /// Current connection state as last published by the driver
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to connection state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Disconnect and stop the driver task
    pub fn shutdown(&self) {
        self.command(Command::Shutdown);
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Feed channel task has stopped, command dropped");
        }
    }
}

/// Outcome of driving one lifecycle phase
enum Step {
    Continue,
    Opened(WsStream),
    Shutdown,
}

/// Driver for a single live feed connection.
///
/// Owns the socket, the reconnect timer and the state machine. All of them
/// are touched only from the driver task, so no locking is needed.
pub struct FeedChannel<H: FeedHandler> {
    url: String,
    machine: FeedStateMachine,
    handler: H,
    commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    reconnect_at: Option<Instant>,
}

impl<H: FeedHandler> FeedChannel<H> {
    /// Create the driver and its handle. The channel starts Idle.
    pub fn new(config: &FeedConfig, handler: H) -> (Self, FeedHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let channel = Self {
            url: config.url.clone(),
            machine: FeedStateMachine::new(config.backoff(), config.auto_reconnect),
            handler,
            commands: command_rx,
            state_tx,
            reconnect_at: None,
        };
        let handle = FeedHandle {
            commands: command_tx,
            state_rx,
        };

        (channel, handle)
    }

    /// Create the driver and run it on the tokio runtime
    pub fn spawn(config: &FeedConfig, handler: H) -> (FeedHandle, JoinHandle<()>) {
        let (channel, handle) = Self::new(config, handler);
        (handle, tokio::spawn(channel.run()))
    }

    /// Run until `shutdown()` is called or every handle is dropped
    pub async fn run(mut self) {
        info!(url = %self.url, "Feed channel started");

        let mut socket: Option<WsStream> = None;
        loop {
            let step = match (self.machine.state(), socket.take()) {
                (ConnectionState::Open, Some(ws)) => self.run_open(ws).await,
                (ConnectionState::Open, None) => {
                    self.dispatch(FeedEvent::TransportClosed);
                    Step::Continue
                }
                (ConnectionState::Connecting, _) => self.run_connecting().await,
                (ConnectionState::Idle | ConnectionState::Closed, _) => self.run_waiting().await,
            };

            match step {
                Step::Continue => {}
                Step::Opened(ws) => socket = Some(ws),
                Step::Shutdown => break,
            }
        }

        info!(url = %self.url, "Feed channel stopped");
    }

    /// Connecting: race the handshake against commands so a disconnect can
    /// abandon it.
    async fn run_connecting(&mut self) -> Step {
        info!(url = %self.url, attempt = self.machine.attempts(), "Connecting to live feed");

        let handshake = connect_async(self.url.clone());
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                result = &mut handshake => {
                    return match result {
                        Ok((ws, _response)) => {
                            info!(url = %self.url, "Live feed connected");
                            self.dispatch(FeedEvent::HandshakeSucceeded);
                            Step::Opened(ws)
                        }
                        Err(e) => {
                            warn!(url = %self.url, error = %e, "Live feed connection failed");
                            self.dispatch(FeedEvent::HandshakeFailed);
                            Step::Continue
                        }
                    };
                }
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Connect) => {
                            self.dispatch(FeedEvent::ConnectRequested);
                        }
                        Some(Command::Send(_)) => {
                            warn!("Cannot send message, feed still connecting");
                        }
                        Some(Command::Disconnect) => {
                            info!("Connection attempt abandoned by disconnect");
                            self.dispatch(FeedEvent::DisconnectRequested);
                            return Step::Continue;
                        }
                        Some(Command::Shutdown) | None => {
                            self.dispatch(FeedEvent::DisconnectRequested);
                            return Step::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Open: forward inbound frames and outbound sends until the
    /// connection ends.
    async fn run_open(&mut self, mut ws: WsStream) -> Step {
        loop {
            tokio::select! {
                frame = ws.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_text(&text),
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "Live feed closed by peer");
                            self.dispatch(FeedEvent::TransportClosed);
                            return Step::Continue;
                        }
                        // Binary frames are not part of the protocol; pings are
                        // answered by tungstenite.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Live feed transport error");
                            self.dispatch(FeedEvent::TransportClosed);
                            return Step::Continue;
                        }
                        None => {
                            info!("Live feed stream ended");
                            self.dispatch(FeedEvent::TransportClosed);
                            return Step::Continue;
                        }
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Send(text)) => {
                            if let Err(e) = ws.send(Message::Text(text)).await {
                                warn!(error = %e, "Failed to send message, dropping connection");
                                self.dispatch(FeedEvent::TransportClosed);
                                return Step::Continue;
                            }
                        }
                        Some(Command::Connect) => {
                            self.dispatch(FeedEvent::ConnectRequested);
                        }
                        Some(Command::Disconnect) => {
                            self.disconnect_open(&mut ws).await;
                            return Step::Continue;
                        }
                        Some(Command::Shutdown) | None => {
                            self.disconnect_open(&mut ws).await;
                            return Step::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Idle or Closed: wait for a command or the reconnect timer
    async fn run_waiting(&mut self) -> Step {
        let command = match self.reconnect_at {
            Some(deadline) => {
                tokio::select! {
                    _ = sleep_until(deadline) => {
                        self.reconnect_at = None;
                        self.dispatch(FeedEvent::TimerFired);
                        return Step::Continue;
                    }
                    command = self.commands.recv() => command,
                }
            }
            None => self.commands.recv().await,
        };

        match command {
            Some(Command::Connect) => {
                self.dispatch(FeedEvent::ConnectRequested);
            }
            Some(Command::Disconnect) => {
                self.dispatch(FeedEvent::DisconnectRequested);
            }
            Some(Command::Send(_)) => {
                warn!(state = %self.machine.state(), "Cannot send message, feed not connected");
            }
            Some(Command::Shutdown) | None => {
                self.dispatch(FeedEvent::DisconnectRequested);
                return Step::Shutdown;
            }
        }

        Step::Continue
    }

    async fn disconnect_open(&mut self, ws: &mut WsStream) {
        if self.dispatch(FeedEvent::DisconnectRequested) {
            if let Err(e) = ws.close(None).await {
                debug!(error = %e, "Error closing live feed socket");
            }
        }
        info!("Live feed disconnected");
    }

    fn handle_text(&mut self, text: &str) {
        match protocol::parse_inbound(text) {
            Ok(InboundMessage::VehicleUpdate(update)) => {
                debug!(vehicle_id = %update.vehicle_id, "Vehicle update received");
                self.handler.on_vehicle_update(update);
            }
            Ok(InboundMessage::Other(msg_type)) => {
                debug!(msg_type = %msg_type, "Ignoring feed message");
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed feed message");
            }
        }
    }

    /// Feed an event to the state machine and perform the resulting
    /// actions. Returns true when the caller must close its socket.
    fn dispatch(&mut self, event: FeedEvent) -> bool {
        let mut close_socket = false;

        for action in self.machine.handle(event) {
            match action {
                // The run loop starts the handshake on seeing Connecting
                FeedAction::StartConnect => {}
                FeedAction::ScheduleReconnect { attempt, delay } => {
                    info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnecting in {}ms",
                        delay.as_millis()
                    );
                    self.reconnect_at = Some(Instant::now() + delay);
                    self.handler.on_reconnect_scheduled(attempt, delay);
                }
                FeedAction::CancelReconnect => {
                    self.reconnect_at = None;
                }
                FeedAction::CloseSocket => close_socket = true,
                FeedAction::NotifyConnected => self.handler.on_connect(),
                FeedAction::NotifyDisconnected => self.handler.on_disconnect(),
            }
        }

        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        close_socket
    }
}
