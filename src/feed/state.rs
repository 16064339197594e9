use super::backoff::Backoff;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Connection lifecycle state of the live feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not connected and not trying to. Initial state, and the state after
    /// an explicit disconnect.
    Idle,
    Connecting,
    Open,
    /// Connection lost or handshake failed; a reconnect may be pending
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Discrete inputs that drive the lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    ConnectRequested,
    HandshakeSucceeded,
    HandshakeFailed,
    TransportClosed,
    DisconnectRequested,
    TimerFired,
}

/// Side effects the driver must perform after a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedAction {
    StartConnect,
    ScheduleReconnect { attempt: u32, delay: Duration },
    CancelReconnect,
    CloseSocket,
    NotifyConnected,
    NotifyDisconnected,
}

/// Pure connection state machine.
///
/// Holds no I/O. The async driver feeds it events and executes the returned
/// actions in order, which keeps backoff and cancellation testable without
/// a network.
#[derive(Debug)]
pub struct FeedStateMachine {
    state: ConnectionState,
    backoff: Backoff,
    auto_reconnect: bool,
    reconnect_pending: bool,
}

impl FeedStateMachine {
    pub fn new(backoff: Backoff, auto_reconnect: bool) -> Self {
        Self {
            state: ConnectionState::Idle,
            backoff,
            auto_reconnect,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while a reconnect timer is armed
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Consecutive closes since the last successful open
    pub fn attempts(&self) -> u32 {
        self.backoff.attempts()
    }

    /// Apply an event and return the actions to perform.
    ///
    /// Events that make no sense in the current state (a stale timer after
    /// disconnect, a handshake result after the attempt was abandoned) are
    /// ignored and return no actions.
    pub fn handle(&mut self, event: FeedEvent) -> Vec<FeedAction> {
        use ConnectionState::*;

        match (self.state, event) {
            (Idle, FeedEvent::ConnectRequested) => {
                self.state = Connecting;
                vec![FeedAction::StartConnect]
            }
            (Closed, FeedEvent::ConnectRequested) => {
                let mut actions = Vec::with_capacity(2);
                if self.reconnect_pending {
                    self.reconnect_pending = false;
                    actions.push(FeedAction::CancelReconnect);
                }
                self.state = Connecting;
                actions.push(FeedAction::StartConnect);
                actions
            }
            (Connecting | Open, FeedEvent::ConnectRequested) => Vec::new(),

            (Connecting, FeedEvent::HandshakeSucceeded) => {
                self.state = Open;
                self.backoff.reset();
                vec![FeedAction::NotifyConnected]
            }
            (Connecting, FeedEvent::HandshakeFailed | FeedEvent::TransportClosed)
            | (Open, FeedEvent::TransportClosed) => self.close(),

            (Closed, FeedEvent::TimerFired) if self.reconnect_pending => {
                self.reconnect_pending = false;
                self.state = Connecting;
                vec![FeedAction::StartConnect]
            }

            (_, FeedEvent::DisconnectRequested) => {
                let mut actions = Vec::new();
                if self.reconnect_pending {
                    self.reconnect_pending = false;
                    actions.push(FeedAction::CancelReconnect);
                }
                match self.state {
                    Open => {
                        actions.push(FeedAction::CloseSocket);
                        actions.push(FeedAction::NotifyDisconnected);
                    }
                    Connecting => actions.push(FeedAction::CloseSocket),
                    Idle | Closed => {}
                }
                self.state = Idle;
                self.backoff.reset();
                actions
            }

            _ => Vec::new(),
        }
    }

    fn close(&mut self) -> Vec<FeedAction> {
        self.state = ConnectionState::Closed;
        let mut actions = vec![FeedAction::NotifyDisconnected];

        if self.auto_reconnect {
            let delay = self.backoff.next_delay();
            self.reconnect_pending = true;
            actions.push(FeedAction::ScheduleReconnect {
                attempt: self.backoff.attempts(),
                delay,
            });
        }

        actions
    }
}
