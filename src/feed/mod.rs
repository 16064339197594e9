// Live feed channel: connection lifecycle, backoff and message framing

mod backoff;
mod channel;
mod config;
pub mod protocol;
mod state;

pub use backoff::{Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, MIN_BASE_DELAY};
pub use channel::{FeedChannel, FeedHandle, FeedHandler};
pub use config::FeedConfig;
pub use protocol::{parse_inbound, InboundMessage, ProtocolError, VehicleUpdateMessage};
pub use state::{ConnectionState, FeedAction, FeedEvent, FeedStateMachine};
