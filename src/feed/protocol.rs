use crate::vehicle::{ValidationError, VehicleUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Envelope `type` of vehicle update messages
pub const VEHICLE_UPDATE: &str = "vehicle_update";

/// Server → Client envelope: `{ "type": ..., "data": ... }`
#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    data: Value,
}

/// Client-side view of an inbound feed message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A validated vehicle update
    VehicleUpdate(VehicleUpdate),
    /// A well-formed envelope with a type this core does not handle
    Other(String),
}

/// Reasons an inbound message is dropped
#[derive(Debug)]
pub enum ProtocolError {
    /// Not JSON, or not an object with a string `type`
    InvalidEnvelope(serde_json::Error),
    /// `data` does not decode into a vehicle update
    InvalidUpdate(serde_json::Error),
    /// `data` decoded but failed payload validation
    Validation(ValidationError),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidEnvelope(e) => write!(f, "invalid message envelope: {}", e),
            ProtocolError::InvalidUpdate(e) => write!(f, "invalid vehicle update: {}", e),
            ProtocolError::Validation(e) => write!(f, "vehicle update rejected: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::InvalidEnvelope(e) | ProtocolError::InvalidUpdate(e) => Some(e),
            ProtocolError::Validation(e) => Some(e),
        }
    }
}

/// Parse one inbound text frame.
///
/// The envelope is checked first; `data` is only decoded and validated
/// when `type` is `vehicle_update`.
pub fn parse_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(ProtocolError::InvalidEnvelope)?;

    if envelope.msg_type != VEHICLE_UPDATE {
        return Ok(InboundMessage::Other(envelope.msg_type));
    }

    let update: VehicleUpdate =
        serde_json::from_value(envelope.data).map_err(ProtocolError::InvalidUpdate)?;
    update.validate().map_err(ProtocolError::Validation)?;

    Ok(InboundMessage::VehicleUpdate(update))
}

/// Client → Server: serialize an outbound payload to a text frame
pub fn encode_outbound<T: Serialize + ?Sized>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

/// Server → Client: vehicle update envelope.
///
/// The core never sends this itself; feed producers and test servers use it
/// to build well-formed messages.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub data: VehicleUpdate,
}

impl From<VehicleUpdate> for VehicleUpdateMessage {
    fn from(update: VehicleUpdate) -> Self {
        Self {
            msg_type: VEHICLE_UPDATE.to_string(),
            data: update,
        }
    }
}
