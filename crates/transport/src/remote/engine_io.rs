use std::time::Duration;

use common::DashboardError;
use serde::Deserialize;

/// Body of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// How long the socket may stay silent before the server counts as gone.
    pub fn read_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, DashboardError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| DashboardError::Protocol("empty engine.io frame".to_string()))?;
        let body = chars.as_str();

        let packet = match kind {
            '0' => Self::Open(serde_json::from_str(body)?),
            '1' => Self::Close,
            '2' => Self::Ping(body.to_string()),
            '3' => Self::Pong(body.to_string()),
            '4' => Self::Message(body.to_string()),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            other => {
                return Err(DashboardError::Protocol(format!(
                    "unknown engine.io packet type '{}'",
                    other
                )));
            }
        };
        Ok(packet)
    }

    pub fn encode(&self) -> String {
        match self {
            // Only servers send open.
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(body) => format!("2{}", body),
            Self::Pong(body) => format!("3{}", body),
            Self::Message(body) => format!("4{}", body),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}
