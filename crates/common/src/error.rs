use thiserror::Error;

use crate::models::FieldId;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid price range: trailing window has no finite high/low (high={high}, low={low})")]
    InvalidRange { high: f64, low: f64 },
    #[error("Chart surface '{0}' not found")]
    MissingSurface(String),
    #[error("Display field '{0}' not found")]
    MissingField(FieldId),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl DashboardError {
    /// Errors that only cost the current unit of work (a frame or a field).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange { .. }
                | Self::MissingSurface(_)
                | Self::MissingField(_)
                | Self::InvalidPayload(_)
        )
    }
}
