use serde_json::{Value, json};
use tracing::debug;

use crate::error::DashboardError;
use crate::models::{MarketUpdate, PerformanceSample};

pub const UPDATE_CHART: &str = "update_chart";
pub const UPDATE_PERFORMANCE: &str = "update_performance";
pub const TRAINING_PROGRESS: &str = "training_progress";
pub const TRAINING_COMPLETE: &str = "training_complete";

pub const REQUEST_DATA: &str = "request_data";
pub const START_TRAINING: &str = "start_training";

/// Everything the dashboard reacts to. `Connected` and `Disconnected` are
/// published by the gateway itself, the rest mirror server pushes.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Connected,
    Disconnected,
    UpdateChart(Box<MarketUpdate>),
    UpdatePerformance(PerformanceSample),
    TrainingProgress(f64),
    TrainingComplete,
}

impl InboundEvent {
    /// Decodes a named server event. Unknown names yield `Ok(None)`.
    pub fn from_wire(name: &str, payload: Option<Value>) -> Result<Option<Self>, DashboardError> {
        let event = match name {
            UPDATE_CHART => {
                let update: MarketUpdate = serde_json::from_value(require(name, payload)?)?;
                Self::UpdateChart(Box::new(update))
            }
            UPDATE_PERFORMANCE => {
                Self::UpdatePerformance(serde_json::from_value(require(name, payload)?)?)
            }
            TRAINING_PROGRESS => {
                let value = require(name, payload)?;
                let progress = value.as_f64().ok_or_else(|| {
                    DashboardError::InvalidPayload(format!(
                        "{} expects a number, got {}",
                        name, value
                    ))
                })?;
                Self::TrainingProgress(progress)
            }
            TRAINING_COMPLETE => Self::TrainingComplete,
            other => {
                debug!("Ignoring unknown event '{}'", other);
                return Ok(None);
            }
        };

        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connect",
            Self::Disconnected => "disconnect",
            Self::UpdateChart(_) => UPDATE_CHART,
            Self::UpdatePerformance(_) => UPDATE_PERFORMANCE,
            Self::TrainingProgress(_) => TRAINING_PROGRESS,
            Self::TrainingComplete => TRAINING_COMPLETE,
        }
    }
}

fn require(name: &str, payload: Option<Value>) -> Result<Value, DashboardError> {
    match payload {
        Some(Value::Null) | None => Err(DashboardError::InvalidPayload(format!(
            "{} arrived without a payload",
            name
        ))),
        Some(value) => Ok(value),
    }
}

/// Requests the dashboard sends back to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    RequestData,
    StartTraining { model: String },
}

impl OutboundCommand {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RequestData => REQUEST_DATA,
            Self::StartTraining { .. } => START_TRAINING,
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::RequestData => None,
            Self::StartTraining { model } => Some(json!({ "model": model })),
        }
    }
}
