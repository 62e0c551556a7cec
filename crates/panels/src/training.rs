use common::DashboardError;
use common::models::{FieldId, OutboundCommand};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::display::{DisplayPort, skip_on_error};

/// Drives the training progress panel and asks the server to train.
pub struct TrainingProgressPresenter<D> {
    display: D,
    commands: broadcast::Sender<OutboundCommand>,
}

impl<D: DisplayPort> TrainingProgressPresenter<D> {
    pub fn new(display: D, commands: broadcast::Sender<OutboundCommand>) -> Self {
        Self { display, commands }
    }

    pub fn start(&mut self, model: &str) -> Result<(), DashboardError> {
        skip_on_error(self.display.set_visibility(FieldId::ProgressContainer, true));
        self.show_progress(0.0);
        skip_on_error(
            self.display
                .set_text(FieldId::TrainingStatus, &format!("Training {}...", model)),
        );

        info!("Requesting training of model '{}'", model);
        self.commands
            .send(OutboundCommand::StartTraining {
                model: model.to_string(),
            })
            .map_err(|_| DashboardError::Protocol("no transport is listening".to_string()))?;
        Ok(())
    }

    pub fn progress(&mut self, percent: f64) -> Result<(), DashboardError> {
        if !percent.is_finite() {
            return Err(DashboardError::InvalidPayload(format!(
                "training progress must be a number, got {}",
                percent
            )));
        }
        let clamped = percent.clamp(0.0, 100.0);
        if clamped != percent {
            warn!("Training progress {} clamped to {}", percent, clamped);
        }
        self.show_progress(clamped);
        Ok(())
    }

    pub fn complete(&mut self) {
        self.show_progress(100.0);
        skip_on_error(
            self.display
                .set_text(FieldId::TrainingStatus, "Model training completed!"),
        );
        info!("Model training completed");
    }

    fn show_progress(&mut self, percent: f64) {
        skip_on_error(self.display.set_value(FieldId::TrainingProgress, percent));
        skip_on_error(
            self.display
                .set_text(FieldId::ProgressPercent, &format!("{}%", percent)),
        );
    }
}
