use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use common::{
    actors::{Actor, ActorType, ControlMessage},
    models::{InboundEvent, OutboundCommand},
};
use panels::{MemoryDisplay, TrainingProgressPresenter};

/// Model queued for training on the first successful connect; taken once.
pub type PendingTraining = Arc<Mutex<Option<String>>>;

pub struct TrainingService {
    id: Uuid,
    presenter: TrainingProgressPresenter<MemoryDisplay>,
    pending: PendingTraining,
    event_rx: broadcast::Receiver<Arc<InboundEvent>>,
}

#[async_trait]
impl Actor for TrainingService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::TrainingActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting Training Service");

        loop {
            match self.event_rx.recv().await {
                Ok(event_arc) => self.handle(&event_arc),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Training service lagged: missed {} events", n);
                }
                Err(_) => {
                    let err_msg = "Inbound channel closed. Stopping service.".to_string();
                    heartbeat_handle.abort();
                    supervisor_tx
                        .send(ControlMessage::Error(self.name(), err_msg.clone()))
                        .await?;
                    bail!(err_msg);
                }
            }
        }
    }
}

impl TrainingService {
    pub fn new(
        display: MemoryDisplay,
        commands: broadcast::Sender<OutboundCommand>,
        pending: PendingTraining,
        event_rx: broadcast::Receiver<Arc<InboundEvent>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            presenter: TrainingProgressPresenter::new(display, commands),
            pending,
            event_rx,
        }
    }

    fn handle(&mut self, event: &InboundEvent) {
        match event {
            InboundEvent::Connected => {
                let model = self.pending.lock().take();
                if let Some(model) = model {
                    if let Err(e) = self.presenter.start(&model) {
                        warn!("Could not request training of '{}': {}", model, e);
                    }
                }
            }
            InboundEvent::TrainingProgress(percent) => {
                if let Err(e) = self.presenter.progress(*percent) {
                    warn!("Training progress ignored: {}", e);
                }
            }
            InboundEvent::TrainingComplete => self.presenter.complete(),
            _ => {}
        }
    }
}
