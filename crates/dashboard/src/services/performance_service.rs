use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use chart::{MemorySurface, PERFORMANCE_CHART, PerformancePanel};
use common::{
    actors::{Actor, ActorType, ControlMessage},
    models::InboundEvent,
};

use crate::services::snapshot::write_snapshot;

pub type SharedPerformancePanel = Arc<Mutex<PerformancePanel<MemorySurface>>>;

/// Feeds `update_performance` samples into the accuracy chart. The panel is
/// shared so its history outlives a restart of this service.
pub struct PerformanceService {
    id: Uuid,
    panel: SharedPerformancePanel,
    surface: MemorySurface,
    event_rx: broadcast::Receiver<Arc<InboundEvent>>,
    snapshot_dir: Option<PathBuf>,
}

#[async_trait]
impl Actor for PerformanceService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::PerformanceActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting Performance Service");

        loop {
            match self.event_rx.recv().await {
                Ok(event_arc) => {
                    let InboundEvent::UpdatePerformance(sample) = &*event_arc else {
                        continue;
                    };

                    let recorded = self.panel.lock().record(*sample);
                    match recorded {
                        Ok(()) => {
                            debug!("Accuracy {:.3} at {}", sample.accuracy, sample.timestamp);
                            if let Some(dir) = &self.snapshot_dir {
                                write_snapshot(dir, &self.surface, PERFORMANCE_CHART).await;
                            }
                        }
                        Err(e) => warn!("Performance sample dropped: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Performance service lagged: missed {} samples", n);
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

impl PerformanceService {
    pub fn new(
        panel: SharedPerformancePanel,
        surface: MemorySurface,
        event_rx: broadcast::Receiver<Arc<InboundEvent>>,
        snapshot_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            panel,
            surface,
            event_rx,
            snapshot_dir,
        }
    }
}
