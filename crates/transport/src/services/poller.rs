use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, mpsc},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::{
    actors::{Actor, ActorType, ControlMessage},
    models::{InboundEvent, OutboundCommand},
};

/// Asks the server for a fresh `update_chart` on a fixed interval and right
/// after every (re)connect.
pub struct DataPoller {
    id: Uuid,
    interval: Duration,
    inbound_rx: broadcast::Receiver<Arc<InboundEvent>>,
    outbound_tx: broadcast::Sender<OutboundCommand>,
}

#[async_trait]
impl Actor for DataPoller {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::PollerActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx);
        info!("Polling for market data every {:?}", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.request_data(),
                event = self.inbound_rx.recv() => match event {
                    Ok(event) => {
                        if matches!(*event, InboundEvent::Connected) {
                            self.request_data();
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Poller lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        heartbeat_handle.abort();
                        bail!("Inbound event channel closed");
                    }
                },
            }
        }
    }
}

impl DataPoller {
    pub fn new(
        interval: Duration,
        inbound_rx: broadcast::Receiver<Arc<InboundEvent>>,
        outbound_tx: broadcast::Sender<OutboundCommand>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            interval,
            inbound_rx,
            outbound_tx,
        }
    }

    fn request_data(&self) {
        if self.outbound_tx.send(OutboundCommand::RequestData).is_err() {
            debug!("No transport listening, request_data dropped");
        }
    }
}
