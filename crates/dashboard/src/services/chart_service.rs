use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use chart::{ChartDataTransformer, ChartRenderer, MemorySurface, TRADING_CHART};
use common::{
    DashboardError,
    actors::{Actor, ActorType, ControlMessage},
    config::SamplingConfig,
    models::{InboundEvent, MarketUpdate},
};
use panels::{MemoryDisplay, SignalPanelPresenter, TrendLabelPresenter};

use crate::services::snapshot::write_snapshot;

const CHART_TITLE: &str = "ETH/USD Trading Chart";

/// Sole consumer of `update_chart`: redraws the trading chart, the trend
/// label and the signal panel, one update at a time.
pub struct ChartService {
    id: Uuid,
    transformer: ChartDataTransformer,
    renderer: ChartRenderer<MemorySurface>,
    trend_label: TrendLabelPresenter<MemoryDisplay>,
    signal_panel: SignalPanelPresenter<MemoryDisplay>,
    event_rx: broadcast::Receiver<Arc<InboundEvent>>,
    snapshot_dir: Option<PathBuf>,
}

#[async_trait]
impl Actor for ChartService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::ChartActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!("Starting Chart Service");

        loop {
            match self.event_rx.recv().await {
                Ok(event_arc) => {
                    let InboundEvent::UpdateChart(update) = &*event_arc else {
                        continue;
                    };

                    if let Err(e) = self.apply(update) {
                        warn!("Chart frame skipped: {}", e);
                        if !e.is_recoverable() {
                            supervisor_tx
                                .send(ControlMessage::Error(self.name(), e.to_string()))
                                .await?;
                        }
                        continue;
                    }

                    if let Some(dir) = &self.snapshot_dir {
                        write_snapshot(dir, self.renderer.surface(), TRADING_CHART).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Chart service lagged: missed {} updates", n);
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

impl ChartService {
    pub fn new(
        sampling: SamplingConfig,
        surface: MemorySurface,
        display: MemoryDisplay,
        event_rx: broadcast::Receiver<Arc<InboundEvent>>,
        snapshot_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transformer: ChartDataTransformer::new(sampling),
            renderer: ChartRenderer::new(TRADING_CHART, CHART_TITLE, surface),
            trend_label: TrendLabelPresenter::new(display.clone()),
            signal_panel: SignalPanelPresenter::new(display),
            event_rx,
            snapshot_dir,
        }
    }

    /// The signal panel is rendered even when the chart frame is rejected, and
    /// the trend label even when the chart container is missing.
    fn apply(&mut self, update: &MarketUpdate) -> Result<(), DashboardError> {
        self.signal_panel.render(update);

        let frame = self.transformer.transform(update, Utc::now())?;
        let trend = frame.trend;
        self.trend_label.render(trend);
        self.renderer.update(frame.traces, frame.layout)?;

        debug!(
            "Rendered {} prices, {} predictions, trend {}",
            update.prices.len(),
            update.predicted_prices.len(),
            trend.label()
        );
        Ok(())
    }
}
