use dotenvy::dotenv;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use chart::{MemorySurface, PERFORMANCE_CHART, PerformancePanel, TRADING_CHART};
use common::actors::ActorType;
use common::config::DashboardConfig;
use common::logger;
use common::models::{InboundEvent, OutboundCommand};
use panels::MemoryDisplay;
use transport::remote::socket_url;
use transport::{DataPoller, TransportGateway};

use crate::actors::supervisor::Supervisor;
use crate::services::chart_service::ChartService;
use crate::services::performance_service::PerformanceService;
use crate::services::training_service::TrainingService;

mod actors;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("Dashboard starting up...");

    let config = DashboardConfig::from_env().context("Invalid dashboard configuration")?;
    let endpoint = socket_url(&config.server_url).context("Invalid server url")?;
    if let Some(dir) = &config.snapshot_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Cannot create snapshot dir {}", dir.display()))?;
        info!("Writing figure snapshots to {}", dir.display());
    }

    let surface = MemorySurface::with_containers([TRADING_CHART, PERFORMANCE_CHART]);
    let display = MemoryDisplay::page();

    let (inbound_tx, _) = broadcast::channel::<Arc<InboundEvent>>(1_024);
    let (outbound_tx, _) = broadcast::channel::<OutboundCommand>(64);

    let mut supervisor = Supervisor::new();

    let tx_for_gateway = inbound_tx.clone();
    let commands_for_gateway = outbound_tx.subscribe();
    supervisor.register_actor(
        ActorType::GatewayActor,
        Box::new(move || {
            Box::new(TransportGateway::new(
                endpoint.clone(),
                tx_for_gateway.clone(),
                commands_for_gateway.resubscribe(),
            ))
        }),
    );

    let poll_interval = config.poll_interval;
    let rx_for_poller = inbound_tx.subscribe();
    let commands_for_poller = outbound_tx.clone();
    supervisor.register_actor(
        ActorType::PollerActor,
        Box::new(move || {
            Box::new(DataPoller::new(
                poll_interval,
                rx_for_poller.resubscribe(),
                commands_for_poller.clone(),
            ))
        }),
    );

    let sampling = config.sampling;
    let surface_for_chart = surface.clone();
    let display_for_chart = display.clone();
    let rx_for_chart = inbound_tx.subscribe();
    let snapshots_for_chart = config.snapshot_dir.clone();
    supervisor.register_actor(
        ActorType::ChartActor,
        Box::new(move || {
            Box::new(ChartService::new(
                sampling,
                surface_for_chart.clone(),
                display_for_chart.clone(),
                rx_for_chart.resubscribe(),
                snapshots_for_chart.clone(),
            ))
        }),
    );

    let performance_panel = Arc::new(Mutex::new(PerformancePanel::new(
        PERFORMANCE_CHART,
        surface.clone(),
        config.performance_capacity,
    )));
    let surface_for_performance = surface.clone();
    let rx_for_performance = inbound_tx.subscribe();
    let snapshots_for_performance = config.snapshot_dir.clone();
    supervisor.register_actor(
        ActorType::PerformanceActor,
        Box::new(move || {
            Box::new(PerformanceService::new(
                performance_panel.clone(),
                surface_for_performance.clone(),
                rx_for_performance.resubscribe(),
                snapshots_for_performance.clone(),
            ))
        }),
    );

    if let Some(model) = &config.train_model {
        info!("Model '{}' will be trained once connected", model);
    }
    let pending_training = Arc::new(Mutex::new(config.train_model.clone()));
    let rx_for_training = inbound_tx.subscribe();
    let commands_for_training = outbound_tx.clone();
    supervisor.register_actor(
        ActorType::TrainingActor,
        Box::new(move || {
            Box::new(TrainingService::new(
                display.clone(),
                commands_for_training.clone(),
                pending_training.clone(),
                rx_for_training.resubscribe(),
            ))
        }),
    );

    supervisor.start().await;
    Ok(())
}
