use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorType {
    GatewayActor,
    PollerActor,
    ChartActor,
    PerformanceActor,
    TrainingActor,
}

/// Messages sent from Actors to the Supervisor
#[derive(Debug)]
pub enum ControlMessage {
    Heartbeat(ActorType),
    Shutdown(ActorType),
    Error(ActorType, String),
}

/// The trait that all restartable services must implement
#[async_trait]
pub trait Actor: Send + Sync {
    /// The kind of the actor, used as the supervisor key
    fn name(&self) -> ActorType;

    /// Instance id, fresh for every restart
    fn id(&self) -> Uuid;

    /// The main loop of the actor.
    /// It must periodically send `ControlMessage::Heartbeat` to the supervisor.
    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()>;

    /// The pulse stops when the returned guard is dropped, so an actor that
    /// panics or is aborted goes quiet with it.
    fn spawn_heartbeat(&self, supervisor_tx: mpsc::Sender<ControlMessage>) -> HeartbeatGuard {
        let name = self.name();
        HeartbeatGuard(tokio::spawn(async move {
            loop {
                if supervisor_tx
                    .send(ControlMessage::Heartbeat(name))
                    .await
                    .is_err()
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }))
    }
}

/// Heartbeat task handle that aborts the task on drop.
#[derive(Debug)]
pub struct HeartbeatGuard(JoinHandle<()>);

impl HeartbeatGuard {
    pub fn abort(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
