use std::{collections::HashMap, time::Duration};
use tracing::{error, info, warn};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

use common::actors::{Actor, ActorType, ControlMessage};

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

/// Spawns registered actors and respawns any that exit or whose heartbeat
/// goes quiet.
pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    supervisor_tx: mpsc::Sender<ControlMessage>,
    supervisor_rx: mpsc::Receiver<ControlMessage>,
    check_interval: Duration,
    heartbeat_timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(1), Duration::from_secs(3))
    }

    pub fn with_timeouts(check_interval: Duration, heartbeat_timeout: Duration) -> Self {
        let (supervisor_tx, supervisor_rx) = mpsc::channel::<ControlMessage>(512);
        Self {
            actor_factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            supervisor_tx,
            supervisor_rx,
            check_interval,
            heartbeat_timeout,
        }
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let mut check_interval = time::interval(self.check_interval);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        for actor in actors {
            self.spawn_actor(actor);
        }

        loop {
            tokio::select! {
                Some(msg) = self.supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(actor_type) => {
                            if self.handles.contains_key(&actor_type) {
                                self.pulses.insert(actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(actor_type) => {
                            warn!("{:?} is shutting down gracefully.", actor_type);
                            self.pulses.remove(&actor_type);
                            if let Some(handle) = self.handles.remove(&actor_type) {
                                handle.abort();
                            }
                        },
                        ControlMessage::Error(actor_type, error_msg) => {
                            error!("Actor {:?} reported error: {}", actor_type, error_msg);
                        },
                    }
                }

                _ = check_interval.tick() => {
                    let now = Instant::now();
                    let dead_actors: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|(actor, last)| {
                            now.duration_since(**last) > self.heartbeat_timeout
                                || self.handles.get(*actor).is_some_and(|h| h.is_finished())
                        })
                        .map(|(actor, _)| *actor)
                        .collect();

                    for actor in dead_actors {
                        warn!("{:?} is unresponsive or has exited! Restarting.", actor);
                        if let Some(handle) = self.handles.remove(&actor) {
                            handle.abort();
                        }
                        self.spawn_actor(actor);
                    }
                }
            }
        }
    }

    fn spawn_actor(&mut self, actor_type: ActorType) {
        let Some(factory) = self.actor_factories.get(&actor_type) else {
            error!("No factory registered for {:?}", actor_type);
            return;
        };

        let mut new_actor = factory();
        info!("Starting {:?} ({})", actor_type, new_actor.id());
        let tx = self.supervisor_tx.clone();
        let new_actor_handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.handles.insert(actor_type, new_actor_handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CrashingActor {
        id: Uuid,
        starts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for CrashingActor {
        fn name(&self) -> ActorType {
            ActorType::ChartActor
        }

        fn id(&self) -> Uuid {
            self.id
        }

        async fn run(&mut self, _supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("boom")
        }
    }

    struct SteadyActor {
        id: Uuid,
        starts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for SteadyActor {
        fn name(&self) -> ActorType {
            ActorType::PollerActor
        }

        fn id(&self) -> Uuid {
            self.id
        }

        async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let _heartbeat = self.spawn_heartbeat(supervisor_tx);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_silent_actor_is_restarted_and_healthy_one_is_not() {
        let crashes = Arc::new(AtomicUsize::new(0));
        let steady = Arc::new(AtomicUsize::new(0));

        let mut supervisor =
            Supervisor::with_timeouts(Duration::from_millis(50), Duration::from_millis(1_000));

        let counter = crashes.clone();
        supervisor.register_actor(
            ActorType::ChartActor,
            Box::new(move || {
                Box::new(CrashingActor {
                    id: Uuid::new_v4(),
                    starts: counter.clone(),
                })
            }),
        );
        let counter = steady.clone();
        supervisor.register_actor(
            ActorType::PollerActor,
            Box::new(move || {
                Box::new(SteadyActor {
                    id: Uuid::new_v4(),
                    starts: counter.clone(),
                })
            }),
        );

        let _ = time::timeout(Duration::from_millis(2_500), supervisor.start()).await;

        assert!(crashes.load(Ordering::SeqCst) >= 2);
        assert_eq!(steady.load(Ordering::SeqCst), 1);
    }

    struct PanickingActor {
        id: Uuid,
        starts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for PanickingActor {
        fn name(&self) -> ActorType {
            ActorType::PerformanceActor
        }

        fn id(&self) -> Uuid {
            self.id
        }

        async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let _heartbeat = self.spawn_heartbeat(supervisor_tx);
            time::sleep(Duration::from_millis(20)).await;
            panic!("frame overflow");
        }
    }

    #[tokio::test]
    async fn test_actor_that_panics_after_heartbeat_is_restarted() {
        let starts = Arc::new(AtomicUsize::new(0));

        // Heartbeat timeout far beyond the test run: only the exit can trigger a restart.
        let mut supervisor =
            Supervisor::with_timeouts(Duration::from_millis(50), Duration::from_secs(60));

        let counter = starts.clone();
        supervisor.register_actor(
            ActorType::PerformanceActor,
            Box::new(move || {
                Box::new(PanickingActor {
                    id: Uuid::new_v4(),
                    starts: counter.clone(),
                })
            }),
        );

        let _ = time::timeout(Duration::from_millis(1_000), supervisor.start()).await;

        assert!(starts.load(Ordering::SeqCst) >= 2);
    }
}
