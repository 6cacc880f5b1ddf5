//! Runs the engine on a single task. Timer ticks and commands are taken from
//! one `select!` loop, so no two mutations or polls ever interleave.

use crate::engine::MonitorEngine;
use crate::target::{EngineSnapshot, MonitoredTarget};
use crate::threshold::ThresholdSet;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Fixed polling cadence.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

const COMMAND_QUEUE: usize = 64;

enum Command {
    Add {
        target: MonitoredTarget,
        reply: oneshot::Sender<bool>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    UpdateThresholds {
        id: Uuid,
        thresholds: ThresholdSet,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
#[error("monitor engine has shut down")]
pub struct EngineStopped;

/// Cloneable front end to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<EngineSnapshot>,
}

impl EngineHandle {
    pub async fn add(&self, target: MonitoredTarget) -> Result<bool, EngineStopped> {
        self.request(|reply| Command::Add { target, reply }).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<bool, EngineStopped> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    pub async fn update_thresholds(&self, id: Uuid, thresholds: ThresholdSet) -> Result<bool, EngineStopped> {
        self.request(|reply| Command::UpdateThresholds { id, thresholds, reply }).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineStopped> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Latest published state, refreshed after every tick and mutation that
    /// changes it.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.state_rx.clone()
    }

    /// Stop the timer. A tick in progress is allowed to finish.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, EngineStopped> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| EngineStopped)?;
        rx.await.map_err(|_| EngineStopped)
    }
}

/// Move `engine` onto its own task, ticking every `period`.
pub fn spawn(engine: MonitorEngine, period: Duration) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let (state_tx, state_rx) = watch::channel(engine.snapshot());
    let task = tokio::spawn(run(engine, period, rx, state_tx));
    (EngineHandle { tx, state_rx }, task)
}

async fn run(
    mut engine: MonitorEngine,
    period: Duration,
    mut rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<EngineSnapshot>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let collector = engine.collector();
                match tokio::task::spawn_blocking(move || collector.list_candidates()).await {
                    Ok(candidates) => engine.tick_with(&candidates),
                    Err(e) => error!("Process scan failed: {}", e),
                }
            }
            command = rx.recv() => {
                match command {
                    Some(Command::Add { target, reply }) => {
                        let _ = reply.send(engine.add(target));
                    }
                    Some(Command::Remove { id, reply }) => {
                        let _ = reply.send(engine.remove(id));
                    }
                    Some(Command::UpdateThresholds { id, thresholds, reply }) => {
                        let _ = reply.send(engine.update_thresholds(id, thresholds));
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(engine.snapshot());
                        continue;
                    }
                    Some(Command::Shutdown) => {
                        info!("Monitor engine shutting down");
                        break;
                    }
                    None => {
                        debug!("All engine handles dropped");
                        break;
                    }
                }
            }
        }
        let snapshot = engine.snapshot();
        state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
