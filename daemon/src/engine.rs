//! Monitoring engine: owns the target list, polls memory and fires alerts

use crate::collector::{find_candidate, AppCandidate, ProcessCollector};
use crate::db::TargetStore;
use crate::notifier::AlertSink;
use crate::target::{EngineSnapshot, MonitoredTarget, PersistedTarget};
use crate::threshold::{format_bytes, ThresholdSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Plain owned state. Callers must serialize access; see [`crate::service`]
/// for the task that does so.
pub struct MonitorEngine {
    targets: Vec<MonitoredTarget>,
    collector: Arc<dyn ProcessCollector>,
    sink: Arc<dyn AlertSink>,
    store: Box<dyn TargetStore>,
}

impl MonitorEngine {
    /// Build an engine seeded from the store. A store that cannot be read
    /// yields an empty target list.
    pub fn new(
        collector: Arc<dyn ProcessCollector>,
        sink: Arc<dyn AlertSink>,
        store: Box<dyn TargetStore>,
    ) -> Self {
        let targets = match store.load() {
            Ok(stored) => stored.into_iter().map(MonitoredTarget::from_persisted).collect(),
            Err(e) => {
                warn!("Failed to load monitored targets: {}, starting empty", e);
                Vec::new()
            }
        };
        info!("Loaded {} monitored target(s)", targets.len());
        Self {
            targets,
            collector,
            sink,
            store,
        }
    }

    pub fn targets(&self) -> &[MonitoredTarget] {
        &self.targets
    }

    pub fn target(&self, id: Uuid) -> Option<&MonitoredTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// True iff some target is using more than its lowest threshold.
    pub fn has_warning(&self) -> bool {
        self.targets.iter().any(MonitoredTarget::has_warning)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            targets: self.targets.iter().map(MonitoredTarget::snapshot).collect(),
            has_warning: self.has_warning(),
        }
    }

    /// Start monitoring `target`. Returns false if its id is already present.
    pub fn add(&mut self, target: MonitoredTarget) -> bool {
        if self.targets.iter().any(|t| t.id == target.id) {
            debug!("Target {} already monitored", target.id);
            return false;
        }
        info!("Monitoring {} ({})", target.name, target.id);
        self.targets.push(target);
        self.persist();
        let index = self.targets.len() - 1;
        let candidates = self.collector.list_candidates();
        self.poll_target(index, &candidates);
        true
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        if self.targets.len() == before {
            return false;
        }
        info!("Stopped monitoring {}", id);
        self.persist();
        true
    }

    /// Replace a target's thresholds; its outstanding breaches are cleared.
    pub fn update_thresholds(&mut self, id: Uuid, thresholds: ThresholdSet) -> bool {
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        target.set_thresholds(thresholds);
        self.persist();
        true
    }

    pub fn collector(&self) -> Arc<dyn ProcessCollector> {
        Arc::clone(&self.collector)
    }

    /// One polling pass over every target, scanning processes once.
    pub fn tick(&mut self) {
        let candidates = self.collector.list_candidates();
        self.tick_with(&candidates);
    }

    /// One polling pass against a candidate list collected by the caller.
    pub fn tick_with(&mut self, candidates: &[AppCandidate]) {
        for index in 0..self.targets.len() {
            self.poll_target(index, candidates);
        }
    }

    fn poll_target(&mut self, index: usize, candidates: &[AppCandidate]) {
        let Some(target) = self.targets.get_mut(index) else {
            return;
        };

        let Some(candidate) = find_candidate(candidates, target.identifier.as_deref(), &target.name) else {
            if target.is_running() {
                info!("{} is no longer running", target.name);
            }
            target.mark_stopped();
            return;
        };

        target.mark_found(candidate);
        match self.collector.read_memory_bytes(candidate.pid) {
            Ok(bytes) => {
                for threshold in target.record_sample(bytes) {
                    info!(
                        "{} crossed {} threshold ({})",
                        target.name,
                        format_bytes(threshold),
                        format_bytes(bytes)
                    );
                    self.sink.notify(&target.name, bytes, threshold);
                }
            }
            // Including NotFound: only a failed lookup stops a target
            Err(e) => {
                warn!("Failed to read memory for {} (pid {}): {}", target.name, candidate.pid, e);
            }
        }
    }

    fn persist(&self) {
        let stored: Vec<PersistedTarget> = self.targets.iter().map(MonitoredTarget::to_persisted).collect();
        if let Err(e) = self.store.save(&stored) {
            error!("Failed to save monitored targets: {}", e);
        }
    }
}
