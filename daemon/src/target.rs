//! Monitored applications and their persisted form

use crate::collector::AppCandidate;
use crate::detector::BreachTracker;
use crate::threshold::{format_bytes, ThresholdSet, MB};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MonitoredTarget {
    pub id: Uuid,
    pub name: String,
    pub identifier: Option<String>,
    thresholds: ThresholdSet,
    pid: Option<u32>,
    icon: Option<String>,
    is_running: bool,
    current_bytes: u64,
    breaches: BreachTracker,
}

impl MonitoredTarget {
    /// A target that has not been polled yet.
    pub fn new(name: impl Into<String>, identifier: Option<String>, thresholds: ThresholdSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            identifier,
            thresholds,
            pid: None,
            icon: None,
            is_running: false,
            current_bytes: 0,
            breaches: BreachTracker::new(),
        }
    }

    /// A target for an application the user just picked.
    pub fn from_candidate(candidate: &AppCandidate, thresholds: ThresholdSet) -> Self {
        let mut target = Self::new(candidate.name.clone(), candidate.identifier.clone(), thresholds);
        target.pid = Some(candidate.pid);
        target.icon = candidate.icon.clone();
        target.is_running = true;
        target
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }

    pub fn notified_thresholds(&self) -> Vec<u64> {
        self.breaches.notified().collect()
    }

    /// Thresholds strictly below current usage.
    pub fn breached_thresholds(&self) -> Vec<u64> {
        self.thresholds
            .iter()
            .filter(|&t| t < self.current_bytes)
            .collect()
    }

    pub fn has_warning(&self) -> bool {
        self.thresholds
            .lowest()
            .map_or(false, |t| self.current_bytes > t)
    }

    /// Replace the thresholds. Outstanding breaches belong to the old limits
    /// and are dropped.
    pub(crate) fn set_thresholds(&mut self, thresholds: ThresholdSet) {
        self.thresholds = thresholds;
        self.breaches.clear();
    }

    pub(crate) fn mark_found(&mut self, candidate: &AppCandidate) {
        self.is_running = true;
        self.pid = Some(candidate.pid);
        self.icon = candidate.icon.clone();
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.is_running = false;
        self.pid = None;
        self.current_bytes = 0;
        self.breaches.clear();
    }

    /// Record a fresh memory sample and return newly breached thresholds.
    pub(crate) fn record_sample(&mut self, bytes: u64) -> Vec<u64> {
        let previous = self.current_bytes;
        self.current_bytes = bytes;
        self.breaches.evaluate(previous, bytes, &self.thresholds)
    }

    pub fn to_persisted(&self) -> PersistedTarget {
        PersistedTarget {
            id: self.id,
            name: self.name.clone(),
            identifier: self.identifier.clone(),
            thresholds_mb: self.thresholds.to_megabytes(),
        }
    }

    /// Rebuild a target from storage. Runtime state starts stopped and empty;
    /// unusable stored thresholds fall back to the defaults.
    pub fn from_persisted(stored: PersistedTarget) -> Self {
        let thresholds = ThresholdSet::from_megabytes(stored.thresholds_mb.iter().copied())
            .unwrap_or_else(|e| {
                warn!("Stored thresholds for {} are invalid ({}), using defaults", stored.name, e);
                ThresholdSet::default()
            });
        let mut target = Self::new(stored.name, stored.identifier, thresholds);
        target.id = stored.id;
        target
    }

    pub fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            id: self.id,
            name: self.name.clone(),
            identifier: self.identifier.clone(),
            pid: self.pid,
            is_running: self.is_running,
            current_bytes: self.current_bytes,
            current: format_bytes(self.current_bytes),
            thresholds_mb: self.thresholds.to_megabytes(),
            thresholds: self.thresholds.formatted(),
            notified_mb: self.breaches.notified().map(|b| b / MB).collect(),
            warning: self.has_warning(),
        }
    }
}

/// Identity and configuration only; runtime state is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTarget {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub thresholds_mb: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSnapshot {
    pub id: Uuid,
    pub name: String,
    pub identifier: Option<String>,
    pub pid: Option<u32>,
    pub is_running: bool,
    pub current_bytes: u64,
    pub current: String,
    pub thresholds_mb: Vec<u64>,
    pub thresholds: Vec<String>,
    pub notified_mb: Vec<u64>,
    pub warning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub targets: Vec<TargetSnapshot>,
    pub has_warning: bool,
}

impl EngineSnapshot {
    pub fn running_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_running).count()
    }
}
