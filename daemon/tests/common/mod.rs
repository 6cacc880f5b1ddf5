//! Fakes shared by the integration tests

#![allow(dead_code)]

use memalert_daemon::{
    collector::{AppCandidate, ProcessCollector},
    db::TargetStore,
    error::{ProbeError, StoreError},
    notifier::AlertSink,
    target::PersistedTarget,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * MB;

/// Scriptable process table: running apps and what a memory read returns.
#[derive(Default)]
pub struct FakeCollector {
    apps: Mutex<Vec<AppCandidate>>,
    memory: Mutex<HashMap<u32, Result<u64, ProbeError>>>,
    scans: AtomicUsize,
}

impl FakeCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn launch(&self, pid: u32, identifier: Option<&str>, name: &str, bytes: u64) {
        self.apps.lock().unwrap().push(AppCandidate {
            pid,
            identifier: identifier.map(str::to_string),
            name: name.to_string(),
            icon: None,
        });
        self.set_memory(pid, bytes);
    }

    pub fn quit(&self, pid: u32) {
        self.apps.lock().unwrap().retain(|a| a.pid != pid);
        self.memory.lock().unwrap().remove(&pid);
    }

    pub fn set_memory(&self, pid: u32, bytes: u64) {
        self.memory.lock().unwrap().insert(pid, Ok(bytes));
    }

    pub fn fail_reads(&self, pid: u32, error: ProbeError) {
        self.memory.lock().unwrap().insert(pid, Err(error));
    }

    /// How many times the process list has been collected.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn candidate(&self, pid: u32) -> AppCandidate {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.pid == pid)
            .cloned()
            .expect("no such fake app")
    }
}

impl ProcessCollector for FakeCollector {
    fn list_candidates(&self) -> Vec<AppCandidate> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.apps.lock().unwrap().clone()
    }

    fn read_memory_bytes(&self, pid: u32) -> Result<u64, ProbeError> {
        self.memory
            .lock()
            .unwrap()
            .get(&pid)
            .cloned()
            .unwrap_or(Err(ProbeError::NotFound))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAlert {
    pub name: String,
    pub current_bytes: u64,
    pub threshold_bytes: u64,
}

#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<SentAlert>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<SentAlert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl AlertSink for RecordingSink {
    fn notify(&self, process_name: &str, current_bytes: u64, threshold_bytes: u64) {
        self.alerts.lock().unwrap().push(SentAlert {
            name: process_name.to_string(),
            current_bytes,
            threshold_bytes,
        });
    }
}

/// Store backed by a shared vector so tests can inspect what was saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<PersistedTarget>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(targets: Vec<PersistedTarget>) -> Self {
        let store = Self::default();
        *store.saved.lock().unwrap() = targets;
        store
    }

    pub fn saved(&self) -> Vec<PersistedTarget> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl TargetStore for MemoryStore {
    fn load(&self) -> Result<Vec<PersistedTarget>, StoreError> {
        Ok(self.saved())
    }

    fn save(&self, targets: &[PersistedTarget]) -> Result<(), StoreError> {
        *self.saved.lock().unwrap() = targets.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// A store whose contents cannot be decoded.
pub struct BrokenStore;

impl TargetStore for BrokenStore {
    fn load(&self) -> Result<Vec<PersistedTarget>, StoreError> {
        Err(serde_json::from_str::<Vec<PersistedTarget>>("not json").unwrap_err().into())
    }

    fn save(&self, _targets: &[PersistedTarget]) -> Result<(), StoreError> {
        Err(serde_json::from_str::<Vec<PersistedTarget>>("not json").unwrap_err().into())
    }
}
