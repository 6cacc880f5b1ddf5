//! Threshold-crossing detection with re-arm on drop

use crate::threshold::ThresholdSet;
use std::collections::BTreeSet;

/// Per-target record of which thresholds have an outstanding breach.
///
/// A threshold fires once when usage reaches it and stays silent until usage
/// falls back below it, at which point it is re-armed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreachTracker {
    notified: BTreeSet<u64>,
}

impl BreachTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one usage sample and return the thresholds newly breached by it,
    /// lowest first. Each returned threshold must be alerted exactly once.
    pub fn evaluate(&mut self, previous: u64, current: u64, thresholds: &ThresholdSet) -> Vec<u64> {
        self.notified.retain(|t| thresholds.contains(*t));

        let mut fired = Vec::new();
        for t in thresholds.iter() {
            if current >= t {
                if self.notified.insert(t) {
                    fired.push(t);
                }
            } else if previous >= t {
                self.notified.remove(&t);
            }
        }
        fired
    }

    /// Forget every outstanding breach.
    pub fn clear(&mut self) {
        self.notified.clear();
    }

    pub fn is_notified(&self, threshold: u64) -> bool {
        self.notified.contains(&threshold)
    }

    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }

    pub fn notified(&self) -> impl Iterator<Item = u64> + '_ {
        self.notified.iter().copied()
    }
}
