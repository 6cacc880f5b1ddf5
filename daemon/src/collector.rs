//! Process discovery and memory reads

pub mod linux;

pub use linux::LinuxProcessCollector;

use crate::error::ProbeError;
use serde::Serialize;

/// A running user-facing application that can be picked for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppCandidate {
    pub pid: u32,
    /// Stable package identifier, preferred as the match key.
    pub identifier: Option<String>,
    pub name: String,
    pub icon: Option<String>,
}

pub trait ProcessCollector: Send + Sync {
    /// User-facing applications, sorted case-insensitively by name.
    fn list_candidates(&self) -> Vec<AppCandidate>;

    fn find_by_identifier(&self, identifier: &str) -> Option<AppCandidate> {
        find_candidate(&self.list_candidates(), Some(identifier), "").cloned()
    }

    fn find_by_name(&self, name: &str) -> Option<AppCandidate> {
        find_candidate(&self.list_candidates(), None, name).cloned()
    }

    /// Resident memory of `pid` in bytes.
    fn read_memory_bytes(&self, pid: u32) -> Result<u64, ProbeError>;
}

/// Look a target up in an already collected list: by identifier when one is
/// known, otherwise by display name.
pub fn find_candidate<'a>(
    candidates: &'a [AppCandidate],
    identifier: Option<&str>,
    name: &str,
) -> Option<&'a AppCandidate> {
    match identifier {
        Some(identifier) => candidates
            .iter()
            .find(|c| c.identifier.as_deref() == Some(identifier)),
        None => candidates.iter().find(|c| c.name == name),
    }
}

/// Sort case-insensitively by name and keep one entry per identifier,
/// preferring the lowest pid.
pub fn normalize_candidates(mut candidates: Vec<AppCandidate>) -> Vec<AppCandidate> {
    candidates.sort_by_key(|c| c.pid);
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| match &c.identifier {
        Some(id) => seen.insert(id.clone()),
        None => true,
    });
    candidates.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.pid.cmp(&b.pid))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(pid: u32, id: &str, name: &str) -> AppCandidate {
        AppCandidate {
            pid,
            identifier: Some(id.to_string()),
            name: name.to_string(),
            icon: None,
        }
    }

    #[test]
    fn normalize_dedupes_and_sorts() {
        let list = normalize_candidates(vec![
            candidate(40, "/usr/bin/firefox", "firefox"),
            candidate(12, "/usr/bin/firefox", "firefox"),
            candidate(7, "/usr/bin/Code", "Code"),
            candidate(9, "/usr/bin/alacritty", "alacritty"),
        ]);
        let pids: Vec<u32> = list.iter().map(|c| c.pid).collect();
        assert_eq!(pids, vec![9, 7, 12]);
    }

    #[test]
    fn find_prefers_identifier() {
        let list = vec![
            candidate(3, "/opt/a/app", "app"),
            candidate(4, "/opt/b/app", "app"),
        ];
        assert_eq!(find_candidate(&list, Some("/opt/b/app"), "app").map(|c| c.pid), Some(4));
        assert_eq!(find_candidate(&list, None, "app").map(|c| c.pid), Some(3));
        assert!(find_candidate(&list, Some("/opt/c/app"), "app").is_none());
    }
}
