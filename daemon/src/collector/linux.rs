use super::{normalize_candidates, AppCandidate, ProcessCollector};
use crate::error::ProbeError;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Environment variables marking a process as part of a graphical session.
const SESSION_VARS: [&[u8]; 2] = [b"DISPLAY=", b"WAYLAND_DISPLAY="];

pub struct LinuxProcessCollector {
    page_size: u64,
    uid: u32,
}

impl LinuxProcessCollector {
    pub fn new() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        let uid = unsafe { libc::getuid() };
        Self {
            page_size: if page_size > 0 { page_size as u64 } else { 4096 },
            uid,
        }
    }

    fn parse_candidate(&self, pid: u32) -> Option<AppCandidate> {
        let proc_path = format!("/proc/{}", pid);
        let proc_dir = Path::new(&proc_path);

        let meta = fs::metadata(proc_dir).ok()?;
        if meta.uid() != self.uid {
            return None;
        }

        // Kernel threads have an empty cmdline
        let cmdline = fs::read(proc_dir.join("cmdline")).ok()?;
        if cmdline.is_empty() {
            return None;
        }

        let environ = fs::read(proc_dir.join("environ")).ok()?;
        let graphical = environ
            .split(|b| *b == 0)
            .any(|var| SESSION_VARS.iter().any(|prefix| var.starts_with(prefix) && var.len() > prefix.len()));
        if !graphical {
            return None;
        }

        let name = fs::read_to_string(proc_dir.join("comm"))
            .ok()?
            .trim_end()
            .to_string();
        if name.is_empty() {
            return None;
        }

        let identifier = fs::read_link(proc_dir.join("exe"))
            .ok()
            .map(|p| p.to_string_lossy().into_owned());

        Some(AppCandidate {
            pid,
            identifier,
            name,
            icon: None,
        })
    }
}

impl Default for LinuxProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector for LinuxProcessCollector {
    fn list_candidates(&self) -> Vec<AppCandidate> {
        let mut candidates = Vec::new();
        if let Ok(entries) = fs::read_dir("/proc") {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(pid) = name.parse::<u32>() {
                        if let Some(candidate) = self.parse_candidate(pid) {
                            candidates.push(candidate);
                        }
                    }
                }
            }
        }
        normalize_candidates(candidates)
    }

    fn read_memory_bytes(&self, pid: u32) -> Result<u64, ProbeError> {
        let statm = fs::read_to_string(format!("/proc/{}/statm", pid))
            .map_err(|e| ProbeError::from_io(&e))?;
        parse_statm_resident(&statm)
            .map(|pages| pages * self.page_size)
            .ok_or(ProbeError::ReadFailed(-1))
    }
}

/// Second field of `/proc/<pid>/statm`: resident set size in pages.
fn parse_statm_resident(statm: &str) -> Option<u64> {
    statm.split_whitespace().nth(1)?.parse().ok()
}
