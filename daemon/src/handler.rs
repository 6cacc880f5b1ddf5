//! Daemon state shared by socket clients, and the alert sink that fans out
//! to the desktop and to connected clients.

use crate::autostart::Autostart;
use crate::collector::{AppCandidate, ProcessCollector};
use crate::config::Config;
use crate::notifier::{alert_body, AlertSink};
use crate::protocol::{AlertData, ConfigData, Request, Response, StatusData, UpdateConfigParams};
use crate::service::{EngineHandle, POLL_INTERVAL};
use crate::socket::RequestHandler;
use crate::target::{EngineSnapshot, MonitoredTarget};
use crate::threshold::ThresholdSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

/// Delivers alerts to the desktop, pushes them to UI clients and counts them.
pub struct DaemonAlertSink {
    desktop: Arc<dyn AlertSink>,
    broadcast_tx: broadcast::Sender<String>,
    alert_count: Arc<AtomicU32>,
}

impl DaemonAlertSink {
    pub fn new(
        desktop: Arc<dyn AlertSink>,
        broadcast_tx: broadcast::Sender<String>,
        alert_count: Arc<AtomicU32>,
    ) -> Self {
        Self { desktop, broadcast_tx, alert_count }
    }
}

impl AlertSink for DaemonAlertSink {
    fn notify(&self, process_name: &str, current_bytes: u64, threshold_bytes: u64) {
        self.desktop.notify(process_name, current_bytes, threshold_bytes);

        let alert = Response::Alert {
            data: AlertData {
                name: process_name.to_string(),
                current_bytes,
                threshold_bytes,
                message: alert_body(process_name, current_bytes, threshold_bytes),
            },
        };
        if let Ok(json) = serde_json::to_string(&alert) {
            // No subscribers is fine
            let _ = self.broadcast_tx.send(json);
        }

        self.alert_count.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct DaemonState {
    collector: Arc<dyn ProcessCollector>,
    engine: EngineHandle,
    config: RwLock<Config>,
    config_path: Option<PathBuf>,
    autostart: Option<Autostart>,
    sound_enabled: Arc<AtomicBool>,
    alert_count: Arc<AtomicU32>,
}

impl DaemonState {
    pub fn new(
        collector: Arc<dyn ProcessCollector>,
        engine: EngineHandle,
        config: Config,
        sound_enabled: Arc<AtomicBool>,
        alert_count: Arc<AtomicU32>,
    ) -> Self {
        sound_enabled.store(config.general.sound_alerts_enabled, Ordering::Relaxed);
        Self {
            collector,
            engine,
            config: RwLock::new(config),
            config_path: None,
            autostart: None,
            sound_enabled,
            alert_count,
        }
    }

    /// Persist settings changes to `path`.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Keep `autostart` in sync with the launch-at-login setting.
    pub fn with_autostart(mut self, autostart: Autostart) -> Self {
        self.autostart = Some(autostart);
        self
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn status(&self, snapshot: &EngineSnapshot) -> Response {
        Response::Status {
            data: StatusData {
                monitored_count: snapshot.targets.len() as u32,
                running_count: snapshot.running_count() as u32,
                has_warning: snapshot.has_warning,
                alert_count: self.alert_count.load(Ordering::Relaxed),
            },
        }
    }

    async fn config_data(&self) -> Response {
        let config = self.config.read().await;
        Response::Config {
            data: ConfigData {
                sound_alerts_enabled: config.general.sound_alerts_enabled,
                launch_at_login: config.general.launch_at_login,
                poll_interval_seconds: POLL_INTERVAL.as_secs(),
                default_thresholds: config.default_thresholds().formatted(),
                presets: ThresholdSet::presets().iter().map(ThresholdSet::formatted).collect(),
            },
        }
    }

    async fn candidates(&self) -> Vec<AppCandidate> {
        let collector = Arc::clone(&self.collector);
        match tokio::task::spawn_blocking(move || collector.list_candidates()).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Candidate listing failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn add_target(&self, pid: u32, thresholds: Option<Vec<String>>) -> Response {
        let thresholds = match thresholds {
            Some(inputs) => match ThresholdSet::parse_list(&inputs) {
                Ok(set) => set,
                Err(e) => return Response::error(e),
            },
            None => self.config.read().await.default_thresholds(),
        };

        let Some(candidate) = self.candidates().await.into_iter().find(|c| c.pid == pid) else {
            return Response::error(format!("No running application with pid {}", pid));
        };

        let target = MonitoredTarget::from_candidate(&candidate, thresholds);
        let id = target.id;
        match self.engine.add(target).await {
            Ok(_) => Response::data(serde_json::json!({ "success": true, "id": id })),
            Err(e) => Response::error(e),
        }
    }

    async fn update_config(&self, params: UpdateConfigParams) -> Response {
        {
            let mut config = self.config.write().await;
            // Fallible step first; on failure nothing changes
            if let Some(enabled) = params.launch_at_login {
                if let Some(autostart) = &self.autostart {
                    if let Err(e) = autostart.set_enabled(enabled) {
                        error!("Failed to update launch at login: {}", e);
                        return Response::error(e);
                    }
                }
                config.general.launch_at_login = enabled;
            }
            if let Some(enabled) = params.sound_alerts_enabled {
                config.general.sound_alerts_enabled = enabled;
                self.sound_enabled.store(enabled, Ordering::Relaxed);
            }
            if let Some(path) = &self.config_path {
                if let Err(e) = config.save(path) {
                    warn!("Failed to save config: {}", e);
                }
            }
            info!("Settings updated: {:?}", config.general);
        }
        self.config_data().await
    }
}

#[async_trait::async_trait]
impl RequestHandler for DaemonState {
    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::ListCandidates => Response::data(serde_json::json!(self.candidates().await)),

            Request::ListTargets => match self.engine.snapshot().await {
                Ok(snapshot) => Response::data(serde_json::json!(snapshot)),
                Err(e) => Response::error(e),
            },

            Request::AddTarget { params } => self.add_target(params.pid, params.thresholds).await,

            Request::RemoveTarget { params } => match self.engine.remove(params.id).await {
                Ok(true) => Response::success(),
                Ok(false) => Response::error(format!("No monitored target {}", params.id)),
                Err(e) => Response::error(e),
            },

            Request::UpdateThresholds { params } => {
                let thresholds = match ThresholdSet::parse_list(&params.thresholds) {
                    Ok(set) => set,
                    Err(e) => return Response::error(e),
                };
                match self.engine.update_thresholds(params.id, thresholds).await {
                    Ok(true) => Response::success(),
                    Ok(false) => Response::error(format!("No monitored target {}", params.id)),
                    Err(e) => Response::error(e),
                }
            }

            Request::GetStatus => match self.engine.snapshot().await {
                Ok(snapshot) => self.status(&snapshot),
                Err(e) => Response::error(e),
            },

            Request::GetConfig => self.config_data().await,

            Request::UpdateConfig { params } => self.update_config(params).await,
        }
    }
}
