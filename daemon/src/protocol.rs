//! IPC protocol definitions (JSON messages)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Ping,
    ListCandidates,
    ListTargets,
    AddTarget { params: AddTargetParams },
    RemoveTarget { params: TargetIdParams },
    UpdateThresholds { params: UpdateThresholdsParams },
    GetStatus,
    GetConfig,
    UpdateConfig { params: UpdateConfigParams },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTargetParams {
    pub pid: u32,
    /// Human sizes such as `"500MB"`; configured defaults when absent.
    #[serde(default)]
    pub thresholds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetIdParams {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateThresholdsParams {
    pub id: Uuid,
    pub thresholds: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfigParams {
    #[serde(default)]
    pub sound_alerts_enabled: Option<bool>,
    #[serde(default)]
    pub launch_at_login: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Response { id: Option<String>, data: serde_json::Value },
    Alert { data: AlertData },
    Status { data: StatusData },
    Config { data: ConfigData },
}

impl Response {
    pub fn data(data: serde_json::Value) -> Self {
        Response::Response { id: None, data }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::data(serde_json::json!({ "error": message.to_string() }))
    }

    pub fn success() -> Self {
        Response::data(serde_json::json!({ "success": true }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    pub name: String,
    pub current_bytes: u64,
    pub threshold_bytes: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub monitored_count: u32,
    pub running_count: u32,
    pub has_warning: bool,
    pub alert_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    pub sound_alerts_enabled: bool,
    pub launch_at_login: bool,
    pub poll_interval_seconds: u64,
    pub default_thresholds: Vec<String>,
    /// Quick-pick threshold sets for the configuration view.
    pub presets: Vec<Vec<String>>,
}
