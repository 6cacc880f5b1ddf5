//! Alert delivery

use crate::threshold::format_bytes;
use notify_rust::Notification;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::error;

const APP_NAME: &str = "MemAlert";
const ALERT_SOUND: &str = "message-new-instant";

/// Receives threshold breaches. Delivery is best-effort: implementations
/// log their own failures and must not block the caller for long.
pub trait AlertSink: Send + Sync {
    fn notify(&self, process_name: &str, current_bytes: u64, threshold_bytes: u64);
}

pub fn alert_body(process_name: &str, current_bytes: u64, threshold_bytes: u64) -> String {
    format!(
        "{} is using {} (over {} threshold)",
        process_name,
        format_bytes(current_bytes),
        format_bytes(threshold_bytes)
    )
}

pub fn send_notification(summary: &str, body: &str, with_sound: bool) -> Result<(), notify_rust::error::Error> {
    let mut notification = Notification::new();
    notification.summary(summary).body(body).appname(APP_NAME);
    if with_sound {
        notification.sound_name(ALERT_SOUND);
    }
    notification.show()?;
    Ok(())
}

/// Desktop notifications through the session notification service.
pub struct DesktopNotifier {
    sound_enabled: Arc<AtomicBool>,
}

impl DesktopNotifier {
    pub fn new(sound_enabled: Arc<AtomicBool>) -> Self {
        Self { sound_enabled }
    }
}

impl AlertSink for DesktopNotifier {
    fn notify(&self, process_name: &str, current_bytes: u64, threshold_bytes: u64) {
        let body = alert_body(process_name, current_bytes, threshold_bytes);
        let with_sound = self.sound_enabled.load(Ordering::Relaxed);
        let deliver = move || {
            if let Err(e) = send_notification("Memory Alert", &body, with_sound) {
                error!("Failed to send notification: {}", e);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(deliver);
            }
            Err(_) => deliver(),
        }
    }
}
