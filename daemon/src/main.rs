use anyhow::Result;
use memalert_daemon::{
    autostart::Autostart,
    collector::LinuxProcessCollector,
    config::Config,
    db::Database,
    engine::MonitorEngine,
    handler::{DaemonAlertSink, DaemonState},
    notifier::DesktopNotifier,
    service::{self, POLL_INTERVAL},
    shutdown::ShutdownSignals,
    socket::{handle_client, SocketServer},
};
use std::sync::atomic::{AtomicBool, AtomicU32};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Push a `status` message to clients whenever the engine state changes.
async fn status_loop(state: Arc<DaemonState>, broadcast_tx: broadcast::Sender<String>) {
    let mut rx = state.engine().subscribe();
    while rx.changed().await.is_ok() {
        let status = {
            let snapshot = rx.borrow_and_update();
            state.status(&snapshot)
        };
        if let Ok(json) = serde_json::to_string(&status) {
            let _ = broadcast_tx.send(json);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("MemAlert daemon starting...");

    let config_path = Config::config_path();
    if !config_path.exists() {
        info!("No config file found, using defaults");
    }
    let config = Config::load_or_default(&config_path);

    let db = Database::open_default()?;
    db.init_schema()?;

    let socket_path = SocketServer::socket_path();
    let server = SocketServer::bind(&socket_path).await?;
    let broadcast_tx = server.broadcast_sender();

    let sound_enabled = Arc::new(AtomicBool::new(config.general.sound_alerts_enabled));
    let alert_count = Arc::new(AtomicU32::new(0));
    let collector = Arc::new(LinuxProcessCollector::new());
    let sink = DaemonAlertSink::new(
        Arc::new(DesktopNotifier::new(Arc::clone(&sound_enabled))),
        broadcast_tx.clone(),
        Arc::clone(&alert_count),
    );

    let engine = MonitorEngine::new(collector.clone(), Arc::new(sink), Box::new(db));
    let (engine_handle, engine_task) = service::spawn(engine, POLL_INTERVAL);

    let mut state = DaemonState::new(collector, engine_handle, config, sound_enabled, alert_count)
        .with_config_path(config_path);
    match Autostart::for_current_user() {
        Ok(autostart) => state = state.with_autostart(autostart),
        Err(e) => warn!("Launch at login unavailable: {}", e),
    }
    let state = Arc::new(state);

    tokio::spawn(status_loop(Arc::clone(&state), broadcast_tx));

    let mut signals = ShutdownSignals::register()?;
    info!("Daemon ready, listening for connections...");

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let state = Arc::clone(&state);
                    let broadcast_rx = server.broadcast_sender().subscribe();
                    tokio::spawn(async move {
                        handle_client(stream, broadcast_rx, state).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            _ = signals.recv() => break,
        }
    }

    state.engine().shutdown().await;
    if let Err(e) = engine_task.await {
        error!("Monitor task failed: {}", e);
    }
    Ok(())
}
