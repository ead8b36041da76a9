//! Main application wiring for otelui.

use crate::core::{Config, Result};
use crate::receiver::{wait_for_shutdown, OtelReceiver};
use crate::storage::{ChangeCause, ChangeEvent, Counts, TelemetryStore};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Coordinates the store, the receivers and the change consumer.
pub struct Application {
    store: Arc<TelemetryStore>,
    receiver: Arc<OtelReceiver>,
    config: Config,
}

impl Application {
    /// Create a new Application with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(TelemetryStore::new(&config.store));
        let receiver = Arc::new(OtelReceiver::new(Arc::clone(&store), config.server.clone()));

        Ok(Self {
            store,
            receiver,
            config,
        })
    }

    /// Run receivers, heartbeat and the status consumer until Ctrl-C or a
    /// receiver failure.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting otelui");

        let (stop, shutdown) = watch::channel(false);

        let heartbeat = self.store.spawn_heartbeat(self.config.store.heartbeat_interval);
        let status = tokio::spawn(report_changes(self.store.subscribe(), shutdown.clone()));
        let commands = tokio::spawn(read_commands(Arc::clone(&self.store), shutdown.clone()));
        let demo = self
            .config
            .demo
            .then(|| tokio::spawn(crate::demo::run(Arc::clone(&self.store), shutdown.clone())));

        let mut receiver = tokio::spawn(Arc::clone(&self.receiver).run(shutdown));

        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, stopping");
                let _ = stop.send(true);
                receiver.await?
            }
            result = &mut receiver => {
                tracing::warn!("Receivers stopped unexpectedly");
                let _ = stop.send(true);
                result?
            }
        };

        heartbeat.abort();
        commands.abort();
        if let Some(demo) = demo {
            demo.await?;
        }
        status.await?;

        let counts = self.store.counts().await;
        tracing::info!(%counts, "otelui stopped");
        result
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }
}

/// Headless display: log a status line whenever the counts move.
pub async fn report_changes(
    mut events: broadcast::Receiver<ChangeEvent>,
    shutdown: watch::Receiver<bool>,
) {
    let mut shown = Counts::default();
    let stopped = wait_for_shutdown(shutdown);
    tokio::pin!(stopped);

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = &mut stopped => break,
        };

        match event {
            Ok(event) => {
                if event.cause == ChangeCause::Reset || event.changed_since(&shown).any() {
                    tracing::info!("{}", event);
                    shown = event.counts;
                }
            },
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "Status consumer lagged behind");
            },
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Reads operator commands from stdin; `r` or `reset` clears the store.
///
/// Lines are read on a detached thread so a pending read never holds up
/// runtime shutdown.
async fn read_commands(store: Arc<TelemetryStore>, shutdown: watch::Receiver<bool>) {
    let (tx, mut lines) = mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    let stopped = wait_for_shutdown(shutdown);
    tokio::pin!(stopped);

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut stopped => break,
        };

        match line.as_deref().map(str::trim) {
            Some("r") | Some("reset") => store.reset().await,
            Some("") => {},
            Some(other) => tracing::debug!(command = other, "Unknown command"),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigBuilder;

    #[test]
    fn test_application_rejects_invalid_config() {
        let mut config = Config::default();
        config.server.http_port = config.server.grpc_port;
        assert!(Application::new(config).is_err());
    }

    #[tokio::test]
    async fn test_application_shares_one_store() {
        let config = ConfigBuilder::new().grpc_port(0).http_port(1).build().unwrap();
        let app = Application::new(config).unwrap();
        assert_eq!(Arc::strong_count(app.store()), 2);
    }

    #[tokio::test]
    async fn test_report_changes_stops_on_shutdown() {
        let store = TelemetryStore::default();
        let (stop, shutdown) = watch::channel(false);
        let consumer = tokio::spawn(report_changes(store.subscribe(), shutdown));

        store.reset().await;
        stop.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
    }
}
