//! Gateway — the event loop connecting the channel to the data
//! collaborators and the AI provider.
//!
//! Events fan in over a single mpsc receiver; each one is handled on
//! its own task so a slow feed fetch never blocks button presses.

mod dispatch;
mod navigate;
pub(crate) mod render;

#[cfg(test)]
mod tests;

use campus_core::{
    config::AuthConfig,
    message::IncomingEvent,
    traits::{ActivitySource, Channel, Provider, QrRenderer, ScheduleSource},
};
use campus_data::weather::WeatherClient;
use navigate::Navigator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::info;

/// The central gateway routing events between the channel, the data
/// collaborators, and the AI provider.
pub struct Gateway {
    provider: Arc<dyn Provider>,
    channels: HashMap<String, Arc<dyn Channel>>,
    navigator: Navigator,
    weather: Arc<WeatherClient>,
    auth: AuthConfig,
    /// Models `/ask` accepts as its optional first argument.
    models: Vec<String>,
    uptime: Instant,
}

impl Gateway {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        schedule: Arc<dyn ScheduleSource>,
        activities: Arc<dyn ActivitySource>,
        qr: Arc<dyn QrRenderer>,
        weather: Arc<WeatherClient>,
        auth: AuthConfig,
        models: Vec<String>,
    ) -> Self {
        Self {
            provider,
            channels,
            navigator: Navigator::new(schedule, activities, qr),
            weather,
            auth,
            models,
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop until ctrl-c.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Campus gateway running | provider: {} | channels: {}",
            self.provider.name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingEvent>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(event) = channel_rx.recv().await {
                    if tx.send(event).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch(event).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn dispatch(&self, event: IncomingEvent) {
        match event {
            IncomingEvent::Message(msg) => self.handle_message(msg).await,
            IncomingEvent::Control(act) => self.handle_control(act).await,
        }
    }

    async fn shutdown(&self) {
        info!("Shutting down...");
        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                tracing::warn!("failed to stop channel {name}: {e}");
            }
        }
        info!("Shutdown complete.");
    }
}
