// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! MQTT telemetry downlink

use anyhow::{anyhow, bail, Result};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{TelemetryConfig, TelemetryRecord, TelemetrySink};

/// Publishes telemetry without waiting on the broker.
///
/// Records are queued with `try_publish`; a full queue or a lost connection
/// drops the record.
pub struct MqttTelemetry {
    client: AsyncClient,
    topic: String,
    connected: Arc<AtomicBool>,
}

impl MqttTelemetry {
    /// Must be called from within a tokio runtime; the event loop runs as a task.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.mqtt_client_id, &config.mqtt_broker, config.mqtt_port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.mqtt_username, &config.mqtt_password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 16);
        let connected = Arc::new(AtomicBool::new(false));

        let link = connected.clone();
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT telemetry link up");
                        link.store(true, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if link.swap(false, Ordering::Relaxed) {
                            warn!("MQTT telemetry link down: {}", e);
                        } else {
                            debug!("MQTT connect failed: {}", e);
                        }
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        info!(
            "MQTT telemetry to {}:{} topic {}",
            config.mqtt_broker, config.mqtt_port, config.mqtt_topic
        );

        Ok(Self {
            client,
            topic: config.mqtt_topic.clone(),
            connected,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for MqttTelemetry {
    fn name(&self) -> &str {
        "mqtt"
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<()> {
        if !self.is_connected() {
            bail!("MQTT link not connected");
        }
        let payload = serde_json::to_vec(record)?;
        self.client
            .try_publish(&self.topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| anyhow!("MQTT publish failed: {}", e))
    }
}
