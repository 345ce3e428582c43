use std::time::Duration;

use rumqttc::{
    AsyncClient, ClientError, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet,
    QoS,
};
use tokio::task::JoinHandle;

use super::traits::{CommandSink, SinkError};

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Requests that may wait for the broker before `send` starts failing.
    pub queue_capacity: usize,
}

/// Publishes commands to an MQTT broker, one topic per destination.
///
/// `send` only enqueues the publish and never waits on the network. The
/// connection is driven by a background task. While the queue is full,
/// commands are rejected with `SinkError::Unavailable` and dropped.
pub struct MqttSink {
    client: AsyncClient,
    event_loop_handle: JoinHandle<()>,
}

impl MqttSink {
    /// Must be called from within a tokio runtime.
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, event_loop) = AsyncClient::new(options, config.queue_capacity.max(1));
        log::info!("MQTT sink connecting to {}:{}", config.host, config.port);

        let event_loop_handle = tokio::spawn(drive_event_loop(event_loop));
        Self {
            client,
            event_loop_handle,
        }
    }

    /// Flush every queued command to the broker and disconnect. Waits at most
    /// `timeout` for the broker.
    pub async fn close(mut self, timeout: Duration) -> Result<(), SinkError> {
        let client = self.client.clone();
        let handle = &mut self.event_loop_handle;
        let flushed = tokio::time::timeout(timeout, async move {
            client
                .disconnect()
                .await
                .map_err(|e| SinkError::Unavailable(e.to_string()))?;
            handle
                .await
                .map_err(|e| SinkError::Unavailable(e.to_string()))?;
            Ok::<(), SinkError>(())
        })
        .await;

        match flushed {
            Ok(result) => result,
            Err(_) => Err(SinkError::Unavailable(format!(
                "broker did not accept queued commands within {:?}",
                timeout
            ))),
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("MQTT broker connected");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                log::info!("MQTT sink disconnected");
                break;
            }
            Ok(event) => {
                log::trace!("MQTT event: {:?}", event);
            }
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                log::warn!("MQTT connection error: {}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

impl CommandSink for MqttSink {
    fn send(&mut self, destination: &str, payload: &str) -> Result<(), SinkError> {
        self.client
            .try_publish(destination, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| match e {
                ClientError::TryRequest(_) => SinkError::Unavailable(e.to_string()),
                other => SinkError::PublishFailed {
                    destination: destination.to_string(),
                    reason: other.to_string(),
                },
            })
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        self.event_loop_handle.abort();
    }
}
