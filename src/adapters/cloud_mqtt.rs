//! MQTT cloud transport adapter (ESP-IDF only).
//!
//! Maps the LightDB-style endpoint tree onto MQTT topics under a per-device
//! prefix and implements [`CloudPort`] on top of `esp-idf-svc`'s MQTT
//! client. The client's event callback runs on the transport task; it never
//! touches the usage store directly, it only converts broker events into
//! [`CloudEvent`]s and hands them to [`channels::publish`] for the sampling
//! loop to apply.
//!
//! Topic layout (device prefix `powermon/<id>`):
//!
//! - `.../sensor`                          — outbound stream reports
//! - `.../state/actual`                    — outbound actual-state document
//! - `.../state/cumulative/get`            — outbound fetch request
//! - `.../state/cumulative`                — inbound fetch response
//! - `.../state/desired/reset_cumulative`  — observed reset intent (retained)
//! - `.../settings/<KEY>`                  — inbound settings deliveries
//! - `.../settings/status`                 — outbound settings acks

#![cfg(target_os = "espidf")]

use std::sync::Arc;

use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttEvent, EventPayload, MqttClientConfiguration, QoS,
};
use heapless::FnvIndexMap;
use log::{info, warn};
use parking_lot::Mutex;

use crate::app::ports::CloudPort;
use crate::cloud::payload::{
    ActualState, StreamReport, ACTUAL_ENDPOINT, CUMULATIVE_ENDPOINT, DESIRED_RESET_PATH,
    STREAM_ENDPOINT,
};
use crate::cloud::{channels, CloudEvent, PushEndpoint};
use crate::error::TransportError;
use crate::settings::{SettingStatus, SettingValue};

/// In-flight publishes awaiting broker acknowledgement.
type PendingAcks = Arc<Mutex<FnvIndexMap<i32, PushEndpoint, 8>>>;

pub struct MqttCloudAdapter {
    client: EspMqttClient<'static>,
    prefix: String,
    pending: PendingAcks,
}

impl MqttCloudAdapter {
    /// Connect to `broker_url` and subscribe to the inbound topics.
    pub fn new(broker_url: &str, device_id: &str) -> anyhow::Result<Self> {
        let prefix = format!("powermon/{device_id}");
        let pending: PendingAcks = Arc::new(Mutex::new(FnvIndexMap::new()));

        let cb_prefix = prefix.clone();
        let cb_pending = Arc::clone(&pending);
        let config = MqttClientConfiguration {
            client_id: Some(device_id),
            ..Default::default()
        };
        let client = EspMqttClient::new_cb(broker_url, &config, move |event| {
            Self::on_event(&cb_prefix, &cb_pending, event);
        })?;

        Ok(Self {
            client,
            prefix,
            pending,
        })
    }

    /// Subscribe to the inbound topics; called from the `Connected` event
    /// handling in the main loop so a reconnect re-subscribes.
    pub fn subscribe(&mut self) -> anyhow::Result<()> {
        for suffix in [CUMULATIVE_ENDPOINT, DESIRED_RESET_PATH, "settings/+"] {
            self.client
                .subscribe(&format!("{}/{suffix}", self.prefix), QoS::AtLeastOnce)?;
        }
        Ok(())
    }

    fn topic(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.prefix)
    }

    fn publish(
        &mut self,
        suffix: &str,
        retain: bool,
        payload: &[u8],
        track: Option<PushEndpoint>,
    ) -> Result<(), TransportError> {
        let topic = self.topic(suffix);
        let msg_id = self
            .client
            .enqueue(&topic, QoS::AtLeastOnce, retain, payload)
            .map_err(|_| TransportError::PublishFailed)?;
        if let Some(endpoint) = track {
            if self.pending.lock().insert(msg_id, endpoint).is_err() {
                // Table full: the ack will be missed and the delta folds on
                // a later confirmed push instead.
                warn!("pending-ack table full for message {msg_id}");
            }
        }
        Ok(())
    }

    /// Broker event → [`CloudEvent`] translation (transport task context).
    fn on_event(prefix: &str, pending: &PendingAcks, event: EspMqttEvent<'_>) {
        match event.payload() {
            EventPayload::Connected(_) => {
                info!("MQTT session established");
                channels::publish(CloudEvent::Connected);
            }
            EventPayload::Published(msg_id) => {
                if let Some(endpoint) = pending.lock().remove(&msg_id) {
                    channels::publish(CloudEvent::PushAck {
                        endpoint,
                        success: true,
                    });
                }
            }
            EventPayload::Received {
                topic: Some(topic),
                data,
                ..
            } => Self::on_message(prefix, topic, data),
            EventPayload::Error(e) => {
                warn!("MQTT error: {e}");
                // Outstanding publishes will never be acknowledged.
                let mut pending = pending.lock();
                for (_, endpoint) in pending.iter() {
                    channels::publish(CloudEvent::PushAck {
                        endpoint: *endpoint,
                        success: false,
                    });
                }
                pending.clear();
            }
            _ => {}
        }
    }

    fn on_message(prefix: &str, topic: &str, data: &[u8]) {
        let Some(suffix) = topic.strip_prefix(prefix).map(|s| s.trim_start_matches('/'))
        else {
            return;
        };

        if suffix == CUMULATIVE_ENDPOINT {
            let Ok(payload) = heapless::Vec::from_slice(data) else {
                warn!("oversized cumulative payload dropped");
                return;
            };
            channels::publish(CloudEvent::FetchResult {
                payload: Some(payload),
            });
        } else if suffix == DESIRED_RESET_PATH {
            let Ok(payload) = heapless::Vec::from_slice(data) else {
                warn!("oversized reset intent dropped");
                return;
            };
            channels::publish(CloudEvent::DesiredReset { payload });
        } else if let Some(key) = suffix.strip_prefix("settings/") {
            Self::on_setting(key, data);
        }
    }

    fn on_setting(key: &str, data: &[u8]) {
        let Ok(key) = heapless::String::try_from(key) else {
            warn!("oversized settings key dropped");
            return;
        };
        let value = match serde_json::from_slice::<serde_json::Value>(data) {
            Ok(serde_json::Value::Number(n)) if n.is_i64() => {
                SettingValue::Int(n.as_i64().unwrap_or_default())
            }
            Ok(serde_json::Value::Number(n)) => {
                SettingValue::Float(n.as_f64().unwrap_or_default() as f32)
            }
            Ok(serde_json::Value::Bool(b)) => SettingValue::Bool(b),
            _ => {
                warn!("undecodable settings payload for {key}");
                SettingValue::Bool(false)
            }
        };
        channels::publish(CloudEvent::Setting { key, value });
    }
}

impl CloudPort for MqttCloudAdapter {
    fn push_stream(&mut self, report: &StreamReport) -> Result<(), TransportError> {
        let json = serde_json::to_vec(report).map_err(|_| TransportError::PublishFailed)?;
        self.publish(STREAM_ENDPOINT, false, &json, Some(PushEndpoint::Stream))
    }

    fn set_actual(&mut self, state: &ActualState) -> Result<(), TransportError> {
        let json = serde_json::to_vec(state).map_err(|_| TransportError::PublishFailed)?;
        self.publish(ACTUAL_ENDPOINT, true, &json, Some(PushEndpoint::Actual))
    }

    fn fetch_cumulative(&mut self) -> Result<(), TransportError> {
        // The backend answers on `state/cumulative`.
        self.publish(&format!("{CUMULATIVE_ENDPOINT}/get"), false, b"", None)
    }

    fn write_desired_reset(&mut self, value: bool) -> Result<(), TransportError> {
        let payload: &[u8] = if value { b"true" } else { b"false" };
        self.publish(DESIRED_RESET_PATH, true, payload, None)
    }

    fn ack_setting(&mut self, key: &str, status: SettingStatus) -> Result<(), TransportError> {
        let body = serde_json::json!({ "key": key, "status": format!("{status:?}") });
        let json = serde_json::to_vec(&body).map_err(|_| TransportError::PublishFailed)?;
        self.publish("settings/status", false, &json, None)
    }
}
