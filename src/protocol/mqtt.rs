// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport for Shelly devices.
//!
//! Topic layout:
//! - Requests: `<device_prefix>/rpc`, envelope `src` set to the client id
//! - Responses: `<client_id>/rpc`
//!
//! One broker connection carries every call. Responses are matched to their
//! callers by envelope id, so any number of calls may be in flight and the
//! device may answer them in any order.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::context::Context;
use crate::error::{ConfigError, Delivery, TransportError, TransportErrorKind};
use crate::protocol::{PendingCalls, Request, Response, Transport};

/// MQTT transport multiplexing calls over one broker connection.
///
/// Created with [`MqttTransport::builder`].
///
/// # Examples
///
/// ```no_run
/// use shelly_rpc::protocol::MqttTransport;
/// use shelly_rpc::{Client, Context};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = MqttTransport::builder()
///     .broker("mqtt://192.168.1.50:1883")
///     .device_prefix("shellyplus2pm-a8032ab1e2c8")
///     .build()
///     .await?;
///
/// let client = Client::new(transport);
/// let status = client
///     .call(&Context::background(), "Shelly.GetStatus", None)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct MqttTransport {
    client: AsyncClient,
    client_id: String,
    device_prefix: String,
    request_topic: String,
    response_topic: String,
    pending: Arc<PendingCalls>,
    connected: Arc<AtomicBool>,
    event_task: JoinHandle<()>,
}

impl MqttTransport {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::new()
    }

    /// Returns the MQTT client id, also used as the envelope `src`.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the device topic prefix.
    #[must_use]
    pub fn device_prefix(&self) -> &str {
        &self.device_prefix
    }

    /// Returns the topic requests are published to.
    #[must_use]
    pub fn request_topic(&self) -> &str {
        &self.request_topic
    }

    /// Returns the topic responses arrive on.
    #[must_use]
    pub fn response_topic(&self) -> &str {
        &self.response_topic
    }

    /// Returns whether the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns the number of calls waiting for a response.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttTransport")
            .field("client_id", &self.client_id)
            .field("request_topic", &self.request_topic)
            .field("connected", &self.is_connected())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

impl Transport for MqttTransport {
    async fn perform(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Response, TransportError> {
        let call = self.pending.register(method);
        let id = call.id();
        let request = Request::new(id, &self.client_id, method, params);
        let payload = serde_json::to_vec(&request).map_err(|e| {
            TransportError::new(
                method,
                TransportErrorKind::InvalidRequest,
                Delivery::NotSent,
                "request could not be serialized",
            )
            .with_source(e)
        })?;

        tracing::debug!(topic = %self.request_topic, method, id, "Publishing MQTT RPC request");

        self.client
            .publish(&self.request_topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| {
                TransportError::new(
                    method,
                    TransportErrorKind::Unreachable,
                    Delivery::NotSent,
                    "MQTT publish failed",
                )
                .with_source(e)
            })?;

        call.wait(cx, method).await
    }
}

/// Builder for an [`MqttTransport`].
#[derive(Debug, Default)]
pub struct MqttTransportBuilder {
    broker: Option<String>,
    device_prefix: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl MqttTransportBuilder {
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default time allowed for connecting and subscribing.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Sets the device topic prefix (usually the device id).
    #[must_use]
    pub fn device_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_prefix = Some(prefix.into());
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Sets how long to wait for the broker to acknowledge the connection.
    #[must_use]
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Connects to the broker and subscribes to the response topic.
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing, the URL is invalid,
    /// or the broker does not acknowledge the connection in time.
    ///
    /// The subscription is queued ahead of every request on the same
    /// connection, so the broker has processed it before any call is sent.
    pub async fn build(self) -> Result<MqttTransport, ConfigError> {
        let broker = self.broker.ok_or(ConfigError::Missing("broker"))?;
        let device_prefix = self
            .device_prefix
            .ok_or(ConfigError::Missing("device_prefix"))?;
        let (host, port) = parse_mqtt_url(&broker)?;

        let client_id = self.client_id.unwrap_or_else(|| {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("shelly_rpc_{}", &suffix[..8])
        });

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(self.keep_alive.unwrap_or(Self::DEFAULT_KEEP_ALIVE));
        mqtt_options.set_clean_session(true);
        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let request_topic = format!("{device_prefix}/rpc");
        let response_topic = format!("{client_id}/rpc");
        client
            .subscribe(&response_topic, QoS::AtLeastOnce)
            .await?;

        let pending = Arc::new(PendingCalls::new());
        let connected = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        let event_task = tokio::spawn(run_event_loop(
            event_loop,
            EventLoopState {
                response_topic: response_topic.clone(),
                pending: Arc::clone(&pending),
                connected: Arc::clone(&connected),
                ready: Some(ready_tx),
            },
        ));

        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Self::DEFAULT_CONNECT_TIMEOUT);
        let outcome = match tokio::time::timeout(connect_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(message))) => Err(ConfigError::ConnectionFailed(message)),
            Ok(Err(_)) => Err(ConfigError::ConnectionFailed(
                "event loop stopped".to_string(),
            )),
            Err(_) => Err(ConfigError::ConnectionFailed(format!(
                "no connection acknowledgement within {} ms",
                connect_timeout.as_millis()
            ))),
        };
        if let Err(e) = outcome {
            event_task.abort();
            return Err(e);
        }

        tracing::debug!(client_id = %client_id, topic = %request_topic, "MQTT transport ready");

        Ok(MqttTransport {
            client,
            client_id,
            device_prefix,
            request_topic,
            response_topic,
            pending,
            connected,
            event_task,
        })
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ConfigError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(ConfigError::InvalidAddress("host is empty".to_string()));
    }

    Ok((host, port))
}

struct EventLoopState {
    response_topic: String,
    pending: Arc<PendingCalls>,
    connected: Arc<AtomicBool>,
    ready: Option<oneshot::Sender<Result<(), String>>>,
}

/// Drives the connection and routes responses to their waiting calls.
async fn run_event_loop(mut event_loop: EventLoop, mut state: EventLoopState) {
    use rumqttc::{Event, Packet};

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
                state.connected.store(true, Ordering::Release);
                if let Some(ready) = state.ready.take() {
                    let _ = ready.send(Ok(()));
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic == state.response_topic {
                    route_response(&state.pending, &publish.payload);
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                state.connected.store(false, Ordering::Release);
                if let Some(ready) = state.ready.take() {
                    let _ = ready.send(Err(e.to_string()));
                }
                let failed = state
                    .pending
                    .fail_all(TransportErrorKind::ConnectionLost, "MQTT connection lost");
                if failed > 0 {
                    tracing::debug!(failed, "Failed in-flight calls after connection loss");
                }
                break;
            }
        }
    }
}

/// Hands one response payload to the call it answers.
///
/// A payload that is not a valid envelope still fails its call when an id
/// can be recovered from it; otherwise it is dropped.
fn route_response(pending: &PendingCalls, payload: &[u8]) {
    match serde_json::from_slice::<Response>(payload) {
        Ok(response) => {
            let id = response.id;
            if !pending.complete(response) {
                tracing::debug!(?id, "Dropping MQTT response for unknown call");
            }
        }
        Err(e) => {
            let id = serde_json::from_slice::<Value>(payload)
                .ok()
                .and_then(|v| v.get("id").and_then(Value::as_u64));
            match id {
                Some(id) => {
                    pending.fail(
                        id,
                        TransportErrorKind::InvalidEnvelope,
                        Delivery::Unknown,
                        "response is not a valid JSON-RPC envelope",
                    );
                }
                None => tracing::debug!(error = %e, "Dropping unparseable MQTT message"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1883").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("192.168.1.50").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_tcp_scheme() {
        let (host, port) = parse_mqtt_url("tcp://broker.local:8883").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 8883);
    }

    #[test]
    fn parse_mqtt_url_rejects_bad_port() {
        assert!(matches!(
            parse_mqtt_url("mqtt://broker:port"),
            Err(ConfigError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn builder_requires_broker_and_prefix() {
        let err = MqttTransportBuilder::new()
            .device_prefix("shelly")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("broker")));

        let err = MqttTransportBuilder::new()
            .broker("mqtt://127.0.0.1:1883")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("device_prefix")));
    }

    #[test]
    fn builder_stores_options() {
        let builder = MqttTransportBuilder::new()
            .broker("mqtt://broker:1883")
            .device_prefix("shellyplus1-441793d69718")
            .credentials("user", "pass")
            .client_id("my_client")
            .keep_alive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(2));

        assert_eq!(builder.broker.as_deref(), Some("mqtt://broker:1883"));
        assert_eq!(
            builder.device_prefix.as_deref(),
            Some("shellyplus1-441793d69718")
        );
        assert_eq!(builder.username.as_deref(), Some("user"));
        assert_eq!(builder.password.as_deref(), Some("pass"));
        assert_eq!(builder.client_id.as_deref(), Some("my_client"));
        assert_eq!(builder.keep_alive, Some(Duration::from_secs(60)));
        assert_eq!(builder.connect_timeout, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn routes_response_by_id() {
        let pending = PendingCalls::new();
        let call = pending.register("Switch.Toggle");
        let payload = json!({"id": call.id(), "src": "dev", "result": {"was_on": true}});

        route_response(&pending, payload.to_string().as_bytes());

        let response = call
            .wait(&Context::background(), "Switch.Toggle")
            .await
            .unwrap();
        assert_eq!(response.result, Some(json!({"was_on": true})));
    }

    #[tokio::test]
    async fn malformed_envelope_fails_its_call() {
        let pending = PendingCalls::new();
        let call = pending.register("Cover.GetStatus");
        let payload = json!({"id": call.id(), "error": "not an object"});

        route_response(&pending, payload.to_string().as_bytes());

        let err = call
            .wait(&Context::background(), "Cover.GetStatus")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::InvalidEnvelope);
        assert_eq!(err.delivery(), Delivery::Unknown);
    }

    #[test]
    fn garbage_is_dropped() {
        let pending = PendingCalls::new();
        let _call = pending.register("Cover.GetStatus");

        route_response(&pending, b"\xff not json");
        route_response(&pending, br#"{"method":"NotifyStatus","params":{}}"#);

        assert_eq!(pending.len(), 1);
    }
}
