// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for Shelly devices.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::context::Context;
use crate::error::{ConfigError, Delivery, TransportError, TransportErrorKind};
use crate::protocol::{ErrorObject, Request, Response, Transport};

/// How calls are encoded as HTTP requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStyle {
    /// `POST /rpc` with a full JSON-RPC envelope in the body.
    #[default]
    Post,
    /// `GET /rpc/<Method>?key=value` with the bare result in the body.
    Get,
}

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration for an HTTP transport.
///
/// HTTP is stateless: each call is an independent request and no connection
/// state is shared between calls.
///
/// # Examples
///
/// ```
/// use shelly_rpc::protocol::{HttpConfig, RequestStyle};
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.60")
///     .with_port(8080)
///     .with_request_style(RequestStyle::Get)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://192.168.1.60:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    timeout: Duration,
    style: RequestStyle,
    source: String,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default `src` placed in request envelopes.
    pub const DEFAULT_SOURCE: &'static str = "shelly_rpc";

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname or IP address of the device
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            timeout: Self::DEFAULT_TIMEOUT,
            style: RequestStyle::default(),
            source: Self::DEFAULT_SOURCE.to_string(),
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Selects how calls are encoded.
    #[must_use]
    pub fn with_request_style(mut self, style: RequestStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the `src` placed in request envelopes.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the request style.
    #[must_use]
    pub fn request_style(&self) -> RequestStyle {
        self.style
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an `HttpTransport` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_transport(self) -> Result<HttpTransport, ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidAddress("host is empty".to_string()));
        }

        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(HttpTransport {
            base_url: self.base_url(),
            client,
            style: self.style,
            source: self.source,
            next_id: AtomicU64::new(1),
        })
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// HTTP transport performing one request per call.
///
/// # Examples
///
/// ```no_run
/// use shelly_rpc::protocol::HttpConfig;
/// use shelly_rpc::{Client, Context};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpConfig::new("192.168.1.60").into_transport()?;
/// let client = Client::new(transport);
/// let info = client
///     .call(&Context::background(), "Shelly.GetDeviceInfo", None)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
    style: RequestStyle,
    source: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Creates a transport for `host` with default settings.
    ///
    /// A host given with an `http://` or `https://` scheme is used as-is.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(host: impl Into<String>) -> Result<Self, ConfigError> {
        let host = host.into();
        if let Some(rest) = host.strip_prefix("https://") {
            return HttpConfig::new(rest).with_https().into_transport();
        }
        let host = host.strip_prefix("http://").unwrap_or(&host).to_string();
        HttpConfig::new(host).into_transport()
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the request style.
    #[must_use]
    pub fn request_style(&self) -> RequestStyle {
        self.style
    }

    fn rpc_url(&self) -> String {
        format!("{}/rpc", self.base_url)
    }

    /// Builds `GET /rpc/<Method>?k=v` with top-level params as the query.
    ///
    /// String values are sent raw; every other value as its JSON text.
    fn get_url(&self, method: &str, params: Option<&Value>) -> Result<String, TransportError> {
        let mut url = format!("{}/rpc/{}", self.base_url, urlencoding::encode(method));

        let fields = match params {
            None | Some(Value::Null) => return Ok(url),
            Some(Value::Object(fields)) => fields,
            Some(_) => {
                return Err(TransportError::new(
                    method,
                    TransportErrorKind::InvalidRequest,
                    Delivery::NotSent,
                    "GET requests need object params",
                ));
            }
        };

        let query: Vec<String> = fields
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&text)
                )
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(url)
    }

    async fn perform_post(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Response, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(id, &self.source, method, params);
        let url = self.rpc_url();

        tracing::debug!(url = %url, method, id, "Sending HTTP RPC request");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(remaining) = cx.remaining() {
            builder = builder.timeout(remaining);
        }
        let response = builder.send().await.map_err(|e| send_error(method, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| body_error(method, e))?;

        tracing::debug!(status = status.as_u16(), len = body.len(), "Received HTTP RPC response");

        match serde_json::from_slice::<Response>(&body) {
            Ok(envelope) if !status.is_success() && envelope.error.is_none() => {
                Err(status_error(method, status))
            }
            Ok(envelope) if envelope.id.is_some_and(|got| got != id) => Err(TransportError::new(
                method,
                TransportErrorKind::InvalidEnvelope,
                Delivery::Unknown,
                format!("response id {:?} does not match request id {id}", envelope.id),
            )),
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(status_error(method, status)),
            Err(e) => Err(TransportError::new(
                method,
                TransportErrorKind::InvalidEnvelope,
                Delivery::Unknown,
                "response body is not a JSON-RPC envelope",
            )
            .with_source(e)),
        }
    }

    async fn perform_get(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Response, TransportError> {
        let url = self.get_url(method, params)?;

        tracing::debug!(url = %url, method, "Sending HTTP RPC GET request");

        let mut builder = self.client.get(&url);
        if let Some(remaining) = cx.remaining() {
            builder = builder.timeout(remaining);
        }
        let response = builder.send().await.map_err(|e| send_error(method, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| body_error(method, e))?;

        tracing::debug!(status = status.as_u16(), len = body.len(), "Received HTTP RPC response");

        if status.is_success() {
            if body.is_empty() {
                return Ok(Response::default());
            }
            return serde_json::from_slice::<Value>(&body)
                .map(Response::success)
                .map_err(|e| {
                    TransportError::new(
                        method,
                        TransportErrorKind::InvalidEnvelope,
                        Delivery::Unknown,
                        "response body is not JSON",
                    )
                    .with_source(e)
                });
        }

        match serde_json::from_slice::<ErrorObject>(&body) {
            Ok(error) => Ok(Response {
                error: Some(error),
                ..Response::default()
            }),
            Err(_) => Err(status_error(method, status)),
        }
    }
}

impl Transport for HttpTransport {
    async fn perform(
        &self,
        cx: &Context,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Response, TransportError> {
        match self.style {
            RequestStyle::Post => self.perform_post(cx, method, params).await,
            RequestStyle::Get => self.perform_get(cx, method, params).await,
        }
    }
}

/// Classifies a failure to send the request.
fn send_error(method: &str, err: reqwest::Error) -> TransportError {
    let (kind, delivery) = if err.is_timeout() {
        (TransportErrorKind::Timeout, Delivery::Unknown)
    } else if err.is_connect() {
        (TransportErrorKind::Unreachable, Delivery::NotSent)
    } else if err.is_builder() {
        (TransportErrorKind::InvalidRequest, Delivery::NotSent)
    } else {
        (TransportErrorKind::ConnectionLost, Delivery::Unknown)
    };
    TransportError::new(method, kind, delivery, "HTTP request failed").with_source(err)
}

/// Classifies a failure while reading the response body.
fn body_error(method: &str, err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else {
        TransportErrorKind::ConnectionLost
    };
    TransportError::new(method, kind, Delivery::Unknown, "reading response body failed")
        .with_source(err)
}

fn status_error(method: &str, status: StatusCode) -> TransportError {
    TransportError::new(
        method,
        TransportErrorKind::Status(status.as_u16()),
        Delivery::Unknown,
        status.canonical_reason().unwrap_or("Unknown"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get_transport() -> HttpTransport {
        HttpConfig::new("192.168.1.60")
            .with_request_style(RequestStyle::Get)
            .into_transport()
            .unwrap()
    }

    #[test]
    fn get_url_without_params() {
        let url = get_transport().get_url("Shelly.GetStatus", None).unwrap();
        assert_eq!(url, "http://192.168.1.60/rpc/Shelly.GetStatus");
    }

    #[test]
    fn get_url_encodes_params() {
        let params = json!({"id": 0, "on": true});
        let url = get_transport()
            .get_url("Switch.Set", Some(&params))
            .unwrap();
        assert_eq!(url, "http://192.168.1.60/rpc/Switch.Set?id=0&on=true");
    }

    #[test]
    fn get_url_sends_strings_raw_and_objects_as_json() {
        let params = json!({"config": {"name": "garage door"}, "name": "a b"});
        let url = get_transport()
            .get_url("Cover.SetConfig", Some(&params))
            .unwrap();
        assert_eq!(
            url,
            "http://192.168.1.60/rpc/Cover.SetConfig?config=%7B%22name%22%3A%22garage%20door%22%7D&name=a%20b"
        );
    }

    #[test]
    fn get_url_rejects_non_object_params() {
        let params = json!([1, 2]);
        let err = get_transport()
            .get_url("Cover.Open", Some(&params))
            .unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::InvalidRequest);
        assert!(err.is_retry_safe());
    }

    #[test]
    fn new_accepts_scheme() {
        let transport = HttpTransport::new("https://10.0.0.2").unwrap();
        assert_eq!(transport.base_url(), "https://10.0.0.2");

        let transport = HttpTransport::new("http://10.0.0.2").unwrap();
        assert_eq!(transport.base_url(), "http://10.0.0.2");
        assert_eq!(transport.request_style(), RequestStyle::Post);
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = HttpConfig::new("").into_transport();
        assert!(matches!(result, Err(ConfigError::InvalidAddress(_))));
    }

    // =========================================================================
    // HttpConfig tests
    // =========================================================================

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("192.168.1.60");
        assert_eq!(config.host(), "192.168.1.60");
        assert_eq!(config.port(), 80);
        assert!(!config.use_https());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.request_style(), RequestStyle::Post);
    }

    #[test]
    fn http_config_with_https() {
        let config = HttpConfig::new("192.168.1.60").with_https();
        assert!(config.use_https());
        assert_eq!(config.port(), 443);
        assert_eq!(config.base_url(), "https://192.168.1.60");
    }

    #[test]
    fn http_config_with_https_custom_port() {
        let config = HttpConfig::new("192.168.1.60").with_port(8443).with_https();
        assert_eq!(config.port(), 8443);
        assert_eq!(config.base_url(), "https://192.168.1.60:8443");
    }

    #[test]
    fn http_config_base_url_custom_port() {
        let config = HttpConfig::new("192.168.1.60").with_port(8080);
        assert_eq!(config.base_url(), "http://192.168.1.60:8080");
    }

    #[test]
    fn http_config_into_transport() {
        let transport = HttpConfig::new("192.168.1.60")
            .with_source("tester")
            .into_transport()
            .unwrap();
        assert_eq!(transport.base_url(), "http://192.168.1.60");
        assert_eq!(transport.rpc_url(), "http://192.168.1.60/rpc");
        assert_eq!(transport.source, "tester");
    }
}
