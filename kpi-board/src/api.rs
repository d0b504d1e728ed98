//! API client for the spreadsheet-backed KPI endpoint.
//!
//! The exporter answers either with bare JSON or with JSON wrapped in a
//! JSONP callback. Both are accepted; the callback is only ever used as a
//! wire format, never executed. Requests run on a dedicated Tokio task
//! driven by [`ApiCommand`]s and report back through [`ApiMessage`]s.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::DashboardData;

/// Failure while fetching the dashboard
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Error de conexión: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Respuesta no válida: {0}")]
    Decode(String),

    #[error("{0}")]
    Remote(String),
}

/// API client for the dashboard exporter
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    callback: String,
}

impl ApiClient {
    /// Create a new API client from resolved configuration
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            callback: config.callback.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the whole dashboard in one request
    pub async fn fetch_dashboard(&self) -> Result<DashboardData, FetchError> {
        // Cache buster, the exporter sits behind an aggressive CDN
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();

        debug!(endpoint = %self.endpoint, "Requesting dashboard");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("callback", self.callback.as_str()), ("ts", ts.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Dashboard endpoint returned an error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let data = decode_dashboard(&body, &self.callback)?;
        info!(count = data.kpis.len(), version = %data.metadata.version, "Dashboard fetched");
        Ok(data)
    }
}

/// Decode a response body, unwrapping a `callback(...)` envelope if present
pub fn decode_dashboard(body: &str, callback: &str) -> Result<DashboardData, FetchError> {
    let json = strip_jsonp(body.trim(), callback);
    let value: Value =
        serde_json::from_str(json).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(message) = remote_error(&value) {
        return Err(FetchError::Remote(message));
    }

    serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
}

fn strip_jsonp<'a>(body: &'a str, callback: &str) -> &'a str {
    let Some(rest) = body.strip_prefix(callback) else {
        return body;
    };
    let rest = rest.trim_start();
    let Some(inner) = rest.strip_prefix('(') else {
        return body;
    };
    let inner = inner.trim_end().trim_end_matches(';').trim_end();
    inner.strip_suffix(')').unwrap_or(inner)
}

fn remote_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Messages sent from the API worker to the UI
#[derive(Debug, Clone)]
pub enum ApiMessage {
    /// A new dashboard snapshot arrived
    DashboardLoaded(DashboardData),
    /// The refresh failed; the previous snapshot stays in place
    FetchFailed(String),
}

/// Commands sent from the UI to the API worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    /// Fetch the dashboard again
    Refresh,
    /// Stop the worker
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "metadata": { "generated_at": "2025-02-03T12:00:00.000Z", "count": 1, "version": "3.1.0" },
        "kpis": [{ "id": 4, "sub_kpi": "Uptime", "tipo_target": "Binario", "logro_val": "Liberado" }]
    }"#;

    #[test]
    fn test_decode_bare_json() {
        let data = decode_dashboard(BODY, "loadDashboardData").unwrap();
        assert_eq!(data.metadata.version, "3.1.0");
        assert_eq!(data.kpis.len(), 1);
        assert!(data.kpis[0].is_binary());
    }

    #[test]
    fn test_decode_jsonp_matches_bare_json() {
        let wrapped = format!("loadDashboardData({});\n", BODY);
        let spaced = format!("  loadDashboardData ( {} )  ", BODY);
        let bare = decode_dashboard(BODY, "loadDashboardData").unwrap();
        assert_eq!(decode_dashboard(&wrapped, "loadDashboardData").unwrap(), bare);
        assert_eq!(decode_dashboard(&spaced, "loadDashboardData").unwrap(), bare);
    }

    #[test]
    fn test_remote_error_payload() {
        let err = decode_dashboard(r#"cb({"error": "Hoja no encontrada"})"#, "cb").unwrap_err();
        assert!(matches!(err, FetchError::Remote(ref m) if m == "Hoja no encontrada"));
        assert_eq!(err.to_string(), "Hoja no encontrada");
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let body = r#"{"error": null, "metadata": {"generated_at": "", "count": 0, "version": "3.0.0"}, "kpis": []}"#;
        assert!(decode_dashboard(body, "cb").unwrap().kpis.is_empty());
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(matches!(
            decode_dashboard("<html>Moved</html>", "cb"),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            decode_dashboard(r#"{"kpis": []}"#, "cb"),
            Err(FetchError::Decode(_))
        ));
    }
}
