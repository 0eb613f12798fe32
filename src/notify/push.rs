/// Push notification transport.
///
/// Posts a multicast request to the push relay, which fans the message out
/// to the registered device tokens and reports per-token delivery counts.

use serde::Deserialize;
use std::time::Duration;

use crate::model::TransportError;

/// Per-batch delivery counts reported by the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub success_count: usize,
    pub failure_count: usize,
}

pub trait PushTransport: Send + Sync {
    /// Send one notification to a batch of device tokens.
    fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<PushOutcome, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP relay implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(rename = "successCount")]
    success_count: usize,
    #[serde(rename = "failureCount")]
    failure_count: usize,
}

pub struct HttpPushTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpPushTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(HttpPushTransport {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl PushTransport for HttpPushTransport {
    fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<PushOutcome, TransportError> {
        let payload = serde_json::json!({
            "tokens": tokens,
            "title": title,
            "body": body,
            "data": data,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::HttpError(response.status().as_u16()));
        }

        let relay: RelayResponse = response
            .json()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(PushOutcome {
            success_count: relay.success_count,
            failure_count: relay.failure_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_response_parses_camel_case_counts() {
        let raw = r#"{"successCount": 3, "failureCount": 1}"#;
        let relay: RelayResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(relay.success_count, 3);
        assert_eq!(relay.failure_count, 1);
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let transport = HttpPushTransport::new("http://relay.local/push/").unwrap();
        assert_eq!(transport.endpoint, "http://relay.local/push");
    }
}
