/// Plant Telemetry HTTP Feed
///
/// Polls the plant gateway's JSON telemetry endpoint for the latest live
/// reading of each device and converts it into canonical snapshots. The
/// gateway exposes one document per device at
/// `{base_url}/telemetry/{device_id}/live.json` with the historical HMI
/// field names (`PH`, `BOD`, `COD`, `TSS`, `Flow`, `Temperature`, `DO`,
/// `Conductivity`, `Turbidity`, `Timestamp`).
///
/// Field values may arrive as JSON numbers or numeric strings depending on
/// the gateway firmware revision; both are accepted at this boundary and
/// anything unparseable becomes an absent reading. The mapping from feed
/// field to snapshot field is explicit and total — consumers never touch
/// raw field names.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::model::{FeedError, Parameter, ParameterSnapshot, ALL_PARAMETERS};

use super::{FeedEvent, FeedSubscription, ReadingFeed};

/// How often producer threads re-check the unsubscribe flag while waiting
/// out the poll interval.
const WAKE_INTERVAL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

/// Feed field name for a canonical parameter.
fn feed_field(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Ph => "PH",
        Parameter::Temperature => "Temperature",
        Parameter::Tss => "TSS",
        Parameter::Cod => "COD",
        Parameter::Bod => "BOD",
        Parameter::Hardness => "Hardness",
        Parameter::Flow => "Flow",
        Parameter::DissolvedOxygen => "DO",
        Parameter::Conductivity => "Conductivity",
        Parameter::Turbidity => "Turbidity",
    }
}

/// Reads a numeric field that may be a JSON number or a numeric string.
fn numeric_field(payload: &serde_json::Value, field: &str) -> Option<f64> {
    match payload.get(field) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses one live telemetry document into a snapshot.
///
/// `received_at` is used when the payload carries no parseable `Timestamp`;
/// the snapshot is still usable, just stamped with delivery time.
pub fn parse_live_payload(
    device_id: &str,
    body: &str,
    received_at: DateTime<Utc>,
) -> Result<ParameterSnapshot, FeedError> {
    let payload: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FeedError::ParseError(e.to_string()))?;

    if payload.is_null() {
        return Err(FeedError::DeviceNotFound(device_id.to_string()));
    }
    if !payload.is_object() {
        return Err(FeedError::ParseError(format!(
            "expected telemetry object, got {}",
            payload
        )));
    }

    let timestamp = payload
        .get("Timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(received_at);

    let mut snapshot = ParameterSnapshot::empty(device_id, timestamp);
    for parameter in ALL_PARAMETERS {
        let value = numeric_field(&payload, feed_field(*parameter));
        match parameter {
            Parameter::Ph => snapshot.ph = value,
            Parameter::Temperature => snapshot.temperature = value,
            Parameter::Tss => snapshot.tss = value,
            Parameter::Cod => snapshot.cod = value,
            Parameter::Bod => snapshot.bod = value,
            Parameter::Hardness => snapshot.hardness = value,
            Parameter::Flow => snapshot.flow = value,
            Parameter::DissolvedOxygen => snapshot.dissolved_oxygen = value,
            Parameter::Conductivity => snapshot.conductivity = value,
            Parameter::Turbidity => snapshot.turbidity = value,
        }
    }

    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Polling feed
// ---------------------------------------------------------------------------

/// Polling implementation of `ReadingFeed` over the gateway HTTP API.
pub struct HttpFeed {
    base_url: String,
    poll_interval: Duration,
    client: reqwest::blocking::Client,
}

impl HttpFeed {
    pub fn new(base_url: &str, poll_interval: Duration) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        Ok(HttpFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            client,
        })
    }

    /// URL of a device's live telemetry document.
    pub fn live_url(&self, device_id: &str) -> String {
        format!("{}/telemetry/{}/live.json", self.base_url, device_id)
    }

    fn fetch_live(&self, device_id: &str) -> Result<ParameterSnapshot, FeedError> {
        let url = self.live_url(device_id);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpError(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        parse_live_payload(device_id, &body, Utc::now())
    }
}

impl ReadingFeed for HttpFeed {
    fn subscribe(&self, device_id: &str) -> Result<FeedSubscription, FeedError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let active = Arc::new(AtomicBool::new(true));

        let feed = HttpFeed {
            base_url: self.base_url.clone(),
            poll_interval: self.poll_interval,
            client: self.client.clone(),
        };
        let device = device_id.to_string();
        let producer_active = Arc::clone(&active);

        std::thread::spawn(move || {
            // The gateway overwrites the live document in place, so a poll
            // can return the same reading twice. Only deliveries with a new
            // timestamp go downstream, mimicking the push feed this replaces.
            let mut last_sent: Option<DateTime<Utc>> = None;

            while producer_active.load(Ordering::SeqCst) {
                let event = match feed.fetch_live(&device) {
                    Ok(snapshot) => {
                        if last_sent == Some(snapshot.timestamp) {
                            None
                        } else {
                            last_sent = Some(snapshot.timestamp);
                            Some(FeedEvent::Reading(snapshot))
                        }
                    }
                    Err(err) => Some(FeedEvent::Error(err)),
                };

                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        break; // consumer dropped the subscription
                    }
                }

                // Sleep in short slices so unsubscribe takes effect promptly.
                let mut waited = Duration::ZERO;
                while waited < feed.poll_interval && producer_active.load(Ordering::SeqCst) {
                    let slice = WAKE_INTERVAL.min(feed.poll_interval - waited);
                    std::thread::sleep(slice);
                    waited += slice;
                }
            }
        });

        Ok(FeedSubscription::new(rx, active))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
