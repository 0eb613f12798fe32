/// Core data types for the wastewater treatment monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond trivial accessors, no I/O, and no external
/// dependencies besides chrono — only types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Process parameters
// ---------------------------------------------------------------------------

/// A process parameter measured by a treatment plant sensor.
///
/// Declaration order is the canonical evaluation order: the fault evaluator
/// walks parameters in this order so that repeated diagnosis of identical
/// snapshots yields identical output, regardless of how the feed happened to
/// order its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    Ph,
    Temperature,
    Tss,
    Cod,
    Bod,
    Hardness,
    Flow,
    DissolvedOxygen,
    Conductivity,
    Turbidity,
}

/// All parameters in canonical order.
pub const ALL_PARAMETERS: &[Parameter] = &[
    Parameter::Ph,
    Parameter::Temperature,
    Parameter::Tss,
    Parameter::Cod,
    Parameter::Bod,
    Parameter::Hardness,
    Parameter::Flow,
    Parameter::DissolvedOxygen,
    Parameter::Conductivity,
    Parameter::Turbidity,
];

impl Parameter {
    /// Display label as it appears in alerts and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
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

    /// Engineering unit for the parameter.
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Temperature => "°C",
            Parameter::Tss => "mg/L",
            Parameter::Cod => "mg/L",
            Parameter::Bod => "mg/L",
            Parameter::Hardness => "ppm",
            Parameter::Flow => "m³/h",
            Parameter::DissolvedOxygen => "mg/L",
            Parameter::Conductivity => "µS/cm",
            Parameter::Turbidity => "NTU",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One timestamped set of sensor readings for a single device.
///
/// Produced by the live reading feed (`feed` module) or constructed manually
/// for what-if diagnosis. A `None` field means the sensor did not report that
/// parameter — absent is never treated as zero, and threshold rules skip
/// absent values entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub tss: Option<f64>,
    pub cod: Option<f64>,
    pub bod: Option<f64>,
    pub hardness: Option<f64>,
    pub flow: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub conductivity: Option<f64>,
    pub turbidity: Option<f64>,
}

impl ParameterSnapshot {
    /// A snapshot with every reading absent.
    pub fn empty(device_id: &str, timestamp: DateTime<Utc>) -> Self {
        ParameterSnapshot {
            device_id: device_id.to_string(),
            timestamp,
            ph: None,
            temperature: None,
            tss: None,
            cod: None,
            bod: None,
            hardness: None,
            flow: None,
            dissolved_oxygen: None,
            conductivity: None,
            turbidity: None,
        }
    }

    /// Total mapping from canonical parameter to the snapshot field.
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Ph => self.ph,
            Parameter::Temperature => self.temperature,
            Parameter::Tss => self.tss,
            Parameter::Cod => self.cod,
            Parameter::Bod => self.bod,
            Parameter::Hardness => self.hardness,
            Parameter::Flow => self.flow,
            Parameter::DissolvedOxygen => self.dissolved_oxygen,
            Parameter::Conductivity => self.conductivity,
            Parameter::Turbidity => self.turbidity,
        }
    }

    /// Number of parameters actually present in this snapshot.
    pub fn reading_count(&self) -> usize {
        ALL_PARAMETERS
            .iter()
            .filter(|p| self.value(**p).is_some())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Canonical alert severity, in ascending order.
///
/// The dashboard historically used two vocabularies (`low/medium/high` in
/// fault diagnosis, `info/warning/critical` in alerting). This service uses
/// one: `low` maps to `Info`, `medium`/`warning` to `Warning`, and
/// `high`/`critical` to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Acceptable operating range for one parameter.
///
/// A rule fires when the observed value falls below `min` (when defined) or
/// above `max` (when defined). `escalation` is the fraction beyond the bound
/// at which the finding escalates from Warning to Critical: with the
/// process-wide 0.10, a value below `min * 0.9` or above `max * 1.1` is
/// Critical.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub parameter: Parameter,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub escalation: f64,
}

/// A process-wide threshold table: one rule per governed parameter.
/// Never mutated at runtime.
pub type ThresholdTable = [ThresholdRule];

// ---------------------------------------------------------------------------
// Fault diagnosis types
// ---------------------------------------------------------------------------

/// Which bound a finding violated, carrying the bound itself for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Violation {
    BelowMin(f64),
    AboveMax(f64),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::BelowMin(min) => write!(f, "below {}", min),
            Violation::AboveMax(max) => write!(f, "above {}", max),
        }
    }
}

/// One threshold rule violation produced by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultFinding {
    pub parameter: Parameter,
    pub value: f64,
    pub violation: Violation,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
}

/// Aggregate result of diagnosing one snapshot.
///
/// Invariants (enforced by the evaluator, asserted in its tests):
///   - `has_fault == !findings.is_empty()`
///   - `severity` is the maximum finding severity, `Info` when none
///   - `recommendations` is non-empty iff `has_fault`, with one entry per
///     distinct violated parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultDiagnosisResult {
    pub has_fault: bool,
    pub findings: Vec<FaultFinding>,
    pub severity: Severity,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// Acknowledgement lifecycle of a persisted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    New,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "new",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted evidence of a detected violation episode.
///
/// Created by the alert monitor when a snapshot evaluates with faults;
/// append-only from the monitor's perspective. Acknowledgement transitions
/// are issued through the alert store by operator actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub device_id: String,
    pub device_name: String,
    pub findings: Vec<FaultFinding>,
    pub snapshot: ParameterSnapshot,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub status: AlertStatus,
}

impl AlertRecord {
    /// Notification title, matching the legacy dashboard wording.
    pub fn title(&self) -> String {
        if self.severity == Severity::Critical {
            format!("CRITICAL ALERT: {}", self.device_name)
        } else {
            format!("Warning: {}", self.device_name)
        }
    }

    /// One-line body listing every out-of-range parameter.
    pub fn body(&self) -> String {
        let violations = self
            .findings
            .iter()
            .map(|f| format!("{}: {} ({})", f.parameter.label(), f.value, f.violation))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} parameter(s) out of range: {}",
            self.findings.len(),
            violations
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when consuming the live telemetry feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Non-2xx HTTP response from the telemetry endpoint.
    HttpError(u16),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The requested device was not present in the feed.
    DeviceNotFound(String),
    /// Transport-level failure (connectivity, timeout).
    Transport(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FeedError::DeviceNotFound(id) => write!(f, "Device not found in feed: {}", id),
            FeedError::Transport(msg) => write!(f, "Feed transport error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

/// Errors from the alert / directory stores.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying database failure.
    Database(String),
    /// The referenced record does not exist.
    NotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Store error: {}", msg),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the push/email notification transports.
#[derive(Debug)]
pub enum TransportError {
    /// Non-2xx HTTP response from the transport endpoint.
    HttpError(u16),
    /// Transport-level failure (connectivity, timeout, serialization).
    Send(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::HttpError(code) => write!(f, "HTTP error: {}", code),
            TransportError::Send(msg) => write!(f, "Send failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_snapshot_value_covers_every_parameter() {
        // `value` must be a total mapping — an empty snapshot answers None
        // for every canonical parameter without panicking.
        let snapshot = ParameterSnapshot::empty("RPi001", ts());
        for parameter in ALL_PARAMETERS {
            assert_eq!(snapshot.value(*parameter), None);
        }
        assert_eq!(snapshot.reading_count(), 0);
    }

    #[test]
    fn test_reading_count_counts_only_present_fields() {
        let mut snapshot = ParameterSnapshot::empty("RPi001", ts());
        snapshot.ph = Some(7.2);
        snapshot.cod = Some(30.0);
        assert_eq!(snapshot.reading_count(), 2);
    }

    #[test]
    fn test_alert_title_reflects_severity() {
        let record = AlertRecord {
            device_id: "RPi001".to_string(),
            device_name: "Primary Tank Sensor".to_string(),
            findings: Vec::new(),
            snapshot: ParameterSnapshot::empty("RPi001", ts()),
            severity: Severity::Critical,
            created_at: ts(),
            status: AlertStatus::New,
        };
        assert_eq!(record.title(), "CRITICAL ALERT: Primary Tank Sensor");

        let warning = AlertRecord {
            severity: Severity::Warning,
            ..record
        };
        assert_eq!(warning.title(), "Warning: Primary Tank Sensor");
    }

    #[test]
    fn test_violation_display_matches_alert_wording() {
        assert_eq!(Violation::BelowMin(6.0).to_string(), "below 6");
        assert_eq!(Violation::AboveMax(200.0).to_string(), "above 200");
    }
}
