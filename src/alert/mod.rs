//! Alerting: turning the continuous reading feed into discrete alerts.
//!
//! Submodules:
//! - `monitor` — per-device monitoring sessions, evaluation, alert emission.
//! - `staleness` — snapshot age checks used to flag sensor gaps.

pub mod monitor;
pub mod staleness;
