/// Wastewater treatment monitoring service
///
/// Watches live sensor telemetry from treatment plant devices, evaluates
/// every reading against process thresholds, and turns violations into
/// persisted alerts with push and email notifications.

pub mod alert;
pub mod config;
pub mod dev_mode;
pub mod devices;
pub mod diagnosis;
pub mod feed;
pub mod logging;
pub mod model;
pub mod notify;
pub mod store;
