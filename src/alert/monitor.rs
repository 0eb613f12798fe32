//! Alert monitor: live per-device evaluation sessions.
//!
//! Each monitored device gets one worker that drains its feed subscription
//! in delivery order, runs the fault evaluator on every snapshot, and emits
//! an alert record through the store and the notification sink whenever the
//! evaluation finds faults. Sessions are tracked in an explicit registry so
//! start and stop are idempotent and no device is ever subscribed twice.
//!
//! Emission semantics follow the legacy dashboard: every violating update
//! re-alerts and re-notifies. A cooldown window can be enabled in the
//! configuration to suppress repeats; it is off by default and keyed on
//! snapshot timestamps so replayed data behaves deterministically.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::devices;
use crate::diagnosis::diagnose;
use crate::feed::{FeedEvent, FeedSubscription, ReadingFeed};
use crate::logging::{self, LogSource};
use crate::model::{AlertRecord, AlertStatus, FeedError, ParameterSnapshot};
use crate::notify::AlertSink;
use crate::store::AlertStore;

use super::staleness::is_stale_at;

/// How long a worker blocks on its subscription before re-checking its
/// stop flag.
const WAKE_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Runtime settings for the alert monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum seconds between alerts for one device, measured on snapshot
    /// timestamps. Zero disables the cooldown and reproduces the legacy
    /// re-alert-on-every-violating-update behavior.
    pub cooldown_secs: u64,
    /// Snapshots older than this are logged as stale before evaluation.
    pub stale_after_minutes: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            cooldown_secs: 0,
            stale_after_minutes: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Session registry
// ---------------------------------------------------------------------------

struct Session {
    stop: Arc<AtomicBool>,
    // Held so the worker is not detached invisibly; never joined on stop to
    // keep stop_monitoring non-blocking.
    _worker: std::thread::JoinHandle<()>,
}

/// Registry of active per-device monitoring sessions.
///
/// Owned by the monitor, never a module global, so independent monitor
/// instances (tests, multi-plant deployments) cannot interfere. The mutex
/// makes the contains-check and insert atomic, which is what guarantees
/// idempotent start under concurrent callers.
#[derive(Default)]
struct SessionRegistry {
    inner: Mutex<HashMap<String, Session>>,
}

// ---------------------------------------------------------------------------
// Feed fault reporting
// ---------------------------------------------------------------------------

/// A feed-side failure surfaced to observers. The session stays in
/// monitoring state; evaluation resumes when the feed recovers.
#[derive(Debug)]
pub struct FeedFault {
    pub device_id: String,
    pub error: FeedError,
}

// ---------------------------------------------------------------------------
// Alert monitor
// ---------------------------------------------------------------------------

pub struct AlertMonitor {
    feed: Arc<dyn ReadingFeed>,
    store: Arc<dyn AlertStore>,
    sink: Arc<dyn AlertSink>,
    config: MonitorConfig,
    sessions: SessionRegistry,
    fault_tx: Sender<FeedFault>,
}

impl AlertMonitor {
    /// Builds a monitor and the receiver on which feed faults are surfaced.
    ///
    /// The receiver may be dropped by callers who only want the logged
    /// record of feed trouble; fault delivery is best effort.
    pub fn new(
        feed: Arc<dyn ReadingFeed>,
        store: Arc<dyn AlertStore>,
        sink: Arc<dyn AlertSink>,
        config: MonitorConfig,
    ) -> (Self, Receiver<FeedFault>) {
        let (fault_tx, fault_rx) = std::sync::mpsc::channel();
        let monitor = AlertMonitor {
            feed,
            store,
            sink,
            config,
            sessions: SessionRegistry::default(),
            fault_tx,
        };
        (monitor, fault_rx)
    }

    /// Starts monitoring a device. Idempotent: returns `Ok(false)` without
    /// side effects if the device is already being monitored.
    pub fn start_monitoring(&self, device_id: &str) -> Result<bool, FeedError> {
        let mut sessions = self.sessions.inner.lock().unwrap();
        if sessions.contains_key(device_id) {
            logging::info(
                LogSource::Monitor,
                Some(device_id),
                "Alert monitoring already active",
            );
            return Ok(false);
        }

        let subscription = self.feed.subscribe(device_id)?;
        let stop = Arc::new(AtomicBool::new(false));

        let worker = spawn_session_worker(SessionContext {
            device_id: device_id.to_string(),
            subscription,
            stop: Arc::clone(&stop),
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
            fault_tx: self.fault_tx.clone(),
        });

        sessions.insert(
            device_id.to_string(),
            Session {
                stop,
                _worker: worker,
            },
        );
        logging::info(LogSource::Monitor, Some(device_id), "Alert monitoring started");
        Ok(true)
    }

    /// Stops monitoring a device. Idempotent: returns `false` if the device
    /// was not being monitored.
    pub fn stop_monitoring(&self, device_id: &str) -> bool {
        let session = self.sessions.inner.lock().unwrap().remove(device_id);
        match session {
            Some(session) => {
                session.stop.store(true, Ordering::SeqCst);
                logging::info(LogSource::Monitor, Some(device_id), "Alert monitoring stopped");
                true
            }
            None => {
                logging::info(
                    LogSource::Monitor,
                    Some(device_id),
                    "No active alert monitoring",
                );
                false
            }
        }
    }

    /// Starts monitoring every device in the registry.
    ///
    /// A subscription failure for one device is logged and does not stop
    /// the others from starting. Returns the number of sessions started.
    pub fn start_all(&self) -> usize {
        let mut started = 0;
        for device_id in devices::all_device_ids() {
            match self.start_monitoring(device_id) {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(err) => logging::log_feed_failure(device_id, "subscribe", &err),
            }
        }
        logging::info(
            LogSource::Monitor,
            None,
            &format!("Started alert monitoring for {} device(s)", started),
        );
        started
    }

    /// Stops every active session.
    pub fn stop_all(&self) {
        let device_ids: Vec<String> = self
            .sessions
            .inner
            .lock()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        for device_id in device_ids {
            self.stop_monitoring(&device_id);
        }
        logging::info(
            LogSource::Monitor,
            None,
            "Stopped all alert monitoring sessions",
        );
    }

    /// Whether a device currently has an active session.
    pub fn is_monitoring(&self, device_id: &str) -> bool {
        self.sessions.inner.lock().unwrap().contains_key(device_id)
    }

    /// Number of active sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.inner.lock().unwrap().len()
    }
}

// ---------------------------------------------------------------------------
// Session worker
// ---------------------------------------------------------------------------

struct SessionContext {
    device_id: String,
    subscription: FeedSubscription,
    stop: Arc<AtomicBool>,
    store: Arc<dyn AlertStore>,
    sink: Arc<dyn AlertSink>,
    config: MonitorConfig,
    fault_tx: Sender<FeedFault>,
}

fn spawn_session_worker(ctx: SessionContext) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut last_alert_at: Option<DateTime<Utc>> = None;

        while !ctx.stop.load(Ordering::SeqCst) {
            let event = match ctx.subscription.recv_timeout(WAKE_INTERVAL) {
                Ok(Some(event)) => event,
                Ok(None) => continue, // timeout, re-check stop flag
                Err(()) => {
                    // Producer shut the stream down. The session remains
                    // registered; an explicit stop/start cycles it.
                    logging::warn(
                        LogSource::Monitor,
                        Some(&ctx.device_id),
                        "Feed stream closed by producer",
                    );
                    break;
                }
            };

            // Stop can land while this worker is blocked in recv. An event
            // delivered after stop_monitoring returned must not be
            // evaluated; only a dispatch already issued may complete.
            if ctx.stop.load(Ordering::SeqCst) {
                break;
            }

            match event {
                FeedEvent::Reading(snapshot) => {
                    handle_reading(&ctx, snapshot, &mut last_alert_at);
                }
                FeedEvent::Error(error) => {
                    logging::log_feed_failure(&ctx.device_id, "read", &error);
                    // Best effort; nobody may be listening.
                    let _ = ctx.fault_tx.send(FeedFault {
                        device_id: ctx.device_id.clone(),
                        error,
                    });
                    // Session stays up; the feed recovers on its own terms.
                }
            }
        }
        // Subscription drops here, signalling the producer to stop.
    })
}

fn handle_reading(
    ctx: &SessionContext,
    snapshot: ParameterSnapshot,
    last_alert_at: &mut Option<DateTime<Utc>>,
) {
    if is_stale_at(&snapshot, ctx.config.stale_after_minutes, Utc::now()) {
        logging::warn(
            LogSource::Monitor,
            Some(&ctx.device_id),
            &format!(
                "Evaluating stale snapshot from {} (sensor may be offline)",
                snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        );
    }

    let result = diagnose(&snapshot);
    if !result.has_fault {
        return;
    }

    if ctx.config.cooldown_secs > 0 {
        if let Some(last) = *last_alert_at {
            let elapsed = snapshot.timestamp.signed_duration_since(last);
            if elapsed < chrono::Duration::seconds(ctx.config.cooldown_secs as i64) {
                logging::debug(
                    LogSource::Monitor,
                    Some(&ctx.device_id),
                    "Alert suppressed by cooldown window",
                );
                return;
            }
        }
    }

    let record = AlertRecord {
        device_id: ctx.device_id.clone(),
        device_name: devices::device_name(&ctx.device_id),
        findings: result.findings,
        severity: result.severity,
        snapshot,
        created_at: Utc::now(),
        status: AlertStatus::New,
    };

    // The alert exists even if persistence or notification fails: a store
    // error must not suppress dispatch, and dispatch is itself infallible.
    match ctx.store.append(&record) {
        Ok(alert_id) => logging::info(
            LogSource::Monitor,
            Some(&ctx.device_id),
            &format!("Alert {} created ({})", alert_id, record.severity),
        ),
        Err(err) => logging::error(
            LogSource::Database,
            Some(&ctx.device_id),
            &format!("Failed to persist alert: {}", err),
        ),
    }

    let summary = ctx.sink.dispatch(&record);
    logging::info(
        LogSource::Monitor,
        Some(&ctx.device_id),
        &format!(
            "Notified {} push recipient(s) ({} failed), {} email recipient(s)",
            summary.push_sent, summary.push_failed, summary.email_recipients
        ),
    );

    *last_alert_at = Some(record.snapshot.timestamp);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
