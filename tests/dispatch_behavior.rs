/// Integration tests for notification dispatch
///
/// Exercises the dispatcher against the user directory and the push/email
/// transports: audience selection by stored preference, per-recipient
/// failure isolation, dry-run email, and the zero-recipient case.
///
/// Run with: cargo test --test dispatch_behavior

use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};

use wwmon_service::model::{
    AlertRecord, AlertStatus, FaultFinding, Parameter, ParameterSnapshot, Severity, StoreError,
    TransportError, Violation,
};
use wwmon_service::notify::email::{EmailTransport, SmtpRelayTransport};
use wwmon_service::notify::push::{PushOutcome, PushTransport};
use wwmon_service::notify::{AlertDispatcher, AlertSink};
use wwmon_service::store::{
    Channel, DirectoryStore, MemoryDirectory, NotificationPreferences, Recipient,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn recipient(
    user_id: &str,
    email: Option<&str>,
    tokens: &[&str],
    push: bool,
    mail: bool,
) -> Recipient {
    Recipient {
        user_id: user_id.to_string(),
        email: email.map(|e| e.to_string()),
        device_tokens: tokens.iter().map(|t| t.to_string()).collect(),
        preferences: NotificationPreferences {
            push_enabled: push,
            email_enabled: mail,
            sms_enabled: false,
            whatsapp_enabled: false,
        },
    }
}

fn critical_record() -> AlertRecord {
    let mut snapshot = ParameterSnapshot::empty(
        "RPi001",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    );
    snapshot.cod = Some(580.0);
    AlertRecord {
        device_id: "RPi001".to_string(),
        device_name: "Raspberry Pi Sensor 001".to_string(),
        findings: vec![FaultFinding {
            parameter: Parameter::Cod,
            value: 580.0,
            violation: Violation::AboveMax(500.0),
            severity: Severity::Critical,
            description: "Chemical oxygen demand above the discharge limit".to_string(),
            impact: "Oxygen depletion in the receiving water".to_string(),
        }],
        snapshot,
        severity: Severity::Critical,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap(),
        status: AlertStatus::New,
    }
}

/// Push transport that fails for one configured user's tokens.
struct SelectivePush {
    failing_token: String,
    batches: Mutex<Vec<Vec<String>>>,
}

impl SelectivePush {
    fn new(failing_token: &str) -> Self {
        SelectivePush {
            failing_token: failing_token.to_string(),
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl PushTransport for SelectivePush {
    fn send(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
        _data: &serde_json::Value,
    ) -> Result<PushOutcome, TransportError> {
        if tokens.contains(&self.failing_token) {
            return Err(TransportError::HttpError(503));
        }
        self.batches.lock().unwrap().push(tokens.to_vec());
        Ok(PushOutcome {
            success_count: tokens.len(),
            failure_count: 0,
        })
    }
}

#[derive(Default)]
struct RecordingEmail {
    batches: Mutex<Vec<(Vec<String>, String, String)>>,
}

impl EmailTransport for RecordingEmail {
    fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<(), TransportError> {
        self.batches
            .lock()
            .unwrap()
            .push((addresses.to_vec(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

/// Directory whose lookups always fail.
struct BrokenDirectory;

impl DirectoryStore for BrokenDirectory {
    fn recipients_with_channel(&self, _channel: Channel) -> Result<Vec<Recipient>, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
}

fn dispatcher(
    directory: Arc<dyn DirectoryStore>,
    push: Arc<dyn PushTransport>,
    email: Arc<dyn EmailTransport>,
) -> AlertDispatcher {
    AlertDispatcher::new(directory, push, email)
}

// ---------------------------------------------------------------------------
// Dispatch behavior
// ---------------------------------------------------------------------------

#[test]
fn test_no_recipients_is_a_successful_dispatch() {
    let d = dispatcher(
        Arc::new(MemoryDirectory::new()),
        Arc::new(SelectivePush::new("unused")),
        Arc::new(RecordingEmail::default()),
    );

    let summary = d.dispatch(&critical_record());
    assert_eq!(summary.push_recipients, 0);
    assert_eq!(summary.push_sent, 0);
    assert_eq!(summary.push_failed, 0);
    assert_eq!(summary.email_recipients, 0);
    assert!(summary.email_delivered);
}

#[test]
fn test_audience_follows_stored_preferences() {
    let directory = MemoryDirectory::new();
    directory.add_user(recipient("push-only", None, &["tok-p"], true, false));
    directory.add_user(recipient(
        "email-only",
        Some("mail@plant.local"),
        &[],
        false,
        true,
    ));
    directory.add_user(recipient("opted-out", Some("quiet@plant.local"), &["tok-q"], false, false));

    let push = Arc::new(SelectivePush::new("unused"));
    let email = Arc::new(RecordingEmail::default());
    let d = dispatcher(Arc::new(directory), push.clone(), email.clone());

    let summary = d.dispatch(&critical_record());

    assert_eq!(summary.push_recipients, 1);
    assert_eq!(summary.push_sent, 1);
    let batches = push.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec!["tok-p".to_string()]);

    assert_eq!(summary.email_recipients, 1);
    let mails = email.batches.lock().unwrap();
    assert_eq!(mails[0].0, vec!["mail@plant.local".to_string()]);
}

#[test]
fn test_one_failing_recipient_does_not_block_the_rest() {
    let directory = MemoryDirectory::new();
    directory.add_user(recipient("flaky", None, &["tok-bad"], true, false));
    directory.add_user(recipient("healthy", None, &["tok-good"], true, false));

    let push = Arc::new(SelectivePush::new("tok-bad"));
    let d = dispatcher(
        Arc::new(directory),
        push.clone(),
        Arc::new(RecordingEmail::default()),
    );

    let summary = d.dispatch(&critical_record());
    assert_eq!(summary.push_recipients, 2);
    assert_eq!(summary.push_sent, 1);
    assert_eq!(summary.push_failed, 1);

    let batches = push.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0], vec!["tok-good".to_string()]);
}

#[test]
fn test_email_content_carries_severity_and_violations() {
    let directory = MemoryDirectory::new();
    directory.add_user(recipient("op", Some("op@plant.local"), &[], false, true));

    let email = Arc::new(RecordingEmail::default());
    let d = dispatcher(
        Arc::new(directory),
        Arc::new(SelectivePush::new("unused")),
        email.clone(),
    );

    d.dispatch(&critical_record());

    let mails = email.batches.lock().unwrap();
    let (_, subject, html) = &mails[0];
    assert_eq!(subject, "[CRITICAL] CRITICAL ALERT: Raspberry Pi Sensor 001");
    assert!(html.contains("#ff0000"), "critical banner color");
    assert!(html.contains("COD: 580 (above 500)"));
    assert!(html.contains("Device ID: RPi001"));
}

#[test]
fn test_dry_run_email_counts_as_delivered() {
    let directory = MemoryDirectory::new();
    directory.add_user(recipient("op", Some("op@plant.local"), &[], false, true));

    // No relay credentials: the transport logs instead of sending.
    let email = SmtpRelayTransport::new("http://relay.local/mail", "alerts@plant.local", None)
        .expect("transport builds without network access");
    assert!(email.is_dry_run());

    let d = dispatcher(
        Arc::new(directory),
        Arc::new(SelectivePush::new("unused")),
        Arc::new(email),
    );

    let summary = d.dispatch(&critical_record());
    assert_eq!(summary.email_recipients, 1);
    assert!(summary.email_delivered);
}

#[test]
fn test_directory_outage_degrades_to_empty_audience() {
    let push = Arc::new(SelectivePush::new("unused"));
    let email = Arc::new(RecordingEmail::default());
    let d = dispatcher(Arc::new(BrokenDirectory), push.clone(), email.clone());

    let summary = d.dispatch(&critical_record());
    assert_eq!(summary.push_recipients, 0);
    assert_eq!(summary.email_recipients, 0);
    assert!(summary.email_delivered);
    assert!(push.batches.lock().unwrap().is_empty());
    assert!(email.batches.lock().unwrap().is_empty());
}
