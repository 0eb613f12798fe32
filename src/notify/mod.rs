/// Notification dispatch.
///
/// Turns a persisted alert into outbound push and email notifications.
/// Dispatch is best-effort by design: the audience is looked up per channel,
/// per-recipient transport failures are logged and counted but never abort
/// the batch, and an empty audience is a trivially successful dispatch.

pub mod email;
pub mod push;

use std::sync::Arc;

use crate::logging::{self, LogSource};
use crate::model::AlertRecord;
use crate::store::{Channel, DirectoryStore, Recipient};

use email::EmailTransport;
use push::PushTransport;

/// Delivery counts for one dispatched alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Push recipients with at least one registered device token.
    pub push_recipients: usize,
    /// Device tokens the push relay confirmed.
    pub push_sent: usize,
    /// Device tokens that failed, including whole batches lost to transport errors.
    pub push_failed: usize,
    /// Addresses the email batch was sent to.
    pub email_recipients: usize,
    /// True when the email batch was delivered (or the audience was empty).
    pub email_delivered: bool,
}

/// Outbound side of the alert pipeline. Implementations never fail:
/// delivery problems are reported through the summary counts.
pub trait AlertSink: Send + Sync {
    fn dispatch(&self, record: &AlertRecord) -> DispatchSummary;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct AlertDispatcher {
    directory: Arc<dyn DirectoryStore>,
    push: Arc<dyn PushTransport>,
    email: Arc<dyn EmailTransport>,
}

impl AlertDispatcher {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        push: Arc<dyn PushTransport>,
        email: Arc<dyn EmailTransport>,
    ) -> Self {
        AlertDispatcher {
            directory,
            push,
            email,
        }
    }

    /// Audience lookup; a directory failure degrades to an empty audience
    /// rather than aborting the other channels.
    fn audience(&self, channel: Channel, device_id: &str) -> Vec<Recipient> {
        match self.directory.recipients_with_channel(channel) {
            Ok(recipients) => recipients,
            Err(err) => {
                logging::error(
                    LogSource::Database,
                    Some(device_id),
                    &format!(
                        "Failed to resolve {} audience, skipping channel: {}",
                        channel.as_str(),
                        err
                    ),
                );
                Vec::new()
            }
        }
    }

    fn dispatch_push(&self, record: &AlertRecord, summary: &mut DispatchSummary) {
        let title = record.title();
        let body = record.body();
        let data = serde_json::json!({
            "deviceId": record.device_id,
            "severity": record.severity.as_str(),
            "timestamp": record.created_at.to_rfc3339(),
        });

        for recipient in self.audience(Channel::Push, &record.device_id) {
            // Recipients without a registered device have nothing to deliver to.
            if recipient.device_tokens.is_empty() {
                continue;
            }
            summary.push_recipients += 1;

            match self
                .push
                .send(&recipient.device_tokens, &title, &body, &data)
            {
                Ok(outcome) => {
                    summary.push_sent += outcome.success_count;
                    summary.push_failed += outcome.failure_count;
                }
                Err(err) => {
                    summary.push_failed += recipient.device_tokens.len();
                    logging::log_transport_failure(
                        LogSource::Push,
                        &format!("push to {}", recipient.user_id),
                        &err,
                    );
                }
            }
        }
    }

    fn dispatch_email(&self, record: &AlertRecord, summary: &mut DispatchSummary) {
        let addresses: Vec<String> = self
            .audience(Channel::Email, &record.device_id)
            .into_iter()
            .filter_map(|r| r.email)
            .collect();

        if addresses.is_empty() {
            summary.email_delivered = true;
            return;
        }
        summary.email_recipients = addresses.len();

        let subject = email::render_subject(record);
        let html = email::render_html(record);

        match self.email.send(&addresses, &subject, &html) {
            Ok(()) => summary.email_delivered = true,
            Err(err) => {
                logging::log_transport_failure(LogSource::Email, "email batch", &err);
            }
        }
    }
}

impl AlertSink for AlertDispatcher {
    fn dispatch(&self, record: &AlertRecord) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        self.dispatch_push(record, &mut summary);
        self.dispatch_email(record, &mut summary);

        // SMS and WhatsApp preferences are stored but those channels have
        // no transport yet; skip them silently.

        logging::log_dispatch_summary(
            LogSource::Push,
            summary.push_sent + summary.push_failed,
            summary.push_sent,
            summary.push_failed,
        );

        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
