/// Email notification transport.
///
/// Renders an HTML alert message and hands it to an SMTP relay endpoint.
/// When relay credentials are missing the transport runs in dry-run mode:
/// the message is logged instead of sent, so a development deployment
/// exercises the full dispatch path without an outbound mail account.

use chrono::Utc;
use std::time::Duration;

use crate::logging::{self, LogSource};
use crate::model::{AlertRecord, Severity, TransportError};

pub trait EmailTransport: Send + Sync {
    /// Send one HTML message to a batch of addresses.
    fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// Banner color by severity, matching the legacy dashboard mails.
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "#ff0000",
        Severity::Warning => "#ff9900",
        Severity::Info => "#0099ff",
    }
}

/// Subject line: `[CRITICAL] CRITICAL ALERT: Inlet Monitor`.
pub fn render_subject(record: &AlertRecord) -> String {
    format!(
        "[{}] {}",
        record.severity.as_str().to_uppercase(),
        record.title()
    )
}

/// HTML body with a severity-colored banner and the violation summary.
pub fn render_html(record: &AlertRecord) -> String {
    let color = severity_color(record.severity);
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: {color}; color: white; padding: 10px 20px; border-radius: 5px 5px 0 0;">
    <h2 style="margin: 0;">{title}</h2>
  </div>
  <div style="border: 1px solid #ddd; border-top: none; padding: 20px; border-radius: 0 0 5px 5px;">
    <p>{body}</p>
    <p>Device ID: {device_id}</p>
    <p>Alert Level: <strong style="color: {color};">{level}</strong></p>
    <p>Time: {time}</p>
    <p style="margin-top: 30px; font-size: 12px; color: #666;">
      This is an automated message from your Wastewater Monitoring System.
      Please do not reply to this email.
    </p>
  </div>
</div>"#,
        color = color,
        title = record.title(),
        body = record.body(),
        device_id = record.device_id,
        level = record.severity.as_str().to_uppercase(),
        time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

// ---------------------------------------------------------------------------
// SMTP relay implementation
// ---------------------------------------------------------------------------

pub struct SmtpRelayTransport {
    endpoint: String,
    from: String,
    /// Relay API key; `None` switches the transport to dry-run mode.
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl SmtpRelayTransport {
    pub fn new(endpoint: &str, from: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(SmtpRelayTransport {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            from: from.to_string(),
            api_key,
            client,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.api_key.is_none()
    }
}

impl EmailTransport for SmtpRelayTransport {
    fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<(), TransportError> {
        let Some(api_key) = &self.api_key else {
            logging::info(
                LogSource::Email,
                None,
                &format!(
                    "Dry run (no relay credentials): would send \"{}\" to {} recipient(s)",
                    subject,
                    addresses.len()
                ),
            );
            return Ok(());
        };

        let payload = serde_json::json!({
            "from": self.from,
            "to": addresses,
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|e| TransportError::Send(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::HttpError(response.status().as_u16()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
