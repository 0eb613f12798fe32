/// PostgreSQL-backed alert store and user directory.
///
/// Schema (see migrations 001-003):
///   alerts(id SERIAL, device_id TEXT, device_name TEXT, severity TEXT,
///          status TEXT, created_at TIMESTAMPTZ, snapshot TEXT, findings TEXT)
///   users(user_id TEXT PRIMARY KEY, email TEXT,
///         push_enabled BOOL, email_enabled BOOL,
///         sms_enabled BOOL, whatsapp_enabled BOOL,
///         device_tokens TEXT[])
///
/// Snapshot and findings are stored as JSON text so the audit trail keeps
/// the exact readings that triggered each alert.

use postgres::Client;
use std::sync::Mutex;

use crate::model::{AlertRecord, AlertStatus, StoreError};

use super::{AlertLifecycle, AlertStore, Channel, DirectoryStore, NotificationPreferences, Recipient};

fn db_error(e: postgres::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn json_error(e: serde_json::Error) -> StoreError {
    StoreError::Database(format!("serialization failed: {}", e))
}

// ---------------------------------------------------------------------------
// Alert store
// ---------------------------------------------------------------------------

pub struct PgAlertStore {
    client: Mutex<Client>,
}

impl PgAlertStore {
    pub fn new(client: Client) -> Self {
        PgAlertStore {
            client: Mutex::new(client),
        }
    }
}

impl AlertStore for PgAlertStore {
    fn append(&self, record: &AlertRecord) -> Result<String, StoreError> {
        let snapshot_json = serde_json::to_string(&record.snapshot).map_err(json_error)?;
        let findings_json = serde_json::to_string(&record.findings).map_err(json_error)?;

        let mut client = self.client.lock().unwrap();
        let row = client
            .query_one(
                "INSERT INTO alerts
                     (device_id, device_name, severity, status, created_at, snapshot, findings)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING id",
                &[
                    &record.device_id,
                    &record.device_name,
                    &record.severity.as_str(),
                    &record.status.as_str(),
                    &record.created_at,
                    &snapshot_json,
                    &findings_json,
                ],
            )
            .map_err(db_error)?;

        let id: i32 = row.get(0);
        Ok(id.to_string())
    }
}

impl AlertLifecycle for PgAlertStore {
    fn set_status(&self, alert_id: &str, status: AlertStatus) -> Result<(), StoreError> {
        let id: i32 = alert_id
            .parse()
            .map_err(|_| StoreError::NotFound(format!("alert {}", alert_id)))?;

        let mut client = self.client.lock().unwrap();
        let updated = client
            .execute(
                "UPDATE alerts SET status = $1 WHERE id = $2",
                &[&status.as_str(), &id],
            )
            .map_err(db_error)?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("alert {}", alert_id)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

pub struct PgDirectory {
    client: Mutex<Client>,
}

impl PgDirectory {
    pub fn new(client: Client) -> Self {
        PgDirectory {
            client: Mutex::new(client),
        }
    }
}

impl DirectoryStore for PgDirectory {
    fn recipients_with_channel(&self, channel: Channel) -> Result<Vec<Recipient>, StoreError> {
        // Channel names map 1:1 onto preference columns; the match keeps the
        // query free of string interpolation.
        let query = match channel {
            Channel::Push => {
                "SELECT user_id, email, push_enabled, email_enabled, sms_enabled,
                        whatsapp_enabled, device_tokens
                 FROM users WHERE push_enabled"
            }
            Channel::Email => {
                "SELECT user_id, email, push_enabled, email_enabled, sms_enabled,
                        whatsapp_enabled, device_tokens
                 FROM users WHERE email_enabled"
            }
            Channel::Sms => {
                "SELECT user_id, email, push_enabled, email_enabled, sms_enabled,
                        whatsapp_enabled, device_tokens
                 FROM users WHERE sms_enabled"
            }
            Channel::WhatsApp => {
                "SELECT user_id, email, push_enabled, email_enabled, sms_enabled,
                        whatsapp_enabled, device_tokens
                 FROM users WHERE whatsapp_enabled"
            }
        };

        let mut client = self.client.lock().unwrap();
        let rows = client.query(query, &[]).map_err(db_error)?;

        let mut recipients = Vec::with_capacity(rows.len());
        for row in rows {
            recipients.push(Recipient {
                user_id: row.get(0),
                email: row.get(1),
                preferences: NotificationPreferences {
                    push_enabled: row.get(2),
                    email_enabled: row.get(3),
                    sms_enabled: row.get(4),
                    whatsapp_enabled: row.get(5),
                },
                device_tokens: row.get::<_, Option<Vec<String>>>(6).unwrap_or_default(),
            });
        }

        Ok(recipients)
    }
}
