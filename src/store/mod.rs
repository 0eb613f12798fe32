//! Persistence boundaries: the alert store and the user directory.
//!
//! The monitor and dispatcher talk to storage only through the traits here.
//! `postgres` holds the production-backed implementations; the in-memory
//! implementations in this module exist for tests and dev mode.

pub mod postgres;

use std::sync::Mutex;

use crate::model::{AlertRecord, AlertStatus, StoreError};

// ---------------------------------------------------------------------------
// Notification channels and recipients
// ---------------------------------------------------------------------------

/// Notification channels a user can opt into.
///
/// Only push and email have a dispatch path; SMS and WhatsApp preferences
/// are stored for forward compatibility and currently never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Push,
    Email,
    Sms,
    WhatsApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Push => "push",
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::WhatsApp => "whatsapp",
        }
    }
}

/// Per-user notification preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
}

impl NotificationPreferences {
    pub fn has_channel(&self, channel: Channel) -> bool {
        match channel {
            Channel::Push => self.push_enabled,
            Channel::Email => self.email_enabled,
            Channel::Sms => self.sms_enabled,
            Channel::WhatsApp => self.whatsapp_enabled,
        }
    }
}

/// A user account as the dispatcher sees it: identity, addresses, tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipient {
    pub user_id: String,
    pub email: Option<String>,
    pub device_tokens: Vec<String>,
    pub preferences: NotificationPreferences,
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Append-only alert persistence.
///
/// The monitor only ever appends. Acknowledgement transitions come from
/// operator actions elsewhere and go through `set_status`.
pub trait AlertStore: Send + Sync {
    /// Persists an alert, returning its id.
    fn append(&self, record: &AlertRecord) -> Result<String, StoreError>;
}

/// Operator-side alert lifecycle, separate from the monitor's append path.
pub trait AlertLifecycle {
    fn set_status(&self, alert_id: &str, status: AlertStatus) -> Result<(), StoreError>;
}

/// User directory: who gets notified, and how.
pub trait DirectoryStore: Send + Sync {
    /// All users whose stored preference enables the given channel.
    fn recipients_with_channel(&self, channel: Channel) -> Result<Vec<Recipient>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory alert store for tests and dev mode.
#[derive(Default)]
pub struct MemoryAlertStore {
    records: Mutex<Vec<(String, AlertRecord)>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        MemoryAlertStore::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored records, in append order.
    pub fn records(&self) -> Vec<AlertRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl AlertStore for MemoryAlertStore {
    fn append(&self, record: &AlertRecord) -> Result<String, StoreError> {
        let mut records = self.records.lock().unwrap();
        let id = format!("alert-{}", records.len() + 1);
        records.push((id.clone(), record.clone()));
        Ok(id)
    }
}

impl AlertLifecycle for MemoryAlertStore {
    fn set_status(&self, alert_id: &str, status: AlertStatus) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|(id, _)| id == alert_id) {
            Some((_, record)) => {
                record.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("alert {}", alert_id))),
        }
    }
}

/// In-memory user directory for tests and dev mode.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<Vec<Recipient>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        MemoryDirectory::default()
    }

    pub fn add_user(&self, recipient: Recipient) {
        self.users.lock().unwrap().push(recipient);
    }
}

impl DirectoryStore for MemoryDirectory {
    fn recipients_with_channel(&self, channel: Channel) -> Result<Vec<Recipient>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.preferences.has_channel(channel))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
