//! Registration Entity
//!
//! A user's enrollment record for one event. The three certificate fields
//! form the issuance ledger: `certificate_generated` implies
//! `certificate_path` points at an existing artifact, and
//! `certificate_issued_at` is written exactly once per issuance.
//! At most one registration exists per (user, event) pair, enforced by a
//! unique compound index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Attended,
    Cancelled,
}

impl Default for RegistrationStatus {
    fn default() -> Self {
        Self::Registered
    }
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Attended => "attended",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(rename = "_id")]
    pub id: String,

    pub user: String,

    pub event: String,

    #[serde(default)]
    pub status: RegistrationStatus,

    #[serde(default)]
    pub certificate_generated: bool,

    #[serde(default)]
    pub certificate_path: Option<String>,

    #[serde(
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub certificate_issued_at: Option<DateTime<Utc>>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(user_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user: user_id.into(),
            event: event_id.into(),
            status: RegistrationStatus::Registered,
            certificate_generated: false,
            certificate_path: None,
            certificate_issued_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_attended(&self) -> bool {
        self.status == RegistrationStatus::Attended
    }

    /// Issuance ledger state as a unit; all three fields move together
    pub fn certificate_issued(&self) -> bool {
        self.certificate_generated && self.certificate_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registration_is_unissued() {
        let reg = Registration::new("user-1", "event-1");
        assert_eq!(reg.status, RegistrationStatus::Registered);
        assert!(!reg.certificate_generated);
        assert!(reg.certificate_path.is_none());
        assert!(reg.certificate_issued_at.is_none());
        assert!(!reg.certificate_issued());
    }
}
