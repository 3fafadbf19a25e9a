//! Event Entity
//!
//! An event carries its own certificate settings: an admin-controlled
//! enablement flag and the path of an uploaded background template image.
//! Both must be set before any certificate can be produced for the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Workshop,
    Seminar,
    Hackathon,
    Competition,
    Other,
}

impl Default for EventCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl EventCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Workshop" => Some(Self::Workshop),
            "Seminar" => Some(Self::Seminar),
            "Hackathon" => Some(Self::Hackathon),
            "Competition" => Some(Self::Competition),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workshop => "Workshop",
            Self::Seminar => "Seminar",
            Self::Hackathon => "Hackathon",
            Self::Competition => "Competition",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Draft,
    Published,
}

impl Default for EventStatus {
    fn default() -> Self {
        Self::Published
    }
}

impl EventStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(Self::Draft),
            "Published" => Some(Self::Published),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Published => "Published",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub description: String,

    /// Scheduled date; the start time is kept separately as a display string
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    pub time: String,

    pub venue: String,

    /// Maximum number of registrations, at least 1
    pub capacity: u32,

    #[serde(default)]
    pub category: EventCategory,

    #[serde(default)]
    pub status: EventStatus,

    /// Admin gate: certificates can only be issued while this is true
    #[serde(default)]
    pub certificate_enabled: bool,

    /// Path of the uploaded certificate background image, if any
    #[serde(default)]
    pub certificate_template: Option<String>,

    #[serde(default)]
    pub banner: String,

    pub created_by: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
        time: impl Into<String>,
        venue: impl Into<String>,
        capacity: u32,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            date,
            time: time.into(),
            venue: venue.into(),
            capacity: capacity.max(1),
            category: EventCategory::default(),
            status: EventStatus::default(),
            certificate_enabled: false,
            certificate_template: None,
            banner: String::new(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Whether the event owner may be granted write access
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}
