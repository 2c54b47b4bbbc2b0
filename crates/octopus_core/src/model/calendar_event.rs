//! Calendar event entity.
//!
//! # Invariants
//! - `id` is generated client-side at creation and never reused.
//! - `end_date`, when set, is not earlier than `start_date`.
//! - Events are never updated in place; the only mutation is delete.

use crate::model::entity::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type EventId = Uuid;

/// Category shown on the shared calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Holiday,
    Commercial,
    Internal,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Holiday => "holiday",
            Self::Commercial => "commercial",
            Self::Internal => "internal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "holiday" => Some(Self::Holiday),
            "commercial" => Some(Self::Commercial),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

/// One row of the `events` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

/// Caller input for a new event; id and `created_at` are assigned on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub kind: EventType,
    pub author_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EmptyTitle,
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "event title cannot be empty"),
            Self::InvalidWindow { start, end } => write!(
                f,
                "end_date ({}) must be >= start_date ({})",
                end.to_rfc3339(),
                start.to_rfc3339()
            ),
        }
    }
}

impl Error for EventValidationError {}

impl CalendarEvent {
    /// Builds a fresh event from caller input, stamping a new id and `created_at`.
    ///
    /// Title and description are trimmed; a blank description becomes `None`.
    pub fn create(draft: NewCalendarEvent) -> Result<Self, EventValidationError> {
        let event = Self {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft
                .description
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            start_date: draft.start_date,
            end_date: draft.end_date,
            kind: draft.kind,
            created_at: Some(Utc::now()),
            author_id: draft.author_id,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(EventValidationError::InvalidWindow {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }
}

impl Entity for CalendarEvent {
    type Id = EventId;

    const COLLECTION: &'static str = "events";
    const CACHE_KEY: &'static str = "calendar_events";

    fn id(&self) -> &EventId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{CalendarEvent, EventType, EventValidationError, NewCalendarEvent};
    use chrono::{TimeZone, Utc};

    fn draft(title: &str) -> NewCalendarEvent {
        NewCalendarEvent {
            title: title.to_string(),
            description: Some("  ".to_string()),
            start_date: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
            end_date: None,
            kind: EventType::Holiday,
            author_id: None,
        }
    }

    #[test]
    fn create_assigns_identity_and_normalizes_text() {
        let event = CalendarEvent::create(draft("  Labour day ")).unwrap();
        assert!(!event.id.is_nil());
        assert_eq!(event.title, "Labour day");
        assert_eq!(event.description, None);
        assert!(event.created_at.is_some());
    }

    #[test]
    fn create_rejects_blank_title_and_reversed_window() {
        assert_eq!(
            CalendarEvent::create(draft("   ")).unwrap_err(),
            EventValidationError::EmptyTitle
        );

        let mut reversed = draft("promo");
        reversed.end_date = Some(Utc.with_ymd_and_hms(2026, 4, 30, 0, 0, 0).unwrap());
        assert!(matches!(
            CalendarEvent::create(reversed).unwrap_err(),
            EventValidationError::InvalidWindow { .. }
        ));
    }

    #[test]
    fn event_type_parse_is_case_insensitive() {
        assert_eq!(EventType::parse(" Commercial "), Some(EventType::Commercial));
        assert_eq!(EventType::parse("feriado"), None);
    }
}
