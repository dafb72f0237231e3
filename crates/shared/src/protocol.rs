use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{hhmm_time, Category, Event, EventId},
    error::{StoreError, ValidationError},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Create intent as emitted by the presentation layer: raw field values plus
/// the selected category. Parsed and validated by [`EventDraft::normalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub category: Category,
}

impl EventDraft {
    /// Validates the draft and produces the event forwarded to the store,
    /// carrying `id` as its provisional identifier. The first violated rule
    /// wins: blank fields are reported before malformed ones.
    pub fn normalize(self, id: EventId) -> Result<Event, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let date_raw = self.date.trim();
        if date_raw.is_empty() {
            return Err(ValidationError::EmptyDate);
        }
        let time_raw = self.time.trim();
        if time_raw.is_empty() {
            return Err(ValidationError::EmptyTime);
        }

        let date = NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date_raw.to_string()))?;
        let time = NaiveTime::parse_from_str(time_raw, hhmm_time::FORMAT)
            .map_err(|_| ValidationError::InvalidTime(time_raw.to_string()))?;

        Ok(Event {
            id,
            title: title.to_string(),
            date,
            time,
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub id: EventId,
}

/// Frames pushed by the store on the watch channel. Every snapshot carries
/// the complete current collection, never a diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StoreEvent {
    Snapshot { events: Vec<Event> },
    Error(StoreError),
}
