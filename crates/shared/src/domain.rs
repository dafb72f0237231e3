use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque document identifier. The store assigns the authoritative value;
/// `generate` mints the provisional client-side id used until then.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of event categories. Unrecognized or absent values decode to
/// `Personal` rather than failing the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    #[default]
    Personal,
    Study,
    Health,
    Birthday,
    Meeting,
    Travel,
    Other,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Personal,
        Self::Study,
        Self::Health,
        Self::Birthday,
        Self::Meeting,
        Self::Travel,
        Self::Other,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "study" => Self::Study,
            "health" => Self::Health,
            "birthday" => Self::Birthday,
            "meeting" => Self::Meeting,
            "travel" => Self::Travel,
            "other" => Self::Other,
            _ => Self::Personal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Study => "study",
            Self::Health => "health",
            Self::Birthday => "birthday",
            Self::Meeting => "meeting",
            Self::Travel => "travel",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Study => "Study",
            Self::Health => "Health",
            Self::Birthday => "Birthday",
            Self::Meeting => "Meeting",
            Self::Travel => "Travel",
            Self::Other => "Other",
        }
    }

    /// Styling token the presentation layer resolves to an accent color.
    pub fn color_token(self) -> &'static str {
        match self {
            Self::Personal => "category-personal",
            Self::Study => "category-study",
            Self::Health => "category-health",
            Self::Birthday => "category-birthday",
            Self::Meeting => "category-meeting",
            Self::Travel => "category-travel",
            Self::Other => "category-other",
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single planned occurrence as persisted by the store. `date` and `time`
/// are always jointly present; combining them yields the target instant every
/// temporal derivation runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm_time")]
    pub time: NaiveTime,
    #[serde(default)]
    pub category: Category,
}

impl Event {
    /// The combined date+time, naive local per the stored fields.
    pub fn target_instant(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Strict 24h `HH:MM` (de)serialization for time-of-day fields.
pub mod hhmm_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sample_event() -> Event {
        Event {
            id: EventId("evt-1".to_string()),
            title: "Launch party".to_string(),
            date: "2024-06-01".parse().expect("date"),
            time: NaiveTime::parse_from_str("18:30", "%H:%M").expect("time"),
            category: Category::Travel,
        }
    }

    #[test]
    fn unknown_category_falls_back_to_personal() {
        let category: Category = serde_json::from_str("\"gym\"").expect("decode");
        assert_eq!(category, Category::Personal);
    }

    #[test]
    fn missing_category_defaults_to_personal() {
        let event: Event = serde_json::from_str(
            r#"{"id":"evt-2","title":"Dentist","date":"2024-06-02","time":"09:15"}"#,
        )
        .expect("decode");
        assert_eq!(event.category, Category::Personal);
    }

    #[test]
    fn event_serializes_time_as_hhmm() {
        let value = serde_json::to_value(sample_event()).expect("encode");
        assert_eq!(value["time"], "18:30");
        assert_eq!(value["date"], "2024-06-01");
        assert_eq!(value["category"], "travel");
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = sample_event();
        let encoded = serde_json::to_string(&event).expect("encode");
        let decoded: Event = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, event);
    }

    #[test]
    fn seconds_in_time_field_are_rejected() {
        let result = serde_json::from_str::<Event>(
            r#"{"id":"evt-3","title":"x","date":"2024-06-02","time":"09:15:30"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn target_instant_combines_date_and_time() {
        let event = sample_event();
        assert_eq!(
            event.target_instant(),
            NaiveDateTime::parse_from_str("2024-06-01T18:30:00", "%Y-%m-%dT%H:%M:%S")
                .expect("timestamp")
        );
    }

    #[test]
    fn every_category_has_a_distinct_color_token() {
        let tokens: HashSet<_> = Category::ALL.iter().map(|c| c.color_token()).collect();
        assert_eq!(tokens.len(), Category::ALL.len());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(EventId::generate(), EventId::generate());
    }
}
