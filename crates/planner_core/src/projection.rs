use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::domain::Event;

use crate::countdown::{self, CountdownState, EventStatus};

/// Temporal filter selected by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Upcoming,
    Past,
}

impl FilterMode {
    fn admits(self, status: EventStatus) -> bool {
        match self {
            Self::All => true,
            Self::Upcoming => status == EventStatus::Upcoming,
            Self::Past => status == EventStatus::Active,
        }
    }
}

/// Presentation-ready pairing of an event with its derived temporal state.
/// Rebuilt on every projection cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventViewModel {
    pub event: Event,
    pub state: CountdownState,
    pub happening_today: bool,
}

/// The full payload handed to the presentation layer: the filtered, ordered
/// entries plus the filter they were produced under and the loading flag that
/// stays set until the first snapshot arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    pub entries: Vec<EventViewModel>,
    pub filter: FilterMode,
    pub loading: bool,
}

/// Pure function of the cache contents, the filter, and the current instant.
/// Output is ordered by target instant ascending; equal instants fall back to
/// id order so rendering stays deterministic.
pub fn project(events: &[Event], filter: FilterMode, now: NaiveDateTime) -> Vec<EventViewModel> {
    let mut entries: Vec<EventViewModel> = events
        .iter()
        .filter_map(|event| {
            let state = countdown::derive(event.target_instant(), now);
            filter.admits(state.status()).then(|| EventViewModel {
                event: event.clone(),
                state,
                happening_today: event.date == now.date(),
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.event
            .target_instant()
            .cmp(&b.event.target_instant())
            .then_with(|| a.event.id.cmp(&b.event.id))
    });
    entries
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use shared::domain::{Category, EventId};

    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("timestamp")
    }

    fn event(id: &str, date: &str, time: &str) -> Event {
        Event {
            id: EventId(id.to_string()),
            title: format!("event {id}"),
            date: date.parse().expect("date"),
            time: NaiveTime::parse_from_str(time, "%H:%M").expect("time"),
            category: Category::Personal,
        }
    }

    fn ids(entries: &[EventViewModel]) -> Vec<&str> {
        entries.iter().map(|vm| vm.event.id.0.as_str()).collect()
    }

    #[test]
    fn upcoming_and_past_partition_all() {
        let events = [
            event("a", "2024-06-10", "08:00"),
            event("b", "2024-06-15", "11:59"),
            event("c", "2024-06-15", "12:00"),
            event("d", "2024-06-20", "23:30"),
        ];
        let now = at("2024-06-15T12:00:00");

        let all = project(&events, FilterMode::All, now);
        let upcoming = project(&events, FilterMode::Upcoming, now);
        let past = project(&events, FilterMode::Past, now);

        assert_eq!(all.len(), events.len());
        assert_eq!(upcoming.len() + past.len(), all.len());

        let mut merged: Vec<_> = ids(&upcoming);
        merged.extend(ids(&past));
        merged.sort_unstable();
        let mut expected = ids(&all);
        expected.sort_unstable();
        assert_eq!(merged, expected);

        for vm in &upcoming {
            assert!(
                past.iter().all(|p| p.event.id != vm.event.id),
                "{} appears in both partitions",
                vm.event.id
            );
        }
    }

    #[test]
    fn output_is_ordered_by_target_then_id() {
        let events = [
            event("c", "2024-06-10", "09:00"),
            event("a", "2024-06-10", "09:00"),
            event("b", "2024-06-09", "23:00"),
            event("d", "2024-06-11", "00:00"),
        ];
        let projected = project(&events, FilterMode::All, at("2024-06-01T00:00:00"));
        assert_eq!(ids(&projected), vec!["b", "a", "c", "d"]);

        for pair in projected.windows(2) {
            assert!(pair[0].event.target_instant() <= pair[1].event.target_instant());
        }
    }

    #[test]
    fn past_filter_selects_only_reached_events() {
        let events = [
            event("later", "2024-07-01", "10:00"),
            event("second", "2024-06-14", "18:00"),
            event("first", "2024-06-10", "09:00"),
        ];
        let projected = project(&events, FilterMode::Past, at("2024-06-15T12:00:00"));
        assert_eq!(ids(&projected), vec!["first", "second"]);
        assert!(projected
            .iter()
            .all(|vm| vm.state == CountdownState::Active));
    }

    #[test]
    fn upcoming_entries_carry_countdowns() {
        let events = [event("a", "2024-06-16", "12:00")];
        let projected = project(&events, FilterMode::Upcoming, at("2024-06-15T12:00:00"));
        assert_eq!(projected.len(), 1);
        let countdown = projected[0].state.countdown().expect("countdown");
        assert_eq!(countdown.days, 1);
        assert_eq!(
            (countdown.hours, countdown.minutes, countdown.seconds),
            (0, 0, 0)
        );
    }

    #[test]
    fn happening_today_marks_only_todays_dates() {
        let events = [
            event("tonight", "2024-06-15", "23:00"),
            event("tomorrow", "2024-06-16", "08:00"),
            event("this-morning", "2024-06-15", "07:00"),
        ];
        let projected = project(&events, FilterMode::All, at("2024-06-15T12:00:00"));

        for vm in &projected {
            let expected = vm.event.id.0 != "tomorrow";
            assert_eq!(vm.happening_today, expected, "{}", vm.event.id);
        }
    }
}
