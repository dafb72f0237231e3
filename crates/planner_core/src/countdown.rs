use chrono::NaiveDateTime;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Filter axis of an event's temporal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Upcoming,
    Active,
}

/// Whole-unit decomposition of the time remaining until a target instant.
/// Days are unbounded; the smaller units stay within their modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    pub fn total_seconds(&self) -> i64 {
        self.days * SECONDS_PER_DAY
            + i64::from(self.hours) * SECONDS_PER_HOUR
            + i64::from(self.minutes) * SECONDS_PER_MINUTE
            + i64::from(self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Active,
    Upcoming(Countdown),
}

impl CountdownState {
    pub fn status(&self) -> EventStatus {
        match self {
            Self::Active => EventStatus::Active,
            Self::Upcoming(_) => EventStatus::Upcoming,
        }
    }

    pub fn countdown(&self) -> Option<Countdown> {
        match self {
            Self::Active => None,
            Self::Upcoming(countdown) => Some(*countdown),
        }
    }
}

/// Derives the temporal state of `target` as seen from `now`. The boundary is
/// inclusive on the active side: a target equal to `now` is already active,
/// and with a forward-moving clock the transition is one-way.
pub fn derive(target: NaiveDateTime, now: NaiveDateTime) -> CountdownState {
    if now >= target {
        return CountdownState::Active;
    }
    let total = (target - now).num_seconds();
    CountdownState::Upcoming(Countdown {
        days: total / SECONDS_PER_DAY,
        hours: ((total % SECONDS_PER_DAY) / SECONDS_PER_HOUR) as u32,
        minutes: ((total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u32,
        seconds: (total % SECONDS_PER_MINUTE) as u32,
    })
}
