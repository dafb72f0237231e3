use chrono::{Local, NaiveDateTime};

/// Supplies the current instant on demand; the only seam for determinism in
/// tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the process-local wall clock. Events store literal date/time fields,
/// so derivations compare against naive local time rather than a normalized
/// timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
