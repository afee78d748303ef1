use chrono::{DateTime, Local};

/// Source of the current time, injectable so message stamps are testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at one instant
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

#[cfg(test)]
impl FixedClock {
    /// Local wall-clock time, e.g. `FixedClock::at("2024-03-05 14:07:00")`
    pub fn at(local: &str) -> Self {
        use chrono::TimeZone;
        let naive = chrono::NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S")
            .expect("valid test timestamp");
        Self(
            Local
                .from_local_datetime(&naive)
                .earliest()
                .expect("unambiguous local time"),
        )
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
