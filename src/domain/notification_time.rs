use chrono::{NaiveTime, Timelike};
use std::fmt;

/// A user's preferred reminder time, minute granularity.
///
/// The settings UI stores `HH:MM:SS` but the scheduler only ever compares
/// hour and minute, so seconds are dropped on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTime(NaiveTime);

impl NotificationTime {
    pub fn parse(s: &str) -> Result<NotificationTime, String> {
        let parsed = NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| format!("{} is not a valid notification time (expected HH:MM).", s))?;
        let truncated = NaiveTime::from_hms_opt(parsed.hour(), parsed.minute(), 0)
            .ok_or_else(|| format!("{} is not a valid notification time.", s))?;
        Ok(Self(truncated))
    }

    /// True when the wall clock is inside this setting's minute.
    pub fn matches(&self, now: NaiveTime) -> bool {
        self.0.hour() == now.hour() && self.0.minute() == now.minute()
    }

    pub fn as_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for NotificationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
