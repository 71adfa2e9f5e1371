// Query time windows and their inclusivity policy

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Which sample boundaries must fall inside the window for a sample to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusivity {
    /// Sample start must be at or after window start.
    #[default]
    StrictStart,
    /// Sample end must be at or before window end.
    StrictEnd,
    /// Sample must lie entirely inside the window.
    StrictBoth,
    /// Any overlap with the window matches.
    Overlapping,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("window start {start} is after end {end}")]
    StartAfterEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("window of {days} days before {end} is out of range")]
    OutOfRange { days: u32, end: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    inclusivity: Inclusivity,
}

impl TimeWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        inclusivity: Inclusivity,
    ) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::StartAfterEnd { start, end });
        }
        Ok(Self {
            start,
            end,
            inclusivity,
        })
    }

    /// `[end - days, end]`.
    pub fn trailing(
        end: DateTime<Utc>,
        days: u32,
        inclusivity: Inclusivity,
    ) -> Result<Self, WindowError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(WindowError::OutOfRange { days, end })?;
        Ok(Self {
            start,
            end,
            inclusivity,
        })
    }

    /// From local midnight of `now`'s day up to `now`.
    pub fn since_start_of_day<Tz: TimeZone>(now: DateTime<Tz>, inclusivity: Inclusivity) -> Self {
        let end = now.with_timezone(&Utc);
        let start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(now.timezone()).earliest())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(end);
        Self {
            start,
            end,
            inclusivity,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn inclusivity(&self) -> Inclusivity {
        self.inclusivity
    }

    pub fn with_inclusivity(mut self, inclusivity: Inclusivity) -> Self {
        self.inclusivity = inclusivity;
        self
    }

    /// Whether a sample spanning `[sample_start, sample_end]` falls in this window.
    pub fn matches(&self, sample_start: DateTime<Utc>, sample_end: DateTime<Utc>) -> bool {
        match self.inclusivity {
            Inclusivity::StrictStart => sample_start >= self.start && sample_start < self.end,
            Inclusivity::StrictEnd => sample_end <= self.end && sample_end > self.start,
            Inclusivity::StrictBoth => sample_start >= self.start && sample_end <= self.end,
            Inclusivity::Overlapping => sample_end >= self.start && sample_start <= self.end,
        }
    }
}
