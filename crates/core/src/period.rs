use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Closed calendar interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days`-long range ending on (and including) `end`.
    pub fn ending_on(end: NaiveDate, days: u64) -> Self {
        let start = end
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// The `days`-long range ending the day before `date`.
    pub fn ending_before(date: NaiveDate, days: u64) -> Self {
        let end = date.pred_opt().unwrap_or(NaiveDate::MIN);
        Self::ending_on(end, days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, 0 for an inverted range.
    pub fn len_days(&self) -> u64 {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Every day in the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| d <= &self.end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
