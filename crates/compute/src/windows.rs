//! Calendar windows evaluated for a single report.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use estate_core::DateRange;

/// Days in the current and prior comparison windows.
pub const WEEK_DAYS: u64 = 7;

/// Days in the daily series feeding sparklines.
pub const DAILY_SERIES_DAYS: u64 = 14;

/// Every window the aggregator queries, derived from one reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindows {
    pub today: NaiveDate,
    /// Last 7 days ending today.
    pub current: DateRange,
    /// The 7 days immediately before `current`.
    pub prior: DateRange,
    /// `baseline_weeks * 7` days ending the day before `current` starts.
    pub baseline: DateRange,
    pub month_to_date: DateRange,
    /// `month_to_date` shifted back one year.
    pub same_month_last_year: DateRange,
    /// 14 days ending today, one bucket per day.
    pub daily: DateRange,
}

impl ReportWindows {
    /// Plan all windows for `today`. A zero `baseline_weeks` is treated as 1.
    pub fn plan(today: NaiveDate, baseline_weeks: u32) -> Self {
        let weeks = u64::from(baseline_weeks.max(1));
        let current = DateRange::ending_on(today, WEEK_DAYS);
        let prior = DateRange::ending_before(current.start, WEEK_DAYS);
        let baseline = DateRange::ending_before(current.start, weeks * WEEK_DAYS);

        let month_start = today.with_day(1).unwrap_or(today);
        let month_to_date = DateRange::new(month_start, today);
        let same_month_last_year = DateRange::new(
            shift_year_back(month_start),
            shift_year_back(today),
        );

        Self {
            today,
            current,
            prior,
            baseline,
            month_to_date,
            same_month_last_year,
            daily: DateRange::ending_on(today, DAILY_SERIES_DAYS),
        }
    }

    /// Dispatches dated strictly before this day count as overdue for confirmation.
    pub fn unconfirmed_cutoff(&self, unconfirmed_days: u32) -> NaiveDate {
        self.today
            .checked_sub_days(Days::new(u64::from(unconfirmed_days)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Same calendar day one year earlier; Feb 29 maps to Feb 28.
fn shift_year_back(date: NaiveDate) -> NaiveDate {
    let year = date.year() - 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn current_prior_baseline_are_contiguous() {
        let w = ReportWindows::plan(d(2024, 6, 20), 8);
        assert_eq!(w.current, DateRange::new(d(2024, 6, 14), d(2024, 6, 20)));
        assert_eq!(w.prior, DateRange::new(d(2024, 6, 7), d(2024, 6, 13)));
        assert_eq!(w.baseline.end, d(2024, 6, 13));
        assert_eq!(w.baseline.len_days(), 56);
        assert_eq!(w.daily.len_days(), 14);
        assert_eq!(w.daily.end, w.today);
    }

    #[test]
    fn month_windows() {
        let w = ReportWindows::plan(d(2024, 6, 20), 8);
        assert_eq!(w.month_to_date, DateRange::new(d(2024, 6, 1), d(2024, 6, 20)));
        assert_eq!(
            w.same_month_last_year,
            DateRange::new(d(2023, 6, 1), d(2023, 6, 20))
        );
    }

    #[test]
    fn leap_day_maps_to_feb_28() {
        let w = ReportWindows::plan(d(2024, 2, 29), 8);
        assert_eq!(w.same_month_last_year.end, d(2023, 2, 28));
    }

    #[test]
    fn zero_baseline_weeks_clamps_to_one() {
        let w = ReportWindows::plan(d(2024, 6, 20), 0);
        assert_eq!(w.baseline.len_days(), 7);
    }

    #[test]
    fn unconfirmed_cutoff_counts_back_from_today() {
        let w = ReportWindows::plan(d(2024, 6, 20), 8);
        assert_eq!(w.unconfirmed_cutoff(7), d(2024, 6, 13));
    }
}
