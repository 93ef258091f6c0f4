//! ISO year-week keys.
//!
//! `year_week_key = iso_year * 100 + iso_week`. Because the ISO week-numbering
//! year only advances together with week 1, the key is non-decreasing in
//! calendar time, which lets window membership be tested with plain integer
//! comparisons.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use dengue_model::TimeWindow;
use std::fmt;

/// An ISO week, identified by its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearWeek {
    monday: NaiveDate,
}

impl YearWeek {
    /// Week `week` of ISO year `year`, if it exists.
    pub fn new(year: i32, week: u32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(|monday| Self { monday })
    }

    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        Self {
            monday: date - Days::new(offset),
        }
    }

    /// Decode a `year_week_key`.
    pub fn from_key(key: i64) -> Option<Self> {
        let year = i32::try_from(key.div_euclid(100)).ok()?;
        let week = u32::try_from(key.rem_euclid(100)).ok()?;
        Self::new(year, week)
    }

    /// The first ISO week whose Monday is on or after `date`.
    pub fn first_on_or_after(date: NaiveDate) -> Self {
        let ahead = (7 - u64::from(date.weekday().num_days_from_monday())) % 7;
        Self {
            monday: date + Days::new(ahead),
        }
    }

    /// ISO week-numbering year.
    pub fn year(&self) -> i32 {
        self.monday.iso_week().year()
    }

    /// ISO week number, 1 to 53.
    pub fn week(&self) -> u32 {
        self.monday.iso_week().week()
    }

    /// Monday of the week.
    pub const fn monday(&self) -> NaiveDate {
        self.monday
    }

    /// Sortable integer key.
    pub fn key(&self) -> i64 {
        i64::from(self.year()) * 100 + i64::from(self.week())
    }
}

impl fmt::Display for YearWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year(), self.week())
    }
}

/// Key of the ISO week containing `date`.
pub fn year_week_key(date: NaiveDate) -> i64 {
    YearWeek::from_date(date).key()
}

/// A [`TimeWindow`] expressed as half-open key bounds `[start_key, end_key)`.
///
/// A week is inside the window when its Monday falls in `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowKeys {
    /// First key inside the window
    pub start_key: i64,
    /// First key after the window
    pub end_key: i64,
}

impl WindowKeys {
    /// Convert a date window to key bounds.
    pub fn from_window(window: &TimeWindow) -> Self {
        Self {
            start_key: YearWeek::first_on_or_after(window.start).key(),
            end_key: YearWeek::first_on_or_after(window.end).key(),
        }
    }

    /// Whether `key` lies in `[start_key, end_key)`.
    pub const fn contains(&self, key: i64) -> bool {
        self.start_key <= key && key < self.end_key
    }

    /// Whether the two key ranges share a week.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_key < other.end_key && other.start_key < self.end_key
    }

    /// Whether the range holds no week at all.
    pub const fn is_empty(&self) -> bool {
        self.start_key >= self.end_key
    }
}

impl From<&TimeWindow> for WindowKeys {
    fn from(window: &TimeWindow) -> Self {
        Self::from_window(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2023, 1, 2), 202301)]
    #[case(date(2023, 1, 1), 202252)]
    #[case(date(2020, 12, 31), 202053)]
    #[case(date(2021, 1, 3), 202053)]
    #[case(date(2021, 1, 4), 202101)]
    #[case(date(2019, 12, 30), 202001)]
    #[case(date(2023, 12, 31), 202352)]
    fn test_year_week_key(#[case] d: NaiveDate, #[case] expected: i64) {
        assert_eq!(year_week_key(d), expected);
    }

    #[test]
    fn test_key_is_monotonic_over_two_decades() {
        let mut d = date(2005, 1, 1);
        let end = date(2030, 1, 1);
        let mut previous = year_week_key(d);
        while d < end {
            d = d.succ_opt().unwrap();
            let key = year_week_key(d);
            assert!(key >= previous, "{d}: {key} < {previous}");
            previous = key;
        }
    }

    #[test]
    fn test_new_rejects_missing_weeks() {
        assert!(YearWeek::new(2020, 53).is_some());
        assert!(YearWeek::new(2021, 53).is_none());
        assert!(YearWeek::new(2021, 0).is_none());
        assert!(YearWeek::new(2021, 54).is_none());
    }

    #[test]
    fn test_from_key_round_trip() {
        let week = YearWeek::from_key(202301).unwrap();
        assert_eq!(week.monday(), date(2023, 1, 2));
        assert_eq!(week.key(), 202301);
        assert_eq!(week.to_string(), "2023-W01");
        assert!(YearWeek::from_key(202199).is_none());
    }

    #[test]
    fn test_first_on_or_after() {
        assert_eq!(YearWeek::first_on_or_after(date(2023, 1, 2)).key(), 202301);
        assert_eq!(YearWeek::first_on_or_after(date(2023, 1, 1)).key(), 202301);
        assert_eq!(YearWeek::first_on_or_after(date(2023, 12, 31)).key(), 202401);
        assert_eq!(YearWeek::first_on_or_after(date(2022, 12, 31)).key(), 202301);
    }

    #[test]
    fn test_window_keys() {
        let train = WindowKeys::from_window(&TimeWindow::new(date(2020, 1, 1), date(2022, 12, 31)));
        let test = WindowKeys::from_window(&TimeWindow::new(date(2023, 1, 1), date(2023, 12, 31)));
        assert_eq!(train, WindowKeys { start_key: 202002, end_key: 202301 });
        assert_eq!(test, WindowKeys { start_key: 202301, end_key: 202401 });
        assert!(test.contains(202301));
        assert!(test.contains(202352));
        assert!(!test.contains(202252));
        assert!(train.contains(202152));
        assert!(!train.overlaps(&test));
        assert!(!test.is_empty());
    }
}
