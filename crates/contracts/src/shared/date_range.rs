use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range.
///
/// Wire format: `{"startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD"}`.
/// Construction validates `start_date <= end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date < start_date {
            bail!(
                "invalid date range: start {} is after end {}",
                start_date,
                end_date
            );
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Parse from the wire format, rejecting malformed dates and inverted ranges.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid start date '{}': {}", start, e))?;
        let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid end date '{}': {}", end, e))?;
        Self::new(start_date, end_date)
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// All dates of the range in calendar order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(self.num_days() as usize);
        let mut current = self.start_date;
        while current <= self.end_date {
            days.push(current);
            current += Duration::days(1);
        }
        days
    }
}

/// ISO-8601 week key (Monday start, week 1 contains the year's first
/// Thursday), e.g. "2026-W05".
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{:04}-W{:02}", iso.year(), iso.week())
}

/// Month key, e.g. "2026-08".
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_range() {
        let range = DateRange::parse("2026-01-01", "2026-01-31").unwrap();
        assert_eq!(range.num_days(), 31);
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        assert!(DateRange::parse("2026-02-01", "2026-01-01").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_dates() {
        assert!(DateRange::parse("2026-13-01", "2026-12-31").is_err());
        assert!(DateRange::parse("not-a-date", "2026-12-31").is_err());
    }

    #[test]
    fn test_days_enumeration() {
        let range = DateRange::parse("2026-02-27", "2026-03-02").unwrap();
        let days: Vec<String> = range.days().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            days,
            vec!["2026-02-27", "2026-02-28", "2026-03-01", "2026-03-02"]
        );
    }

    #[test]
    fn test_week_key_iso_boundaries() {
        // 2021-01-01 is a Friday and belongs to ISO week 53 of 2020
        let d = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(week_key(d), "2020-W53");

        // 2024-12-30 is a Monday and starts ISO week 1 of 2025
        let d = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_key(d), "2025-W01");
    }

    #[test]
    fn test_month_key() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(month_key(d), "2026-08");
    }
}
