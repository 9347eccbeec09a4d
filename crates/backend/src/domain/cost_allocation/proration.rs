use contracts::domain::a007_cost_rule::aggregate::CostFrequency;
use contracts::shared::date_range::DateRange;
use chrono::{Datelike, Duration, NaiveDate};

/// Exact day count of the date's calendar month.
pub fn days_in_month(date: NaiveDate) -> i64 {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first of month is always valid");
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
    .expect("first of next month is always valid");
    (next - first).num_days()
}

/// Exact day count of the date's calendar quarter.
pub fn days_in_quarter(date: NaiveDate) -> i64 {
    let quarter_start_month = (date.month0() / 3) * 3 + 1;
    let first = NaiveDate::from_ymd_opt(date.year(), quarter_start_month, 1)
        .expect("quarter start is always valid");
    let next = if quarter_start_month == 10 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), quarter_start_month + 3, 1)
    }
    .expect("next quarter start is always valid");
    (next - first).num_days()
}

/// Exact day count of the date's calendar year, computed from the actual
/// year boundaries (leap aware, never a fixed 365).
pub fn days_in_year(date: NaiveDate) -> i64 {
    let first = NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("january 1 is always valid");
    let next =
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).expect("january 1 is always valid");
    (next - first).num_days()
}

/// Per-day share of a fixed cost with the given cadence, as charged to
/// `date`. One-time costs land only on the earliest date with any activity
/// in the processed range; per-order/per-item cadences are order-driven and
/// contribute nothing per calendar day.
pub fn daily_share(
    frequency: CostFrequency,
    value: f64,
    date: NaiveDate,
    is_first_activity_date: bool,
) -> f64 {
    match frequency {
        CostFrequency::Daily => value,
        CostFrequency::Weekly => value / 7.0,
        CostFrequency::Monthly => value / days_in_month(date) as f64,
        CostFrequency::Quarterly => value / days_in_quarter(date) as f64,
        CostFrequency::Yearly => value / days_in_year(date) as f64,
        CostFrequency::OneTime => {
            if is_first_activity_date {
                value
            } else {
                0.0
            }
        }
        CostFrequency::PerOrder | CostFrequency::PerItem => 0.0,
    }
}

/// Time-bound allocation for range-level cost reporting: the cost's total
/// value pro-rated linearly over the overlap, in milliseconds, between its
/// effective window and the requested range. Zero without overlap, and zero
/// for open-ended or malformed windows (no finite total to prorate).
pub fn time_bound_share(
    value: f64,
    effective_from: Option<i64>,
    effective_to: Option<i64>,
    range: &DateRange,
) -> f64 {
    let (Some(from), Some(to)) = (effective_from, effective_to) else {
        return 0.0;
    };
    if to <= from {
        return 0.0;
    }

    let range_start = range
        .start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis();
    let range_end = (range.end_date + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis();

    let overlap_ms = (to.min(range_end) - from.max(range_start)).max(0);
    value * overlap_ms as f64 / (to - from) as f64
}
