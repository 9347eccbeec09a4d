use crate::domain::cost_allocation::proration::days_in_month;
use crate::projections::p900_daily_metrics::builder::{add_additive, finalize_totals};
use crate::shared::data::MetricStore;
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use contracts::projections::p900_daily_metrics::dto::{DailyMetric, MetricTotals};
use contracts::projections::p901_period_metrics::dto::{PeriodMetric, PeriodType};
use contracts::shared::date_range::{month_key, week_key, DateRange};
use std::collections::BTreeMap;

/// Roll daily records into one period record: sum the additive fields,
/// recompute every derived ratio from the sums. Daily ratios are never
/// averaged.
pub fn rollup(
    organization_id: &str,
    period_type: PeriodType,
    period_key: &str,
    dailies: &[DailyMetric],
) -> PeriodMetric {
    let mut totals = MetricTotals::default();
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(dailies.len());
    for daily in dailies {
        add_additive(&mut totals, &daily.totals);
        dates.push(daily.date);
    }
    dates.sort();
    dates.dedup();
    finalize_totals(&mut totals);

    PeriodMetric {
        organization_id: organization_id.to_string(),
        period_type,
        period_key: period_key.to_string(),
        days_included: dates.len() as i64,
        dates,
        totals,
    }
}

/// Calendar span of the ISO week (Monday start) containing `date`.
pub fn week_span(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = date.week(Weekday::Mon);
    (week.first_day(), week.last_day())
}

/// Calendar span of the month containing `date`.
pub fn month_span(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).expect("day 1 is always valid");
    (first, first + Duration::days(days_in_month(date) - 1))
}

/// Refresh every week and month rollup the given dates belong to.
///
/// Idempotent by construction: each period is rebuilt from the day-level
/// source of truth in the store and upserted whole, never incremented.
pub async fn refresh_for_dates(
    store: &dyn MetricStore,
    organization_id: &str,
    dates: &[NaiveDate],
) -> Result<()> {
    let mut weeks: BTreeMap<String, (NaiveDate, NaiveDate)> = BTreeMap::new();
    let mut months: BTreeMap<String, (NaiveDate, NaiveDate)> = BTreeMap::new();
    for date in dates {
        weeks.entry(week_key(*date)).or_insert_with(|| week_span(*date));
        months
            .entry(month_key(*date))
            .or_insert_with(|| month_span(*date));
    }

    for (key, (start, end)) in weeks {
        refresh_period(store, organization_id, PeriodType::Week, &key, start, end).await?;
    }
    for (key, (start, end)) in months {
        refresh_period(store, organization_id, PeriodType::Month, &key, start, end).await?;
    }
    Ok(())
}

async fn refresh_period(
    store: &dyn MetricStore,
    organization_id: &str,
    period_type: PeriodType,
    period_key: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let range = DateRange::new(start, end)?;
    let dailies = store.get_daily_range(organization_id, &range).await?;
    if dailies.is_empty() {
        tracing::debug!(
            "No daily metrics for {:?} {}, skipping rollup",
            period_type,
            period_key
        );
        return Ok(());
    }

    let metric = rollup(organization_id, period_type, period_key, &dailies);
    store.upsert_period(&metric).await?;
    tracing::debug!(
        "Rolled up {} daily records into {:?} {}",
        metric.days_included,
        period_type,
        period_key
    );
    Ok(())
}
