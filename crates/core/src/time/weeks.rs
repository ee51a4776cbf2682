use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Forecast weeks start on Monday. Dates whose Monday falls before the
/// calendar's first day are returned unchanged.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let back = i64::from(date.weekday().num_days_from_monday());
    date.checked_sub_signed(Duration::days(back)).unwrap_or(date)
}

/// Start date for a forecast that came without one.
///
/// An explicit `YYYY-MM-DD` argument wins (snapped back to its Monday);
/// otherwise the Monday of the current UTC week.
pub fn resolve_start_date(arg: Option<&str>, now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    if let Some(s) = arg {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid start date {s:?}, expected YYYY-MM-DD"))?;
        return Ok(week_start_of(date));
    }

    Ok(week_start_of(now_utc.date_naive()))
}
