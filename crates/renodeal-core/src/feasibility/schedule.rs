use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RenoDealError;
use crate::RenoDealResult;

/// One calendar quarter of the project, clipped to the project window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterPeriod {
    /// 1-based position in the schedule
    pub index: u32,
    /// e.g. "Q3 2025"
    pub label: String,
    pub year: i32,
    /// Calendar quarter, 1..=4
    pub quarter: u32,
    /// Days covered, both ends inclusive
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Last calendar day of the project: `purchase_date + duration_days - 1`.
///
/// The project occupies exactly `duration_days` calendar days starting on
/// the purchase date. Returns `None` for a zero-length project.
pub fn project_last_day(
    purchase_date: NaiveDate,
    duration_days: u32,
) -> RenoDealResult<Option<NaiveDate>> {
    if duration_days == 0 {
        return Ok(None);
    }
    purchase_date
        .checked_add_days(Days::new(u64::from(duration_days) - 1))
        .map(Some)
        .ok_or_else(|| {
            RenoDealError::DateError(format!(
                "{purchase_date} + {duration_days} days is out of range"
            ))
        })
}

/// Build the ordered calendar-quarter schedule covering the project.
///
/// Day counts sum to `duration_days`. A zero-length project yields a single
/// zero-day period on the purchase date so that the acquisition still has a
/// quarter to be financed in.
pub fn generate_quarters(
    purchase_date: NaiveDate,
    duration_days: u32,
) -> RenoDealResult<Vec<QuarterPeriod>> {
    let last_day = match project_last_day(purchase_date, duration_days)? {
        Some(day) => day,
        None => {
            let quarter = quarter_of(purchase_date);
            return Ok(vec![QuarterPeriod {
                index: 1,
                label: quarter_label(quarter, purchase_date.year()),
                year: purchase_date.year(),
                quarter,
                days: 0,
                start_date: purchase_date,
                end_date: purchase_date,
            }]);
        }
    };

    let mut periods = Vec::new();
    let mut year = purchase_date.year();

    'years: loop {
        for quarter in 1..=4u32 {
            let q_start = quarter_start(year, quarter)?;
            if q_start > last_day {
                break 'years;
            }
            let q_end = quarter_end(year, quarter)?;
            if q_end < purchase_date {
                continue;
            }

            let start = q_start.max(purchase_date);
            let end = q_end.min(last_day);
            let days = (end - start).num_days() + 1;

            periods.push(QuarterPeriod {
                index: periods.len() as u32 + 1,
                label: quarter_label(quarter, year),
                year,
                quarter,
                days: days as u32,
                start_date: start,
                end_date: end,
            });

            if end == last_day {
                break 'years;
            }
        }
        year += 1;
    }

    Ok(periods)
}

fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

fn quarter_label(quarter: u32, year: i32) -> String {
    format!("Q{quarter} {year}")
}

fn quarter_start(year: i32, quarter: u32) -> RenoDealResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
        .ok_or_else(|| RenoDealError::DateError(format!("no Q{quarter} in year {year}")))
}

fn quarter_end(year: i32, quarter: u32) -> RenoDealResult<NaiveDate> {
    let end = if quarter == 4 {
        NaiveDate::from_ymd_opt(year, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(year, quarter * 3 + 1, 1).and_then(|d| d.pred_opt())
    };
    end.ok_or_else(|| RenoDealError::DateError(format!("no Q{quarter} in year {year}")))
}
