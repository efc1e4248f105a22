use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use crate::store::{SessionLog, User};

/// Total minutes for one calendar day. `date` is midnight UTC of the day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub total_time_spent: i64,
}

/// Append one session record at login time. The duration is always recorded
/// as zero; nothing in this service accumulates it afterwards.
pub fn record_login(user: &mut User, now: OffsetDateTime) {
    user.session_logs.push(SessionLog {
        date: now,
        duration: 0,
    });
}

/// Aggregate sessions over the 7 calendar days ending at `today`.
/// Buckets are collected newest-first (today, today-1, ... today-6) and then
/// reversed, so the output is strictly oldest-first.
pub fn daily_time_spent(logs: &[SessionLog], today: Date) -> Vec<DailyTotal> {
    let mut totals: Vec<DailyTotal> = (0..7)
        .map(|offset| {
            let day = today - Duration::days(offset);
            let total = logs
                .iter()
                .filter(|log| log.date.date() == day)
                .map(|log| log.duration)
                .sum();
            DailyTotal {
                date: day.midnight().assume_utc(),
                total_time_spent: total,
            }
        })
        .collect();
    totals.reverse();
    totals
}
