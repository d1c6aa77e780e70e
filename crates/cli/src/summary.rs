//! `survmerge summary` — per-day capture summary for customer reporting.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate};
use survmerge_dedup::Record;
use survmerge_io::read_combined;

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_LOAD};
use crate::CliError;

/// Minutes of rig shutdown assumed after the last captured point.
const SHUTDOWN_BUFFER_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub points: usize,
    pub first_point: DateTime<FixedOffset>,
    pub last_point: DateTime<FixedOffset>,
}

impl DaySummary {
    pub fn estimated_power_off(&self) -> DateTime<FixedOffset> {
        self.last_point + chrono::Duration::minutes(SHUTDOWN_BUFFER_MINUTES)
    }
}

/// Group records into per-day capture sessions in site-local time.
pub fn daily_sessions(records: &[Record], offset: FixedOffset) -> Vec<DaySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<DateTime<FixedOffset>>> = BTreeMap::new();
    for record in records {
        let local = record.timestamp.with_timezone(&offset);
        days.entry(local.date_naive()).or_default().push(local);
    }

    days.into_iter()
        .filter_map(|(date, times)| {
            let first_point = times.iter().min().copied()?;
            let last_point = times.iter().max().copied()?;
            Some(DaySummary {
                date,
                points: times.len(),
                first_point,
                last_point,
            })
        })
        .collect()
}

pub fn cmd_summary(input: PathBuf, utc_offset: i32) -> Result<(), CliError> {
    let summary_err = |code: u8, message: String| CliError {
        code,
        message,
        hint: None,
    };

    let offset = FixedOffset::east_opt(utc_offset * 3600).ok_or_else(|| {
        summary_err(
            EXIT_INVALID_CONFIG,
            format!("UTC offset must be within -23..=23 hours, got {utc_offset}"),
        )
    })?;

    let records = read_combined(&input).map_err(|e| summary_err(EXIT_LOAD, e.to_string()))?;
    let days = daily_sessions(&records, offset);

    println!("{}", render(&records, &days, utc_offset));
    Ok(())
}

fn clock(time: &DateTime<FixedOffset>) -> String {
    time.format("%I:%M %p")
        .to_string()
        .trim_start_matches('0')
        .to_string()
}

fn render(records: &[Record], days: &[DaySummary], utc_offset: i32) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "CUSTOMER MISSION SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(
        out,
        "\n{} survey points collected over {} day(s).\n",
        records.len(),
        days.len(),
    );

    for day in days {
        let duration = day.last_point - day.first_point;
        let hours = duration.num_seconds() / 3600;
        let minutes = (duration.num_seconds() % 3600) / 60;

        let _ = writeln!(out, "{}:", day.date.format("%B %d, %Y"));
        let _ = writeln!(out, "  {} survey points collected", day.points);
        let _ = writeln!(out, "  First point collected at {}", clock(&day.first_point));
        let _ = writeln!(out, "  Last point collected at {}", clock(&day.last_point));
        let _ = writeln!(
            out,
            "  Estimated power-off at {}",
            clock(&day.estimated_power_off())
        );
        let _ = writeln!(
            out,
            "  Active collection time: {hours} hours {minutes} minutes\n"
        );
    }

    let _ = writeln!(out, "* All times shown at UTC{utc_offset:+}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use survmerge_dedup::model::Position;

    fn record(day: u32, hour: u32, minute: u32) -> Record {
        Record {
            identifier: format!("g-{day}-{hour}{minute}"),
            label: "1".into(),
            position: Some(Position {
                longitude: -97.1,
                latitude: 30.4,
                altitude: 271.0,
            }),
            rover_position: None,
            timestamp: Utc.with_ymd_and_hms(2025, 9, day, hour, minute, 0).unwrap(),
            status: 1,
            origin: "combined.csv".into(),
        }
    }

    #[test]
    fn sessions_group_by_local_date() {
        // 02:00 UTC on Sep 26 is still Sep 25 at UTC-5.
        let records = vec![record(25, 14, 0), record(25, 21, 30), record(26, 2, 0)];
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let days = daily_sessions(&records, offset);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].points, 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 9, 25).unwrap());
    }

    #[test]
    fn first_and_last_point_bound_the_session() {
        let records = vec![record(25, 16, 45), record(25, 14, 2), record(25, 20, 10)];
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let days = daily_sessions(&records, offset);
        assert_eq!(clock(&days[0].first_point), "9:02 AM");
        assert_eq!(clock(&days[0].last_point), "3:10 PM");
        assert_eq!(clock(&days[0].estimated_power_off()), "3:40 PM");
    }

    #[test]
    fn render_reports_duration() {
        let records = vec![record(25, 14, 0), record(25, 16, 30)];
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let days = daily_sessions(&records, offset);
        let text = render(&records, &days, -5);
        assert!(text.contains("2 survey points collected"));
        assert!(text.contains("Active collection time: 2 hours 30 minutes"));
        assert!(text.contains("UTC-5"));
    }
}
