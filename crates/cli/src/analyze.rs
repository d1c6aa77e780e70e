//! `survmerge analyze` — duplicate diagnostics across session folders.
//!
//! Runs every identity strategy side by side so an operator can see which
//! field the device actually kept unique before choosing a merge strategy.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use survmerge_dedup::grouper::group_by_key;
use survmerge_dedup::{proximity_report, DedupStrategy, MergeError, ProximityReport, Record};
use survmerge_io::{discover_session_files, load_file};

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_LOAD, EXIT_RUNTIME};
use crate::CliError;

#[derive(Debug, Serialize)]
pub struct AnalyzeReport {
    pub files: Vec<FileStat>,
    pub total_records: usize,
    /// Duplicate row count per strategy (rows beyond each group's first).
    pub strategy_duplicates: BTreeMap<String, usize>,
    /// Exact coordinate duplicate groups, most-repeated first.
    pub coordinate_groups: Vec<CoordinateGroup>,
    pub coverage: Option<Coverage>,
    pub status_counts: BTreeMap<u8, usize>,
    pub proximity: ProximityReport,
}

#[derive(Debug, Serialize)]
pub struct FileStat {
    pub name: String,
    pub points: usize,
    /// Coordinate duplicates entirely inside this one file.
    pub internal_duplicates: usize,
}

#[derive(Debug, Serialize)]
pub struct CoordinateGroup {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub occurrences: usize,
    pub identifiers: Vec<String>,
    pub labels: Vec<String>,
    pub origins: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Coverage {
    pub longitude: (f64, f64),
    pub latitude: (f64, f64),
    pub altitude: (f64, f64),
}

/// Build the full diagnostic report over one in-memory record set.
pub fn build_report(records: &[Record], epsilon: f64) -> Result<AnalyzeReport, MergeError> {
    let mut strategy_duplicates = BTreeMap::new();
    for strategy in DedupStrategy::KEY_BASED {
        let grouping = group_by_key(records, strategy)?;
        let duplicates: usize = grouping
            .groups
            .iter()
            .map(|g| g.members.len() - 1)
            .sum();
        strategy_duplicates.insert(strategy.to_string(), duplicates);
    }

    let coordinate_grouping = group_by_key(records, DedupStrategy::ByCoordinate)?;
    let mut coordinate_groups: Vec<CoordinateGroup> = coordinate_grouping
        .groups
        .iter()
        .filter_map(|group| {
            let first = &records[group.members[0]];
            let position = first.position?;
            Some(CoordinateGroup {
                longitude: position.longitude,
                latitude: position.latitude,
                altitude: position.altitude,
                occurrences: group.members.len(),
                identifiers: dedup_preserving_order(
                    group.members.iter().map(|&i| records[i].identifier.clone()),
                ),
                labels: dedup_preserving_order(
                    group.members.iter().map(|&i| records[i].label.clone()),
                ),
                origins: dedup_preserving_order(
                    group.members.iter().map(|&i| records[i].origin.clone()),
                ),
            })
        })
        .collect();
    coordinate_groups.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

    let mut status_counts: BTreeMap<u8, usize> = BTreeMap::new();
    for record in records {
        *status_counts.entry(record.status).or_insert(0) += 1;
    }

    Ok(AnalyzeReport {
        files: file_stats(records)?,
        total_records: records.len(),
        strategy_duplicates,
        coordinate_groups,
        coverage: coverage(records),
        status_counts,
        proximity: proximity_report(records, epsilon)?,
    })
}

fn file_stats(records: &[Record]) -> Result<Vec<FileStat>, MergeError> {
    let mut stats: Vec<FileStat> = Vec::new();
    for origin in dedup_preserving_order(records.iter().map(|r| r.origin.clone())) {
        let file_records: Vec<Record> = records
            .iter()
            .filter(|r| r.origin == origin)
            .cloned()
            .collect();
        let grouping = group_by_key(&file_records, DedupStrategy::ByCoordinate)?;
        let internal_duplicates = grouping
            .groups
            .iter()
            .map(|g| g.members.len() - 1)
            .sum();
        stats.push(FileStat {
            name: origin,
            points: file_records.len(),
            internal_duplicates,
        });
    }
    Ok(stats)
}

fn coverage(records: &[Record]) -> Option<Coverage> {
    let mut positions = records.iter().filter_map(|r| r.position);
    let first = positions.next()?;
    let mut cov = Coverage {
        longitude: (first.longitude, first.longitude),
        latitude: (first.latitude, first.latitude),
        altitude: (first.altitude, first.altitude),
    };
    for p in positions {
        cov.longitude = (cov.longitude.0.min(p.longitude), cov.longitude.1.max(p.longitude));
        cov.latitude = (cov.latitude.0.min(p.latitude), cov.latitude.1.max(p.latitude));
        cov.altitude = (cov.altitude.0.min(p.altitude), cov.altitude.1.max(p.altitude));
    }
    Some(cov)
}

fn dedup_preserving_order<I: Iterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

pub fn cmd_analyze(
    dirs: Vec<PathBuf>,
    epsilon: f64,
    exclude: Vec<String>,
    json_output: bool,
) -> Result<(), CliError> {
    let analyze_err = |code: u8, message: String| CliError {
        code,
        message,
        hint: None,
    };

    let patterns = vec!["*.csv".to_string()];
    let mut records = Vec::new();
    for dir in &dirs {
        let files = discover_session_files(dir, &patterns, &exclude)
            .map_err(|e| analyze_err(EXIT_LOAD, e.to_string()))?;
        for file in files {
            let mut loaded =
                load_file(&file).map_err(|e| analyze_err(EXIT_LOAD, e.to_string()))?;
            records.append(&mut loaded);
        }
    }

    let report = build_report(&records, epsilon).map_err(|e| match e {
        MergeError::InvalidEpsilon(_) => analyze_err(EXIT_INVALID_CONFIG, e.to_string()),
        other => analyze_err(EXIT_RUNTIME, other.to_string()),
    })?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| analyze_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        eprint!("{}", render(&report));
    }

    Ok(())
}

fn render(report: &AnalyzeReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let rule = "-".repeat(50);

    let _ = writeln!(out, "MISSION DATA ANALYSIS");
    let _ = writeln!(out, "{}", "=".repeat(50));

    let _ = writeln!(out, "\nFILE PROCESSING SUMMARY\n{rule}");
    for file in &report.files {
        let _ = writeln!(
            out,
            "  {:<40} {:>5} points, {} internal duplicate(s)",
            file.name, file.points, file.internal_duplicates,
        );
    }
    let _ = writeln!(out, "  Total raw records: {}", report.total_records);

    let _ = writeln!(out, "\nDUPLICATE ANALYSIS\n{rule}");
    for (strategy, count) in &report.strategy_duplicates {
        let _ = writeln!(out, "  {strategy}: {count}");
    }

    if !report.coordinate_groups.is_empty() {
        let _ = writeln!(out, "\nCOORDINATE DUPLICATE DETAIL\n{rule}");
        for (i, group) in report.coordinate_groups.iter().enumerate() {
            let _ = writeln!(
                out,
                "  #{}: ({:.6}, {:.6}, {:.2}) appears {} times",
                i + 1,
                group.longitude,
                group.latitude,
                group.altitude,
                group.occurrences,
            );
            let _ = writeln!(out, "      points: {}", group.labels.join(", "));
            let _ = writeln!(out, "      files:  {}", group.origins.join(", "));
        }
    }

    let _ = writeln!(
        out,
        "\nNEAR-DUPLICATES (epsilon {:e})\n{rule}",
        report.proximity.epsilon
    );
    if report.proximity.pairs.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for pair in &report.proximity.pairs {
        let _ = writeln!(
            out,
            "  '{}' ({}) ~ '{}' ({}), delta ({:e}, {:e}, {:e})",
            pair.left_identifier,
            pair.left_origin,
            pair.right_identifier,
            pair.right_origin,
            pair.delta[0],
            pair.delta[1],
            pair.delta[2],
        );
    }
    if !report.proximity.rejected.is_empty() {
        let _ = writeln!(
            out,
            "  {} record(s) skipped (no position)",
            report.proximity.rejected.len()
        );
    }

    if let Some(ref cov) = report.coverage {
        let _ = writeln!(out, "\nGEOGRAPHIC COVERAGE\n{rule}");
        let _ = writeln!(
            out,
            "  Longitude: {:.6} to {:.6}",
            cov.longitude.0, cov.longitude.1
        );
        let _ = writeln!(
            out,
            "  Latitude:  {:.6} to {:.6}",
            cov.latitude.0, cov.latitude.1
        );
        let _ = writeln!(
            out,
            "  Altitude:  {:.2} to {:.2}",
            cov.altitude.0, cov.altitude.1
        );
    }

    let _ = writeln!(out, "\nSTATUS DISTRIBUTION\n{rule}");
    for (status, count) in &report.status_counts {
        let _ = writeln!(out, "  status {status}: {count} points");
    }

    out
}
