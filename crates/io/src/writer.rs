use std::path::Path;

use chrono::{DateTime, Utc};
use survmerge_dedup::{AuditTrail, Record};

use crate::error::LoadError;
use crate::loader::{
    load_records, COL_ALT, COL_ID, COL_LAT, COL_LON, COL_NAME, COL_ROVER_ALT, COL_ROVER_LAT,
    COL_ROVER_LON, COL_STATUS, COL_TIME,
};

/// Metadata block written above the combined CSV body. Values come
/// straight from the audit trail — the writer recomputes nothing.
#[derive(Debug, Clone)]
pub struct CombinedHeader {
    pub total_points: usize,
    pub raw_points: usize,
    pub duplicates_removed: usize,
    pub records_rejected: usize,
    pub files_processed: usize,
    pub generated: DateTime<Utc>,
}

impl CombinedHeader {
    pub fn from_audit(audit: &AuditTrail, files_processed: usize) -> Self {
        Self {
            total_points: audit.total_after,
            raw_points: audit.total_input,
            duplicates_removed: audit.discarded.len(),
            records_rejected: audit.rejected.len(),
            files_processed,
            generated: Utc::now(),
        }
    }

    fn lines(&self) -> Vec<String> {
        vec![
            "# Mission Data Summary".into(),
            format!("# Total Survey Points: {}", self.total_points),
            format!(
                "# Original Points Before Deduplication: {}",
                self.raw_points
            ),
            format!("# Duplicates Removed: {}", self.duplicates_removed),
            format!("# Records Rejected: {}", self.records_rejected),
            format!("# Files Processed: {}", self.files_processed),
            format!("# Generated: {}", self.generated.format("%Y-%m-%d %H:%M:%S")),
            "#".into(),
        ]
    }
}

/// Write the combined dataset: `#` metadata lines, then the CSV body in
/// device-export column order.
pub fn write_combined(
    path: &Path,
    survivors: &[Record],
    header: &CombinedHeader,
) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| LoadError::Io(e.to_string()))?;
        }
    }

    let mut out = String::new();
    for line in header.lines() {
        out.push_str(&line);
        out.push('\n');
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            COL_ID,
            COL_NAME,
            COL_LON,
            COL_LAT,
            COL_ALT,
            COL_ROVER_LON,
            COL_ROVER_LAT,
            COL_ROVER_ALT,
            COL_TIME,
            COL_STATUS,
        ])
        .map_err(|e| LoadError::Io(e.to_string()))?;

    for record in survivors {
        let (lon, lat, alt) =
            position_cells(record.position.map(|p| (p.longitude, p.latitude, p.altitude)));
        let (rlon, rlat, ralt) = position_cells(
            record
                .rover_position
                .map(|p| (p.longitude, p.latitude, p.altitude)),
        );
        let time = record.timestamp.to_rfc3339();
        let status = record.status.to_string();
        writer
            .write_record([
                record.identifier.as_str(),
                record.label.as_str(),
                lon.as_str(),
                lat.as_str(),
                alt.as_str(),
                rlon.as_str(),
                rlat.as_str(),
                ralt.as_str(),
                time.as_str(),
                status.as_str(),
            ])
            .map_err(|e| LoadError::Io(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| LoadError::Io(e.to_string()))?;
    out.push_str(&String::from_utf8_lossy(&body));

    std::fs::write(path, out).map_err(|e| LoadError::Io(e.to_string()))
}

fn position_cells(position: Option<(f64, f64, f64)>) -> (String, String, String) {
    match position {
        Some((lon, lat, alt)) => (lon.to_string(), lat.to_string(), alt.to_string()),
        None => (String::new(), String::new(), String::new()),
    }
}

/// Read a combined file back, skipping the `#` metadata block.
pub fn read_combined(path: &Path) -> Result<Vec<Record>, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|e| LoadError::Io(e.to_string()))?;
    let body: String = data
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| format!("{line}\n"))
        .collect();
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_records(&origin, &body)
}
