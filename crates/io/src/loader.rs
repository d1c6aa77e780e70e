use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use survmerge_dedup::model::Position;
use survmerge_dedup::Record;

use crate::error::LoadError;

/// Column names as written by the field device export.
pub const COL_ID: &str = "id";
pub const COL_NAME: &str = "name";
pub const COL_LON: &str = "originalLongitude";
pub const COL_LAT: &str = "originalLatitude";
pub const COL_ALT: &str = "originalAltitude";
pub const COL_ROVER_LON: &str = "roverPositionLongitude";
pub const COL_ROVER_LAT: &str = "roverPositionLatitude";
pub const COL_ROVER_ALT: &str = "roverPositionAltitude";
pub const COL_TIME: &str = "time";
pub const COL_STATUS: &str = "status";

/// Load one session file, tagging every record with the file name as its
/// origin.
pub fn load_file(path: &Path) -> Result<Vec<Record>, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|e| LoadError::Io(e.to_string()))?;
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_records(&origin, &data)
}

/// Parse device-export CSV into records.
///
/// Empty coordinate cells produce a record without that position; the
/// engine rejects it later only if the chosen strategy needs it.
/// Non-empty cells that fail to parse are load errors carrying the file
/// and record context.
pub fn load_records(origin: &str, csv_data: &str) -> Result<Vec<Record>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                file: origin.into(),
                column: name.into(),
            })
    };

    let id_idx = idx(COL_ID)?;
    let name_idx = idx(COL_NAME)?;
    let lon_idx = idx(COL_LON)?;
    let lat_idx = idx(COL_LAT)?;
    let alt_idx = idx(COL_ALT)?;
    let rover_lon_idx = idx(COL_ROVER_LON)?;
    let rover_lat_idx = idx(COL_ROVER_LAT)?;
    let rover_alt_idx = idx(COL_ROVER_ALT)?;
    let time_idx = idx(COL_TIME)?;
    let status_idx = idx(COL_STATUS)?;

    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| LoadError::Io(e.to_string()))?;
        let cell = |i: usize| row.get(i).unwrap_or("").trim();

        let identifier = cell(id_idx).to_string();

        let position = parse_position(
            origin,
            &identifier,
            [
                (COL_LON, cell(lon_idx)),
                (COL_LAT, cell(lat_idx)),
                (COL_ALT, cell(alt_idx)),
            ],
        )?;
        let rover_position = parse_position(
            origin,
            &identifier,
            [
                (COL_ROVER_LON, cell(rover_lon_idx)),
                (COL_ROVER_LAT, cell(rover_lat_idx)),
                (COL_ROVER_ALT, cell(rover_alt_idx)),
            ],
        )?;

        let timestamp = parse_timestamp(origin, &identifier, cell(time_idx))?;

        let status_cell = cell(status_idx);
        let status: u8 = if status_cell.is_empty() {
            0
        } else {
            status_cell.parse().map_err(|_| LoadError::NumberParse {
                file: origin.into(),
                identifier: identifier.clone(),
                column: COL_STATUS.into(),
                value: status_cell.into(),
            })?
        };

        records.push(Record {
            identifier,
            label: cell(name_idx).to_string(),
            position,
            rover_position,
            timestamp,
            status,
            origin: origin.into(),
        });
    }

    Ok(records)
}

/// A position is present only when all three cells are non-empty.
fn parse_position(
    file: &str,
    identifier: &str,
    cells: [(&str, &str); 3],
) -> Result<Option<Position>, LoadError> {
    if cells.iter().any(|(_, value)| value.is_empty()) {
        return Ok(None);
    }

    let mut parsed = [0.0f64; 3];
    for (slot, (column, value)) in parsed.iter_mut().zip(cells) {
        *slot = value.parse().map_err(|_| LoadError::NumberParse {
            file: file.into(),
            identifier: identifier.into(),
            column: column.into(),
            value: value.into(),
        })?;
    }

    Ok(Some(Position {
        longitude: parsed[0],
        latitude: parsed[1],
        altitude: parsed[2],
    }))
}

/// The device writes RFC 3339 timestamps; older firmware wrote naive
/// `YYYY-MM-DD HH:MM:SS` local-UTC strings. Accept both.
fn parse_timestamp(file: &str, identifier: &str, value: &str) -> Result<DateTime<Utc>, LoadError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(LoadError::TimestampParse {
        file: file.into(),
        identifier: identifier.into(),
        value: value.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,name,originalLongitude,originalLatitude,originalAltitude,roverPositionLongitude,roverPositionLatitude,roverPositionAltitude,time,status";

    #[test]
    fn load_basic() {
        let csv = format!(
            "{HEADER}\n\
             guid-1,101,-97.123456,30.400001,271.2,-97.123300,30.400100,275.7,2025-09-25T14:03:12Z,1\n\
             guid-2,102,-97.123470,30.400010,271.4,-97.123310,30.400110,275.8,2025-09-25T14:05:40Z,1\n"
        );
        let records = load_records("sep25_a.csv", &csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "guid-1");
        assert_eq!(records[0].label, "101");
        assert_eq!(records[0].origin, "sep25_a.csv");
        let position = records[0].position.unwrap();
        assert_eq!(position.longitude, -97.123456);
        assert_eq!(position.altitude, 271.2);
        assert!(records[0].rover_position.is_some());
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn naive_timestamps_are_accepted() {
        let csv = format!(
            "{HEADER}\n\
             guid-1,101,-97.1,30.4,271.2,-97.1,30.4,275.7,2025-09-25 14:03:12,1\n"
        );
        let records = load_records("a.csv", &csv).unwrap();
        assert_eq!(
            records[0].timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2025-09-25 14:03:12"
        );
    }

    #[test]
    fn empty_coordinates_load_as_missing_position() {
        let csv = format!(
            "{HEADER}\n\
             guid-1,101,,,,-97.1,30.4,275.7,2025-09-25T14:03:12Z,1\n"
        );
        let records = load_records("a.csv", &csv).unwrap();
        assert!(records[0].position.is_none());
        assert!(records[0].rover_position.is_some());
    }

    #[test]
    fn malformed_coordinate_is_a_load_error() {
        let csv = format!(
            "{HEADER}\n\
             guid-1,101,not-a-number,30.4,271.2,-97.1,30.4,275.7,2025-09-25T14:03:12Z,1\n"
        );
        let err = load_records("a.csv", &csv).unwrap_err();
        match err {
            LoadError::NumberParse {
                file,
                identifier,
                column,
                value,
            } => {
                assert_eq!(file, "a.csv");
                assert_eq!(identifier, "guid-1");
                assert_eq!(column, COL_LON);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected NumberParse, got {other:?}"),
        }
    }

    #[test]
    fn malformed_timestamp_is_a_load_error() {
        let csv = format!(
            "{HEADER}\n\
             guid-1,101,-97.1,30.4,271.2,-97.1,30.4,275.7,yesterday,1\n"
        );
        let err = load_records("a.csv", &csv).unwrap_err();
        assert!(matches!(err, LoadError::TimestampParse { .. }));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let csv = "id,name,time\nguid-1,101,2025-09-25T14:03:12Z\n";
        let err = load_records("a.csv", csv).unwrap_err();
        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, COL_LON),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}
