use serde::{Deserialize, Serialize};

use crate::model::{PositionKey, Record, RejectReason};

/// Rule deciding when two records count as the same physical measurement.
///
/// Which field the device guarantees unique varies by deployment, so the
/// strategy is an explicit required input rather than a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Every field except timestamp and origin must match.
    ExactRow,
    /// Device GUID only.
    ById,
    /// Operator point name only.
    ByLabel,
    /// Measured position, bit-exact component comparison.
    ByCoordinate,
    /// Measured position within epsilon. Diagnostic only: proximity is
    /// not transitive, so this strategy never selects survivors.
    ByCoordinateTolerance,
}

impl DedupStrategy {
    /// True for strategies that produce a groupable equality key.
    pub fn is_key_based(&self) -> bool {
        !matches!(self, Self::ByCoordinateTolerance)
    }

    pub const KEY_BASED: [DedupStrategy; 4] = [
        Self::ExactRow,
        Self::ById,
        Self::ByLabel,
        Self::ByCoordinate,
    ];
}

impl std::fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactRow => write!(f, "exact_row"),
            Self::ById => write!(f, "by_id"),
            Self::ByLabel => write!(f, "by_label"),
            Self::ByCoordinate => write!(f, "by_coordinate"),
            Self::ByCoordinateTolerance => write!(f, "by_coordinate_tolerance"),
        }
    }
}

/// Identity key of one record under a key-based strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Row {
        identifier: String,
        label: String,
        position: PositionKey,
        rover_position: PositionKey,
        status: u8,
    },
    Identifier(String),
    Label(String),
    Coordinate(PositionKey),
}

/// Compute `record`'s identity key under a key-based strategy.
///
/// Stateless and order-independent. Returns the reason the record cannot
/// participate when a required field is missing. Callers must filter out
/// the tolerance strategy first (`is_key_based`).
pub fn key_of(strategy: DedupStrategy, record: &Record) -> Result<RecordKey, RejectReason> {
    match strategy {
        DedupStrategy::ExactRow => {
            let position = record.position.ok_or(RejectReason::MissingPosition)?;
            let rover_position = record
                .rover_position
                .ok_or(RejectReason::MissingRoverPosition)?;
            Ok(RecordKey::Row {
                identifier: record.identifier.clone(),
                label: record.label.clone(),
                position: position.key(),
                rover_position: rover_position.key(),
                status: record.status,
            })
        }
        DedupStrategy::ById => {
            if record.identifier.is_empty() {
                Err(RejectReason::MissingIdentifier)
            } else {
                Ok(RecordKey::Identifier(record.identifier.clone()))
            }
        }
        DedupStrategy::ByLabel => {
            if record.label.is_empty() {
                Err(RejectReason::MissingLabel)
            } else {
                Ok(RecordKey::Label(record.label.clone()))
            }
        }
        DedupStrategy::ByCoordinate => {
            let position = record.position.ok_or(RejectReason::MissingPosition)?;
            Ok(RecordKey::Coordinate(position.key()))
        }
        DedupStrategy::ByCoordinateTolerance => {
            unreachable!("tolerance strategy has no equality key")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use chrono::{TimeZone, Utc};

    fn record(identifier: &str, label: &str, position: Option<Position>) -> Record {
        Record {
            identifier: identifier.into(),
            label: label.into(),
            position,
            rover_position: position,
            timestamp: Utc.with_ymd_and_hms(2025, 9, 25, 14, 0, 0).unwrap(),
            status: 1,
            origin: "a.csv".into(),
        }
    }

    fn pos(longitude: f64, latitude: f64, altitude: f64) -> Position {
        Position {
            longitude,
            latitude,
            altitude,
        }
    }

    #[test]
    fn id_key_ignores_everything_else() {
        let a = record("guid-1", "101", Some(pos(1.0, 2.0, 3.0)));
        let b = record("guid-1", "999", Some(pos(9.0, 9.0, 9.0)));
        assert_eq!(
            key_of(DedupStrategy::ById, &a).unwrap(),
            key_of(DedupStrategy::ById, &b).unwrap()
        );
    }

    #[test]
    fn coordinate_key_is_bit_exact() {
        let a = record("g1", "101", Some(pos(1.0, 2.0, 3.0)));
        let b = record("g2", "102", Some(pos(1.0, 2.0, 3.0 + 1e-12)));
        assert_ne!(
            key_of(DedupStrategy::ByCoordinate, &a).unwrap(),
            key_of(DedupStrategy::ByCoordinate, &b).unwrap()
        );
    }

    #[test]
    fn exact_row_key_ignores_timestamp_and_origin() {
        let a = record("g1", "101", Some(pos(1.0, 2.0, 3.0)));
        let mut b = a.clone();
        b.timestamp = Utc.with_ymd_and_hms(2025, 9, 26, 9, 0, 0).unwrap();
        b.origin = "b.csv".into();
        assert_eq!(
            key_of(DedupStrategy::ExactRow, &a).unwrap(),
            key_of(DedupStrategy::ExactRow, &b).unwrap()
        );
    }

    #[test]
    fn missing_fields_are_rejected_with_reason() {
        let no_pos = record("g1", "101", None);
        assert_eq!(
            key_of(DedupStrategy::ByCoordinate, &no_pos).unwrap_err(),
            RejectReason::MissingPosition
        );

        let no_id = record("", "101", Some(pos(1.0, 2.0, 3.0)));
        assert_eq!(
            key_of(DedupStrategy::ById, &no_id).unwrap_err(),
            RejectReason::MissingIdentifier
        );
    }
}
