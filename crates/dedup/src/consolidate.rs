use crate::error::MergeError;
use crate::grouper::group_by_key;
use crate::model::{AuditTrail, Consolidation, Record};
use crate::selector::select_survivor;
use crate::strategy::DedupStrategy;

/// Consolidate `records` under a key-based strategy.
///
/// Keeps exactly one member per duplicate group (first ingestion
/// occurrence) and returns survivors sorted by non-decreasing timestamp,
/// with ingestion order breaking timestamp ties. Records the strategy
/// cannot key are excluded and listed in the audit, never silently
/// dropped. Empty input yields an empty result with a zero-valued audit.
///
/// Requesting the tolerance strategy is a configuration error: pairwise
/// proximity does not define consistent groups, so it cannot select
/// survivors (use [`crate::proximity_report`] instead).
pub fn consolidate(records: &[Record], strategy: DedupStrategy) -> Result<Consolidation, MergeError> {
    let grouping = group_by_key(records, strategy)?;

    let mut discarded = Vec::new();
    let mut keep: Vec<usize> = grouping.singletons.clone();
    for group in &grouping.groups {
        let (survivor_index, mut lost) = select_survivor(records, group);
        keep.push(survivor_index);
        discarded.append(&mut lost);
    }

    // Restore ingestion order first, then stable-sort by timestamp so
    // records sharing a timestamp keep their ingestion order.
    keep.sort_unstable();
    let mut survivors: Vec<Record> = keep.iter().map(|&i| records[i].clone()).collect();
    survivors.sort_by_key(|r| r.timestamp);

    let audit = AuditTrail {
        strategy,
        total_input: records.len(),
        duplicate_groups: grouping.groups.len(),
        total_after: survivors.len(),
        discarded,
        rejected: grouping.rejected,
    };

    Ok(Consolidation { survivors, audit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use chrono::{TimeZone, Utc};

    fn record(identifier: &str, longitude: f64, minute: u32) -> Record {
        Record {
            identifier: identifier.into(),
            label: identifier.into(),
            position: Some(Position {
                longitude,
                latitude: 30.0,
                altitude: 270.0,
            }),
            rover_position: None,
            timestamp: Utc.with_ymd_and_hms(2025, 9, 25, 14, minute, 0).unwrap(),
            status: 1,
            origin: "a.csv".into(),
        }
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let result = consolidate(&[], DedupStrategy::ById).unwrap();
        assert!(result.survivors.is_empty());
        assert_eq!(result.audit.total_input, 0);
        assert_eq!(result.audit.duplicate_groups, 0);
        assert!(result.audit.discarded.is_empty());
        assert!(result.audit.rejected.is_empty());
    }

    #[test]
    fn tolerance_consolidation_is_a_configuration_error() {
        let records = vec![record("a", 1.0, 0)];
        let err = consolidate(&records, DedupStrategy::ByCoordinateTolerance).unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedStrategy(_)));
    }

    #[test]
    fn survivors_sorted_by_timestamp() {
        let records = vec![
            record("c", 3.0, 30),
            record("a", 1.0, 10),
            record("b", 2.0, 20),
        ];
        let result = consolidate(&records, DedupStrategy::ById).unwrap();
        let ids: Vec<&str> = result.survivors.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_timestamps_keep_ingestion_order() {
        let records = vec![
            record("x", 1.0, 5),
            record("y", 2.0, 5),
            record("z", 3.0, 5),
        ];
        let result = consolidate(&records, DedupStrategy::ById).unwrap();
        let ids: Vec<&str> = result.survivors.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn audit_supplies_renderer_totals() {
        let records = vec![
            record("a", 1.0, 0),
            record("a", 2.0, 1),
            record("b", 3.0, 2),
        ];
        let result = consolidate(&records, DedupStrategy::ById).unwrap();
        assert_eq!(result.audit.total_input, 3);
        assert_eq!(result.audit.total_after, 2);
        assert_eq!(result.audit.duplicate_groups, 1);
        assert_eq!(result.audit.discarded.len(), 1);
        assert_eq!(result.audit.discarded[0].survivor_identifier, "a");
    }
}
