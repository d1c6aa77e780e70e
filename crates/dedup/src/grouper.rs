use std::collections::HashMap;

use crate::error::MergeError;
use crate::model::{
    DuplicateGroup, Grouping, Position, ProximityPair, ProximityReport, Record, RejectReason,
    RejectedRecord,
};
use crate::strategy::{key_of, DedupStrategy, RecordKey};

/// Partition `records` into duplicate groups under a key-based strategy.
///
/// Hash-grouped in one pass. Groups come back ordered by first ingestion
/// occurrence with members in ingestion order, so downstream survivor
/// selection is deterministic. Records missing a field the strategy needs
/// are rejected, not dropped.
pub fn group_by_key(records: &[Record], strategy: DedupStrategy) -> Result<Grouping, MergeError> {
    if !strategy.is_key_based() {
        return Err(MergeError::UnsupportedStrategy(strategy));
    }

    let mut slots: HashMap<RecordKey, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match key_of(strategy, record) {
            Ok(key) => {
                let slot = *slots.entry(key).or_insert_with(|| {
                    buckets.push(Vec::new());
                    buckets.len() - 1
                });
                buckets[slot].push(index);
            }
            Err(reason) => rejected.push(reject(index, record, reason)),
        }
    }

    let mut groups = Vec::new();
    let mut singletons = Vec::new();
    for bucket in buckets {
        if bucket.len() >= 2 {
            groups.push(DuplicateGroup { members: bucket });
        } else {
            singletons.extend(bucket);
        }
    }

    Ok(Grouping {
        groups,
        singletons,
        rejected,
    })
}

/// Pairwise near-duplicate scan: every i<j pair whose positions are
/// within `epsilon` on all three components.
///
/// Proximity is not transitive (A≈B and B≈C does not imply A≈C), so the
/// relation reported here is raw pairwise adjacency — pairs are never
/// merged into clusters, and a record can appear in several pairs.
/// O(n²); intended for diagnostics over a few thousand records, not for
/// bulk data. Records without a position are rejected per-record.
pub fn proximity_report(records: &[Record], epsilon: f64) -> Result<ProximityReport, MergeError> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(MergeError::InvalidEpsilon(epsilon));
    }

    let mut rejected = Vec::new();
    let mut located: Vec<(usize, Position)> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match record.position {
            Some(position) => located.push((index, position)),
            None => rejected.push(reject(index, record, RejectReason::MissingPosition)),
        }
    }

    let mut pairs = Vec::new();
    for a in 0..located.len() {
        let (i, pi) = located[a];
        for &(j, pj) in &located[a + 1..] {
            if pi.within(&pj, epsilon) {
                pairs.push(ProximityPair {
                    left_index: i,
                    right_index: j,
                    left_identifier: records[i].identifier.clone(),
                    right_identifier: records[j].identifier.clone(),
                    left_origin: records[i].origin.clone(),
                    right_origin: records[j].origin.clone(),
                    delta: [
                        (pi.longitude - pj.longitude).abs(),
                        (pi.latitude - pj.latitude).abs(),
                        (pi.altitude - pj.altitude).abs(),
                    ],
                });
            }
        }
    }

    Ok(ProximityReport {
        epsilon,
        total_input: records.len(),
        pairs,
        rejected,
    })
}

fn reject(index: usize, record: &Record, reason: RejectReason) -> RejectedRecord {
    RejectedRecord {
        index,
        identifier: record.identifier.clone(),
        label: record.label.clone(),
        origin: record.origin.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(identifier: &str, longitude: f64) -> Record {
        Record {
            identifier: identifier.into(),
            label: identifier.into(),
            position: Some(Position {
                longitude,
                latitude: 30.0,
                altitude: 270.0,
            }),
            rover_position: None,
            timestamp: Utc.with_ymd_and_hms(2025, 9, 25, 14, 0, 0).unwrap(),
            status: 1,
            origin: "a.csv".into(),
        }
    }

    #[test]
    fn groups_keep_ingestion_order() {
        let records = vec![
            record("a", 1.0),
            record("b", 2.0),
            record("a", 3.0),
            record("c", 4.0),
            record("a", 5.0),
        ];
        let grouping = group_by_key(&records, DedupStrategy::ById).unwrap();
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].members, vec![0, 2, 4]);
        assert_eq!(grouping.singletons, vec![1, 3]);
        assert!(grouping.rejected.is_empty());
    }

    #[test]
    fn group_order_follows_first_occurrence() {
        let records = vec![
            record("x", 1.0),
            record("y", 2.0),
            record("y", 3.0),
            record("x", 4.0),
        ];
        let grouping = group_by_key(&records, DedupStrategy::ById).unwrap();
        assert_eq!(grouping.groups[0].members, vec![0, 3]);
        assert_eq!(grouping.groups[1].members, vec![1, 2]);
    }

    #[test]
    fn tolerance_strategy_is_not_groupable() {
        let records = vec![record("a", 1.0)];
        let err = group_by_key(&records, DedupStrategy::ByCoordinateTolerance).unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedStrategy(_)));
    }

    #[test]
    fn unkeyable_records_are_rejected_not_dropped() {
        let mut no_position = record("b", 0.0);
        no_position.position = None;
        let records = vec![record("a", 1.0), no_position, record("a", 1.0)];
        let grouping = group_by_key(&records, DedupStrategy::ByCoordinate).unwrap();
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.rejected.len(), 1);
        assert_eq!(grouping.rejected[0].index, 1);
        assert_eq!(grouping.rejected[0].reason, RejectReason::MissingPosition);
    }

    #[test]
    fn proximity_pairs_are_not_transitive() {
        // p1≈p2 and p2≈p3 but |p1-p3| >= epsilon: exactly two pairs, no
        // three-way cluster.
        let records = vec![record("p1", 1.0), record("p2", 1.0 + 6e-7), record("p3", 1.0 + 1.2e-6)];
        let report = proximity_report(&records, 1e-6).unwrap();
        let pairs: Vec<(usize, usize)> = report
            .pairs
            .iter()
            .map(|p| (p.left_index, p.right_index))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn proximity_rejects_bad_epsilon() {
        let records = vec![record("a", 1.0)];
        assert!(matches!(
            proximity_report(&records, 0.0),
            Err(MergeError::InvalidEpsilon(_))
        ));
        assert!(matches!(
            proximity_report(&records, -1.0),
            Err(MergeError::InvalidEpsilon(_))
        ));
        assert!(matches!(
            proximity_report(&records, f64::NAN),
            Err(MergeError::InvalidEpsilon(_))
        ));
    }

    #[test]
    fn proximity_skips_unpositioned_records() {
        let mut blank = record("b", 0.0);
        blank.position = None;
        let records = vec![record("a", 1.0), blank, record("c", 1.0 + 1e-8)];
        let report = proximity_report(&records, 1e-6).unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].left_index, 0);
        assert_eq!(report.pairs[0].right_index, 2);
        assert_eq!(report.rejected.len(), 1);
    }
}
