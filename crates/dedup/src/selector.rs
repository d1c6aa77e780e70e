use crate::model::{DiscardedRecord, DuplicateGroup, Record};

/// Pick the surviving member of a duplicate group.
///
/// Policy: first ingestion occurrence wins. Ingestion order is file
/// discovery order then row order within a file, and is independent of
/// timestamps — a later-captured record still survives if it was loaded
/// first. The discarded members are returned with provenance plus the
/// survivor they were merged into.
pub fn select_survivor(records: &[Record], group: &DuplicateGroup) -> (usize, Vec<DiscardedRecord>) {
    let survivor_index = group.members[0];
    let survivor = &records[survivor_index];

    let discarded = group.members[1..]
        .iter()
        .map(|&index| {
            let record = &records[index];
            DiscardedRecord {
                identifier: record.identifier.clone(),
                label: record.label.clone(),
                origin: record.origin.clone(),
                timestamp: record.timestamp,
                survivor_identifier: survivor.identifier.clone(),
                survivor_label: survivor.label.clone(),
                survivor_origin: survivor.origin.clone(),
            }
        })
        .collect();

    (survivor_index, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use chrono::{TimeZone, Utc};

    fn record(identifier: &str, origin: &str, hour: u32) -> Record {
        Record {
            identifier: identifier.into(),
            label: "101".into(),
            position: Some(Position {
                longitude: 1.0,
                latitude: 2.0,
                altitude: 3.0,
            }),
            rover_position: None,
            timestamp: Utc.with_ymd_and_hms(2025, 9, 25, hour, 0, 0).unwrap(),
            status: 1,
            origin: origin.into(),
        }
    }

    #[test]
    fn first_occurrence_wins_even_with_later_timestamp() {
        // The first-loaded record has the latest capture time; it still
        // survives because selection follows ingestion order.
        let records = vec![
            record("a", "first.csv", 18),
            record("a", "second.csv", 9),
            record("a", "third.csv", 12),
        ];
        let group = DuplicateGroup {
            members: vec![0, 1, 2],
        };
        let (survivor, discarded) = select_survivor(&records, &group);
        assert_eq!(survivor, 0);
        assert_eq!(discarded.len(), 2);
        assert_eq!(discarded[0].origin, "second.csv");
        assert_eq!(discarded[0].survivor_origin, "first.csv");
        assert_eq!(discarded[1].origin, "third.csv");
    }
}
