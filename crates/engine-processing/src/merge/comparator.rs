use model::records::record::DataRecord;
use std::cmp::Ordering;

/// Orders by commit sequence number. Records without one sort first.
pub fn csn_comparator(a: &DataRecord, b: &DataRecord) -> Ordering {
    a.csn().cmp(&b.csn())
}

/// Orders by source position. Incomparable positions count as equal.
pub fn position_comparator(a: &DataRecord, b: &DataRecord) -> Ordering {
    a.position()
        .partial_cmp(b.position())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::{position::Position, record::ChangeType};

    fn record(position: Position, csn: Option<u64>) -> DataRecord {
        let record = DataRecord::new(ChangeType::Insert, "t_order", position);
        match csn {
            Some(csn) => record.with_csn(csn),
            None => record,
        }
    }

    #[test]
    fn test_missing_csn_sorts_first() {
        let without = record(Position::Placeholder, None);
        let with = record(Position::Placeholder, Some(1));
        assert_eq!(csn_comparator(&without, &with), Ordering::Less);
        assert_eq!(
            csn_comparator(&record(Position::Placeholder, Some(9)), &with),
            Ordering::Greater
        );
    }

    #[test]
    fn test_incomparable_positions_are_equal() {
        let wal = record(Position::wal(10), None);
        let binlog = record(Position::binlog("mysql-bin.000001", 4), None);
        assert_eq!(position_comparator(&wal, &binlog), Ordering::Equal);
        assert_eq!(
            position_comparator(&wal, &record(Position::wal(11), None)),
            Ordering::Less
        );
    }
}
