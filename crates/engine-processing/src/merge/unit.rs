use model::records::{position::Position, record::DataRecord};

/// What the merger selects and dequeues in one step.
pub trait MergeUnit: Send {
    /// Record the comparator looks at.
    fn first_record(&self) -> Option<&DataRecord>;

    /// Position acknowledged for the channel once this unit is dequeued.
    fn ack_position(&self) -> Option<&Position>;

    fn records_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.first_record().is_none()
    }
}

impl MergeUnit for DataRecord {
    fn first_record(&self) -> Option<&DataRecord> {
        Some(self)
    }

    fn ack_position(&self) -> Option<&Position> {
        Some(self.position())
    }

    fn records_count(&self) -> usize {
        1
    }
}

/// Records of one transaction, delivered together.
impl MergeUnit for Vec<DataRecord> {
    fn first_record(&self) -> Option<&DataRecord> {
        self.first()
    }

    fn ack_position(&self) -> Option<&Position> {
        self.last().map(DataRecord::position)
    }

    fn records_count(&self) -> usize {
        self.len()
    }
}
