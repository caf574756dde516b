use model::{core::identifiers::SourceChannel, records::position::Position};
use std::collections::BTreeMap;

/// Last acknowledged position per source channel. Only the merger writes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckPositions {
    positions: BTreeMap<SourceChannel, Position>,
}

impl AckPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: &SourceChannel) -> Option<&Position> {
        self.positions.get(channel)
    }

    pub(crate) fn record(&mut self, channel: SourceChannel, position: Position) {
        self.positions.insert(channel, position);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceChannel, &Position)> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
