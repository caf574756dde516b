use crate::{
    backoff::PollBackoff,
    merge::{
        ack::AckPositions,
        channel::{ChannelReceiver, ChannelSender, channel},
        unit::MergeUnit,
    },
    metrics::MergeMetrics,
};
use model::{
    core::identifiers::SourceChannel,
    records::{position::Position, record::DataRecord},
};
use std::{cmp::Ordering, collections::BTreeMap};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

pub type RecordComparator = Box<dyn Fn(&DataRecord, &DataRecord) -> Ordering + Send + Sync>;

/// Dequeues the unit whose first record is the global minimum across all
/// channel heads and records the channel's new ack position.
///
/// Empty grouped units found at a head are dropped without acknowledgement.
/// On equal heads the first channel in `SourceChannel` order wins. `None`
/// means every queue is empty right now, not that the stream has ended.
pub fn select_next_global_minimum<U, F>(
    queues: &mut BTreeMap<SourceChannel, ChannelReceiver<U>>,
    comparator: F,
    ack_positions: &mut AckPositions,
) -> Option<U>
where
    U: MergeUnit,
    F: Fn(&DataRecord, &DataRecord) -> Ordering,
{
    select_with(queues, comparator, ack_positions).0
}

fn select_with<U, F>(
    queues: &mut BTreeMap<SourceChannel, ChannelReceiver<U>>,
    comparator: F,
    ack_positions: &mut AckPositions,
) -> (Option<U>, u64)
where
    U: MergeUnit,
    F: Fn(&DataRecord, &DataRecord) -> Ordering,
{
    let mut discarded = 0u64;
    for (channel, receiver) in queues.iter_mut() {
        while receiver.peek().is_some_and(|unit| unit.is_empty()) {
            receiver.poll();
            discarded += 1;
            trace!(channel = %channel, "Discarded empty unit");
        }
    }

    let mut winner: Option<(&SourceChannel, &DataRecord)> = None;
    for (channel, receiver) in queues.iter() {
        let Some(record) = receiver.head().and_then(|unit| unit.first_record()) else {
            continue;
        };
        match winner {
            Some((_, best)) if comparator(record, best) != Ordering::Less => {}
            _ => winner = Some((channel, record)),
        }
    }

    let Some(channel) = winner.map(|(channel, _)| channel.clone()) else {
        return (None, discarded);
    };

    let unit = queues.get_mut(&channel).and_then(ChannelReceiver::poll);
    if let Some(position) = unit.as_ref().and_then(|unit| unit.ack_position()) {
        trace!(channel = %channel, position = %position, "Acknowledged");
        ack_positions.record(channel, position.clone());
    }
    (unit, discarded)
}

/// Merges per-source ordered change streams into one globally ordered stream.
///
/// Driven by a single task; producers only touch their `ChannelSender`s.
pub struct ChangeStreamMerger<U> {
    queues: BTreeMap<SourceChannel, ChannelReceiver<U>>,
    ack_positions: AckPositions,
    comparator: RecordComparator,
    backoff: PollBackoff,
    metrics: MergeMetrics,
}

impl<U: MergeUnit> ChangeStreamMerger<U> {
    pub fn new<F>(comparator: F) -> Self
    where
        F: Fn(&DataRecord, &DataRecord) -> Ordering + Send + Sync + 'static,
    {
        Self {
            queues: BTreeMap::new(),
            ack_positions: AckPositions::new(),
            comparator: Box::new(comparator),
            backoff: PollBackoff::default(),
            metrics: MergeMetrics::new(),
        }
    }

    pub fn with_backoff(mut self, backoff: PollBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Creates a bounded queue for `channel` and returns its producer handle.
    pub fn register_channel(
        &mut self,
        channel: impl Into<SourceChannel>,
        capacity: usize,
    ) -> ChannelSender<U> {
        let (sender, receiver) = self::channel(capacity);
        self.add_channel(channel, receiver);
        sender
    }

    pub fn add_channel(&mut self, channel: impl Into<SourceChannel>, receiver: ChannelReceiver<U>) {
        let channel = channel.into();
        if self.queues.insert(channel.clone(), receiver).is_some() {
            warn!(channel = %channel, "Replaced an already registered channel");
        } else {
            debug!(channel = %channel, "Registered channel");
        }
    }

    pub fn channel_count(&self) -> usize {
        self.queues.len()
    }

    /// One non-blocking selection round.
    pub fn select_next(&mut self) -> Option<U> {
        let (unit, discarded) = select_with(
            &mut self.queues,
            &self.comparator,
            &mut self.ack_positions,
        );
        if discarded > 0 {
            self.metrics.increment_discarded(discarded);
        }
        if let Some(unit) = &unit {
            self.metrics.increment_units(1);
            self.metrics.increment_records(unit.records_count() as u64);
        }
        unit
    }

    /// Waits for the next unit, backing off while every queue is empty.
    ///
    /// Returns `None` once `cancel` fires or when every producer has hung up
    /// and all queues are drained.
    pub async fn next_unit(&mut self, cancel: &CancellationToken) -> Option<U> {
        loop {
            if cancel.is_cancelled() {
                debug!("Merge loop cancelled");
                return None;
            }

            if let Some(unit) = self.select_next() {
                self.backoff.reset();
                return Some(unit);
            }

            if self.is_finished() {
                debug!(channels = self.queues.len(), "All channels drained");
                return None;
            }

            let delay = self.backoff.next_delay();
            self.metrics.increment_idle_polls(1);
            trace!(delay_ms = delay.as_millis() as u64, "No pending units");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Merge loop cancelled while idle");
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Every channel is closed and empty.
    pub fn is_finished(&self) -> bool {
        self.queues.values().all(ChannelReceiver::is_finished)
    }

    pub fn ack_positions(&self) -> &AckPositions {
        &self.ack_positions
    }

    pub fn ack_position(&self, channel: &SourceChannel) -> Option<&Position> {
        self.ack_positions.get(channel)
    }

    pub fn metrics(&self) -> &MergeMetrics {
        &self.metrics
    }
}
