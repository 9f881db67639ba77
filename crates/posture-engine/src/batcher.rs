//! Fixed-size batching of enriched events

use posture_core::{Batch, Deliver, DeliveryReport, EnrichedEvent};
use tracing::debug;

/// Accumulates events and hands each full batch to the delivery channel
pub struct Batcher<'a> {
    batch_size: usize,
    execution_id: String,
    current: Vec<EnrichedEvent>,
    channel: &'a dyn Deliver,
}

impl<'a> Batcher<'a> {
    /// `batch_size` must be greater than zero
    pub fn new(batch_size: usize, execution_id: impl Into<String>, channel: &'a dyn Deliver) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            execution_id: execution_id.into(),
            current: Vec::new(),
            channel,
        }
    }

    /// Append an event, delivering the batch once it is full
    pub fn push(&mut self, event: EnrichedEvent) -> Option<DeliveryReport> {
        self.current.push(event);
        if self.current.len() >= self.batch_size {
            self.flush()
        } else {
            None
        }
    }

    /// Deliver whatever is buffered; no-op when empty
    pub fn flush(&mut self) -> Option<DeliveryReport> {
        if self.current.is_empty() {
            return None;
        }

        let events = std::mem::take(&mut self.current);
        debug!("Flushing batch of {} events", events.len());
        Some(self.channel.deliver(Batch {
            execution_id: self.execution_id.clone(),
            events,
        }))
    }

    /// Number of buffered, undelivered events
    pub fn pending(&self) -> usize {
        self.current.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use posture_core::{Classifications, SinkOutcome, EVENT_TYPE};
    use std::sync::Mutex;

    /// Records every batch it receives
    #[derive(Default)]
    pub(crate) struct RecordingChannel {
        pub(crate) batches: Mutex<Vec<Batch>>,
    }

    impl RecordingChannel {
        pub(crate) fn sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Batch::len).collect()
        }

        pub(crate) fn items(&self) -> Vec<String> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flat_map(|b| b.events.iter().map(|e| e.item.clone()))
                .collect()
        }
    }

    impl Deliver for RecordingChannel {
        fn deliver(&self, batch: Batch) -> DeliveryReport {
            let report = DeliveryReport {
                batch_size: batch.len(),
                elapsed_ms: 0,
                structured: SinkOutcome::Delivered,
                logs: None,
            };
            self.batches.lock().unwrap().push(batch);
            report
        }
    }

    pub(crate) fn event(item: &str) -> EnrichedEvent {
        let now = Utc::now();
        EnrichedEvent {
            event_type: EVENT_TYPE,
            service: "gke".to_string(),
            provider: "gcp".to_string(),
            test_id: "run".to_string(),
            test_start_time: now,
            test_end_time: now,
            timestamp: 1_700_000_000_000.0,
            item: item.to_string(),
            item_type: "gke_cluster".to_string(),
            test_name: "t".to_string(),
            test_result: "issue_found".to_string(),
            classifications: Classifications::new(),
            additional_data: Default::default(),
        }
    }

    #[test]
    fn test_full_batches_and_final_partial() {
        let channel = RecordingChannel::default();
        let batch_size = 10;
        let mut batcher = Batcher::new(batch_size, "exec", &channel);

        let delivered = (0..3 * batch_size + 2)
            .filter_map(|i| batcher.push(event(&i.to_string())))
            .count();
        assert_eq!(delivered, 3);
        assert_eq!(batcher.pending(), 2);

        assert!(batcher.flush().is_some());
        assert_eq!(channel.sizes(), vec![10, 10, 10, 2]);
    }

    #[test]
    fn test_order_is_preserved() {
        let channel = RecordingChannel::default();
        let mut batcher = Batcher::new(3, "exec", &channel);
        for i in 0..7 {
            batcher.push(event(&i.to_string()));
        }
        batcher.flush();
        assert_eq!(channel.items(), vec!["0", "1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_flush_of_empty_batch_is_noop() {
        let channel = RecordingChannel::default();
        let mut batcher = Batcher::new(2, "exec", &channel);
        assert!(batcher.flush().is_none());
        batcher.push(event("a"));
        batcher.push(event("b"));
        assert!(batcher.flush().is_none());
        assert_eq!(channel.sizes(), vec![2]);
    }

    #[test]
    fn test_batches_carry_execution_id() {
        let channel = RecordingChannel::default();
        let mut batcher = Batcher::new(1, "2024-01-01_abc", &channel);
        batcher.push(event("a"));
        assert_eq!(channel.batches.lock().unwrap()[0].execution_id, "2024-01-01_abc");
    }

    #[test]
    fn test_huge_batch_size_only_counts() {
        let channel = RecordingChannel::default();
        let mut batcher = Batcher::new(usize::MAX, "exec", &channel);
        assert!(batcher.push(event("a")).is_none());
        assert_eq!(batcher.pending(), 1);

        let report = batcher.flush().unwrap();
        assert_eq!(report.batch_size, 1);
        assert_eq!(channel.sizes(), vec![1]);
        assert_eq!(batcher.pending(), 0);
    }
}
