//! Analysis event side-channel
//!
//! Observers subscribe for structured notifications emitted while an
//! analysis runs. Emission never blocks, and analysis output is identical
//! whether anyone is listening or not.

use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::types::{FundingAnalysisResult, FundingSource};

/// Notification emitted during funding analysis
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// A funding source was classified as a known exchange
    ExchangeDetected(FundingSource),
    /// A funding source was classified as a mixer or privacy protocol
    MixerDetected(FundingSource),
    /// Full analysis finished
    AnalysisComplete(FundingAnalysisResult),
}

/// Fan-out of tracker events to any number of observers
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Mutex<Vec<mpsc::UnboundedSender<TrackerEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer and return its receiving end
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut senders = self.senders.lock().unwrap_or_else(|p| p.into_inner());
        senders.push(tx);
        rx
    }

    /// Deliver an event to every live observer, dropping closed ones
    pub fn emit(&self, event: TrackerEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(|p| p.into_inner());
        if senders.is_empty() {
            return;
        }
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of attached observers
    pub fn observer_count(&self) -> usize {
        self.senders.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityType;

    fn sample_source() -> FundingSource {
        FundingSource {
            address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            name: "Binance".to_string(),
            entity_type: EntityType::Cex,
            total_value_raw: 100,
            transfer_count: 1,
            depth: 0,
            is_sanctioned: false,
        }
    }

    #[test]
    fn test_all_observers_receive_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(TrackerEvent::ExchangeDetected(sample_source()));

        assert!(matches!(
            first.try_recv(),
            Ok(TrackerEvent::ExchangeDetected(_))
        ));
        assert!(matches!(
            second.try_recv(),
            Ok(TrackerEvent::ExchangeDetected(_))
        ));
    }

    #[test]
    fn test_events_arrive_in_emission_order() {
        let bus = EventBus::new();
        let mut observer = bus.subscribe();

        bus.emit(TrackerEvent::ExchangeDetected(sample_source()));
        bus.emit(TrackerEvent::MixerDetected(sample_source()));

        tokio_test::block_on(async {
            assert!(matches!(
                observer.recv().await,
                Some(TrackerEvent::ExchangeDetected(_))
            ));
            assert!(matches!(
                observer.recv().await,
                Some(TrackerEvent::MixerDetected(_))
            ));
        });
    }

    #[test]
    fn test_emit_without_observers_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit(TrackerEvent::MixerDetected(sample_source()));
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_closed_observers_are_pruned() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.observer_count(), 2);

        drop(first);
        bus.emit(TrackerEvent::MixerDetected(sample_source()));

        assert_eq!(bus.observer_count(), 1);
        assert!(matches!(
            second.try_recv(),
            Ok(TrackerEvent::MixerDetected(_))
        ));
    }
}
