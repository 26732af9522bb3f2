//! # Session event bus.
//!
//! Every session owns one [`Bus`]. The affinity thread (cycle start/stop), the
//! completion watcher (work outcome), the stop hook and subscriber workers all
//! publish into it; the session's listener and any caller of
//! [`Session::subscribe`](crate::Session::subscribe) read from it.
//!
//! Publishing never blocks the affinity thread. Events published while nobody
//! listens are gone; a receiver that falls more than `capacity` events behind
//! skips the oldest ones (`RecvError::Lagged`).

use tokio::sync::broadcast;

use super::event::Event;

/// Fire-and-forget broadcast of [`Event`]s. Clones share the channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining at most `capacity` undelivered events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev` to current receivers.
    pub fn publish(&self, ev: Event) {
        // Err only means no receiver is attached.
        let _ = self.tx.send(ev);
    }

    /// A receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_receiver_sees_only_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::StopRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::CycleStarting).with_cycle(1));

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::CycleStarting);
        assert_eq!(ev.cycle, Some(1));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for cycle in 1..=3 {
            bus.publish(Event::new(EventKind::CycleStarting).with_cycle(cycle));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().cycle, Some(2));
        assert_eq!(rx.recv().await.unwrap().cycle, Some(3));
    }
}
