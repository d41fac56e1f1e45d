use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;

/// Stream handed to a watcher: retained events first, then live ones.
pub type TurnStream<T> = UnboundedReceiver<T>;

/// Append-only event log with live fan-out.
///
/// Events are numbered from 1 in publish order. Catch-up and registration of a
/// new subscriber happen under the same lock as publishing, so every stream
/// sees a contiguous run of events with no gaps and no repeats.
pub struct TurnBroadcaster<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    log: Vec<T>,
    subscribers: Vec<UnboundedSender<T>>,
}

impl<T: Clone> Default for TurnBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TurnBroadcaster<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                log: Vec::new(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Builds the next event from its sequence number, appends it and pushes it out.
    ///
    /// Never blocks on subscribers. Ones that went away are dropped.
    pub fn publish_with(&self, make_event: impl FnOnce(u32) -> T) -> u32 {
        let mut inner = self.inner.lock();
        let seq = inner.log.len() as u32 + 1;
        let event = make_event(seq);

        inner
            .subscribers
            .retain(|subscriber| subscriber.unbounded_send(event.clone()).is_ok());
        inner.log.push(event);
        seq
    }

    pub fn publish(&self, event: T) -> u32 {
        self.publish_with(|_| event)
    }

    /// Subscribes to every event after sequence number `from`.
    pub fn subscribe(&self, from: u32) -> TurnStream<T> {
        let mut inner = self.inner.lock();
        let (sender, receiver) = mpsc::unbounded();

        for event in inner.log.iter().skip(from as usize) {
            // receiver is still in hand, cannot be disconnected yet
            let _ = sender.unbounded_send(event.clone());
        }
        inner.subscribers.push(sender);
        receiver
    }

    /// Events after `from` that are already retained.
    pub fn replay(&self, from: u32) -> Vec<T> {
        let inner = self.inner.lock();
        inner.log.iter().skip(from as usize).cloned().collect()
    }

    pub fn latest(&self) -> Option<T> {
        self.inner.lock().log.last().cloned()
    }

    pub fn len(&self) -> u32 {
        self.inner.lock().log.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().log.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Ends every live stream. The log stays available for replay.
    pub fn close(&self) {
        self.inner.lock().subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn drain(stream: &mut TurnStream<u32>) -> Vec<u32> {
        let mut events = Vec::new();
        while let Ok(event) = stream.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn live_subscribers_get_events_in_order() {
        let broadcaster = TurnBroadcaster::new();
        let mut stream = broadcaster.subscribe(0);

        for seq in 1..=3 {
            assert_eq!(broadcaster.publish_with(|n| n * 10), seq);
        }

        assert_eq!(drain(&mut stream), [10, 20, 30]);
    }

    #[test]
    fn late_subscriber_catches_up_then_goes_live() {
        let broadcaster = TurnBroadcaster::new();
        for n in 1..=4 {
            broadcaster.publish(n);
        }

        let mut stream = broadcaster.subscribe(2);
        assert_eq!(drain(&mut stream), [3, 4]);

        broadcaster.publish(5);
        assert_eq!(drain(&mut stream), [5]);
    }

    #[test]
    fn subscribing_past_the_end_only_gets_new_events() {
        let broadcaster = TurnBroadcaster::new();
        broadcaster.publish(1);

        let mut stream = broadcaster.subscribe(10);
        assert!(drain(&mut stream).is_empty());

        broadcaster.publish(2);
        assert_eq!(drain(&mut stream), [2]);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let broadcaster = TurnBroadcaster::new();
        let kept = broadcaster.subscribe(0);
        drop(broadcaster.subscribe(0));
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.publish(1);

        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(kept);
    }

    #[test]
    fn close_ends_streams_but_keeps_log() {
        let broadcaster = TurnBroadcaster::new();
        let mut stream = broadcaster.subscribe(0);
        broadcaster.publish(1);

        broadcaster.close();

        let events = futures_executor::block_on(stream.by_ref().collect::<Vec<_>>());
        assert_eq!(events, [1]);
        assert_eq!(broadcaster.replay(0), [1]);
        assert_eq!(broadcaster.latest(), Some(1));
    }
}
