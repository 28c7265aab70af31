//! In-process refresh signals.
//!
//! Mutating actions and realtime pushes both funnel into one bus of typed
//! topics. Views subscribe to the topics they render; anything arriving
//! under an unknown wire topic is dropped at the boundary.

use tokio::sync::broadcast;

/// Closed set of refreshable surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Notifications,
    Invites,
    Friends,
    Activity,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Notifications,
        Topic::Invites,
        Topic::Friends,
        Topic::Activity,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Topic::Notifications => "notifications",
            Topic::Invites => "invites",
            Topic::Friends => "friends",
            Topic::Activity => "activity",
        }
    }

    /// Maps a wire topic onto the closed set. Unknown strings are `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.as_str() == raw)
    }
}

#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Topic>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Topic> {
        self.tx.subscribe()
    }

    /// Fire and forget. A bus with no subscribers swallows the signal.
    pub fn publish(&self, topic: Topic) {
        let delivered = self.tx.send(topic).unwrap_or(0);
        tracing::trace!(topic = topic.as_str(), delivered, "refresh signal");
    }

    /// Publishes a wire topic if it maps onto the closed set. Returns false
    /// when the topic is unknown and the signal was dropped.
    pub fn publish_raw(&self, raw: &str) -> bool {
        match Topic::parse(raw) {
            Some(topic) => {
                self.publish(topic);
                true
            }
            None => false,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_each_receive_the_signal() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(Topic::Friends);

        assert_eq!(first.recv().await.unwrap(), Topic::Friends);
        assert_eq!(second.recv().await.unwrap(), Topic::Friends);
    }

    #[tokio::test]
    async fn unknown_wire_topics_are_dropped() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        assert!(!bus.publish_raw("presence"));
        assert!(bus.publish_raw("activity"));

        assert_eq!(rx.recv().await.unwrap(), Topic::Activity);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(Topic::Invites);
    }
}
