//! Topic-based event bus implementation.

use ability_core::AbilityEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::TickEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Instance lifecycle and target ownership changes
    Ability,
    /// Scheduler passes
    Tick,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Ability(AbilityEvent),
    Tick(TickEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Ability(_) => Topic::Ability,
            Event::Tick(_) => Topic::Tick,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; slow subscribers lag.
#[derive(Debug, Clone)]
pub struct EventBus {
    ability: broadcast::Sender<Event>,
    tick: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ability: broadcast::channel(capacity).0,
            tick: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Ability => &self.ability,
            Topic::Tick => &self.tick,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{AbilityKind, EntityId};

    #[test]
    fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut ability_rx = bus.subscribe(Topic::Ability);
        let mut tick_rx = bus.subscribe(Topic::Tick);

        bus.publish(Event::Ability(AbilityEvent::Deactivated {
            actor: EntityId(1),
            kind: AbilityKind::Bloodbending,
        }));

        assert!(matches!(ability_rx.try_recv(), Ok(Event::Ability(_))));
        assert!(tick_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(Event::Tick(TickEvent {
            tick: 1,
            now: 50,
            live: 0,
            terminated: 0,
        }));
    }
}
