//! Agent event queue
//!
//! Double-buffered notifications from the AI core to external subscribers
//! (animation, scoring, despawn). Events pushed during tick N become
//! readable during tick N+1, so consumers never observe a half-finished
//! tick.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

/// Notifications emitted by the behavior core.
///
/// `#[non_exhaustive]` so new variants can be added without breaking
/// downstream wildcard matches.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AgentEvent {
    /// An agent took damage.
    Damaged {
        /// The agent that was damaged
        entity: Entity,
        /// Amount of damage applied
        amount: f32,
        /// Attacker, if any
        source: Option<Entity>,
    },

    /// An agent's health crossed zero. Fired exactly once per agent.
    Died {
        /// The agent that died
        entity: Entity,
        /// Source of the killing blow, if known
        killer: Option<Entity>,
    },

    /// An agent acquired a new pursuit target.
    TargetAcquired {
        /// The observing agent
        entity: Entity,
        /// The detected target
        target: Entity,
    },

    /// An agent gave up on a destination after exhausting stuck recovery.
    DestinationAbandoned {
        /// The stuck agent
        entity: Entity,
        /// The destination that was abandoned
        destination: Vec3,
    },
}

/// Double-buffered queue of [`AgentEvent`]s.
///
/// Call [`EventQueue::swap`] once per tick; `iter` then yields the previous
/// tick's events while `push` writes into the next batch.
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<AgentEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<AgentEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(Self::DEFAULT_CAPACITY),
            processing: VecDeque::with_capacity(Self::DEFAULT_CAPACITY),
        }
    }

    /// Queue an event for the next tick's consumers
    #[inline]
    pub fn push(&mut self, event: AgentEvent) {
        self.pending.push_back(event);
    }

    /// Swap buffers at the tick boundary
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate the previous tick's events
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AgentEvent> {
        self.processing.iter()
    }

    /// Drain the previous tick's events, taking ownership
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = AgentEvent> + '_ {
        self.processing.drain(..)
    }

    /// Number of events ready for processing
    #[must_use]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Whether no events are ready for processing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Drop all events, pending and processing
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        hecs::World::new().spawn(())
    }

    #[test]
    fn test_events_visible_after_swap() {
        let mut queue = EventQueue::new();
        queue.push(AgentEvent::Died {
            entity: entity(),
            killer: None,
        });

        // Not visible until the tick boundary
        assert!(queue.is_empty());

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            queue.iter().next(),
            Some(AgentEvent::Died { .. })
        ));
    }

    #[test]
    fn test_swap_discards_consumed_events() {
        let mut queue = EventQueue::new();
        queue.push(AgentEvent::TargetAcquired {
            entity: entity(),
            target: entity(),
        });
        queue.swap();
        assert_eq!(queue.len(), 1);

        queue.swap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_during_processing_lands_next_tick() {
        let mut queue = EventQueue::new();
        queue.push(AgentEvent::Damaged {
            entity: entity(),
            amount: 5.0,
            source: None,
        });
        queue.swap();

        // Reaction pushed while consuming
        queue.push(AgentEvent::Died {
            entity: entity(),
            killer: None,
        });
        assert_eq!(queue.len(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            queue.iter().next(),
            Some(AgentEvent::Died { .. })
        ));
    }
}
