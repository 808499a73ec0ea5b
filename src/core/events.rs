use crate::core::{BodyHandle, ContactPoint};
use std::collections::VecDeque;

/// Types of collision events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventType {
    /// An arbiter was created for the pair
    Begin,

    /// The pair's arbiter lost its last contact and was removed
    End,

    /// A brand-new contact point was added to the pair's manifold
    ContactCreated,
}

/// A collision event between two bodies
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    /// The type of collision event
    pub event_type: CollisionEventType,

    /// The first body in the collision
    pub body_a: BodyHandle,

    /// The second body in the collision
    pub body_b: BodyHandle,

    /// The contact involved (absent for `End`)
    pub contact: Option<ContactPoint>,
}

/// Types of body events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventType {
    /// A body has been added to the world
    Added,

    /// A body has been removed from the world
    Removed,

    /// A body's island went to sleep
    Deactivated,

    /// A body's island was woken up
    Activated,
}

/// An event related to a single body
#[derive(Debug, Clone)]
pub struct BodyEvent {
    /// The type of body event
    pub event_type: BodyEventType,

    /// The body that the event refers to
    pub body: BodyHandle,
}

/// A queue of physics events, filled by [`World::step`](crate::core::World::step)
#[derive(Debug, Default)]
pub struct EventQueue {
    collision_events: VecDeque<CollisionEvent>,
    body_events: VecDeque<BodyEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collision event to the queue
    pub fn add_collision_event(&mut self, event: CollisionEvent) {
        self.collision_events.push_back(event);
    }

    /// Adds a body event to the queue
    pub fn add_body_event(&mut self, event: BodyEvent) {
        self.body_events.push_back(event);
    }

    pub(crate) fn body(&mut self, event_type: BodyEventType, body: BodyHandle) {
        self.add_body_event(BodyEvent { event_type, body });
    }

    pub(crate) fn collision(
        &mut self,
        event_type: CollisionEventType,
        body_a: BodyHandle,
        body_b: BodyHandle,
        contact: Option<ContactPoint>,
    ) {
        self.add_collision_event(CollisionEvent { event_type, body_a, body_b, contact });
    }

    /// Gets the next collision event from the queue
    pub fn next_collision_event(&mut self) -> Option<CollisionEvent> {
        self.collision_events.pop_front()
    }

    /// Gets the next body event from the queue
    pub fn next_body_event(&mut self) -> Option<BodyEvent> {
        self.body_events.pop_front()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.collision_events.is_empty() && self.body_events.is_empty()
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.collision_events.clear();
        self.body_events.clear();
    }

    /// Gets all collision events of a specific type
    pub fn get_collision_events_of_type(&self, event_type: CollisionEventType) -> Vec<&CollisionEvent> {
        self.collision_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Gets all body events of a specific type
    pub fn get_body_events_of_type(&self, event_type: BodyEventType) -> Vec<&BodyEvent> {
        self.body_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Gets all collision events involving a specific body
    pub fn get_collision_events_for_body(&self, body: BodyHandle) -> Vec<&CollisionEvent> {
        self.collision_events
            .iter()
            .filter(|e| e.body_a == body || e.body_b == body)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_pop_in_order() {
        let mut queue = EventQueue::new();
        let (a, b) = (BodyHandle(0), BodyHandle(1));
        queue.body(BodyEventType::Added, a);
        queue.body(BodyEventType::Deactivated, a);
        queue.collision(CollisionEventType::Begin, a, b, None);
        queue.collision(CollisionEventType::End, b, a, None);

        assert_eq!(queue.get_collision_events_for_body(b).len(), 2);
        assert_eq!(queue.next_body_event().map(|e| e.event_type), Some(BodyEventType::Added));
        assert_eq!(
            queue.next_collision_event().map(|e| e.event_type),
            Some(CollisionEventType::Begin)
        );
        assert!(!queue.is_empty());

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.next_body_event().is_none());
    }
}
