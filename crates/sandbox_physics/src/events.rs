//! Contact event collection.

use bevy::prelude::*;
use rapier3d::crossbeam::channel::{unbounded, Receiver};
use rapier3d::prelude as rapier;
use rapier::{ChannelEventCollector, CollisionEvent, RigidBodyHandle};

use crate::collision::CollisionCategory;

/// A new contact between two categorized bodies.
///
/// Emitted once per contact start, after the physics step that produced it.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ContactStarted {
    pub body_a: RigidBodyHandle,
    pub category_a: CollisionCategory,
    pub body_b: RigidBodyHandle,
    pub category_b: CollisionCategory,
}

/// Rapier's channel collector plus the receiving end of its collision
/// channel. Contact force events are not requested by any collider.
pub struct ContactChannel {
    pub collector: ChannelEventCollector,
    pub collision_events: Receiver<CollisionEvent>,
}

impl ContactChannel {
    pub fn new() -> Self {
        let (collision_send, collision_events) = unbounded();
        let (contact_force_send, _) = unbounded();
        Self {
            collector: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_events,
        }
    }
}

impl Default for ContactChannel {
    fn default() -> Self {
        Self::new()
    }
}
