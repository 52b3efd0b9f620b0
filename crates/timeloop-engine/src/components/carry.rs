//! Carryable boxes.
//!
//! A box is an [`Entity`] with [`Capability::Carryable`]. Carry operations live
//! here as methods on `Entity` because they need both the carry state and the
//! box's own geometry.

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::{Capability, Entity, Obstacle};

/// Whether a box is resting or riding on a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CarryState {
    #[default]
    Free,
    /// `offset` is box center minus carrier center, frozen at pickup.
    /// `carrier` is `None` when playback re-attached the box.
    Carried {
        carrier: Option<EntityId>,
        offset: Vec2,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarryComponent {
    pub state: CarryState,
    /// Takes part in rewinds at all.
    pub rewind_tracked: bool,
    /// Can be picked up.
    pub movable: bool,
    /// Record every position, not just pickups and drops.
    pub full_rewind_tracking: bool,
    /// Currently driven by rewind playback.
    pub rewinding: bool,
}

impl CarryComponent {
    pub fn new(rewind_tracked: bool, movable: bool) -> Self {
        Self {
            state: CarryState::Free,
            rewind_tracked,
            movable,
            full_rewind_tracking: false,
            rewinding: false,
        }
    }

    pub fn with_full_rewind_tracking(mut self, full: bool) -> Self {
        self.full_rewind_tracking = full;
        self
    }

    pub fn is_carried(&self) -> bool {
        matches!(self.state, CarryState::Carried { .. })
    }

    pub fn carrier(&self) -> Option<EntityId> {
        match self.state {
            CarryState::Carried { carrier, .. } => carrier,
            CarryState::Free => None,
        }
    }

    /// Offset from carrier center to box center. Only meaningful while carried.
    pub fn offset(&self) -> Option<Vec2> {
        match self.state {
            CarryState::Carried { offset, .. } => Some(offset),
            CarryState::Free => None,
        }
    }
}

impl Entity {
    /// Build a box entity.
    pub fn new_box(id: EntityId, width: u32, height: u32, carry: CarryComponent) -> Self {
        Entity::new(id, width, height).with_capability(Capability::Carryable(carry))
    }

    pub fn is_box(&self) -> bool {
        self.carry().is_some()
    }

    pub fn is_carried(&self) -> bool {
        self.carry().is_some_and(CarryComponent::is_carried)
    }

    /// Pick the box up, freezing its center-to-center offset from the carrier.
    ///
    /// A live pickup (`carrier` is `Some`) takes the box away from rewind
    /// playback. A carrier-less pickup is a recorded action and is only
    /// accepted while the box is rewinding. Returns false without side
    /// effects if the box is immovable or already carried.
    pub fn pick_up(&mut self, carrier_center: Vec2, carrier: Option<EntityId>) -> bool {
        let center = self.center();
        let id = self.id;
        let Some(carry) = self.carry_mut() else {
            return false;
        };
        if !carry.movable || carry.is_carried() {
            return false;
        }
        match carrier {
            Some(_) if carry.rewinding => {
                carry.rewinding = false;
                log::debug!("box {:?}: rewind cancelled by live pickup", id);
            }
            None if !carry.rewinding => return false,
            _ => {}
        }

        let offset = center - carrier_center;
        carry.state = CarryState::Carried { carrier, offset };
        log::debug!("box {:?} picked up, offset {:?}", id, offset);
        true
    }

    /// Re-center the box on its carrier. Must run after the carrier has moved
    /// this frame, otherwise the box trails one frame behind.
    pub fn update_carried_position(&mut self, carrier_center: Vec2) {
        let Some(offset) = self.carry().and_then(CarryComponent::offset) else {
            return;
        };
        let center = carrier_center + offset;
        self.pos = center - self.size() / 2.0;
    }

    /// Release the box where it is. No grid snapping.
    pub fn drop_carried(&mut self) -> bool {
        let id = self.id;
        let pos = self.pos;
        let Some(carry) = self.carry_mut() else {
            return false;
        };
        if !carry.is_carried() {
            return false;
        }
        carry.state = CarryState::Free;
        log::debug!("box {:?} dropped at {:?}", id, pos);
        true
    }

    /// Recording stopped while the box was held: drop it where it is.
    pub fn handle_recording_end(&mut self) {
        if self.is_carried() {
            log::info!("box {:?}: recording ended while held, dropping", self.id);
            self.drop_carried();
        }
    }

    pub fn set_rewinding(&mut self, rewinding: bool) {
        if let Some(carry) = self.carry_mut() {
            carry.rewinding = rewinding;
        }
    }

    /// Would this box, where it stands now, overlap any obstacle other than
    /// itself or its carrier?
    pub fn collides_with_any(&self, obstacles: &[Obstacle]) -> bool {
        obstacles
            .iter()
            .any(|o| self.collides_with_body(o.id, &o.bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::Bounds;

    const PLAYER: EntityId = EntityId(0);

    fn test_box(movable: bool) -> Entity {
        Entity::new_box(EntityId(7), 32, 32, CarryComponent::new(true, movable))
            .with_pos(Vec2::new(100.0, 100.0))
    }

    #[test]
    fn pickup_freezes_center_offset() {
        let mut b = test_box(true);
        assert!(b.pick_up(Vec2::new(90.0, 116.0), Some(PLAYER)));
        // Box center (116, 116) minus carrier center (90, 116)
        assert_eq!(b.carry().unwrap().offset(), Some(Vec2::new(26.0, 0.0)));
        assert_eq!(b.carry().unwrap().carrier(), Some(PLAYER));
    }

    #[test]
    fn immovable_or_held_box_cannot_be_picked_up() {
        let mut fixed = test_box(false);
        assert!(!fixed.pick_up(Vec2::ZERO, Some(PLAYER)));
        assert!(!fixed.is_carried());

        let mut b = test_box(true);
        assert!(b.pick_up(Vec2::ZERO, Some(PLAYER)));
        let before = b.clone();
        assert!(!b.pick_up(Vec2::new(5.0, 5.0), Some(EntityId(9))));
        assert_eq!(b, before);
    }

    #[test]
    fn carrierless_pickup_requires_rewinding() {
        let mut b = test_box(true);
        assert!(!b.pick_up(Vec2::ZERO, None));

        b.set_rewinding(true);
        assert!(b.pick_up(Vec2::ZERO, None));
        assert!(b.is_carried());
        assert_eq!(b.carry().unwrap().carrier(), None);
    }

    #[test]
    fn live_pickup_cancels_box_rewind() {
        let mut b = test_box(true);
        b.set_rewinding(true);
        assert!(b.pick_up(Vec2::ZERO, Some(PLAYER)));
        assert!(!b.carry().unwrap().rewinding);
    }

    #[test]
    fn pickup_drop_round_trip_has_no_drift() {
        for &(px, py) in &[(0.0, 0.0), (13.5, -7.25), (640.0, 480.0), (-100.0, 33.3)] {
            let mut b = test_box(true);
            assert!(b.pick_up(Vec2::new(80.0, 90.0), Some(PLAYER)));
            let offset = b.carry().unwrap().offset().unwrap();

            b.update_carried_position(Vec2::new(px, py));
            assert!(b.drop_carried());

            let expected = Vec2::new(px + offset.x - 32.0 / 2.0, py + offset.y - 32.0 / 2.0);
            assert_eq!(b.pos, expected);
            assert!(!b.is_carried());
        }
    }

    #[test]
    fn direct_writes_blocked_while_carried_unless_rewinding() {
        let mut b = test_box(true);
        assert!(b.pick_up(Vec2::ZERO, Some(PLAYER)));
        assert!(!b.set_pos(Vec2::new(1.0, 1.0)));
        assert_eq!(b.pos, Vec2::new(100.0, 100.0));

        b.set_rewinding(true);
        assert!(b.set_pos(Vec2::new(1.0, 1.0)));
        assert_eq!(b.pos, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn carried_box_ignores_only_its_carrier() {
        let mut b = test_box(true);
        let overlapping = Bounds::collision(Vec2::new(104.0, 100.0), 32, 32);
        assert!(b.collides_with_body(PLAYER, &overlapping));

        assert!(b.pick_up(Vec2::new(116.0, 116.0), Some(PLAYER)));
        assert!(!b.collides_with_body(PLAYER, &overlapping));
        assert!(b.collides_with_body(EntityId(3), &overlapping));
    }

    #[test]
    fn drop_when_free_is_noop() {
        let mut b = test_box(true);
        assert!(!b.drop_carried());
        b.handle_recording_end();
        assert_eq!(b.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn recording_end_drops_held_box() {
        let mut b = test_box(true);
        assert!(b.pick_up(Vec2::ZERO, Some(PLAYER)));
        b.handle_recording_end();
        assert!(!b.is_carried());
    }
}
