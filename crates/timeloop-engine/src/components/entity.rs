use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::button::ButtonComponent;
use crate::components::carry::CarryComponent;

/// Collision bounds are this fraction of the full bounds, centered.
pub const COLLISION_SHRINK: f32 = 0.9;

/// Integer axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Full bounds of a body whose top-left corner is `pos`.
    pub fn full(pos: Vec2, width: u32, height: u32) -> Self {
        Self::new(pos.x as i32, pos.y as i32, width as i32, height as i32)
    }

    /// Shrunken bounds used for collision, so touching neighbours in adjacent
    /// grid cells never register as overlapping.
    pub fn collision(pos: Vec2, width: u32, height: u32) -> Self {
        let cw = (width as f32 * COLLISION_SHRINK) as i32;
        let ch = (height as f32 * COLLISION_SHRINK) as i32;
        let x = pos.x as i32 + (width as i32 - cw) / 2;
        let y = pos.y as i32 + (height as i32 - ch) / 2;
        Self::new(x, y, cw, ch)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A solid thing the player (or a rewinding box) cannot pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub id: EntityId,
    pub bounds: Bounds,
}

/// What an entity can do. Replaces a class hierarchy: each variant carries
/// exactly the state its behaviour needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// Walls and other solid scenery.
    Static,
    /// A box that can be picked up and may take part in rewinds.
    Carryable(CarryComponent),
    /// A button wired to the trigger graph.
    Triggerable(ButtonComponent),
    /// A door body. Open/closed state lives in the `DoorController` under `door_id`.
    Openable { door_id: String },
}

/// Fat Entity: a single flat record plus a capability variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding entities by name.
    pub tag: String,
    /// Whether this entity is active (inactive entities are skipped).
    pub active: bool,
    /// Top-left corner in pixel space.
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: u32,
    pub height: u32,
    pub capability: Capability,
}

impl Entity {
    /// Create a new static entity with the given ID and size at the origin.
    pub fn new(id: EntityId, width: u32, height: u32) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            width,
            height,
            capability: Capability::Static,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    // -- Geometry --

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size() / 2.0
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::full(self.pos, self.width, self.height)
    }

    pub fn collision_bounds(&self) -> Bounds {
        Bounds::collision(self.pos, self.width, self.height)
    }

    pub fn obstacle(&self) -> Obstacle {
        Obstacle {
            id: self.id,
            bounds: self.collision_bounds(),
        }
    }

    /// Write the position unless a carry is holding it.
    /// A carried box only accepts direct writes while playback drives it.
    pub fn set_pos(&mut self, pos: Vec2) -> bool {
        if let Capability::Carryable(carry) = &self.capability {
            if carry.is_carried() && !carry.rewinding {
                return false;
            }
        }
        self.pos = pos;
        true
    }

    /// Collision test against another body. A carried box never collides
    /// with its own carrier, in either direction.
    pub fn collides_with_body(&self, other_id: EntityId, other_bounds: &Bounds) -> bool {
        if other_id == self.id {
            return false;
        }
        if let Some(carry) = self.carry() {
            if carry.carrier() == Some(other_id) {
                return false;
            }
        }
        self.collision_bounds().intersects(other_bounds)
    }

    pub fn collides_with(&self, other: &Entity) -> bool {
        if let Some(carry) = other.carry() {
            if carry.carrier() == Some(self.id) {
                return false;
            }
        }
        self.collides_with_body(other.id, &other.collision_bounds())
    }

    // -- Capability access --

    pub fn is_static(&self) -> bool {
        matches!(self.capability, Capability::Static)
    }

    pub fn carry(&self) -> Option<&CarryComponent> {
        match &self.capability {
            Capability::Carryable(carry) => Some(carry),
            _ => None,
        }
    }

    pub fn carry_mut(&mut self) -> Option<&mut CarryComponent> {
        match &mut self.capability {
            Capability::Carryable(carry) => Some(carry),
            _ => None,
        }
    }

    pub fn button(&self) -> Option<&ButtonComponent> {
        match &self.capability {
            Capability::Triggerable(button) => Some(button),
            _ => None,
        }
    }

    pub fn button_mut(&mut self) -> Option<&mut ButtonComponent> {
        match &mut self.capability {
            Capability::Triggerable(button) => Some(button),
            _ => None,
        }
    }

    pub fn door_id(&self) -> Option<&str> {
        match &self.capability {
            Capability::Openable { door_id } => Some(door_id),
            _ => None,
        }
    }
}
