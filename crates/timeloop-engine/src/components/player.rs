use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::{Bounds, Obstacle};

/// The player always holds id 0; level entities are numbered from 1.
pub const PLAYER_ID: EntityId = EntityId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Held directions, driven by discrete press/release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Intent {
    /// Unit-less heading. Opposite keys cancel. Not normalized, so a diagonal
    /// moves at full speed on each axis like the arrow keys do.
    pub fn heading(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }

    pub fn is_idle(&self) -> bool {
        self.heading() == Vec2::ZERO
    }
}

/// Footprint of the held box, relative to the player's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarriedBody {
    pub offset: Vec2,
    pub width: u32,
    pub height: u32,
}

/// The carrier. Moves under intent and resolves collisions one axis at a time.
/// A held box travels with it and blocks the move like the player's own body.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: EntityId,
    /// Top-left corner in pixel space.
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: u32,
    pub height: u32,
    /// Pixels per second.
    pub speed: f32,
    intent: Intent,
    obstacles: Vec<Obstacle>,
    carried: Option<EntityId>,
    carried_body: Option<CarriedBody>,
    /// Play area in pixels; the player is clamped inside it.
    area: Vec2,
}

impl Player {
    pub fn new(width: u32, height: u32, speed: f32, area: Vec2) -> Self {
        Self {
            id: PLAYER_ID,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            width,
            height,
            speed,
            intent: Intent::default(),
            obstacles: Vec::new(),
            carried: None,
            carried_body: None,
            area,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size() / 2.0
    }

    pub fn collision_bounds(&self) -> Bounds {
        Bounds::collision(self.pos, self.width, self.height)
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn carried(&self) -> Option<EntityId> {
        self.carried
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Replace the obstacle list. Called every frame before `update`.
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
    }

    pub fn set_carried(&mut self, carried: Option<EntityId>) {
        self.carried = carried;
        if carried.is_none() {
            self.carried_body = None;
        }
    }

    /// Footprint of the held box. Refreshed every frame before `update`.
    pub fn set_carried_body(&mut self, body: Option<CarriedBody>) {
        self.carried_body = body.filter(|_| self.carried.is_some());
    }

    pub fn set_direction(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Left => self.intent.left = held,
            Direction::Right => self.intent.right = held,
            Direction::Up => self.intent.up = held,
            Direction::Down => self.intent.down = held,
        }
    }

    /// Drop all held directions and stop.
    pub fn freeze(&mut self) {
        self.intent = Intent::default();
        self.vel = Vec2::ZERO;
    }

    /// Teleport, e.g. to a level spawn or a rewind sample.
    pub fn place_at(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
    }

    pub fn set_area(&mut self, area: Vec2) {
        self.area = area;
    }

    fn blocked_at(&self, pos: Vec2) -> bool {
        let own = Bounds::collision(pos, self.width, self.height);
        let held = self
            .carried_body
            .map(|b| Bounds::collision(pos + b.offset, b.width, b.height));
        self.obstacles
            .iter()
            .filter(|o| o.id != self.id && Some(o.id) != self.carried)
            .any(|o| own.intersects(&o.bounds) || held.is_some_and(|h| h.intersects(&o.bounds)))
    }

    /// Move one tick. X then Y; a blocked axis keeps its previous coordinate.
    pub fn update(&mut self, dt: f32) {
        self.vel = self.intent.heading() * self.speed;
        let step = self.vel * dt;

        if step.x != 0.0 {
            let next = Vec2::new(self.pos.x + step.x, self.pos.y);
            if self.blocked_at(next) {
                self.vel.x = 0.0;
            } else {
                self.pos = next;
            }
        }
        if step.y != 0.0 {
            let next = Vec2::new(self.pos.x, self.pos.y + step.y);
            if self.blocked_at(next) {
                self.vel.y = 0.0;
            } else {
                self.pos = next;
            }
        }

        let max = (self.area - self.size()).max(Vec2::ZERO);
        self.pos = self.pos.clamp(Vec2::ZERO, max);
    }
}
