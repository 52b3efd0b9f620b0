use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;

use crate::api::game::GameConfig;
use crate::api::types::EntityId;
use crate::components::button::ButtonComponent;
use crate::components::carry::CarryComponent;
use crate::components::door::{Door, DoorController};
use crate::components::entity::{Entity, Obstacle};
use crate::core::grid::Grid;
use crate::systems::triggers::{Action, TriggerGraph};

/// One loaded level: the grid, a flat entity store, and the door/trigger
/// wiring between its buttons and doors.
#[derive(Debug, Clone)]
pub struct Level {
    pub index: u32,
    grid: Grid,
    entities: Vec<Entity>,
    pub doors: DoorController,
    pub triggers: TriggerGraph,
    /// Level ids start at 1; 0 is the player.
    next_id: u32,
    spawn: (i32, i32),
    /// Door id → level that door leads to.
    exits: BTreeMap<String, u32>,
}

impl Level {
    pub fn new(index: u32, config: &GameConfig) -> Self {
        Self {
            index,
            grid: Grid::new(config.screen_width, config.screen_height, config.cell_size),
            entities: Vec::with_capacity(256),
            doors: DoorController::new(),
            triggers: TriggerGraph::new(),
            next_id: 1,
            spawn: (0, 0),
            exits: BTreeMap::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell_size(&self) -> u32 {
        self.grid.cell_size()
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // -- Construction --

    /// Place `entity` with its top-left in cell (x, y). Bodies larger than a
    /// cell occupy every cell they cover. Its id is replaced by a fresh level
    /// id. Returns `None`, changing nothing, if any covered cell is taken or
    /// outside the grid.
    pub fn add_entity(&mut self, mut entity: Entity, x: i32, y: i32) -> Option<EntityId> {
        let (w, h) = self.grid.cells_for(entity.width, entity.height);
        if !self.grid.is_span_free(x, y, w, h) {
            log::debug!("level {}: cells at ({}, {}) unavailable", self.index, x, y);
            return None;
        }
        entity.id = self.alloc_id();
        if !self.grid.place_spanning(&mut entity, x, y, w, h) {
            return None;
        }
        let id = entity.id;
        self.entities.push(entity);
        Some(id)
    }

    pub fn add_block(&mut self, x: i32, y: i32) -> Option<EntityId> {
        let cs = self.cell_size();
        self.add_entity(Entity::new(EntityId(0), cs, cs).with_tag("block"), x, y)
    }

    pub fn add_box(&mut self, x: i32, y: i32, carry: CarryComponent) -> Option<EntityId> {
        let cs = self.cell_size();
        self.add_entity(Entity::new_box(EntityId(0), cs, cs, carry).with_tag("box"), x, y)
    }

    pub fn add_button(
        &mut self,
        tag: &str,
        x: i32,
        y: i32,
        button: ButtonComponent,
    ) -> Option<EntityId> {
        let cs = self.cell_size();
        self.add_entity(Entity::new_button(EntityId(0), cs, cs, button).with_tag(tag), x, y)
    }

    /// Register `door` with the controller and place its body at (x, y),
    /// covering `door.grid_width()` x `door.grid_height()` cells.
    pub fn add_door(&mut self, door: Door, x: i32, y: i32) -> Option<EntityId> {
        let body = Entity::new_door(EntityId(0), self.cell_size(), &door);
        let id = self.add_entity(body, x, y)?;
        self.doors.register(door);
        Some(id)
    }

    /// Blocks around the outer edge of the grid.
    pub fn add_border(&mut self) {
        let (w, h) = (self.grid.horizontal_cells(), self.grid.vertical_cells());
        for x in 0..w {
            self.add_block(x, 0);
            self.add_block(x, h - 1);
        }
        for y in 1..h - 1 {
            self.add_block(0, y);
            self.add_block(w - 1, y);
        }
    }

    pub fn set_spawn(&mut self, x: i32, y: i32) {
        self.spawn = (x, y);
    }

    pub fn spawn_pos(&self) -> Vec2 {
        self.grid.grid_to_screen(self.spawn.0, self.spawn.1)
    }

    pub fn add_exit(&mut self, door_id: impl Into<String>, next_level: u32) {
        self.exits.insert(door_id.into(), next_level);
    }

    pub fn exit_for(&self, door_id: &str) -> Option<u32> {
        self.exits.get(door_id).copied()
    }

    // -- Queries --

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn boxes(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.active && e.is_box())
    }

    /// Door bodies whose door is open.
    pub fn open_doors(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|e| e.door_id().is_some_and(|id| self.doors.is_open(id)))
    }

    /// Walls plus closed doors. What a rewinding box may not enter.
    pub fn solid_obstacles(&self) -> Vec<Obstacle> {
        self.entities
            .iter()
            .filter(|e| e.active)
            .filter(|e| match e.door_id() {
                Some(door) => !self.doors.is_open(door),
                None => e.is_static(),
            })
            .map(Entity::obstacle)
            .collect()
    }

    /// Everything the player collides with: walls, closed doors, and boxes
    /// nobody is carrying.
    pub fn player_obstacles(&self) -> Vec<Obstacle> {
        let mut obstacles = self.solid_obstacles();
        obstacles.extend(
            self.boxes()
                .filter(|b| !b.is_carried())
                .map(Entity::obstacle),
        );
        obstacles
    }

    // -- Per-frame --

    /// Re-open doors held by latched button groups.
    pub fn sync_doors(&mut self) {
        self.triggers.sync_doors(&mut self.doors);
    }

    pub fn update_timers(&mut self, now: Duration) {
        self.triggers.update(&mut self.doors, now);
    }

    /// Recompute every weighted button from the current box centers and
    /// dispatch what they fire.
    pub fn update_weighted_buttons(&mut self, now: Duration) {
        let centers: Vec<Vec2> = self.boxes().map(Entity::center).collect();
        let mut fired = Vec::new();
        for e in self.entities.iter_mut().filter(|e| e.active) {
            e.update_weighted_button(&centers, now, &mut fired);
        }
        self.dispatch(fired, now);
    }

    /// Entity housekeeping: pressable buttons pop back up.
    pub fn update(&mut self, now: Duration) {
        for e in self.entities.iter_mut().filter(|e| e.active) {
            if let Some(button) = e.button_mut() {
                button.update(now);
            }
        }
    }

    /// Player interaction with a button. False if it refused (cooldown,
    /// weighted, not a button).
    pub fn activate_button(&mut self, id: EntityId, now: Duration) -> bool {
        let mut fired = Vec::new();
        let activated = self
            .get_mut(id)
            .and_then(Entity::button_mut)
            .is_some_and(|b| b.activate(now, &mut fired));
        self.dispatch(fired, now);
        activated
    }

    pub fn dispatch(&mut self, actions: Vec<Action>, now: Duration) {
        self.triggers.fire_all(actions, &mut self.doors, now);
    }

    /// Drop everything: entities, occupancy, doors, triggers, exits.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.grid.clear();
        self.doors.clear();
        self.triggers.clear();
        self.exits.clear();
        self.next_id = 1;
    }
}
