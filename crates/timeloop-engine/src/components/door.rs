use std::collections::BTreeMap;

use crate::api::types::EntityId;
use crate::components::entity::{Capability, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorState {
    #[default]
    Closed,
    Open,
    /// Absorbing: nothing closes the door again.
    PermanentlyOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    id: String,
    state: DoorState,
    /// Size in grid cells, for doors spanning more than one cell.
    grid_width: u32,
    grid_height: u32,
}

impl Door {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DoorState::Closed,
            grid_width: 1,
            grid_height: 1,
        }
    }

    pub fn with_cells(mut self, grid_width: u32, grid_height: u32) -> Self {
        self.grid_width = grid_width.max(1);
        self.grid_height = grid_height.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    pub fn is_open(&self) -> bool {
        self.state != DoorState::Closed
    }

    pub fn is_permanently_open(&self) -> bool {
        self.state == DoorState::PermanentlyOpen
    }

    pub fn open(&mut self) {
        if self.state == DoorState::Closed {
            self.state = DoorState::Open;
        }
    }

    pub fn close(&mut self) {
        if self.state == DoorState::Open {
            self.state = DoorState::Closed;
        }
    }

    /// Returns the resulting open state.
    pub fn toggle(&mut self) -> bool {
        match self.state {
            DoorState::Closed => self.state = DoorState::Open,
            DoorState::Open => self.state = DoorState::Closed,
            DoorState::PermanentlyOpen => {}
        }
        self.is_open()
    }

    pub fn open_permanently(&mut self) {
        if self.state != DoorState::PermanentlyOpen {
            log::info!("door {} is now permanently open", self.id);
        }
        self.state = DoorState::PermanentlyOpen;
    }
}

/// Central registry of the doors in a level, keyed by door id.
/// Every operation on an unknown id is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DoorController {
    doors: BTreeMap<String, Door>,
}

impl DoorController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a door, replacing any door with the same id.
    pub fn register(&mut self, door: Door) -> Option<Door> {
        self.doors.insert(door.id.clone(), door)
    }

    pub fn get(&self, id: &str) -> Option<&Door> {
        self.doors.get(id)
    }

    pub fn open_door(&mut self, id: &str) {
        if let Some(door) = self.doors.get_mut(id) {
            door.open();
        }
    }

    pub fn close_door(&mut self, id: &str) {
        if let Some(door) = self.doors.get_mut(id) {
            door.close();
        }
    }

    pub fn toggle_door(&mut self, id: &str) {
        if let Some(door) = self.doors.get_mut(id) {
            door.toggle();
        }
    }

    pub fn open_door_permanently(&mut self, id: &str) {
        if let Some(door) = self.doors.get_mut(id) {
            door.open_permanently();
        }
    }

    /// Unknown doors read as closed.
    pub fn is_open(&self, id: &str) -> bool {
        self.doors.get(id).is_some_and(Door::is_open)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Door> {
        self.doors.values()
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn clear(&mut self) {
        self.doors.clear();
    }
}

impl Entity {
    /// Build the spatial body of a door spanning `door`'s cells.
    pub fn new_door(id: EntityId, cell_size: u32, door: &Door) -> Self {
        Entity::new(id, cell_size * door.grid_width(), cell_size * door.grid_height())
            .with_tag(door.id())
            .with_capability(Capability::Openable {
                door_id: door.id().to_string(),
            })
    }
}
