use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity in a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// A game event raised by the play state during a tick.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    /// A level was loaded. `a` = level number.
    pub const LEVEL_LOADED: f32 = 1.0;
    /// The countdown ran out. `a` = level number.
    pub const GAME_OVER: f32 = 2.0;
    /// The rewind manager changed mode. `a` = new state as u8.
    pub const REWIND_STATE: f32 = 3.0;
    /// A box was picked up (`b` = 1) or dropped (`b` = 0). `a` = entity id.
    pub const BOX_CARRY: f32 = 4.0;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }
}
