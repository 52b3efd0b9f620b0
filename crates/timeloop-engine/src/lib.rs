pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod bridge;
pub mod input;
pub mod assets;
pub mod levels;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig};
pub use api::play_state::PlayState;
pub use api::types::{EntityId, GameEvent};
pub use components::button::{ButtonComponent, ButtonKind};
pub use components::carry::{CarryComponent, CarryState};
pub use components::door::{Door, DoorController, DoorState};
pub use components::entity::{Bounds, Capability, Entity, Obstacle};
pub use components::layer::RenderLayer;
pub use components::player::{Player, PLAYER_ID};
pub use core::grid::Grid;
pub use core::level::Level;
pub use core::time::{FixedTimestep, GameClock};
pub use core::timer::TimerManager;
pub use renderer::instance::{DrawInstance, DrawKind, Frame, FrameSnapshot, Hud};
pub use renderer::traits::{draw_frame, Renderer};
pub use input::queue::{InputEvent, InputQueue, Key};
pub use assets::manifest::AssetManifest;
pub use assets::registry::{AssetCache, AssetHandle};
pub use bridge::protocol::ProtocolLayout;
pub use levels::{BuiltinLevels, LevelSource};
pub use systems::rewind::{RewindManager, RewindState};
pub use systems::triggers::{Action, MultiButtonAction, TimedAction, TriggerGraph};
