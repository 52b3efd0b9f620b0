pub mod game;
pub mod play_state;
pub mod types;
