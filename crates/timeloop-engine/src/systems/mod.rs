pub mod render;
pub mod rewind;
pub mod triggers;
