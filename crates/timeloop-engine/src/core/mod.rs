pub mod grid;
pub mod level;
pub mod time;
pub mod timer;
