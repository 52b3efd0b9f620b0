pub mod button;
pub mod carry;
pub mod door;
pub mod entity;
pub mod layer;
pub mod player;
