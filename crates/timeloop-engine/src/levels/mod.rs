pub mod builtin;

use crate::api::game::GameConfig;
use crate::core::level::Level;

pub use builtin::BuiltinLevels;

/// Where levels come from. `index` is 1-based.
pub trait LevelSource {
    /// Build level `index`, or `None` if there is no such level.
    fn build(&self, index: u32, config: &GameConfig) -> Option<Level>;

    /// Number of levels available.
    fn count(&self) -> u32;
}
