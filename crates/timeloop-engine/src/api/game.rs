use serde::{Deserialize, Serialize};

use crate::api::types::GameEvent;
use crate::assets::registry::AssetCache;
use crate::input::queue::InputQueue;
use crate::renderer::traits::Renderer;

/// Configuration for a play session.
/// Every field has a default, so a JSON file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60). One rewind sample per step.
    pub fixed_dt: f32,
    /// Play area width in pixels.
    pub screen_width: u32,
    /// Play area height in pixels.
    pub screen_height: u32,
    /// Grid cell edge in pixels.
    pub cell_size: u32,
    /// Countdown per level, in seconds.
    pub timer_secs: u32,
    /// Look-back window of the rewind recorder, in seconds.
    pub rewind_max_secs: f32,
    /// Minimum time between two presses of the same button, in milliseconds.
    pub button_cooldown_ms: u64,
    /// How long a timed button keeps its group input high, in milliseconds.
    pub timed_button_ms: u64,
    /// Player movement speed in pixels per second.
    pub player_speed: f32,
    /// Level loaded by `init`.
    pub start_level: u32,
    /// Draw-instance slots in the host buffer.
    pub max_instances: usize,
    /// Game-event slots in the host buffer, per frame.
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            screen_width: 1024,
            screen_height: 768,
            cell_size: 32,
            timer_secs: 60,
            rewind_max_secs: 10.0,
            button_cooldown_ms: 1000,
            timed_button_ms: 1000,
            player_speed: 180.0,
            start_level: 1,
            max_instances: 1024,
            max_events: 32,
        }
    }
}

impl GameConfig {
    /// Parse a config from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of samples the rewind recorder keeps.
    pub fn rewind_capacity(&self) -> usize {
        if self.fixed_dt <= 0.0 {
            return 0;
        }
        (self.rewind_max_secs / self.fixed_dt).round().max(0.0) as usize
    }
}

/// The contract a host loop drives: one fixed tick at a time, then a draw pass.
pub trait Game {
    /// Return session configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Build the first level and reset all session state.
    fn init(&mut self);

    /// Advance exactly one fixed tick, consuming the queued input first.
    fn update(&mut self, input: &mut InputQueue);

    /// Hand the last completed tick to the renderer, one draw per entity.
    fn render(&self, renderer: &mut dyn Renderer);

    /// Swap in sprite handles resolved by the host. Games without sprites
    /// ignore it.
    fn load_assets(&mut self, _assets: AssetCache) {}

    /// Events raised since the last call.
    fn take_events(&mut self) -> Vec<GameEvent> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = GameConfig::from_json(r#"{ "cell_size": 16, "timer_secs": 5 }"#).unwrap();
        assert_eq!(cfg.cell_size, 16);
        assert_eq!(cfg.timer_secs, 5);
        assert_eq!(cfg.screen_width, 1024);
        assert_eq!(cfg.button_cooldown_ms, 1000);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(GameConfig::from_json("{ cell_size: }").is_err());
    }

    #[test]
    fn rewind_capacity_follows_timestep() {
        let cfg = GameConfig {
            fixed_dt: 0.5,
            rewind_max_secs: 10.0,
            ..Default::default()
        };
        assert_eq!(cfg.rewind_capacity(), 20);

        let broken = GameConfig {
            fixed_dt: 0.0,
            ..Default::default()
        };
        assert_eq!(broken.rewind_capacity(), 0);
    }
}
