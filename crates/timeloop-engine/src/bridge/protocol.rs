/// Flat frame buffer layout shared with the browser host.
/// Must stay in sync with the host's `protocol.ts`.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 16 floats]
/// [Instances: max_instances × 12 floats]
/// [Events: max_events × 4 floats]
/// ```
///
/// Capacities are written into the header on every frame.
/// The host reads them from the header to compute offsets.

use crate::api::game::GameConfig;
use crate::api::types::GameEvent;
use crate::renderer::instance::{DrawInstance, Hud};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 16;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_MAX_INSTANCES: usize = 2;
pub const HEADER_INSTANCE_COUNT: usize = 3;
pub const HEADER_WORLD_WIDTH: usize = 4;
pub const HEADER_WORLD_HEIGHT: usize = 5;
pub const HEADER_MAX_EVENTS: usize = 6;
pub const HEADER_EVENT_COUNT: usize = 7;
pub const HEADER_PROTOCOL_VERSION: usize = 8;
pub const HEADER_LEVEL: usize = 9;
pub const HEADER_REMAINING_SECS: usize = 10;
pub const HEADER_REWIND_STATE: usize = 11;
pub const HEADER_REWIND_FILL: usize = 12;
pub const HEADER_GAME_OVER: usize = 13;
pub const HEADER_PAUSED: usize = 14;
pub const HEADER_CELL_SIZE: usize = 15;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per draw instance (wire format).
pub const INSTANCE_FLOATS: usize = DrawInstance::FLOATS;

/// Floats per game event: kind, a, b, c (wire format).
pub const EVENT_FLOATS: usize = GameEvent::FLOATS;

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    pub max_instances: usize,
    pub max_events: usize,

    /// Size of instance data section in floats.
    pub instance_data_floats: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,

    /// Offset (in floats) where instance data begins.
    pub instance_data_offset: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    pub fn new(max_instances: usize, max_events: usize) -> Self {
        let instance_data_floats = max_instances * INSTANCE_FLOATS;
        let event_data_floats = max_events * EVENT_FLOATS;

        let instance_data_offset = HEADER_FLOATS;
        let event_data_offset = instance_data_offset + instance_data_floats;
        let buffer_total_floats = event_data_offset + event_data_floats;

        Self {
            max_instances,
            max_events,
            instance_data_floats,
            event_data_floats,
            instance_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_instances, config.max_events)
    }

    /// Write the capacity and overlay fields of the header.
    /// `buf` must hold at least `HEADER_FLOATS` values.
    pub fn write_header(&self, buf: &mut [f32], config: &GameConfig, hud: &Hud) {
        if buf.len() < HEADER_FLOATS {
            return;
        }
        buf[HEADER_MAX_INSTANCES] = self.max_instances as f32;
        buf[HEADER_MAX_EVENTS] = self.max_events as f32;
        buf[HEADER_WORLD_WIDTH] = config.screen_width as f32;
        buf[HEADER_WORLD_HEIGHT] = config.screen_height as f32;
        buf[HEADER_CELL_SIZE] = config.cell_size as f32;
        buf[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        buf[HEADER_LEVEL] = hud.level as f32;
        buf[HEADER_REMAINING_SECS] = hud.remaining_secs as f32;
        buf[HEADER_REWIND_STATE] = hud.rewind_state;
        buf[HEADER_REWIND_FILL] = hud.rewind_fill;
        buf[HEADER_GAME_OVER] = if hud.game_over { 1.0 } else { 0.0 };
        buf[HEADER_PAUSED] = if hud.paused { 1.0 } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_sizes() {
        let layout = ProtocolLayout::from_config(&GameConfig::default());

        assert_eq!(layout.max_instances, 1024);
        assert_eq!(layout.max_events, 32);
        assert_eq!(layout.instance_data_floats, 1024 * 12);
        assert_eq!(layout.event_data_floats, 32 * 4);
        assert_eq!(layout.buffer_total_floats, 16 + 1024 * 12 + 32 * 4);
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn offsets_are_contiguous() {
        let layout = ProtocolLayout::new(100, 20);

        assert_eq!(layout.instance_data_offset, HEADER_FLOATS);
        assert_eq!(layout.event_data_offset, layout.instance_data_offset + layout.instance_data_floats);
        assert_eq!(layout.buffer_total_floats, layout.event_data_offset + layout.event_data_floats);
    }

    #[test]
    fn header_carries_hud() {
        let config = GameConfig::default();
        let layout = ProtocolLayout::from_config(&config);
        let mut buf = vec![0.0; HEADER_FLOATS];
        let hud = Hud {
            level: 2,
            remaining_secs: 17,
            rewind_state: 1.0,
            rewind_fill: 0.5,
            game_over: true,
            paused: false,
        };
        layout.write_header(&mut buf, &config, &hud);

        assert_eq!(buf[HEADER_LEVEL], 2.0);
        assert_eq!(buf[HEADER_REMAINING_SECS], 17.0);
        assert_eq!(buf[HEADER_REWIND_FILL], 0.5);
        assert_eq!(buf[HEADER_GAME_OVER], 1.0);
        assert_eq!(buf[HEADER_PAUSED], 0.0);
        assert_eq!(buf[HEADER_WORLD_WIDTH], 1024.0);
        assert_eq!(buf[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
    }

    #[test]
    fn short_buffer_is_left_alone() {
        let layout = ProtocolLayout::new(1, 1);
        let mut buf = vec![7.0; 4];
        layout.write_header(&mut buf, &GameConfig::default(), &Hud::default());
        assert!(buf.iter().all(|v| *v == 7.0));
    }
}
