use bytemuck::{Pod, Zeroable};

use crate::components::layer::RenderLayer;

/// What a draw instance depicts. Stored as a float in [`DrawInstance::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DrawKind {
    Player = 0,
    Block = 1,
    Box = 2,
    Button = 3,
    WeightedButton = 4,
    Door = 5,
}

/// Bits for [`DrawInstance::flags`].
pub mod flags {
    pub const PRESSED: u32 = 1 << 0;
    pub const OPEN: u32 = 1 << 1;
    pub const PERMANENT: u32 = 1 << 2;
    pub const CARRIED: u32 = 1 << 3;
    pub const REWINDING: u32 = 1 << 4;
    /// Within interaction range of the player.
    pub const HIGHLIGHT: u32 = 1 << 5;
}

/// One drawable rectangle, laid out for a flat f32 buffer.
/// Must match the host protocol: 12 floats = 48 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    /// Top-left X in pixels.
    pub x: f32,
    /// Top-left Y in pixels.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// [`DrawKind`] as f32.
    pub kind: f32,
    /// [`flags`] bitset as f32.
    pub flags: f32,
    /// Asset handle, or -1.0 when the sprite is missing and the colour
    /// below should be drawn instead.
    pub asset: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    /// [`RenderLayer`] as f32.
    pub layer: f32,
}

impl DrawInstance {
    pub const FLOATS: usize = 12;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn kind(&self) -> Option<DrawKind> {
        match self.kind as u8 {
            0 => Some(DrawKind::Player),
            1 => Some(DrawKind::Block),
            2 => Some(DrawKind::Box),
            3 => Some(DrawKind::Button),
            4 => Some(DrawKind::WeightedButton),
            5 => Some(DrawKind::Door),
            _ => None,
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags as u32
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags() & flag != 0
    }

    pub fn layer(&self) -> Option<RenderLayer> {
        RenderLayer::from_u8(self.layer as u8)
    }

    pub fn has_asset(&self) -> bool {
        self.asset >= 0.0
    }

    /// Wire form, field order as declared.
    pub fn to_floats(&self) -> [f32; Self::FLOATS] {
        bytemuck::cast(*self)
    }
}

/// Overlay state published alongside the instances.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hud {
    pub level: u32,
    pub remaining_secs: u32,
    /// `RewindState::as_f32` value.
    pub rewind_state: f32,
    /// Fraction of the rewind window currently recorded, 0..=1.
    pub rewind_fill: f32,
    pub game_over: bool,
    pub paused: bool,
}

/// Everything a renderer needs for one completed tick.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub instances: Vec<DrawInstance>,
    pub hud: Hud,
}

impl Frame {
    pub fn clear(&mut self) {
        self.instances.clear();
        self.hud = Hud::default();
    }

    pub fn push(&mut self, instance: DrawInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Instances as a flat float slice for the host.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(self.instances.as_slice())
    }
}

/// Double-buffered frame. The tick writes the back buffer; `publish` swaps it
/// to the front where readers see only completed ticks.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    front: Frame,
    back: Frame,
}

impl FrameSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last completed frame.
    pub fn front(&self) -> &Frame {
        &self.front
    }

    /// Frame under construction, cleared.
    pub fn begin(&mut self) -> &mut Frame {
        self.back.clear();
        &mut self.back
    }

    pub fn publish(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_instance_is_12_floats() {
        assert_eq!(std::mem::size_of::<DrawInstance>(), 48);
        assert_eq!(DrawInstance::FLOATS, 12);
    }

    #[test]
    fn readers_only_see_published_frames() {
        let mut snap = FrameSnapshot::new();
        snap.begin().push(DrawInstance {
            x: 1.0,
            ..Default::default()
        });
        assert_eq!(snap.front().instance_count(), 0);

        snap.publish();
        assert_eq!(snap.front().instance_count(), 1);

        snap.begin();
        assert_eq!(snap.front().instance_count(), 1);
        snap.publish();
        assert_eq!(snap.front().instance_count(), 0);
    }

    #[test]
    fn flat_floats_follow_field_order() {
        let mut frame = Frame::default();
        frame.push(DrawInstance {
            x: 3.0,
            y: 4.0,
            asset: -1.0,
            layer: 5.0,
            ..Default::default()
        });
        let floats = frame.as_floats();
        assert_eq!(floats.len(), 12);
        assert_eq!(floats[0], 3.0);
        assert_eq!(floats[1], 4.0);
        assert_eq!(floats[6], -1.0);
        assert_eq!(floats[11], 5.0);
    }

    #[test]
    fn flag_decoding() {
        let inst = DrawInstance {
            flags: (flags::OPEN | flags::PERMANENT) as f32,
            kind: DrawKind::Door as u8 as f32,
            ..Default::default()
        };
        assert!(inst.has_flag(flags::OPEN));
        assert!(!inst.has_flag(flags::PRESSED));
        assert_eq!(inst.kind(), Some(DrawKind::Door));
        assert_eq!(inst.layer(), Some(RenderLayer::Background));
    }
}
