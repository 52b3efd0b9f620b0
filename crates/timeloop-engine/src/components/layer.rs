/// Render layer. Controls draw order.
///
/// Layers are drawn back-to-front: Background first, UI last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RenderLayer {
    Background = 0,
    /// Walls and doors.
    Terrain = 1,
    /// Buttons sit under whatever rests on them.
    #[default]
    Objects = 2,
    Boxes = 3,
    Actors = 4,
    UI = 5,
}

impl RenderLayer {
    /// Total number of render layers.
    pub const COUNT: usize = 6;

    /// Convert from a u8 value to a RenderLayer.
    /// Returns None if the value is out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Background),
            1 => Some(Self::Terrain),
            2 => Some(Self::Objects),
            3 => Some(Self::Boxes),
            4 => Some(Self::Actors),
            5 => Some(Self::UI),
            _ => None,
        }
    }

    /// Convert to u8 for the draw buffer.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
