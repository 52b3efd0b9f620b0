/// Logical keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Press nearby buttons, pick up or drop a box.
    Interact,
    /// Start recording, or start rewinding what was recorded.
    RewindToggle,
    /// Restart the current level (also leaves the game-over screen).
    Reset,
    /// Jump straight to level `n`.
    SelectLevel(u8),
    Pause,
}

impl Key {
    /// Map a browser `KeyboardEvent.keyCode` to a key. Arrows and WASD
    /// move, E interacts, R rewinds, T resets, 1-9 pick a level, Escape and
    /// P pause.
    pub fn from_key_code(code: u32) -> Option<Key> {
        match code {
            37 | 65 => Some(Key::Left),
            39 | 68 => Some(Key::Right),
            38 | 87 => Some(Key::Up),
            40 | 83 => Some(Key::Down),
            69 => Some(Key::Interact),
            82 => Some(Key::RewindToggle),
            84 => Some(Key::Reset),
            27 | 80 => Some(Key::Pause),
            49..=57 => Some(Key::SelectLevel((code - 48) as u8)),
            _ => None,
        }
    }
}

/// Discrete input events; there is no analog input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Key),
    Released(Key),
}

/// A queue of input events.
/// The host writes events into the queue; the game drains them each tick.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Push a raw key code. Unmapped codes are dropped.
    pub fn push_key_code(&mut self, code: u32, pressed: bool) -> bool {
        let Some(key) = Key::from_key_code(code) else {
            return false;
        };
        self.push(if pressed {
            InputEvent::Pressed(key)
        } else {
            InputEvent::Released(key)
        });
        true
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
