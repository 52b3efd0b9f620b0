use std::time::Duration;

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::{Capability, Entity};
use crate::systems::triggers::Action;

/// Default minimum time between two presses of one button.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Pressed by the player's interact key.
    Pressable,
    /// Held down by a box resting on it; ignores the interact key.
    Weighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonComponent {
    pub kind: ButtonKind,
    pressed: bool,
    last_press: Option<Duration>,
    cooldown: Duration,
    /// Fired on every successful press.
    pub action: Option<Action>,
    /// Fired when a weighted button loses its box.
    pub release_action: Option<Action>,
    /// Display colour override, so buttons wired together look alike.
    pub tint: Option<[u8; 3]>,
}

impl ButtonComponent {
    pub fn pressable(action: Option<Action>) -> Self {
        Self {
            kind: ButtonKind::Pressable,
            pressed: false,
            last_press: None,
            cooldown: DEFAULT_COOLDOWN,
            action,
            release_action: None,
            tint: None,
        }
    }

    pub fn weighted(action: Option<Action>, release_action: Option<Action>) -> Self {
        Self {
            kind: ButtonKind::Weighted,
            pressed: false,
            last_press: None,
            cooldown: DEFAULT_COOLDOWN,
            action,
            release_action,
            tint: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_tint(mut self, rgb: [u8; 3]) -> Self {
        self.tint = Some(rgb);
        self
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn cooldown_elapsed(&self, now: Duration) -> bool {
        self.last_press
            .map_or(true, |at| now.saturating_sub(at) >= self.cooldown)
    }

    /// Player interaction. Weighted buttons refuse it.
    /// On success the bound action is pushed to `fired` for immediate dispatch.
    pub fn activate(&mut self, now: Duration, fired: &mut Vec<Action>) -> bool {
        match self.kind {
            ButtonKind::Pressable => self.press(now, fired),
            ButtonKind::Weighted => false,
        }
    }

    /// Shared activation path: cooldown gate, latch, fire.
    fn press(&mut self, now: Duration, fired: &mut Vec<Action>) -> bool {
        if !self.cooldown_elapsed(now) {
            return false;
        }
        self.pressed = true;
        self.last_press = Some(now);
        if let Some(action) = &self.action {
            fired.push(action.clone());
        }
        true
    }

    fn release(&mut self, fired: &mut Vec<Action>) {
        self.pressed = false;
        if let Some(action) = &self.release_action {
            fired.push(action.clone());
        }
    }

    /// Per-frame housekeeping: a pressable button pops back up once its
    /// cooldown has run out.
    pub fn update(&mut self, now: Duration) {
        if self.kind == ButtonKind::Pressable && self.pressed && self.cooldown_elapsed(now) {
            self.pressed = false;
        }
    }
}

impl Entity {
    /// Build a button entity.
    pub fn new_button(id: EntityId, width: u32, height: u32, button: ButtonComponent) -> Self {
        Entity::new(id, width, height).with_capability(Capability::Triggerable(button))
    }

    /// True if any box center lies strictly inside this entity's rectangle.
    pub fn has_box_on_top(&self, box_centers: &[Vec2]) -> bool {
        let center = self.center();
        let half = self.size() / 2.0;
        box_centers.iter().any(|c| {
            let d = (center - *c).abs();
            d.x < half.x && d.y < half.y
        })
    }

    /// Recompute a weighted button from box positions. A rising edge goes
    /// through the normal press path, a falling edge releases it.
    /// Returns true if the pressed state changed.
    pub fn update_weighted_button(
        &mut self,
        box_centers: &[Vec2],
        now: Duration,
        fired: &mut Vec<Action>,
    ) -> bool {
        let on_top = self.has_box_on_top(box_centers);
        let Some(button) = self.button_mut() else {
            return false;
        };
        if button.kind != ButtonKind::Weighted {
            return false;
        }
        match (on_top, button.pressed) {
            (true, false) => button.press(now, fired),
            (false, true) => {
                button.release(fired);
                true
            }
            _ => false,
        }
    }
}
