//! Renderer contract.
//!
//! The engine never draws. After each tick it publishes a [`Frame`] of
//! [`DrawInstance`]s and hands them, one at a time, to whatever implements
//! [`Renderer`]: the browser host through the web bridge, a test recorder,
//! or a native backend.
//!
//! # Example Implementation
//!
//! ```ignore
//! struct CanvasRenderer {
//!     ctx: web_sys::CanvasRenderingContext2d,
//! }
//!
//! impl Renderer for CanvasRenderer {
//!     fn draw(&mut self, inst: &DrawInstance) {
//!         // fill_rect with the fallback colour, or blit the sprite...
//!     }
//! }
//! ```

use super::instance::{DrawInstance, Frame, Hud};

pub trait Renderer {
    /// Draw one instance of the last completed tick.
    fn draw(&mut self, instance: &DrawInstance);

    /// Overlay state. Called once per frame after all instances.
    fn hud(&mut self, _hud: &Hud) {}
}

/// Replay a published frame into `renderer`.
pub fn draw_frame(frame: &Frame, renderer: &mut dyn Renderer) {
    for instance in &frame.instances {
        renderer.draw(instance);
    }
    renderer.hud(&frame.hud);
}

/// Collects everything it is asked to draw.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub instances: Vec<DrawInstance>,
    pub hud: Option<Hud>,
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, instance: &DrawInstance) {
        self.instances.push(*instance);
    }

    fn hud(&mut self, hud: &Hud) {
        self.hud = Some(*hud);
    }
}
