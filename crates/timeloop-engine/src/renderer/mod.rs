pub mod instance;
pub mod traits;

// Re-export key types for convenient access
pub use instance::{flags, DrawInstance, DrawKind, Frame, FrameSnapshot, Hud};
pub use traits::{draw_frame, RecordingRenderer, Renderer};
