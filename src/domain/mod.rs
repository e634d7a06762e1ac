//! Domain modules split by discipline.
//! - `controls`: drive input aggregation, overlay toggles, and the follow camera.
//! - `presentation`: HUD choreography, tweens, readouts, and egui overlays.
//! - `simulation`: vehicle, health, hazards, contacts, and level flow.
//! - `schedule`, `audio`, `error`: shared plumbing.

pub mod audio;
pub mod controls;
pub mod error;
pub mod presentation;
pub mod schedule;
pub mod simulation;

pub use audio::AudioCuePlugin;
pub use controls::{CameraRigPlugin, ControlsPlugin};
pub use presentation::{HudPlugin, OverlayPlugin};
pub use simulation::SimPlugin;
