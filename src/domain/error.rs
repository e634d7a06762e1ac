use bevy::prelude::Entity;
use thiserror::Error;

/// Wiring mistakes found at runtime. These are logged and the affected
/// feature goes inert; nothing here is worth halting the frame loop for.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("camera rig has no target to follow")]
    MissingCameraTarget,
    #[error("hazard {0:?} has no material to flash")]
    MissingRenderer(Entity),
    #[error("{0} is not available yet")]
    CollaboratorUnavailable(&'static str),
}
