//! Chase camera: trails a target at an offset that turns with it and keeps
//! the target in view. Runs on the fixed timestep.

use bevy::prelude::*;

use crate::domain::error::SetupError;

#[derive(Component, Clone, Debug)]
pub struct CameraRig {
    target: Option<Entity>,
    /// Desired camera position in the target's local frame. Targets face -Z,
    /// so positive Z sits behind them.
    pub offset: Vec3,
    pub follow_speed: f32,
    pub look_speed: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target: None,
            offset: Vec3::new(0.0, 3.0, 8.0),
            follow_speed: 8.0,
            look_speed: 15.0,
        }
    }
}

impl CameraRig {
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Clearing the target is allowed but reported; the rig idles until a
    /// new one arrives.
    pub fn set_target(&mut self, target: Option<Entity>) -> Result<(), SetupError> {
        self.target = target;
        match target {
            Some(_) => Ok(()),
            None => Err(SetupError::MissingCameraTarget),
        }
    }
}

/// Points every rig at a new target, or clears them with `None`.
#[derive(Event, Clone, Copy, Debug)]
pub struct RetargetCamera(pub Option<Entity>);

pub struct CameraRigPlugin;
impl Plugin for CameraRigPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RetargetCamera>()
            .add_systems(Update, retarget_camera)
            .add_systems(FixedUpdate, follow_target);
    }
}

pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0)
}

pub fn desired_position(target_pos: Vec3, target_rot: Quat, offset: Vec3) -> Vec3 {
    target_pos + target_rot * offset
}

pub fn follow_step(current: Vec3, desired: Vec3, rate: f32, dt: f32) -> Vec3 {
    current.lerp(desired, smoothing_factor(rate, dt))
}

pub fn look_step(camera_pos: Vec3, rotation: Quat, look_at: Vec3, rate: f32, dt: f32) -> Quat {
    if (look_at - camera_pos).length_squared() < 1e-8 {
        return rotation;
    }
    let wanted = Transform::from_translation(camera_pos)
        .looking_at(look_at, Vec3::Y)
        .rotation;
    rotation.slerp(wanted, smoothing_factor(rate, dt))
}

fn retarget_camera(mut ev_retarget: EventReader<RetargetCamera>, mut rigs: Query<&mut CameraRig>) {
    for ev in ev_retarget.read() {
        for mut rig in &mut rigs {
            debug!("camera target {:?} -> {:?}", rig.target(), ev.0);
            if let Err(err) = rig.set_target(ev.0) {
                error!("failed to set camera target: {err}");
            }
        }
    }
}

pub fn follow_target(
    time: Res<Time>,
    mut rigs: Query<(&CameraRig, &mut Transform)>,
    targets: Query<&GlobalTransform, Without<CameraRig>>,
) {
    let dt = time.delta_seconds();
    for (rig, mut t) in &mut rigs {
        let Some(target) = rig.target else {
            continue;
        };
        let Ok(target_tf) = targets.get(target) else {
            continue;
        };

        let (_, target_rot, target_pos) = target_tf.to_scale_rotation_translation();
        let desired = desired_position(target_pos, target_rot, rig.offset);
        t.translation = follow_step(t.translation, desired, rig.follow_speed, dt);
        t.rotation = look_step(t.translation, t.rotation, target_pos, rig.look_speed, dt);
    }
}
