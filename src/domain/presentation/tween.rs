use bevy::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    Linear,
    #[default]
    OutBack,
    InBack,
    InOutQuad,
}

const BACK_C1: f32 = 1.70158;
const BACK_C3: f32 = BACK_C1 + 1.0;

impl Ease {
    /// Maps normalized time to progress. `0 -> 0` and `1 -> 1` for every curve;
    /// the back curves overshoot in between.
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::OutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
            Ease::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Uniform scale animation. Replacing the component restarts from whatever
/// scale the node currently has.
#[derive(Component, Clone, Debug)]
pub struct ScaleTween {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub ease: Ease,
    /// Hide the node once the tween lands.
    pub hide_on_finish: bool,
    elapsed: f32,
}

impl ScaleTween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            ease,
            hide_on_finish: false,
            elapsed: 0.0,
        }
    }

    pub fn hiding(mut self) -> Self {
        self.hide_on_finish = true;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances and returns the scale for this frame.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        if self.is_finished() {
            return self.to;
        }
        let p = self.ease.sample(self.elapsed / self.duration);
        self.from + (self.to - self.from) * p
    }
}

pub fn advance_tweens(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut ScaleTween, &mut Transform, &mut Visibility)>,
) {
    let dt = time.delta_seconds();
    for (e, mut tween, mut t, mut vis) in &mut q {
        t.scale = Vec3::splat(tween.tick(dt));
        if tween.is_finished() {
            if tween.hide_on_finish {
                *vis = Visibility::Hidden;
            }
            commands.entity(e).remove::<ScaleTween>();
        }
    }
}
