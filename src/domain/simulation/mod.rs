use bevy::prelude::*;
use bevy::utils::HashSet;

use crate::domain::controls::DriveInput;

pub mod hazard;
pub mod level;
pub mod track;

pub use hazard::{Hazard, HazardPlugin, HitFlash};
pub use level::{
    FinishLine, LevelCommand, LevelCompleted, LevelFailed, LevelOutcome, LevelPlugin,
    LevelSession, LevelSettings, LevelStarted, SpawnPoint,
};
pub use track::{Obstacle, TrackAssets, TrackSettings};

/// The car the player drives. HUD readouts and level rules track this one.
#[derive(Component)]
pub struct Player;

/// Anything a hazard can hurt. Hazard strikes are registered per damageable
/// component type; the game registers `Health`.
pub trait Damageable: Component {
    fn take_damage(&mut self, amount: u32);
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

impl Damageable for Health {
    fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// Announced on spawn (which doubles as the max-health announcement) and on
/// every change after that.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub health: u32,
    pub max: u32,
}

#[derive(Component, Clone, Debug)]
pub struct Vehicle {
    /// Signed, units per second along the vehicle's forward axis.
    pub speed: f32,
    pub max_speed: f32,
    pub max_reverse_speed: f32,
    pub acceleration: f32,
    pub braking: f32,
    pub drag: f32,
    pub turn_rate: f32,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            speed: 0.0,
            max_speed: 30.0,
            max_reverse_speed: 8.0,
            acceleration: 12.0,
            braking: 40.0,
            drag: 3.0,
            turn_rate: 2.2,
        }
    }
}

impl Vehicle {
    /// Speed as shown to the player.
    pub fn display_speed(&self) -> f32 {
        self.speed.abs() * 3.6
    }

    pub fn step(&mut self, input: &DriveInput, dt: f32) {
        let mut speed = self.speed;
        if input.accelerate {
            speed += self.acceleration * dt;
        }
        if input.reverse {
            speed -= self.acceleration * dt;
        }
        if !input.accelerate && !input.reverse {
            speed = approach_zero(speed, self.drag * dt);
        }
        if input.handbrake {
            speed = approach_zero(speed, self.braking * dt);
        }
        self.speed = speed.clamp(-self.max_reverse_speed, self.max_speed);
    }

    /// Yaw change for this frame. Steering reverses when backing up, like a car.
    pub fn yaw_delta(&self, input: &DriveInput, dt: f32) -> f32 {
        let mut steer = 0.0;
        if input.turn_left {
            steer += 1.0;
        }
        if input.turn_right {
            steer -= 1.0;
        }
        let grip = (self.speed / self.max_speed.max(1.0)).clamp(-1.0, 1.0);
        steer * self.turn_rate * grip * dt
    }
}

fn approach_zero(v: f32, by: f32) -> f32 {
    if v > 0.0 {
        (v - by).max(0.0)
    } else {
        (v + by).min(0.0)
    }
}

/// Bounding sphere used by the contact detector.
#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub radius: f32,
}

/// Two colliders started touching this frame.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    pub a: Entity,
    pub b: Entity,
}

impl ContactEvent {
    pub fn other(&self, e: Entity) -> Option<Entity> {
        if self.a == e {
            Some(self.b)
        } else if self.b == e {
            Some(self.a)
        } else {
            None
        }
    }
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HealthChanged>()
            .add_event::<ContactEvent>()
            .init_resource::<TrackSettings>()
            .add_plugins((LevelPlugin, HazardPlugin))
            .add_systems(Update, track::layout_track.after(level::tick_level_clock))
            .add_systems(
                Update,
                (drive_vehicle, detect_contacts, bump_on_contact, announce_health)
                    .chain()
                    .after(level::tick_level_clock),
            );
    }
}

fn drive_vehicle(
    time: Res<Time>,
    input: Res<DriveInput>,
    session: Res<LevelSession>,
    mut q: Query<(&mut Transform, &mut Vehicle), With<Player>>,
) {
    let dt = time.delta_seconds();
    let Ok((mut t, mut vehicle)) = q.get_single_mut() else {
        return;
    };

    let input = if session.running {
        *input
    } else {
        DriveInput {
            handbrake: true,
            ..default()
        }
    };

    vehicle.step(&input, dt);
    t.rotate_y(vehicle.yaw_delta(&input, dt));
    let forward = *t.forward();
    t.translation += forward * vehicle.speed * dt;
}

/// Sphere overlap test over every collider pair. Only reports a pair on the
/// frame it starts overlapping.
pub fn detect_contacts(
    q: Query<(Entity, &GlobalTransform, &Collider)>,
    mut touching: Local<HashSet<(Entity, Entity)>>,
    mut ev_contact: EventWriter<ContactEvent>,
) {
    let bodies: Vec<_> = q
        .iter()
        .map(|(e, gt, c)| (e, gt.translation(), c.radius))
        .collect();

    let mut now = HashSet::default();
    for (i, &(a, pa, ra)) in bodies.iter().enumerate() {
        for &(b, pb, rb) in &bodies[i + 1..] {
            let reach = ra + rb;
            if pa.distance_squared(pb) > reach * reach {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if !touching.contains(&key) {
                ev_contact.send(ContactEvent { a: key.0, b: key.1 });
            }
            now.insert(key);
        }
    }
    *touching = now;
}

fn bump_on_contact(
    mut ev_contact: EventReader<ContactEvent>,
    mut players: Query<(Entity, &mut Vehicle), With<Player>>,
    hazards: Query<(), With<Hazard>>,
) {
    let Ok((player, mut vehicle)) = players.get_single_mut() else {
        ev_contact.clear();
        return;
    };
    for ev in ev_contact.read() {
        let Some(other) = ev.other(player) else {
            continue;
        };
        if hazards.contains(other) {
            vehicle.speed *= -0.3;
        }
    }
}

fn announce_health(
    q: Query<(Entity, &Health), Changed<Health>>,
    mut ev_health: EventWriter<HealthChanged>,
) {
    for (entity, health) in &q {
        ev_health.send(HealthChanged {
            entity,
            health: health.current,
            max: health.max,
        });
    }
}
