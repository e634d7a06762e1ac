//! Level flow: start, clock, fail on a wrecked car, complete at the finish
//! line, and the restart/menu commands coming back from the result screen.

use bevy::prelude::*;

use super::{Health, Player, Vehicle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome {
    Failed,
    Completed,
}

#[derive(Resource, Clone, Debug, Default)]
pub struct LevelSession {
    pub level_index: u32,
    pub reward: u32,
    pub stars: u32,
    /// Seconds since the level started. Frozen once an outcome is reached.
    pub elapsed: f32,
    pub running: bool,
    pub show_timer: bool,
    pub outcome: Option<LevelOutcome>,
}

#[derive(Resource, Clone, Debug)]
pub struct LevelSettings {
    pub reward_per_star: u32,
    /// How close the car must get to a finish line to complete the level.
    pub finish_radius: f32,
    pub show_timer: bool,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            reward_per_star: 25,
            finish_radius: 4.0,
            show_timer: true,
        }
    }
}

#[derive(Component)]
pub struct FinishLine;

/// Where the car goes back to on restart.
#[derive(Component, Clone, Copy, Debug)]
pub struct SpawnPoint(pub Transform);

#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelStarted {
    pub level_index: u32,
}

#[derive(Event, Clone, Copy, Debug, Default)]
pub struct LevelFailed;

#[derive(Event, Clone, Copy, Debug, Default)]
pub struct LevelCompleted;

/// Result-screen button presses forwarded to the level.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelCommand {
    Restart,
    Menu,
}

pub struct LevelPlugin;
impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelSession>()
            .init_resource::<LevelSettings>()
            .add_event::<LevelStarted>()
            .add_event::<LevelFailed>()
            .add_event::<LevelCompleted>()
            .add_event::<LevelCommand>()
            .add_systems(Startup, begin_first_level)
            .add_systems(
                Update,
                (
                    handle_level_commands,
                    on_level_started,
                    tick_level_clock,
                    check_failure,
                    check_finish,
                )
                    .chain(),
            );
    }
}

/// 3 stars untouched, 2 at half health or better, otherwise 1.
pub fn stars_for(health: u32, max: u32) -> u32 {
    if max == 0 || health >= max {
        3
    } else if health * 2 >= max {
        2
    } else {
        1
    }
}

fn begin_first_level(session: Res<LevelSession>, mut ev_started: EventWriter<LevelStarted>) {
    ev_started.send(LevelStarted {
        level_index: session.level_index,
    });
}

fn on_level_started(
    mut ev_started: EventReader<LevelStarted>,
    mut session: ResMut<LevelSession>,
    settings: Res<LevelSettings>,
) {
    for ev in ev_started.read() {
        info!("level {} started", ev.level_index + 1);
        *session = LevelSession {
            level_index: ev.level_index,
            running: true,
            show_timer: settings.show_timer,
            ..default()
        };
    }
}

pub fn tick_level_clock(time: Res<Time>, mut session: ResMut<LevelSession>) {
    if session.running {
        session.elapsed += time.delta_seconds();
    }
}

/// A wreck still pays for the distance covered: one star per full third of
/// the way to the finish, never all three.
pub fn stars_for_progress(progress: f32) -> u32 {
    ((progress.clamp(0.0, 1.0) * 3.0).floor() as u32).min(2)
}

/// Fraction of the spawn-to-finish distance covered, against the nearest
/// finish line. Zero without a finish line.
pub fn track_progress(spawn: Vec3, car: Vec3, finishes: impl Iterator<Item = Vec3>) -> f32 {
    let Some(finish) = finishes.min_by(|a, b| a.distance(car).total_cmp(&b.distance(car))) else {
        return 0.0;
    };
    let total = spawn.distance(finish);
    if total <= f32::EPSILON {
        return 0.0;
    }
    (1.0 - car.distance(finish) / total).clamp(0.0, 1.0)
}

fn check_failure(
    mut session: ResMut<LevelSession>,
    settings: Res<LevelSettings>,
    players: Query<(&Health, &GlobalTransform, Option<&SpawnPoint>), With<Player>>,
    finishes: Query<&GlobalTransform, With<FinishLine>>,
    mut ev_failed: EventWriter<LevelFailed>,
) {
    if !session.running {
        return;
    }
    let Ok((health, car, spawn)) = players.get_single() else {
        return;
    };
    if health.is_depleted() {
        let spawn = spawn.map(|s| s.0.translation).unwrap_or(car.translation());
        let progress = track_progress(
            spawn,
            car.translation(),
            finishes.iter().map(|f| f.translation()),
        );
        session.running = false;
        session.outcome = Some(LevelOutcome::Failed);
        session.stars = stars_for_progress(progress);
        session.reward = session.stars * settings.reward_per_star;
        info!(
            "level {} failed after {:.1}s at {:.0}% of the track",
            session.level_index + 1,
            session.elapsed,
            progress * 100.0
        );
        ev_failed.send(LevelFailed);
    }
}

fn check_finish(
    mut session: ResMut<LevelSession>,
    settings: Res<LevelSettings>,
    players: Query<(&GlobalTransform, &Health), With<Player>>,
    finishes: Query<&GlobalTransform, With<FinishLine>>,
    mut ev_completed: EventWriter<LevelCompleted>,
) {
    if !session.running {
        return;
    }
    let Ok((car, health)) = players.get_single() else {
        return;
    };
    let reached = finishes
        .iter()
        .any(|f| f.translation().distance(car.translation()) <= settings.finish_radius);
    if reached {
        session.running = false;
        session.outcome = Some(LevelOutcome::Completed);
        session.stars = stars_for(health.current, health.max);
        session.reward = session.stars * settings.reward_per_star;
        info!(
            "level {} complete: {} stars, reward {}",
            session.level_index + 1,
            session.stars,
            session.reward
        );
        ev_completed.send(LevelCompleted);
    }
}

/// Scene loading is out of reach here, so "menu" restarts from the first level.
fn handle_level_commands(
    mut ev_command: EventReader<LevelCommand>,
    session: Res<LevelSession>,
    mut players: Query<(&SpawnPoint, &mut Transform, &mut Vehicle, &mut Health), With<Player>>,
    mut ev_started: EventWriter<LevelStarted>,
) {
    for cmd in ev_command.read() {
        let level_index = match cmd {
            LevelCommand::Restart if session.outcome == Some(LevelOutcome::Completed) => {
                session.level_index + 1
            }
            LevelCommand::Restart => session.level_index,
            LevelCommand::Menu => {
                info!("returning to the first level");
                0
            }
        };

        for (spawn, mut t, mut vehicle, mut health) in &mut players {
            *t = spawn.0;
            vehicle.speed = 0.0;
            health.restore();
        }
        ev_started.send(LevelStarted { level_index });
    }
}
