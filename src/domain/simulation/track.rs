//! Obstacle layout. Each level index seeds its own RNG so a level always
//! looks the same on restart.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Collider, Hazard, LevelStarted};

#[derive(Resource, Clone, Debug)]
pub struct TrackSettings {
    pub obstacle_count: usize,
    /// Distance from the spawn point to the finish line along -Z.
    pub length: f32,
    pub half_width: f32,
    /// Obstacle-free stretch at both ends of the track.
    pub margin: f32,
    pub obstacle_radius: f32,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            obstacle_count: 12,
            length: 200.0,
            half_width: 8.0,
            margin: 15.0,
            obstacle_radius: 1.0,
        }
    }
}

/// Render handles for obstacles. Without it, layout is skipped (headless runs).
#[derive(Resource, Clone)]
pub struct TrackAssets {
    pub obstacle_mesh: Handle<Mesh>,
    pub obstacle_material: Handle<StandardMaterial>,
    pub hit_material: Handle<StandardMaterial>,
}

#[derive(Component)]
pub struct Obstacle;

pub fn obstacle_layout(level_index: u32, settings: &TrackSettings) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(u64::from(level_index));
    let near = settings.margin;
    let far = (settings.length - settings.margin).max(near);
    (0..settings.obstacle_count)
        .map(|_| {
            let x = rng.gen_range(-settings.half_width..=settings.half_width);
            let z = rng.gen_range(near..=far);
            Vec3::new(x, settings.obstacle_radius, -z)
        })
        .collect()
}

pub fn layout_track(
    mut commands: Commands,
    mut ev_started: EventReader<LevelStarted>,
    settings: Res<TrackSettings>,
    assets: Option<Res<TrackAssets>>,
    old: Query<Entity, With<Obstacle>>,
) {
    let Some(level_index) = ev_started.read().last().map(|ev| ev.level_index) else {
        return;
    };
    let Some(assets) = assets else {
        return;
    };

    for e in &old {
        commands.entity(e).despawn_recursive();
    }
    let layout = obstacle_layout(level_index, &settings);
    debug!("level {}: {} obstacles", level_index + 1, layout.len());
    for position in layout {
        commands.spawn((
            PbrBundle {
                mesh: assets.obstacle_mesh.clone(),
                material: assets.obstacle_material.clone(),
                transform: Transform::from_translation(position),
                ..default()
            },
            Hazard::with_hit_material(assets.hit_material.clone()),
            Collider {
                radius: settings.obstacle_radius,
            },
            Obstacle,
        ));
    }
}
