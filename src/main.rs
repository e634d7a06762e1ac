mod domain;

use std::path::Path;

use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::log::LogPlugin;
use bevy::prelude::*;

use domain::audio::SoundBank;
use domain::controls::{CameraRig, RetargetCamera};
use domain::presentation::HudSettings;
use domain::simulation::{
    Collider, FinishLine, Health, Player, SpawnPoint, TrackAssets, TrackSettings, Vehicle,
};
use domain::{AudioCuePlugin, CameraRigPlugin, ControlsPlugin, HudPlugin, OverlayPlugin, SimPlugin};

const UI_CLIP: &str = "audio/ui.ogg";

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.45, 0.62, 0.85)))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "arcade-drive".into(),
                        resolution: (1280., 720.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,arcade_drive=debug".into(),
                    ..default()
                }),
        )
        .add_plugins((
            ControlsPlugin,
            CameraRigPlugin,
            SimPlugin,
            HudPlugin::default(),
            OverlayPlugin,
            AudioCuePlugin,
        ))
        .add_systems(Startup, (setup_scene, load_sounds))
        .run();
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    track: Res<TrackSettings>,
    mut ev_retarget: EventWriter<RetargetCamera>,
) {
    commands.spawn(PbrBundle {
        mesh: meshes.add(
            Plane3d::default()
                .mesh()
                .size(track.half_width * 2.0 + 6.0, track.length + 40.0),
        ),
        material: materials.add(Color::srgb(0.3, 0.32, 0.35)),
        transform: Transform::from_xyz(0.0, 0.0, -track.length / 2.0),
        ..default()
    });

    let spawn = Transform::from_xyz(0.0, 0.5, 0.0);
    let car = commands
        .spawn((
            PbrBundle {
                mesh: meshes.add(Cuboid::new(1.8, 1.0, 4.0)),
                material: materials.add(Color::srgb(0.1, 0.4, 0.9)),
                transform: spawn,
                ..default()
            },
            Player,
            Vehicle::default(),
            Health::new(3),
            Collider { radius: 1.5 },
            SpawnPoint(spawn),
        ))
        .id();

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Cuboid::new(track.half_width * 2.0, 0.1, 1.0)),
            material: materials.add(Color::WHITE),
            transform: Transform::from_xyz(0.0, 0.05, -track.length),
            ..default()
        },
        FinishLine,
    ));

    commands.insert_resource(TrackAssets {
        obstacle_mesh: meshes.add(Sphere::new(track.obstacle_radius)),
        obstacle_material: materials.add(Color::srgb(0.9, 0.6, 0.1)),
        hit_material: materials.add(Color::srgb(0.9, 0.1, 0.1)),
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(4.0, 10.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    let rig = CameraRig::default();
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_translation(spawn.translation + rig.offset)
                .looking_at(spawn.translation, Vec3::Y),
            ..default()
        },
        rig,
    ));
    ev_retarget.send(RetargetCamera(Some(car)));
}

fn load_sounds(mut commands: Commands, asset_server: Res<AssetServer>, hud: Res<HudSettings>) {
    if !Path::new("assets").join(UI_CLIP).exists() {
        info!("{} not found, UI sounds disabled", UI_CLIP);
        return;
    }
    let mut bank = SoundBank::default();
    bank.insert(hud.ui_sound_key.clone(), asset_server.load(UI_CLIP));
    commands.insert_resource(bank);
}
