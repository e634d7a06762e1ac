//! HUD layout and the readouts that refresh every frame: speed, clock, level
//! number and health segments.

use bevy::prelude::*;

use super::tween::Ease;
use crate::domain::controls::{DriveAction, TouchButton};
use crate::domain::error::SetupError;
use crate::domain::simulation::{HealthChanged, LevelSession, Player, Vehicle};

#[derive(Resource, Clone, Debug)]
pub struct HudSettings {
    /// Seconds each element takes to scale in or out.
    pub element_duration: f32,
    /// Gap between consecutive elements of a staggered open/close.
    pub element_interval: f32,
    pub open_ease: Ease,
    pub close_ease: Ease,
    /// Wait between the level ending and the result screen appearing.
    pub result_delay: f32,
    pub level_complete_message: String,
    pub level_fail_message: String,
    pub restart_label: String,
    pub next_label: String,
    pub ui_sound_key: String,
    /// Time constant of the speed readout smoothing.
    pub speed_smooth_time: f32,
    pub star_count: usize,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            element_duration: 0.5,
            element_interval: 0.1,
            open_ease: Ease::OutBack,
            close_ease: Ease::InBack,
            result_delay: 1.0,
            level_complete_message: "Level Complete!".into(),
            level_fail_message: "Level Failed".into(),
            restart_label: "Restart".into(),
            next_label: "Next".into(),
            ui_sound_key: "ui".into(),
            speed_smooth_time: 0.1,
            star_count: 3,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultButton {
    Menu,
    Restart,
}

/// Entities of the spawned HUD, handed to every system that drives it.
#[derive(Resource, Clone, Debug)]
pub struct HudLayout {
    pub level_text: Entity,
    pub timer_text: Entity,
    pub speed_text: Entity,
    pub health_container: Entity,
    pub coin_text: Entity,
    pub result_text: Entity,
    pub restart_label: Entity,
    pub stars: Vec<Entity>,
    /// Opened when a level starts, closed when the result screen shows.
    pub gameplay: Vec<Entity>,
    pub result: Vec<Entity>,
}

#[derive(Resource, Default, Debug)]
pub struct HealthSegments {
    pub segments: Vec<Entity>,
}

#[derive(Resource, Default, Debug)]
pub struct SpeedReadout {
    pub shown: f32,
    velocity: f32,
}

const PANEL: Color = Color::srgba(0.05, 0.06, 0.09, 0.85);
const SEGMENT: Color = Color::srgb(0.86, 0.2, 0.24);
const BUTTON: Color = Color::srgba(1.0, 1.0, 1.0, 0.18);
const STAR: Color = Color::srgb(1.0, 0.8, 0.2);

/// Critically damped approach of `current` toward `target`. `velocity` carries
/// state between calls. Never overshoots the target.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(seconds: f32) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u32;
    let secs = (seconds % 60.0).floor() as u32;
    format!("{:02}:{:02}", minutes, secs)
}

pub fn segment_visible(index: usize, health: u32) -> bool {
    index < health as usize
}

fn label(text: impl Into<String>, size: f32) -> TextBundle {
    TextBundle::from_section(
        text,
        TextStyle {
            font_size: size,
            color: Color::WHITE,
            ..default()
        },
    )
}

fn hidden_node(style: Style, color: Color) -> NodeBundle {
    NodeBundle {
        style,
        background_color: color.into(),
        transform: Transform::from_scale(Vec3::ZERO),
        visibility: Visibility::Hidden,
        ..default()
    }
}

fn hidden_button(style: Style) -> ButtonBundle {
    ButtonBundle {
        style,
        background_color: BUTTON.into(),
        transform: Transform::from_scale(Vec3::ZERO),
        visibility: Visibility::Hidden,
        ..default()
    }
}

fn hidden_label(text: impl Into<String>, size: f32) -> TextBundle {
    let mut bundle = label(text, size);
    bundle.transform = Transform::from_scale(Vec3::ZERO);
    bundle.visibility = Visibility::Hidden;
    bundle
}

pub fn spawn_hud(
    mut commands: Commands,
    settings: Res<HudSettings>,
    session: Option<Res<LevelSession>>,
) {
    let level_index = session.map(|s| s.level_index).unwrap_or_default();

    let root = commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            ..default()
        })
        .id();

    // level number is the one element visible before the level starts
    let level_text = commands
        .spawn(label((level_index + 1).to_string(), 40.0).with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(16.0),
            left: Val::Px(24.0),
            ..default()
        }))
        .id();

    let timer_text = commands
        .spawn(label(format_clock(0.0), 32.0).with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(16.0),
            left: Val::Percent(46.0),
            ..default()
        }))
        .id();

    let health_container = commands
        .spawn(hidden_node(
            Style {
                position_type: PositionType::Absolute,
                top: Val::Px(20.0),
                right: Val::Px(24.0),
                column_gap: Val::Px(6.0),
                padding: UiRect::all(Val::Px(6.0)),
                ..default()
            },
            PANEL,
        ))
        .id();

    let speed_text = commands.spawn(label("0", 48.0)).id();
    let speed_display = commands
        .spawn(hidden_node(
            Style {
                position_type: PositionType::Absolute,
                bottom: Val::Px(140.0),
                right: Val::Px(32.0),
                padding: UiRect::all(Val::Px(10.0)),
                ..default()
            },
            PANEL,
        ))
        .add_child(speed_text)
        .id();

    let control_buttons = commands
        .spawn(hidden_node(
            Style {
                position_type: PositionType::Absolute,
                bottom: Val::Px(24.0),
                width: Val::Percent(100.0),
                justify_content: JustifyContent::SpaceEvenly,
                ..default()
            },
            Color::NONE,
        ))
        .id();

    let mut touch_buttons = Vec::with_capacity(DriveAction::ALL.len());
    for action in DriveAction::ALL {
        let caption = commands.spawn(label(action.label(), 18.0)).id();
        let button = commands
            .spawn((
                hidden_button(Style {
                    width: Val::Px(110.0),
                    height: Val::Px(80.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                }),
                TouchButton(action),
            ))
            .add_child(caption)
            .id();
        touch_buttons.push(button);
    }
    commands.entity(control_buttons).push_children(&touch_buttons);

    let result_text = commands.spawn(hidden_label("", 44.0)).id();
    let coin_text = commands.spawn(label("0", 32.0)).id();

    let stars: Vec<Entity> = (0..settings.star_count)
        .map(|_| {
            commands
                .spawn(NodeBundle {
                    style: Style {
                        width: Val::Px(36.0),
                        height: Val::Px(36.0),
                        ..default()
                    },
                    background_color: STAR.into(),
                    visibility: Visibility::Hidden,
                    ..default()
                })
                .id()
        })
        .collect();
    let star_row = commands
        .spawn(NodeBundle {
            style: Style {
                column_gap: Val::Px(8.0),
                ..default()
            },
            ..default()
        })
        .push_children(&stars)
        .id();

    let result_button_style = Style {
        width: Val::Px(160.0),
        height: Val::Px(56.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    };
    let menu_caption = commands.spawn(label("Menu", 24.0)).id();
    let menu_button = commands
        .spawn((hidden_button(result_button_style.clone()), ResultButton::Menu))
        .add_child(menu_caption)
        .id();
    let restart_label = commands.spawn(label(settings.restart_label.clone(), 24.0)).id();
    let restart_button = commands
        .spawn((hidden_button(result_button_style), ResultButton::Restart))
        .add_child(restart_label)
        .id();

    let result_panel = commands
        .spawn(hidden_node(
            Style {
                position_type: PositionType::Absolute,
                left: Val::Percent(30.0),
                top: Val::Percent(20.0),
                width: Val::Percent(40.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                padding: UiRect::all(Val::Px(24.0)),
                ..default()
            },
            PANEL,
        ))
        .push_children(&[result_text, star_row, coin_text, menu_button, restart_button])
        .id();

    commands.entity(root).push_children(&[
        level_text,
        timer_text,
        health_container,
        speed_display,
        control_buttons,
        result_panel,
    ]);

    let mut gameplay = vec![level_text, health_container, control_buttons, speed_display];
    gameplay.extend(touch_buttons);

    commands.insert_resource(HudLayout {
        level_text,
        timer_text,
        speed_text,
        health_container,
        coin_text,
        result_text,
        restart_label,
        stars,
        gameplay,
        result: vec![result_panel, result_text, menu_button, restart_button],
    });
}

fn spawn_segment(commands: &mut Commands, visible: bool) -> Entity {
    commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Px(22.0),
                height: Val::Px(14.0),
                ..default()
            },
            background_color: SEGMENT.into(),
            visibility: if visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            },
            ..default()
        })
        .id()
}

/// Rebuilds the bar when the announced max differs from what is on screen,
/// then shows segment `i` iff `i < health`.
pub fn sync_health_segments(
    mut commands: Commands,
    mut ev_health: EventReader<HealthChanged>,
    layout: Res<HudLayout>,
    players: Query<(), With<Player>>,
    mut bar: ResMut<HealthSegments>,
    mut visibility: Query<&mut Visibility>,
) {
    for ev in ev_health.read() {
        if !players.contains(ev.entity) {
            continue;
        }

        if bar.segments.len() != ev.max as usize {
            for e in bar.segments.drain(..) {
                commands.entity(e).despawn_recursive();
            }
            let segments: Vec<Entity> = (0..ev.max as usize)
                .map(|i| spawn_segment(&mut commands, segment_visible(i, ev.health)))
                .collect();
            commands.entity(layout.health_container).push_children(&segments);
            bar.segments = segments;
            continue;
        }

        for (i, &e) in bar.segments.iter().enumerate() {
            if let Ok(mut vis) = visibility.get_mut(e) {
                *vis = if segment_visible(i, ev.health) {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}

pub fn update_speed_text(
    time: Res<Time>,
    settings: Res<HudSettings>,
    layout: Res<HudLayout>,
    mut readout: ResMut<SpeedReadout>,
    vehicles: Query<&Vehicle, With<Player>>,
    mut texts: Query<&mut Text>,
    mut reported_missing: Local<bool>,
) {
    let Ok(vehicle) = vehicles.get_single() else {
        report_outage("player vehicle", &mut reported_missing);
        return;
    };
    *reported_missing = false;

    let SpeedReadout { shown, velocity } = &mut *readout;
    *shown = smooth_damp(
        *shown,
        vehicle.display_speed(),
        velocity,
        settings.speed_smooth_time,
        time.delta_seconds(),
    );
    if let Ok(mut text) = texts.get_mut(layout.speed_text) {
        text.sections[0].value = format!("{:.0}", readout.shown);
    }
}

/// Logs a missing collaborator once per outage rather than every frame.
fn report_outage(what: &'static str, reported: &mut bool) {
    if !*reported {
        debug!("{}", SetupError::CollaboratorUnavailable(what));
        *reported = true;
    }
}

pub fn update_timer_text(
    session: Option<Res<LevelSession>>,
    layout: Res<HudLayout>,
    mut texts: Query<&mut Text>,
    mut visibility: Query<&mut Visibility>,
    mut reported_missing: Local<bool>,
) {
    let Some(session) = session else {
        report_outage("level session", &mut reported_missing);
        return;
    };
    *reported_missing = false;
    if let Ok(mut vis) = visibility.get_mut(layout.timer_text) {
        vis.set_if_neq(if session.show_timer {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
    if !session.show_timer {
        return;
    }
    if let Ok(mut text) = texts.get_mut(layout.timer_text) {
        let clock = format_clock(session.elapsed);
        if text.sections[0].value != clock {
            text.sections[0].value = clock;
        }
    }
}

pub fn update_level_text(
    session: Option<Res<LevelSession>>,
    layout: Res<HudLayout>,
    mut texts: Query<&mut Text>,
    mut reported_missing: Local<bool>,
) {
    let Some(session) = session else {
        report_outage("level session", &mut reported_missing);
        return;
    };
    *reported_missing = false;
    if !session.is_changed() {
        return;
    }
    if let Ok(mut text) = texts.get_mut(layout.level_text) {
        text.sections[0].value = (session.level_index + 1).to_string();
    }
}
