//! HUD visibility state machine.
//!
//! ```text
//! Hidden --level started--> GameplayVisible --failed/completed (+delay)--> ResultVisible
//!   ^                                                                          |
//!   +--------------------------- menu / restart pressed -----------------------+
//! ```

use std::time::Duration;

use bevy::prelude::*;

use super::hud::{HudLayout, HudSettings, ResultButton};
use super::tween::ScaleTween;
use crate::domain::audio::PlaySound;
use crate::domain::error::SetupError;
use crate::domain::schedule::{stagger, Scheduler, TaskHandle};
use crate::domain::simulation::{
    LevelCommand, LevelCompleted, LevelFailed, LevelSession, LevelStarted,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HudPhase {
    #[default]
    Hidden,
    GameplayVisible,
    ResultVisible,
}

#[derive(Resource, Default, Debug)]
pub struct Orchestrator {
    pub phase: HudPhase,
    pending_result: Option<TaskHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    Reveal(Entity),
    Conceal(Entity),
    ShowResult { success: bool },
}

/// The result-screen delay ran out.
#[derive(Event, Clone, Copy, Debug)]
pub struct ResultScreenDue {
    pub success: bool,
}

fn open_group(scheduler: &mut Scheduler<UiAction>, elements: &[Entity], settings: &HudSettings) {
    stagger(scheduler, elements, settings.element_interval, UiAction::Reveal);
}

fn close_group(scheduler: &mut Scheduler<UiAction>, elements: &[Entity], settings: &HudSettings) {
    stagger(scheduler, elements, settings.element_interval, UiAction::Conceal);
}

pub fn open_gameplay_hud(
    mut ev_started: EventReader<LevelStarted>,
    layout: Res<HudLayout>,
    settings: Res<HudSettings>,
    mut orchestrator: ResMut<Orchestrator>,
    mut scheduler: ResMut<Scheduler<UiAction>>,
) {
    for _ in ev_started.read() {
        if let Some(pending) = orchestrator.pending_result.take() {
            scheduler.cancel(pending);
        }
        open_group(&mut scheduler, &layout.gameplay, &settings);
        orchestrator.phase = HudPhase::GameplayVisible;
    }
}

pub fn queue_result_screen(
    mut ev_failed: EventReader<LevelFailed>,
    mut ev_completed: EventReader<LevelCompleted>,
    settings: Res<HudSettings>,
    mut orchestrator: ResMut<Orchestrator>,
    mut scheduler: ResMut<Scheduler<UiAction>>,
) {
    let outcomes = ev_failed
        .read()
        .map(|_| false)
        .chain(ev_completed.read().map(|_| true));
    for success in outcomes {
        if let Some(pending) = orchestrator.pending_result.take() {
            scheduler.cancel(pending);
        }
        let delay = Duration::from_secs_f32(settings.result_delay.max(0.0));
        orchestrator.pending_result =
            Some(scheduler.schedule_after(delay, UiAction::ShowResult { success }));
    }
}

pub fn run_ui_schedule(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<HudSettings>,
    mut scheduler: ResMut<Scheduler<UiAction>>,
    mut nodes: Query<(&Transform, &mut Visibility)>,
    mut ev_sound: EventWriter<PlaySound>,
    mut ev_result: EventWriter<ResultScreenDue>,
) {
    for action in scheduler.advance(time.delta()) {
        match action {
            UiAction::Reveal(e) => {
                // node torn down before its turn came
                let Ok((t, mut vis)) = nodes.get_mut(e) else {
                    continue;
                };
                *vis = Visibility::Inherited;
                commands.entity(e).insert(ScaleTween::new(
                    t.scale.x,
                    1.0,
                    settings.element_duration,
                    settings.open_ease,
                ));
                ev_sound.send(PlaySound::new(settings.ui_sound_key.clone()));
            }
            UiAction::Conceal(e) => {
                let Ok((t, _)) = nodes.get(e) else {
                    continue;
                };
                commands.entity(e).insert(
                    ScaleTween::new(t.scale.x, 0.0, settings.element_duration, settings.close_ease)
                        .hiding(),
                );
                ev_sound.send(PlaySound::new(settings.ui_sound_key.clone()));
            }
            UiAction::ShowResult { success } => {
                ev_result.send(ResultScreenDue { success });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn present_result(
    mut ev_result: EventReader<ResultScreenDue>,
    session: Option<Res<LevelSession>>,
    layout: Res<HudLayout>,
    settings: Res<HudSettings>,
    mut orchestrator: ResMut<Orchestrator>,
    mut scheduler: ResMut<Scheduler<UiAction>>,
    mut texts: Query<&mut Text>,
    mut visibility: Query<&mut Visibility>,
) {
    for ev in ev_result.read() {
        orchestrator.pending_result = None;

        let Some(session) = session.as_deref() else {
            warn!(
                "result screen skipped: {}",
                SetupError::CollaboratorUnavailable("level session")
            );
            continue;
        };
        let (reward, stars) = (session.reward, session.stars);

        let mut set_text = |e: Entity, value: String| {
            if let Ok(mut text) = texts.get_mut(e) {
                text.sections[0].value = value;
            }
        };
        set_text(layout.coin_text, reward.to_string());
        let (label, message) = if ev.success {
            (&settings.next_label, &settings.level_complete_message)
        } else {
            (&settings.restart_label, &settings.level_fail_message)
        };
        set_text(layout.restart_label, label.clone());
        set_text(layout.result_text, message.clone());

        for (i, &star) in layout.stars.iter().enumerate() {
            if let Ok(mut vis) = visibility.get_mut(star) {
                *vis = if i < stars as usize {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }

        close_group(&mut scheduler, &layout.gameplay, &settings);
        open_group(&mut scheduler, &layout.result, &settings);
        orchestrator.phase = HudPhase::ResultVisible;
    }
}

pub fn handle_result_buttons(
    buttons: Query<(&Interaction, &ResultButton), Changed<Interaction>>,
    layout: Res<HudLayout>,
    settings: Res<HudSettings>,
    mut orchestrator: ResMut<Orchestrator>,
    mut scheduler: ResMut<Scheduler<UiAction>>,
    mut ev_command: EventWriter<LevelCommand>,
) {
    for (interaction, button) in &buttons {
        if *interaction != Interaction::Pressed || orchestrator.phase != HudPhase::ResultVisible {
            continue;
        }
        ev_command.send(match button {
            ResultButton::Menu => LevelCommand::Menu,
            ResultButton::Restart => LevelCommand::Restart,
        });
        close_group(&mut scheduler, &layout.result, &settings);
        orchestrator.phase = HudPhase::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::presentation::hud::HealthSegments;
    use crate::domain::presentation::HudPlugin;
    use crate::domain::simulation::{Health, HealthChanged, Player, Vehicle};

    #[derive(Resource, Default)]
    struct SoundLog(usize);

    fn log_sounds(mut ev_sound: EventReader<PlaySound>, mut log: ResMut<SoundLog>) {
        log.0 += ev_sound.read().count();
    }

    fn hud_app_with(session: Option<LevelSession>) -> App {
        let mut app = App::new();
        app.init_resource::<Time>().init_resource::<SoundLog>();
        if let Some(session) = session {
            app.insert_resource(session);
        }
        app.add_plugins(HudPlugin::default())
            .add_systems(Last, log_sounds);
        app.update();
        app
    }

    fn hud_app() -> App {
        hud_app_with(Some(LevelSession::default()))
    }

    fn show_failed_result(app: &mut App) {
        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(app, 1.0);
        app.world_mut().send_event(LevelFailed);
        run_for(app, 3.0);
    }

    fn drain_commands(app: &mut App) -> Vec<LevelCommand> {
        app.world_mut()
            .resource_mut::<Events<LevelCommand>>()
            .drain()
            .collect()
    }

    fn run_for(app: &mut App, seconds: f32) {
        let frames = (seconds / 0.05).ceil() as u32;
        for _ in 0..frames {
            app.world_mut()
                .resource_mut::<Time>()
                .advance_by(Duration::from_millis(50));
            app.update();
        }
    }

    fn layout(app: &App) -> HudLayout {
        app.world().resource::<HudLayout>().clone()
    }

    fn visible(app: &App, e: Entity) -> bool {
        *app.world().get::<Visibility>(e).unwrap() != Visibility::Hidden
    }

    fn scale(app: &App, e: Entity) -> f32 {
        app.world().get::<Transform>(e).unwrap().scale.x
    }

    fn text(app: &App, e: Entity) -> String {
        app.world().get::<Text>(e).unwrap().sections[0].value.clone()
    }

    fn phase(app: &App) -> HudPhase {
        app.world().resource::<Orchestrator>().phase
    }

    fn sounds(app: &mut App) -> usize {
        std::mem::take(&mut app.world_mut().resource_mut::<SoundLog>().0)
    }

    #[test]
    fn starts_hidden_with_level_number_showing() {
        let app = hud_app();
        let l = layout(&app);
        assert_eq!(phase(&app), HudPhase::Hidden);
        assert!(visible(&app, l.level_text));
        assert_eq!(text(&app, l.level_text), "1");
        for &e in l.gameplay.iter().skip(1).chain(&l.result) {
            assert!(!visible(&app, e));
            assert_eq!(scale(&app, e), 0.0);
        }
    }

    #[test]
    fn level_start_reveals_gameplay_in_order() {
        let mut app = hud_app();
        let l = layout(&app);
        sounds(&mut app);

        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(&mut app, 0.05);
        assert_eq!(phase(&app), HudPhase::GameplayVisible);
        assert!(visible(&app, l.gameplay[0]));
        assert!(!visible(&app, l.gameplay[3]));

        run_for(&mut app, 2.0);
        for &e in &l.gameplay {
            assert!(visible(&app, e));
            assert_eq!(scale(&app, e), 1.0);
        }
        assert_eq!(sounds(&mut app), l.gameplay.len());
    }

    #[test]
    fn failed_level_shows_result_screen() {
        let mut app = hud_app();
        let l = layout(&app);
        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(&mut app, 2.0);

        {
            let mut session = app.world_mut().resource_mut::<LevelSession>();
            session.reward = 50;
            session.stars = 2;
        }
        app.world_mut().send_event(LevelFailed);
        run_for(&mut app, 0.5);
        // still waiting out the result delay
        assert_eq!(phase(&app), HudPhase::GameplayVisible);
        assert!(!visible(&app, l.result[0]));

        run_for(&mut app, 2.5);
        assert_eq!(phase(&app), HudPhase::ResultVisible);
        assert_eq!(text(&app, l.coin_text), "50");
        assert!(visible(&app, l.stars[0]));
        assert!(visible(&app, l.stars[1]));
        assert!(!visible(&app, l.stars[2]));
        assert_eq!(text(&app, l.restart_label), "Restart");
        assert_eq!(text(&app, l.result_text), "Level Failed");
        for &e in &l.gameplay {
            assert!(!visible(&app, e));
            assert_eq!(scale(&app, e), 0.0);
        }
        for &e in &l.result {
            assert!(visible(&app, e));
            assert_eq!(scale(&app, e), 1.0);
        }
    }

    #[test]
    fn completed_level_labels_next() {
        let mut app = hud_app();
        let l = layout(&app);
        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(&mut app, 1.0);
        app.world_mut().resource_mut::<LevelSession>().stars = 3;
        app.world_mut().send_event(LevelCompleted);
        run_for(&mut app, 3.0);

        assert_eq!(text(&app, l.restart_label), "Next");
        assert_eq!(text(&app, l.result_text), "Level Complete!");
        assert!(l.stars.iter().all(|&s| visible(&app, s)));
    }

    #[test]
    fn restart_before_result_cancels_it() {
        let mut app = hud_app();
        let l = layout(&app);
        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(&mut app, 1.0);
        app.world_mut().send_event(LevelFailed);
        run_for(&mut app, 0.3);
        app.world_mut().send_event(LevelStarted { level_index: 0 });
        run_for(&mut app, 3.0);

        assert_eq!(phase(&app), HudPhase::GameplayVisible);
        assert!(!visible(&app, l.result[0]));
    }

    #[test]
    fn restart_button_forwards_and_hides_result() {
        let mut app = hud_app();
        let l = layout(&app);
        show_failed_result(&mut app);
        assert_eq!(phase(&app), HudPhase::ResultVisible);

        let restart = *l.result.last().unwrap();
        app.world_mut().entity_mut(restart).insert(Interaction::Pressed);
        run_for(&mut app, 0.05);
        assert_eq!(phase(&app), HudPhase::Hidden);
        assert_eq!(drain_commands(&mut app), vec![LevelCommand::Restart]);

        run_for(&mut app, 2.0);
        for &e in &l.result {
            assert!(!visible(&app, e));
        }
    }

    #[test]
    fn menu_button_forwards_and_hides_result() {
        let mut app = hud_app();
        let l = layout(&app);
        show_failed_result(&mut app);

        let menu = l.result[2];
        assert_eq!(app.world().get::<ResultButton>(menu), Some(&ResultButton::Menu));
        app.world_mut().entity_mut(menu).insert(Interaction::Pressed);
        run_for(&mut app, 0.05);
        assert_eq!(phase(&app), HudPhase::Hidden);
        assert_eq!(drain_commands(&mut app), vec![LevelCommand::Menu]);

        run_for(&mut app, 2.0);
        for &e in &l.result {
            assert!(!visible(&app, e));
        }
    }

    #[test]
    fn result_skipped_without_level_session() {
        let mut app = hud_app_with(None);
        let l = layout(&app);
        show_failed_result(&mut app);

        assert_eq!(phase(&app), HudPhase::GameplayVisible);
        assert_eq!(text(&app, l.coin_text), "0");
        assert_eq!(text(&app, l.result_text), "");
        for &e in &l.result {
            assert!(!visible(&app, e));
        }
        assert_eq!(text(&app, l.timer_text), "00:00");
        assert_eq!(text(&app, l.level_text), "1");
    }

    #[test]
    fn speed_readout_follows_player_vehicle() {
        let mut app = hud_app();
        let l = layout(&app);
        run_for(&mut app, 0.2);
        assert_eq!(text(&app, l.speed_text), "0");

        let vehicle = Vehicle {
            speed: 20.0,
            ..default()
        };
        let expected = format!("{:.0}", vehicle.display_speed());
        app.world_mut().spawn((Player, vehicle));
        run_for(&mut app, 0.05);
        // smoothed, so one frame is not enough to get there
        assert_ne!(text(&app, l.speed_text), expected);

        run_for(&mut app, 1.0);
        assert_eq!(text(&app, l.speed_text), expected);
    }

    #[test]
    fn buttons_ignored_outside_result_phase() {
        let mut app = hud_app();
        let l = layout(&app);
        app.world_mut()
            .entity_mut(l.result[2])
            .insert(Interaction::Pressed);
        run_for(&mut app, 0.05);
        assert!(app.world().resource::<Events<LevelCommand>>().is_empty());
    }

    #[test]
    fn health_segments_track_player() {
        let mut app = hud_app();
        let car = app.world_mut().spawn((Player, Health::new(4))).id();
        app.world_mut().send_event(HealthChanged {
            entity: car,
            health: 4,
            max: 4,
        });
        run_for(&mut app, 0.05);
        let segments = app.world().resource::<HealthSegments>().segments.clone();
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|&s| visible(&app, s)));

        app.world_mut().send_event(HealthChanged {
            entity: car,
            health: 1,
            max: 4,
        });
        run_for(&mut app, 0.05);
        let shown: Vec<bool> = segments.iter().map(|&s| visible(&app, s)).collect();
        assert_eq!(shown, vec![true, false, false, false]);

        // someone else's health is not ours to draw
        let other = app.world_mut().spawn(Health::new(9)).id();
        app.world_mut().send_event(HealthChanged {
            entity: other,
            health: 9,
            max: 9,
        });
        run_for(&mut app, 0.05);
        assert_eq!(app.world().resource::<HealthSegments>().segments, segments);
    }

    #[test]
    fn timer_follows_session_clock() {
        let mut app = hud_app();
        let l = layout(&app);
        {
            let mut session = app.world_mut().resource_mut::<LevelSession>();
            session.show_timer = true;
            session.elapsed = 125.4;
        }
        run_for(&mut app, 0.05);
        assert_eq!(text(&app, l.timer_text), "02:05");

        app.world_mut().resource_mut::<LevelSession>().show_timer = false;
        run_for(&mut app, 0.05);
        assert!(!visible(&app, l.timer_text));
    }
}
