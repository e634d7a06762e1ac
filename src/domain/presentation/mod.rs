use bevy::diagnostic::DiagnosticsStore;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin};

use crate::domain::audio::PlaySound;
use crate::domain::controls::{CameraRig, DriveInput, Keybinds, OverlayToggles};
use crate::domain::schedule::Scheduler;
use crate::domain::simulation::{
    Hazard, HealthChanged, HitFlash, LevelCommand, LevelCompleted, LevelFailed, LevelSession,
    LevelStarted,
};

pub mod hud;
pub mod orchestrator;
pub mod panels;
pub mod tween;

pub use hud::{HudLayout, HudSettings, ResultButton};
pub use orchestrator::{HudPhase, Orchestrator, UiAction};

use panels::{
    diagnostics_panel::show_diagnostics_panel, help_panel::show_help_panel,
    settings_panel::show_settings_panel,
};

/// In-game HUD: readouts plus the staggered show/hide choreography.
#[derive(Default)]
pub struct HudPlugin {
    pub settings: HudSettings,
}

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .init_resource::<orchestrator::Orchestrator>()
            .init_resource::<Scheduler<UiAction>>()
            .init_resource::<hud::HealthSegments>()
            .init_resource::<hud::SpeedReadout>()
            .add_event::<orchestrator::ResultScreenDue>()
            .add_event::<PlaySound>()
            .add_event::<HealthChanged>()
            .add_event::<LevelStarted>()
            .add_event::<LevelFailed>()
            .add_event::<LevelCompleted>()
            .add_event::<LevelCommand>()
            .add_systems(Startup, hud::spawn_hud)
            .add_systems(
                Update,
                (
                    orchestrator::open_gameplay_hud,
                    orchestrator::queue_result_screen,
                    orchestrator::run_ui_schedule,
                    orchestrator::present_result,
                    orchestrator::handle_result_buttons,
                    tween::advance_tweens,
                    hud::sync_health_segments,
                    hud::update_speed_text,
                    hud::update_timer_text,
                    hud::update_level_text,
                )
                    .chain()
                    .run_if(resource_exists::<HudLayout>),
            );
    }
}

/// egui developer overlays: help, live settings, diagnostics.
pub struct OverlayPlugin;
impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, overlay_system);
    }
}

#[allow(clippy::too_many_arguments)]
fn overlay_system(
    mut contexts: EguiContexts,
    toggles: Res<OverlayToggles>,
    mut keybinds: ResMut<Keybinds>,
    mut hud_settings: ResMut<HudSettings>,
    mut rigs: Query<&mut CameraRig>,
    session: Res<LevelSession>,
    diagnostics: Res<DiagnosticsStore>,
    input: Res<DriveInput>,
    orchestrator: Res<Orchestrator>,
    ui_tasks: Res<Scheduler<UiAction>>,
    hazards: Query<&Hazard>,
    mut rebinding: Local<Option<usize>>,
) {
    let ctx = contexts.ctx_mut();
    show_help_panel(ctx, &toggles, &keybinds);
    if toggles.show_settings {
        show_settings_panel(
            ctx,
            &mut keybinds,
            &mut hud_settings,
            &mut rigs,
            &session,
            &mut rebinding,
        );
    }
    let flashing = hazards
        .iter()
        .filter(|h| h.state() == HitFlash::Flashing)
        .count();
    show_diagnostics_panel(
        ctx,
        &diagnostics,
        &toggles,
        &input,
        orchestrator.phase,
        &ui_tasks,
        flashing,
    );
}
