use bevy::diagnostic::{
    DiagnosticPath, DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin,
};
use bevy_egui::egui;

use crate::domain::controls::{DriveAction, DriveInput, OverlayToggles};
use crate::domain::presentation::{HudPhase, UiAction};
use crate::domain::schedule::Scheduler;

pub fn show_diagnostics_panel(
    ctx: &egui::Context,
    diagnostics: &DiagnosticsStore,
    toggles: &OverlayToggles,
    input: &DriveInput,
    phase: HudPhase,
    ui_tasks: &Scheduler<UiAction>,
    flashing_hazards: usize,
) {
    if !toggles.show_diagnostics {
        return;
    }
    egui::Window::new("Diagnostics").show(ctx, |ui| {
        let smoothed = |path: &DiagnosticPath| diagnostics.get(path).and_then(|d| d.smoothed());
        if let Some(fps) = smoothed(&FrameTimeDiagnosticsPlugin::FPS) {
            ui.label(format!("FPS: {:.1}", fps));
        }
        if let Some(ms) = smoothed(&FrameTimeDiagnosticsPlugin::FRAME_TIME) {
            ui.label(format!("Frame: {:.2} ms", ms));
        }
        if let Some(count) = diagnostics
            .get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT)
            .and_then(|d| d.value())
        {
            ui.label(format!("Entities: {}", count));
        }

        ui.separator();
        ui.label(format!("HUD: {:?}", phase));
        if ui_tasks.is_empty() {
            ui.label("UI tasks: idle");
        } else {
            ui.label(format!("UI tasks: {} pending", ui_tasks.len()));
        }
        ui.label(format!("Hazards flashing: {}", flashing_hazards));
        let held: Vec<&str> = DriveAction::ALL
            .into_iter()
            .filter(|a| input.get(*a))
            .map(DriveAction::label)
            .collect();
        if held.is_empty() {
            ui.label("Input: -");
        } else {
            ui.label(format!("Input: {}", held.join(", ")));
        }
    });
}
