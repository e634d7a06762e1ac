use bevy_egui::egui;

use crate::domain::controls::{DriveAction, Keybinds, OverlayToggles};

pub fn show_help_panel(ctx: &egui::Context, toggles: &OverlayToggles, keybinds: &Keybinds) {
    if toggles.show_help {
        egui::Window::new("Help").show(ctx, |ui| {
            for action in DriveAction::ALL {
                ui.label(format!("{:?}: {}", keybinds.key(action), action.label()));
            }
            ui.separator();
            ui.label("F1: Toggle Help");
            ui.label("F2: Settings");
            ui.label("F3: Diagnostics");
        });
    }
}
