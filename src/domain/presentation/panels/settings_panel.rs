use bevy::prelude::*;
use bevy_egui::egui;

use crate::domain::controls::{CameraRig, DriveAction, Keybinds};
use crate::domain::presentation::HudSettings;
use crate::domain::simulation::LevelSession;

/// Live tuning window. `rebinding` holds the index into `DriveAction::ALL`
/// waiting for its next key press.
pub fn show_settings_panel(
    ctx: &egui::Context,
    keybinds: &mut Keybinds,
    hud: &mut HudSettings,
    rigs: &mut Query<&mut CameraRig>,
    session: &LevelSession,
    rebinding: &mut Option<usize>,
) {
    let mut pressed_key = None;
    ctx.input(|i| {
        for event in &i.events {
            if let egui::Event::Key {
                key, pressed: true, ..
            } = event
            {
                pressed_key = Some(*key);
            }
        }
    });

    egui::Window::new("Settings").show(ctx, |ui| {
        ui.label(format!(
            "Level {}  Time {:.1}s  Reward {}  Stars {}",
            session.level_index + 1,
            session.elapsed,
            session.reward,
            session.stars
        ));

        ui.separator();
        ui.label("Camera");
        for mut rig in rigs.iter_mut() {
            ui.add(egui::Slider::new(&mut rig.follow_speed, 1.0..=20.0).text("Follow speed"));
            ui.add(egui::Slider::new(&mut rig.look_speed, 1.0..=20.0).text("Look speed"));
            ui.add(egui::Slider::new(&mut rig.offset.y, 0.5..=10.0).text("Height"));
            ui.add(egui::Slider::new(&mut rig.offset.z, 2.0..=20.0).text("Distance"));
        }

        ui.separator();
        ui.label("HUD");
        ui.add(egui::Slider::new(&mut hud.element_duration, 0.1..=2.0).text("Element duration"));
        ui.add(egui::Slider::new(&mut hud.element_interval, 0.1..=2.0).text("Element interval"));
        ui.add(egui::Slider::new(&mut hud.result_delay, 0.1..=5.0).text("Result delay"));

        ui.separator();
        ui.label("Keybinds");
        for (index, action) in DriveAction::ALL.into_iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(action.label());
                let caption = if *rebinding == Some(index) {
                    "Press a key...".to_string()
                } else {
                    format!("{:?}", keybinds.key(action))
                };
                if ui.button(caption).clicked() {
                    *rebinding = Some(index);
                }
            });
        }
    });

    let Some(index) = *rebinding else {
        return;
    };
    if let Some(key) = pressed_key.and_then(egui_to_bevy_keycode) {
        *keybinds.key_mut(DriveAction::ALL[index]) = key;
        *rebinding = None;
    }
}

fn egui_to_bevy_keycode(key: egui::Key) -> Option<KeyCode> {
    use egui::Key;
    let code = match key {
        Key::ArrowUp => KeyCode::ArrowUp,
        Key::ArrowDown => KeyCode::ArrowDown,
        Key::ArrowLeft => KeyCode::ArrowLeft,
        Key::ArrowRight => KeyCode::ArrowRight,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Tab => KeyCode::Tab,
        Key::Backspace => KeyCode::Backspace,
        Key::W => KeyCode::KeyW,
        Key::A => KeyCode::KeyA,
        Key::S => KeyCode::KeyS,
        Key::D => KeyCode::KeyD,
        Key::Q => KeyCode::KeyQ,
        Key::E => KeyCode::KeyE,
        Key::Z => KeyCode::KeyZ,
        Key::X => KeyCode::KeyX,
        Key::C => KeyCode::KeyC,
        Key::I => KeyCode::KeyI,
        Key::J => KeyCode::KeyJ,
        Key::K => KeyCode::KeyK,
        Key::L => KeyCode::KeyL,
        Key::Num0 => KeyCode::Digit0,
        Key::Num1 => KeyCode::Digit1,
        Key::Num2 => KeyCode::Digit2,
        Key::Num3 => KeyCode::Digit3,
        _ => return None,
    };
    Some(code)
}
