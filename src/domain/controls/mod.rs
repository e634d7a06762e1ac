use bevy::prelude::*;
use bevy::utils::HashMap;

pub mod camera;

pub use camera::{CameraRig, CameraRigPlugin, RetargetCamera};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DriveAction {
    Accelerate,
    Reverse,
    TurnLeft,
    TurnRight,
    Handbrake,
}

impl DriveAction {
    pub const ALL: [DriveAction; 5] = [
        DriveAction::Accelerate,
        DriveAction::Reverse,
        DriveAction::TurnLeft,
        DriveAction::TurnRight,
        DriveAction::Handbrake,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DriveAction::Accelerate => "Accelerate",
            DriveAction::Reverse => "Reverse",
            DriveAction::TurnLeft => "Turn Left",
            DriveAction::TurnRight => "Turn Right",
            DriveAction::Handbrake => "Handbrake",
        }
    }
}

/// What the driver wants this frame. Rewritten wholesale every frame, never
/// cleared in between.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriveInput {
    pub accelerate: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub handbrake: bool,
}

impl DriveInput {
    pub fn get(&self, action: DriveAction) -> bool {
        match action {
            DriveAction::Accelerate => self.accelerate,
            DriveAction::Reverse => self.reverse,
            DriveAction::TurnLeft => self.turn_left,
            DriveAction::TurnRight => self.turn_right,
            DriveAction::Handbrake => self.handbrake,
        }
    }

    pub fn set(&mut self, action: DriveAction, value: bool) {
        match action {
            DriveAction::Accelerate => self.accelerate = value,
            DriveAction::Reverse => self.reverse = value,
            DriveAction::TurnLeft => self.turn_left = value,
            DriveAction::TurnRight => self.turn_right = value,
            DriveAction::Handbrake => self.handbrake = value,
        }
    }
}

#[derive(Resource, Clone, Debug, PartialEq)]
pub struct Keybinds {
    pub accelerate: KeyCode,
    pub reverse: KeyCode,
    pub turn_left: KeyCode,
    pub turn_right: KeyCode,
    pub handbrake: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            accelerate: KeyCode::ArrowUp,
            reverse: KeyCode::ArrowDown,
            turn_left: KeyCode::ArrowLeft,
            turn_right: KeyCode::ArrowRight,
            handbrake: KeyCode::Space,
        }
    }
}

impl Keybinds {
    pub fn key(&self, action: DriveAction) -> KeyCode {
        match action {
            DriveAction::Accelerate => self.accelerate,
            DriveAction::Reverse => self.reverse,
            DriveAction::TurnLeft => self.turn_left,
            DriveAction::TurnRight => self.turn_right,
            DriveAction::Handbrake => self.handbrake,
        }
    }

    pub fn key_mut(&mut self, action: DriveAction) -> &mut KeyCode {
        match action {
            DriveAction::Accelerate => &mut self.accelerate,
            DriveAction::Reverse => &mut self.reverse,
            DriveAction::TurnLeft => &mut self.turn_left,
            DriveAction::TurnRight => &mut self.turn_right,
            DriveAction::Handbrake => &mut self.handbrake,
        }
    }
}

/// On-screen button feeding one drive action. Pressed while its
/// `Interaction` is `Pressed`.
#[derive(Component, Clone, Copy, Debug)]
pub struct TouchButton(pub DriveAction);

/// Touch buttons found at startup. Only consulted when every action has one.
#[derive(Resource, Default, Debug)]
pub struct TouchControls {
    configured: bool,
    buttons: HashMap<DriveAction, Entity>,
}

impl TouchControls {
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn button(&self, action: DriveAction) -> Option<Entity> {
        self.buttons.get(&action).copied()
    }
}

/// Developer overlay visibility, flipped with the function keys.
#[derive(Resource, Clone, Debug)]
pub struct OverlayToggles {
    pub show_help: bool,
    pub show_settings: bool,
    pub show_diagnostics: bool,
}

impl Default for OverlayToggles {
    fn default() -> Self {
        Self {
            show_help: true,
            show_settings: false,
            show_diagnostics: false,
        }
    }
}

pub struct ControlsPlugin;
impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<DriveInput>()
            .init_resource::<TouchControls>()
            .init_resource::<OverlayToggles>()
            .add_systems(PostStartup, detect_touch_controls)
            .add_systems(
                Update,
                (aggregate_drive_input, help_toggle, settings_toggle, diagnostics_toggle),
            );
    }
}

pub fn resolve_action(key_down: bool, touch_configured: bool, touch_pressed: bool) -> bool {
    key_down || (touch_configured && touch_pressed)
}

fn detect_touch_controls(buttons: Query<(Entity, &TouchButton)>, mut touch: ResMut<TouchControls>) {
    touch.buttons = buttons.iter().map(|(e, b)| (b.0, e)).collect();
    touch.configured = DriveAction::ALL
        .iter()
        .all(|action| touch.buttons.contains_key(action));

    if touch.configured {
        debug!("touch controls configured");
    } else {
        debug!(
            "touch controls disabled, {} of {} buttons present",
            touch.buttons.len(),
            DriveAction::ALL.len()
        );
    }
}

fn aggregate_drive_input(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    touch: Res<TouchControls>,
    interactions: Query<&Interaction>,
    mut input: ResMut<DriveInput>,
) {
    let mut next = DriveInput::default();
    for action in DriveAction::ALL {
        let touch_pressed = touch
            .button(action)
            .and_then(|e| interactions.get(e).ok())
            .is_some_and(|i| *i == Interaction::Pressed);
        next.set(
            action,
            resolve_action(
                keys.pressed(keybinds.key(action)),
                touch.is_configured(),
                touch_pressed,
            ),
        );
    }

    // avoid tripping change detection for readers when nothing moved
    input.set_if_neq(next);
}

fn help_toggle(mut toggles: ResMut<OverlayToggles>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F1) {
        toggles.show_help = !toggles.show_help;
    }
}

fn settings_toggle(mut toggles: ResMut<OverlayToggles>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F2) {
        toggles.show_settings = !toggles.show_settings;
    }
}

fn diagnostics_toggle(mut toggles: ResMut<OverlayToggles>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        toggles.show_diagnostics = !toggles.show_diagnostics;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls_app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .add_plugins(ControlsPlugin);
        app
    }

    fn spawn_touch_buttons(app: &mut App, actions: &[DriveAction]) -> HashMap<DriveAction, Entity> {
        actions
            .iter()
            .map(|&a| {
                let e = app.world_mut().spawn((TouchButton(a), Interaction::None)).id();
                (a, e)
            })
            .collect()
    }

    #[test]
    fn resolve_truth_table() {
        for key in [false, true] {
            for pressed in [false, true] {
                assert_eq!(resolve_action(key, true, pressed), key || pressed);
                assert_eq!(resolve_action(key, false, pressed), key);
            }
        }
    }

    #[test]
    fn defaults_are_arrows_and_space() {
        let binds = Keybinds::default();
        assert_eq!(binds.key(DriveAction::Accelerate), KeyCode::ArrowUp);
        assert_eq!(binds.key(DriveAction::Reverse), KeyCode::ArrowDown);
        assert_eq!(binds.key(DriveAction::TurnLeft), KeyCode::ArrowLeft);
        assert_eq!(binds.key(DriveAction::TurnRight), KeyCode::ArrowRight);
        assert_eq!(binds.key(DriveAction::Handbrake), KeyCode::Space);
    }

    #[test]
    fn every_action_follows_key_or_touch() {
        let mut app = controls_app();
        let buttons = spawn_touch_buttons(&mut app, &DriveAction::ALL);
        app.update();
        assert!(app.world().resource::<TouchControls>().is_configured());

        let binds = Keybinds::default();
        for action in DriveAction::ALL {
            for key in [false, true] {
                for pressed in [false, true] {
                    {
                        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
                        keys.reset_all();
                        if key {
                            keys.press(binds.key(action));
                        }
                    }
                    let interaction = if pressed {
                        Interaction::Pressed
                    } else {
                        Interaction::None
                    };
                    app.world_mut().entity_mut(buttons[&action]).insert(interaction);
                    app.update();

                    let input = *app.world().resource::<DriveInput>();
                    assert_eq!(input.get(action), key || pressed, "{action:?} key={key} touch={pressed}");
                }
            }
            app.world_mut().entity_mut(buttons[&action]).insert(Interaction::None);
        }
    }

    #[test]
    fn partial_touch_setup_is_ignored() {
        let mut app = controls_app();
        let buttons = spawn_touch_buttons(
            &mut app,
            &[DriveAction::Accelerate, DriveAction::Reverse],
        );
        app.update();
        assert!(!app.world().resource::<TouchControls>().is_configured());

        app.world_mut()
            .entity_mut(buttons[&DriveAction::Accelerate])
            .insert(Interaction::Pressed);
        app.update();
        assert!(!app.world().resource::<DriveInput>().accelerate);
    }

    #[test]
    fn touch_setup_is_cached_at_startup() {
        let mut app = controls_app();
        app.update();
        assert!(!app.world().resource::<TouchControls>().is_configured());

        // buttons that show up later do not switch touch on
        let buttons = spawn_touch_buttons(&mut app, &DriveAction::ALL);
        app.world_mut()
            .entity_mut(buttons[&DriveAction::Handbrake])
            .insert(Interaction::Pressed);
        app.update();
        assert!(!app.world().resource::<TouchControls>().is_configured());
        assert!(!app.world().resource::<DriveInput>().handbrake);
    }

    #[test]
    fn rebinding_a_key_moves_the_action() {
        let mut app = controls_app();
        app.update();
        app.world_mut().resource_mut::<Keybinds>().accelerate = KeyCode::KeyW;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::ArrowUp);
        app.update();
        assert!(!app.world().resource::<DriveInput>().accelerate);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyW);
        app.update();
        assert!(app.world().resource::<DriveInput>().accelerate);
    }
}
