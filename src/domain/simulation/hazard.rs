//! Obstacles that hurt the car on contact and flash a hit material.
//!
//! A hazard is either `Idle` or `Flashing`. Contact while idle deals damage
//! once, swaps in the hit material and schedules the revert; contact while
//! flashing is dropped outright. When several colliders touch a hazard in the
//! same frame only the first one counts.

use std::time::Duration;

use bevy::prelude::*;

use super::{detect_contacts, ContactEvent, Damageable, Health};
use crate::domain::error::SetupError;
use crate::domain::schedule::Scheduler;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitFlash {
    #[default]
    Idle,
    Flashing,
}

#[derive(Component, Clone, Debug)]
pub struct Hazard {
    pub damage: u32,
    pub hit_duration: f32,
    pub hit_material: Option<Handle<StandardMaterial>>,
    state: HitFlash,
    original_material: Option<Handle<StandardMaterial>>,
}

impl Default for Hazard {
    fn default() -> Self {
        Self {
            damage: 1,
            hit_duration: 0.5,
            hit_material: None,
            state: HitFlash::Idle,
            original_material: None,
        }
    }
}

impl Hazard {
    pub fn with_hit_material(hit_material: Handle<StandardMaterial>) -> Self {
        Self {
            hit_material: Some(hit_material),
            ..default()
        }
    }

    pub fn state(&self) -> HitFlash {
        self.state
    }

    /// Idle -> Flashing. Returns `false` if the hazard was already flashing.
    fn arm_flash(&mut self) -> bool {
        if self.state == HitFlash::Flashing {
            return false;
        }
        self.state = HitFlash::Flashing;
        true
    }

    fn rearm(&mut self) {
        self.state = HitFlash::Idle;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardAction {
    Revert(Entity),
}

pub struct HazardPlugin;
impl Plugin for HazardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Scheduler<HazardAction>>().add_systems(
            Update,
            (
                capture_original_material,
                run_hazard_timers,
                strike_on_contact::<Health>,
            )
                .chain()
                .after(detect_contacts),
        );
    }
}

fn capture_original_material(
    mut hazards: Query<(Entity, &mut Hazard, Option<&Handle<StandardMaterial>>), Added<Hazard>>,
) {
    for (entity, mut hazard, material) in &mut hazards {
        match material {
            Some(m) => hazard.original_material = Some(m.clone()),
            None => warn!("{}", SetupError::MissingRenderer(entity)),
        }
    }
}

fn run_hazard_timers(
    time: Res<Time>,
    mut scheduler: ResMut<Scheduler<HazardAction>>,
    mut hazards: Query<(&mut Hazard, Option<&mut Handle<StandardMaterial>>)>,
) {
    for action in scheduler.advance(time.delta()) {
        let HazardAction::Revert(entity) = action;
        // hazard may have been despawned while flashing
        let Ok((mut hazard, material)) = hazards.get_mut(entity) else {
            continue;
        };
        if let (Some(mut material), Some(original)) = (material, hazard.original_material.clone()) {
            *material = original;
        }
        hazard.rearm();
    }
}

pub fn strike_on_contact<D: Damageable>(
    mut ev_contact: EventReader<ContactEvent>,
    mut scheduler: ResMut<Scheduler<HazardAction>>,
    mut hazards: Query<(&mut Hazard, Option<&mut Handle<StandardMaterial>>)>,
    mut victims: Query<&mut D, Without<Hazard>>,
) {
    for ev in ev_contact.read() {
        for (hazard_entity, other) in [(ev.a, ev.b), (ev.b, ev.a)] {
            let Ok((mut hazard, material)) = hazards.get_mut(hazard_entity) else {
                continue;
            };
            let Ok(mut victim) = victims.get_mut(other) else {
                continue;
            };
            if !hazard.arm_flash() {
                continue;
            }

            victim.take_damage(hazard.damage);
            debug!("hazard {:?} hit {:?} for {}", hazard_entity, other, hazard.damage);

            if let (Some(mut material), Some(hit)) = (material, hazard.hit_material.clone()) {
                if hazard.original_material.is_some() {
                    *material = hit;
                }
            }
            scheduler.schedule_after(
                Duration::from_secs_f32(hazard.hit_duration.max(0.0)),
                HazardAction::Revert(hazard_entity),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORMAL: Handle<StandardMaterial> = Handle::weak_from_u128(0x4e4f524d);
    const HIT: Handle<StandardMaterial> = Handle::weak_from_u128(0x484954);

    fn hazard_app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .add_event::<ContactEvent>()
            .add_plugins(HazardPlugin);
        app
    }

    fn step(app: &mut App, millis: u64) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(millis));
        app.update();
    }

    fn touch(app: &mut App, a: Entity, b: Entity) {
        app.world_mut().send_event(ContactEvent { a, b });
    }

    struct Scene {
        hazard: Entity,
        car: Entity,
    }

    fn scene(app: &mut App) -> Scene {
        let hazard = app
            .world_mut()
            .spawn((Hazard::with_hit_material(HIT), NORMAL))
            .id();
        let car = app.world_mut().spawn(Health::new(5)).id();
        step(app, 0);
        Scene { hazard, car }
    }

    fn health(app: &App, e: Entity) -> u32 {
        app.world().get::<Health>(e).unwrap().current
    }

    fn material(app: &App, e: Entity) -> Handle<StandardMaterial> {
        app.world().get::<Handle<StandardMaterial>>(e).unwrap().clone()
    }

    #[test]
    fn hit_damages_once_and_flashes() {
        let mut app = hazard_app();
        let s = scene(&mut app);

        touch(&mut app, s.car, s.hazard);
        step(&mut app, 16);
        assert_eq!(health(&app, s.car), 4);
        assert_eq!(material(&app, s.hazard), HIT);
        assert_eq!(app.world().get::<Hazard>(s.hazard).unwrap().state(), HitFlash::Flashing);

        step(&mut app, 600);
        assert_eq!(material(&app, s.hazard), NORMAL);
        assert_eq!(app.world().get::<Hazard>(s.hazard).unwrap().state(), HitFlash::Idle);
    }

    #[test]
    fn contact_during_flash_is_ignored() {
        let mut app = hazard_app();
        let s = scene(&mut app);

        touch(&mut app, s.hazard, s.car);
        step(&mut app, 16);
        assert_eq!(health(&app, s.car), 4);

        step(&mut app, 200);
        touch(&mut app, s.hazard, s.car);
        step(&mut app, 100);
        assert_eq!(health(&app, s.car), 4);
        assert_eq!(material(&app, s.hazard), HIT);

        // past the hit duration: re-armed, next contact counts again
        step(&mut app, 300);
        assert_eq!(material(&app, s.hazard), NORMAL);
        touch(&mut app, s.hazard, s.car);
        step(&mut app, 16);
        assert_eq!(health(&app, s.car), 3);
    }

    #[test]
    fn first_contact_in_a_frame_wins() {
        let mut app = hazard_app();
        let s = scene(&mut app);
        let other_car = app.world_mut().spawn(Health::new(5)).id();

        touch(&mut app, s.hazard, s.car);
        touch(&mut app, s.hazard, other_car);
        step(&mut app, 16);
        assert_eq!(health(&app, s.car), 4);
        assert_eq!(health(&app, other_car), 5);
    }

    #[test]
    fn non_damageable_contact_does_nothing() {
        let mut app = hazard_app();
        let s = scene(&mut app);
        let rock = app.world_mut().spawn_empty().id();

        touch(&mut app, rock, s.hazard);
        step(&mut app, 16);
        assert_eq!(material(&app, s.hazard), NORMAL);
        assert_eq!(app.world().get::<Hazard>(s.hazard).unwrap().state(), HitFlash::Idle);
    }

    #[test]
    fn hazard_without_material_still_deals_damage() {
        let mut app = hazard_app();
        let hazard = app.world_mut().spawn(Hazard::default()).id();
        let car = app.world_mut().spawn(Health::new(2)).id();
        step(&mut app, 0);

        touch(&mut app, hazard, car);
        step(&mut app, 16);
        assert_eq!(health(&app, car), 1);
        assert!(app.world().get::<Handle<StandardMaterial>>(hazard).is_none());
    }

    #[derive(Component, Default)]
    struct Shield {
        absorbed: u32,
    }

    impl Damageable for Shield {
        fn take_damage(&mut self, amount: u32) {
            self.absorbed += amount;
        }
    }

    #[test]
    fn strikes_reach_any_damageable_component() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<Scheduler<HazardAction>>()
            .add_event::<ContactEvent>()
            .add_systems(Update, strike_on_contact::<Shield>);
        let hazard = app.world_mut().spawn(Hazard::default()).id();
        let wall = app.world_mut().spawn(Shield::default()).id();

        touch(&mut app, wall, hazard);
        step(&mut app, 16);
        assert_eq!(app.world().get::<Shield>(wall).unwrap().absorbed, 1);
        assert_eq!(app.world().get::<Hazard>(hazard).unwrap().state(), HitFlash::Flashing);
    }

    #[test]
    fn despawned_hazard_revert_is_a_no_op() {
        let mut app = hazard_app();
        let s = scene(&mut app);
        touch(&mut app, s.hazard, s.car);
        step(&mut app, 16);

        app.world_mut().despawn(s.hazard);
        step(&mut app, 600);
        assert!(app.world().resource::<Scheduler<HazardAction>>().is_empty());
    }
}
