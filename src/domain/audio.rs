//! UI sound cues. Anything may fire a [`PlaySound`]; if no [`SoundBank`] is
//! loaded, or the key is unknown, the cue is dropped.

use bevy::prelude::*;
use bevy::utils::HashMap;

#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct PlaySound {
    pub key: String,
}

impl PlaySound {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[derive(Resource, Default)]
pub struct SoundBank {
    clips: HashMap<String, Handle<AudioSource>>,
}

impl SoundBank {
    pub fn insert(&mut self, key: impl Into<String>, clip: Handle<AudioSource>) {
        self.clips.insert(key.into(), clip);
    }

    pub fn get(&self, key: &str) -> Option<&Handle<AudioSource>> {
        self.clips.get(key)
    }
}

/// Marks the short-lived entity spawned for a single cue.
#[derive(Component)]
pub struct SoundCue;

pub struct AudioCuePlugin;
impl Plugin for AudioCuePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlaySound>()
            .add_systems(PostUpdate, play_sounds);
    }
}

pub fn play_sounds(
    mut commands: Commands,
    mut ev_sound: EventReader<PlaySound>,
    bank: Option<Res<SoundBank>>,
) {
    let Some(bank) = bank else {
        ev_sound.clear();
        return;
    };

    for ev in ev_sound.read() {
        match bank.get(&ev.key) {
            Some(clip) => {
                commands.spawn((
                    AudioBundle {
                        source: clip.clone(),
                        settings: PlaybackSettings::DESPAWN,
                    },
                    SoundCue,
                ));
            }
            None => debug!("no clip for sound key {:?}", ev.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue_count(app: &mut App) -> usize {
        let mut cues = app.world_mut().query_filtered::<(), With<SoundCue>>();
        cues.iter(app.world()).count()
    }

    #[test]
    fn missing_bank_is_a_no_op() {
        let mut app = App::new();
        app.add_plugins(AudioCuePlugin);
        app.world_mut().send_event(PlaySound::new("ui"));
        app.update();
        assert_eq!(cue_count(&mut app), 0);
    }

    #[test]
    fn known_key_spawns_one_cue() {
        let mut app = App::new();
        app.add_plugins(AudioCuePlugin);
        let mut bank = SoundBank::default();
        bank.insert("ui", Handle::default());
        app.insert_resource(bank);

        app.world_mut().send_event(PlaySound::new("ui"));
        app.world_mut().send_event(PlaySound::new("horn"));
        app.update();
        assert_eq!(cue_count(&mut app), 1);
    }
}
