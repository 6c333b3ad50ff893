// Sound cues synthesised at startup into in-memory WAV clips.
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::io::Cursor;

use bevy::prelude::*;
use rand::Rng;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

pub struct SfxPlugin;

impl Plugin for SfxPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PlayCue>()
            .init_resource::<CueBank>()
            .add_systems(Startup, synthesize_cues)
            .add_systems(Update, play_cues);
    }
}

pub const SAMPLE_RATE: u32 = 22_050;

/// Symbolic sound cues the game can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AudioCue {
    Hit,
    Heal,
    MenuSelect,
    MenuMove,
    Explosion,
    RhythmGood,
    RhythmPerfect,
    FireSpell,
    IceSpell,
    Lightning,
}

/// Fire-and-forget request to play a cue.
#[derive(Message, Debug, Clone, Copy)]
pub struct PlayCue(pub AudioCue);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Square(f32),
    Chord(&'static [f32]),
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    /// Seconds.
    pub duration: f32,
    /// Peak amplitude in [0, 1].
    pub volume: f32,
}

impl AudioCue {
    pub fn voice(self) -> Voice {
        let (waveform, duration, volume) = match self {
            AudioCue::Hit => (Waveform::Square(440.0), 0.1, 0.3),
            AudioCue::Heal => (Waveform::Chord(&[523.0, 659.0, 784.0]), 0.3, 0.5),
            AudioCue::MenuSelect => (Waveform::Square(330.0), 0.05, 0.2),
            AudioCue::MenuMove => (Waveform::Square(220.0), 0.05, 0.1),
            AudioCue::Explosion => (Waveform::Noise, 0.2, 0.5),
            AudioCue::RhythmGood => (Waveform::Chord(&[784.0, 988.0]), 0.1, 0.4),
            AudioCue::RhythmPerfect => (Waveform::Chord(&[1046.0, 1318.0]), 0.15, 0.6),
            AudioCue::FireSpell => (Waveform::Noise, 0.3, 0.4),
            AudioCue::IceSpell => (Waveform::Chord(&[523.0]), 0.4, 0.3),
            AudioCue::Lightning => (Waveform::Square(880.0), 0.2, 0.5),
        };
        Voice {
            waveform,
            duration,
            volume,
        }
    }
}

/// Render a voice to signed 16-bit mono samples with a linear fade-out.
pub fn synthesize(voice: &Voice) -> Vec<i16> {
    let count = (SAMPLE_RATE as f32 * voice.duration) as usize;
    let mut rng = rand::rng();

    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let raw = match voice.waveform {
                Waveform::Square(freq) => {
                    if (TAU * freq * t).sin() >= 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                Waveform::Chord(freqs) => {
                    let sum: f32 = freqs.iter().map(|f| (TAU * f * t).sin()).sum();
                    sum / freqs.len().max(1) as f32
                }
                Waveform::Noise => rng.random_range(-1.0..=1.0),
            };
            let envelope = 1.0 - i as f32 / count as f32;
            (raw * envelope * voice.volume * i16::MAX as f32) as i16
        })
        .collect()
}

/// Wrap samples in a mono WAV container.
pub fn encode_wav(samples: &[i16]) -> hound::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[derive(Resource, Default)]
pub struct CueBank(HashMap<AudioCue, Handle<AudioSource>>);

fn synthesize_cues(mut bank: ResMut<CueBank>, mut sources: ResMut<Assets<AudioSource>>) {
    for cue in AudioCue::iter() {
        let name: &'static str = cue.into();
        match encode_wav(&synthesize(&cue.voice())) {
            Ok(bytes) => {
                let handle = sources.add(AudioSource {
                    bytes: bytes.into(),
                });
                bank.0.insert(cue, handle);
            }
            Err(err) => warn!("could not encode cue {name}: {err}"),
        }
    }
    info!("synthesized {} sound cues", bank.0.len());
}

fn play_cues(mut commands: Commands, mut cues: MessageReader<PlayCue>, bank: Res<CueBank>) {
    for PlayCue(cue) in cues.read() {
        let Some(handle) = bank.0.get(cue) else {
            continue;
        };
        commands.spawn((AudioPlayer::new(handle.clone()), PlaybackSettings::DESPAWN));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_matches_duration() {
        let samples = synthesize(&AudioCue::MenuSelect.voice());
        assert_eq!(samples.len(), (SAMPLE_RATE as f32 * 0.05) as usize);
    }

    #[test]
    fn samples_stay_within_volume() {
        for cue in AudioCue::iter() {
            let voice = cue.voice();
            let limit = (voice.volume * i16::MAX as f32) as i16 + 1;
            for sample in synthesize(&voice) {
                assert!(sample.abs() <= limit, "{cue:?} sample {sample} over {limit}");
            }
        }
    }

    #[test]
    fn clips_fade_out() {
        let samples = synthesize(&AudioCue::Lightning.voice());
        let head = samples[..100].iter().map(|s| s.unsigned_abs()).max();
        let tail = samples[samples.len() - 100..]
            .iter()
            .map(|s| s.unsigned_abs())
            .max();
        assert!(tail < head);
    }

    #[test]
    fn wav_container_round_trips_length() {
        let samples = synthesize(&AudioCue::Hit.voice());
        let bytes = encode_wav(&samples).expect("in-memory encode");
        assert_eq!(&bytes[..4], b"RIFF");

        let reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len() as usize, samples.len());
    }

    #[test]
    fn cue_names_are_snake_case() {
        let name: &'static str = AudioCue::RhythmPerfect.into();
        assert_eq!(name, "rhythm_perfect");
    }
}
