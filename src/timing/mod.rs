// Battle timing: shared judging contract and the two engines that implement it.
pub mod rhythm;
pub mod timed_hit;

pub use rhythm::{PatternName, RhythmConfig, RhythmEngine};
pub use timed_hit::{AttackKind, HitWindowSequence, TimedHitConfig, TimedHitEngine};

use crate::sfx::AudioCue;

/// Outcome of a single player action against a timing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitQuality {
    Perfect,
    Good,
    Miss,
    /// No run has been started; the neutral case, not an error.
    Idle,
}

impl HitQuality {
    /// Damage multiplier awarded for this outcome.
    pub fn multiplier(self) -> f32 {
        match self {
            HitQuality::Perfect => 2.0,
            HitQuality::Good => 1.5,
            HitQuality::Miss | HitQuality::Idle => 1.0,
        }
    }

    pub fn cue(self) -> Option<AudioCue> {
        match self {
            HitQuality::Perfect => Some(AudioCue::RhythmPerfect),
            HitQuality::Good => Some(AudioCue::RhythmGood),
            HitQuality::Miss | HitQuality::Idle => None,
        }
    }

    /// Pop-up label and how many ticks it stays on screen.
    pub fn popup(self) -> Option<(&'static str, u32)> {
        match self {
            HitQuality::Perfect => Some(("PERFECT!", 30)),
            HitQuality::Good => Some(("GOOD!", 20)),
            HitQuality::Miss => Some(("MISS", 15)),
            HitQuality::Idle => None,
        }
    }
}

/// What a tick did to the engine's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// No run is active.
    Idle,
    Running,
    /// The run finished on this tick.
    Complete,
}

/// Result of resolving a name against a fixed table. Unknown names resolve to
/// a defined default instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Fallback(T),
}

impl<T> Lookup<T> {
    pub fn into_inner(self) -> T {
        match self {
            Lookup::Found(value) | Lookup::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Lookup::Fallback(_))
    }
}

/// Resolve `name` through `FromStr`, falling back to `default`.
pub fn lookup<T: std::str::FromStr>(name: &str, default: T) -> Lookup<T> {
    match name.parse::<T>() {
        Ok(value) => Lookup::Found(value),
        Err(_) => Lookup::Fallback(default),
    }
}

/// Common surface of the rhythm and timed-hit engines.
///
/// Both engines are driven purely by tick counts: `tick` is called once per
/// fixed simulation step and `judge` whenever the player presses the action
/// button, before that step's tick.
pub trait TimingJudge {
    fn tick(&mut self) -> Progress;
    fn judge(&mut self) -> HitQuality;
    fn is_active(&self) -> bool;
}

/// Consecutive non-miss judgements and the best streak seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Combo {
    pub current: u32,
    pub best: u32,
}

impl Combo {
    pub fn record(&mut self, quality: HitQuality) {
        match quality {
            HitQuality::Perfect | HitQuality::Good => {
                self.current += 1;
                self.best = self.best.max(self.current);
            }
            HitQuality::Miss => self.current = 0,
            HitQuality::Idle => {}
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
