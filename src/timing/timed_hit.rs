// Timed-hit engine: an attack plays out over a fixed clock and the player
// presses near the scripted impact ticks.
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::{HitQuality, Lookup, Progress, TimingJudge, lookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AttackKind {
    Jump,
    Hammer,
    Special,
}

impl AttackKind {
    /// Impact ticks, relative to the start of the attack.
    pub fn offsets(self) -> &'static [u32] {
        match self {
            AttackKind::Jump => &[15, 30, 45],
            AttackKind::Hammer => &[20, 40],
            AttackKind::Special => &[10, 25, 35, 50],
        }
    }
}

/// Impact ticks used when an attack name is not recognised.
const FALLBACK_OFFSETS: &[u32] = &[30];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitWindowSequence {
    /// `None` for the fallback sequence.
    pub attack: Option<AttackKind>,
    pub offsets: &'static [u32],
}

impl HitWindowSequence {
    pub fn of(attack: AttackKind) -> Self {
        Self {
            attack: Some(attack),
            offsets: attack.offsets(),
        }
    }

    pub fn fallback() -> Self {
        Self {
            attack: None,
            offsets: FALLBACK_OFFSETS,
        }
    }

    pub fn lookup(name: &str) -> Lookup<Self> {
        match lookup::<AttackKind>(name, AttackKind::Jump) {
            Lookup::Found(attack) => Lookup::Found(Self::of(attack)),
            Lookup::Fallback(_) => Lookup::Fallback(Self::fallback()),
        }
    }

    pub fn last_offset(&self) -> u32 {
        self.offsets.iter().copied().max().unwrap_or(0)
    }
}

/// Half-widths of the judging zones around each impact tick, inclusive.
#[derive(Debug, Clone, Copy)]
pub struct TimedHitConfig {
    pub perfect_zone: u32,
    pub good_zone: u32,
}

impl Default for TimedHitConfig {
    fn default() -> Self {
        Self {
            perfect_zone: 10,
            good_zone: 20,
        }
    }
}

/// Judgements recorded during one attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl Tally {
    fn record(&mut self, quality: HitQuality) {
        match quality {
            HitQuality::Perfect => self.perfect += 1,
            HitQuality::Good => self.good += 1,
            HitQuality::Miss => self.miss += 1,
            HitQuality::Idle => {}
        }
    }
}

#[derive(Debug, Clone)]
struct HitWindowCursor {
    sequence: HitWindowSequence,
    elapsed: u32,
    tally: Tally,
}

#[derive(Debug, Clone, Default)]
enum Run {
    #[default]
    Idle,
    Active(HitWindowCursor),
    Expired(HitWindowCursor),
}

#[derive(Debug, Clone, Default)]
pub struct TimedHitEngine {
    config: TimedHitConfig,
    run: Run,
}

impl TimedHitEngine {
    pub fn new(config: TimedHitConfig) -> Self {
        Self {
            config,
            run: Run::Idle,
        }
    }

    /// Start the named attack. Unknown names use a single impact at tick 30.
    pub fn start(&mut self, name: &str) -> Lookup<HitWindowSequence> {
        let sequence = HitWindowSequence::lookup(name);
        self.start_sequence(sequence.into_inner());
        sequence
    }

    pub fn start_sequence(&mut self, sequence: HitWindowSequence) {
        self.run = Run::Active(HitWindowCursor {
            sequence,
            elapsed: 0,
            tally: Tally::default(),
        });
    }

    pub fn config(&self) -> &TimedHitConfig {
        &self.config
    }

    pub fn sequence(&self) -> Option<&HitWindowSequence> {
        self.cursor().map(|cursor| &cursor.sequence)
    }

    pub fn elapsed(&self) -> u32 {
        self.cursor().map_or(0, |cursor| cursor.elapsed)
    }

    pub fn tally(&self) -> Tally {
        self.cursor().map(|cursor| cursor.tally).unwrap_or_default()
    }

    /// Last tick on which the current attack is still live.
    pub fn horizon(&self) -> u32 {
        self.sequence()
            .map_or(0, |sequence| sequence.last_offset() + self.config.good_zone)
    }

    fn cursor(&self) -> Option<&HitWindowCursor> {
        match &self.run {
            Run::Idle => None,
            Run::Active(cursor) | Run::Expired(cursor) => Some(cursor),
        }
    }

    fn grade(&self, elapsed: u32, offsets: &[u32]) -> HitQuality {
        let within = |zone: u32| offsets.iter().any(|offset| elapsed.abs_diff(*offset) <= zone);
        if within(self.config.perfect_zone) {
            HitQuality::Perfect
        } else if within(self.config.good_zone) {
            HitQuality::Good
        } else {
            HitQuality::Miss
        }
    }
}

impl TimingJudge for TimedHitEngine {
    fn tick(&mut self) -> Progress {
        let horizon = self.horizon();
        let Run::Active(cursor) = &mut self.run else {
            return Progress::Idle;
        };

        cursor.elapsed += 1;
        if cursor.elapsed > horizon {
            if let Run::Active(cursor) = std::mem::take(&mut self.run) {
                self.run = Run::Expired(cursor);
            }
            return Progress::Complete;
        }
        Progress::Running
    }

    fn judge(&mut self) -> HitQuality {
        let quality = match &self.run {
            Run::Idle => return HitQuality::Idle,
            Run::Expired(_) => HitQuality::Miss,
            Run::Active(cursor) => self.grade(cursor.elapsed, cursor.sequence.offsets),
        };
        if let Run::Active(cursor) | Run::Expired(cursor) = &mut self.run {
            cursor.tally.record(quality);
        }
        quality
    }

    fn is_active(&self) -> bool {
        matches!(self.run, Run::Active(_))
    }
}
