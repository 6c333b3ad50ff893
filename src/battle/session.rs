// Battle session: picks the timing engine for an encounter and reports when
// the encounter is over.
use bevy::prelude::*;
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::story::{DialogueId, StoryEffect, StoryFlag};
use crate::timing::{
    AttackKind, HitQuality, HitWindowSequence, Lookup, PatternName, Progress, RhythmConfig,
    RhythmEngine, TimedHitConfig, TimedHitEngine, TimingJudge, lookup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Encounter {
    ShroomScout,
    GoombaSentinel,
    RoyalKoopas,
    ShadowLuigi,
    Bowser,
}

/// Which engine an encounter runs and with what pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Rhythm(PatternName),
    TimedHit(AttackKind),
}

impl Encounter {
    pub fn lookup(name: &str) -> Lookup<Self> {
        lookup(name, Encounter::ShroomScout)
    }

    pub fn engine(self) -> EngineKind {
        match self {
            Encounter::ShroomScout => EngineKind::Rhythm(PatternName::Default),
            Encounter::GoombaSentinel => EngineKind::Rhythm(PatternName::Boss),
            Encounter::RoyalKoopas => EngineKind::TimedHit(AttackKind::Hammer),
            Encounter::ShadowLuigi => EngineKind::Rhythm(PatternName::Fast),
            Encounter::Bowser => EngineKind::TimedHit(AttackKind::Special),
        }
    }

    pub fn enemies(self) -> &'static [&'static str] {
        match self {
            Encounter::ShroomScout => &["Shroom Scout"],
            Encounter::GoombaSentinel => &["Goomba Sentinel"],
            Encounter::RoyalKoopas => &["Royal Koopa Alpha", "Royal Koopa Beta"],
            Encounter::ShadowLuigi => &["Shadow Luigi"],
            Encounter::Bowser => &["Bowser Lord of Embers"],
        }
    }

    /// Story effects applied once the encounter resolves.
    pub fn aftermath(self) -> &'static [StoryEffect] {
        match self {
            Encounter::GoombaSentinel => &[StoryEffect::SetFlag(StoryFlag::BeatGoombaSentinel)],
            Encounter::Bowser => &[
                StoryEffect::SetFlag(StoryFlag::BeatFinalBoss),
                StoryEffect::Dialogue(DialogueId::Ending),
            ],
            Encounter::ShroomScout | Encounter::RoyalKoopas | Encounter::ShadowLuigi => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum ActiveEngine {
    #[default]
    None,
    Rhythm(RhythmEngine),
    TimedHit(TimedHitEngine),
}

impl ActiveEngine {
    fn judge_mut(&mut self) -> Option<&mut dyn TimingJudge> {
        match self {
            ActiveEngine::None => None,
            ActiveEngine::Rhythm(engine) => Some(engine),
            ActiveEngine::TimedHit(engine) => Some(engine),
        }
    }

    pub fn is_rhythm(&self) -> bool {
        matches!(self, ActiveEngine::Rhythm(_))
    }
}

/// The encounter currently being fought. Owns its timing engine.
#[derive(Resource, Debug, Default)]
pub struct BattleSession {
    encounter: Option<Encounter>,
    engine: ActiveEngine,
    resolved: bool,
    /// Sum of multipliers earned this encounter.
    power: f32,
    rhythm: RhythmConfig,
    timed_hit: TimedHitConfig,
}

impl BattleSession {
    /// Start the named encounter. Unknown names fight the Shroom Scout.
    pub fn start(&mut self, name: &str) -> Lookup<Encounter> {
        let encounter = Encounter::lookup(name);
        if encounter.is_fallback() {
            debug!("unknown encounter {name:?}, using {:?}", encounter.into_inner());
        }
        self.start_encounter(encounter.into_inner());
        encounter
    }

    /// Start `encounter`, discarding whatever run was in progress.
    pub fn start_encounter(&mut self, encounter: Encounter) {
        self.engine = match encounter.engine() {
            EngineKind::Rhythm(pattern) => {
                let mut engine = RhythmEngine::new(self.rhythm);
                engine.start_pattern(pattern);
                ActiveEngine::Rhythm(engine)
            }
            EngineKind::TimedHit(attack) => {
                let mut engine = TimedHitEngine::new(self.timed_hit);
                engine.start_sequence(HitWindowSequence::of(attack));
                ActiveEngine::TimedHit(engine)
            }
        };
        self.encounter = Some(encounter);
        self.resolved = false;
        self.power = 0.0;
    }

    pub fn encounter(&self) -> Option<Encounter> {
        self.encounter
    }

    pub fn engine(&self) -> &ActiveEngine {
        &self.engine
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn tick(&mut self) -> Progress {
        if self.resolved {
            return Progress::Idle;
        }
        let Some(engine) = self.engine.judge_mut() else {
            return Progress::Idle;
        };
        let progress = engine.tick();
        if progress == Progress::Complete {
            self.resolved = true;
        }
        progress
    }

    /// Judge a press against the running engine. Neutral when nothing runs.
    pub fn judge(&mut self) -> HitQuality {
        if self.resolved {
            return HitQuality::Idle;
        }
        let quality = self
            .engine
            .judge_mut()
            .map_or(HitQuality::Idle, |engine| engine.judge());
        self.power += quality.multiplier();
        quality
    }

    /// The resolved encounter's aftermath. Yields once per encounter.
    pub fn take_aftermath(&mut self) -> Option<(Encounter, &'static [StoryEffect])> {
        if !self.resolved {
            return None;
        }
        let encounter = self.encounter.take()?;
        Some((encounter, encounter.aftermath()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn run_to_resolution(session: &mut BattleSession) -> usize {
        let mut ticks = 0;
        while !session.is_resolved() {
            session.tick();
            ticks += 1;
            assert!(ticks < 10_000, "encounter never resolved");
        }
        ticks
    }

    #[test]
    fn encounter_table() {
        assert_eq!(
            Encounter::ShroomScout.engine(),
            EngineKind::Rhythm(PatternName::Default)
        );
        assert_eq!(
            Encounter::GoombaSentinel.engine(),
            EngineKind::Rhythm(PatternName::Boss)
        );
        assert_eq!(
            Encounter::RoyalKoopas.engine(),
            EngineKind::TimedHit(AttackKind::Hammer)
        );
        assert_eq!(
            Encounter::ShadowLuigi.engine(),
            EngineKind::Rhythm(PatternName::Fast)
        );
        assert_eq!(
            Encounter::Bowser.engine(),
            EngineKind::TimedHit(AttackKind::Special)
        );
    }

    #[test]
    fn unknown_encounter_falls_back_to_scout() {
        let mut session = BattleSession::default();
        let encounter = session.start("dry_bones");
        assert_eq!(encounter, Lookup::Fallback(Encounter::ShroomScout));
        assert_eq!(session.encounter(), Some(Encounter::ShroomScout));
        assert!(session.engine().is_rhythm());
    }

    #[test]
    fn every_encounter_resolves() {
        for encounter in Encounter::iter() {
            let mut session = BattleSession::default();
            session.start_encounter(encounter);
            let ticks = run_to_resolution(&mut session);
            let expected = match encounter.engine() {
                EngineKind::Rhythm(pattern) => pattern.beats().len() * 30,
                EngineKind::TimedHit(attack) => {
                    *attack.offsets().iter().max().unwrap_or(&0) as usize + 21
                }
            };
            assert_eq!(ticks, expected, "{encounter:?}");
        }
    }

    #[test]
    fn aftermath_is_taken_once() {
        let mut session = BattleSession::default();
        session.start("bowser");
        assert!(session.take_aftermath().is_none());

        run_to_resolution(&mut session);
        let (encounter, effects) = session.take_aftermath().expect("resolved");
        assert_eq!(encounter, Encounter::Bowser);
        assert!(effects.contains(&StoryEffect::SetFlag(StoryFlag::BeatFinalBoss)));
        assert!(session.take_aftermath().is_none());
    }

    #[test]
    fn idle_session_is_neutral() {
        let mut session = BattleSession::default();
        assert_eq!(session.judge(), HitQuality::Idle);
        assert_eq!(session.tick(), Progress::Idle);
        assert!(!session.is_resolved());
    }

    #[test]
    fn judge_forwards_to_timed_hits() {
        let mut session = BattleSession::default();
        session.start_encounter(Encounter::RoyalKoopas);
        for _ in 0..20 {
            session.tick();
        }
        assert_eq!(session.judge(), HitQuality::Perfect);
        assert_eq!(session.power(), 2.0);
    }

    #[test]
    fn new_encounter_supersedes_the_old_one() {
        let mut session = BattleSession::default();
        session.start_encounter(Encounter::Bowser);
        run_to_resolution(&mut session);
        session.start_encounter(Encounter::ShadowLuigi);
        assert!(!session.is_resolved());
        assert!(session.engine().is_rhythm());
        assert_eq!(session.power(), 0.0);
    }
}
