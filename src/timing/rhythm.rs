// Rhythm engine: a beat pattern plays out on a ring of markers and the player
// presses while a freshly struck marker is still swollen.
use bevy::math::Vec2;
use std::f32::consts::TAU;
use strum::{EnumIter, EnumString, IntoStaticStr};

use super::{Combo, HitQuality, Lookup, Progress, TimingJudge, lookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PatternName {
    Default,
    Fast,
    Boss,
}

impl PatternName {
    /// Beat flags, 1 for a struck beat and 0 for a rest.
    pub fn beats(self) -> &'static [u8] {
        match self {
            PatternName::Default => &[1, 0, 1, 0, 1, 1, 0, 1],
            PatternName::Fast => &[1, 1, 0, 1, 0, 1, 1, 1],
            PatternName::Boss => &[1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 1],
        }
    }
}

/// Tuning for [`RhythmEngine`]. Radii and positions are in logical pixels.
#[derive(Debug, Clone, Copy)]
pub struct RhythmConfig {
    /// Ticks between beats.
    pub beat_interval: u32,
    /// Resting marker radius; decay never goes below it.
    pub base_radius: f32,
    /// Radius a marker jumps to when its beat lands.
    pub peak_radius: f32,
    /// Per-tick multiplicative decay of active markers.
    pub decay: f32,
    /// Markers are judgeable only while larger than this.
    pub check_radius: f32,
    pub perfect_error: f32,
    pub good_error: f32,
    pub center: Vec2,
    pub orbit: f32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            beat_interval: 30,
            base_radius: 8.0,
            peak_radius: 12.0,
            decay: 0.9,
            check_radius: 10.0,
            perfect_error: 1.0,
            good_error: 2.0,
            center: Vec2::new(120.0, 80.0),
            orbit: 60.0,
        }
    }
}

/// One marker on the beat ring, created for every struck beat of the pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatMarker {
    pub beat_index: usize,
    /// Angle around the ring in radians.
    pub angle: f32,
    pub radius: f32,
    pub active: bool,
}

impl BeatMarker {
    pub fn position(&self, center: Vec2, orbit: f32) -> Vec2 {
        center + Vec2::new(self.angle.cos(), self.angle.sin()) * orbit
    }
}

#[derive(Debug, Clone)]
struct BeatCursor {
    pattern: PatternName,
    index: usize,
    accumulator: u32,
    markers: Vec<BeatMarker>,
}

impl BeatCursor {
    fn new(pattern: PatternName, base_radius: f32) -> Self {
        let beats = pattern.beats();
        let len = beats.len() as f32;
        let markers = beats
            .iter()
            .enumerate()
            .filter(|(_, beat)| **beat != 0)
            .map(|(i, _)| BeatMarker {
                beat_index: i,
                angle: TAU * i as f32 / len,
                radius: base_radius,
                active: false,
            })
            .collect();
        Self {
            pattern,
            index: 0,
            accumulator: 0,
            markers,
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Run {
    #[default]
    Idle,
    Active(BeatCursor),
    Finished(BeatCursor),
}

#[derive(Debug, Clone, Default)]
pub struct RhythmEngine {
    config: RhythmConfig,
    run: Run,
    combo: Combo,
}

impl RhythmEngine {
    pub fn new(config: RhythmConfig) -> Self {
        Self {
            config,
            run: Run::Idle,
            combo: Combo::default(),
        }
    }

    /// Start the named pattern. Unknown names play `default`.
    pub fn start(&mut self, name: &str) -> Lookup<PatternName> {
        let pattern = lookup(name, PatternName::Default);
        self.start_pattern(pattern.into_inner());
        pattern
    }

    pub fn start_pattern(&mut self, pattern: PatternName) {
        self.run = Run::Active(BeatCursor::new(pattern, self.config.base_radius));
        self.combo.reset();
    }

    pub fn config(&self) -> &RhythmConfig {
        &self.config
    }

    pub fn combo(&self) -> Combo {
        self.combo
    }

    pub fn pattern(&self) -> Option<PatternName> {
        self.cursor().map(|cursor| cursor.pattern)
    }

    /// Number of beats already played in the current run.
    pub fn beat_index(&self) -> usize {
        self.cursor().map_or(0, |cursor| cursor.index)
    }

    pub fn markers(&self) -> &[BeatMarker] {
        self.cursor()
            .map(|cursor| cursor.markers.as_slice())
            .unwrap_or_default()
    }

    fn cursor(&self) -> Option<&BeatCursor> {
        match &self.run {
            Run::Idle => None,
            Run::Active(cursor) | Run::Finished(cursor) => Some(cursor),
        }
    }
}

impl TimingJudge for RhythmEngine {
    fn tick(&mut self) -> Progress {
        let config = self.config;
        let Run::Active(cursor) = &mut self.run else {
            return Progress::Idle;
        };

        cursor.accumulator += 1;
        if cursor.accumulator >= config.beat_interval {
            cursor.accumulator = 0;

            let index = cursor.index;
            if let Some(marker) = cursor.markers.iter_mut().find(|m| m.beat_index == index) {
                marker.active = true;
                marker.radius = config.peak_radius;
            }
            cursor.index += 1;

            if cursor.index >= cursor.pattern.beats().len() {
                let finished = std::mem::take(&mut self.run);
                if let Run::Active(cursor) = finished {
                    self.run = Run::Finished(cursor);
                }
                return Progress::Complete;
            }
        }

        for marker in cursor.markers.iter_mut().filter(|m| m.active) {
            marker.radius = (marker.radius * config.decay).max(config.base_radius);
        }
        Progress::Running
    }

    fn judge(&mut self) -> HitQuality {
        let quality = match &self.run {
            Run::Idle => return HitQuality::Idle,
            Run::Finished(_) => HitQuality::Miss,
            Run::Active(cursor) => {
                let config = &self.config;
                cursor
                    .markers
                    .iter()
                    .filter(|m| m.active && m.radius > config.check_radius)
                    .find_map(|m| {
                        let error = (m.radius - config.check_radius).abs();
                        if error < config.perfect_error {
                            Some(HitQuality::Perfect)
                        } else if error < config.good_error {
                            Some(HitQuality::Good)
                        } else {
                            None
                        }
                    })
                    .unwrap_or(HitQuality::Miss)
            }
        };
        self.combo.record(quality);
        quality
    }

    fn is_active(&self) -> bool {
        matches!(self.run, Run::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn strike_first_marker(engine: &mut RhythmEngine, radius: f32) {
        if let Run::Active(cursor) = &mut engine.run {
            cursor.markers[0].active = true;
            cursor.markers[0].radius = radius;
        }
    }

    #[test]
    fn every_pattern_runs_to_completion() {
        for pattern in PatternName::iter() {
            let mut engine = RhythmEngine::default();
            let name: &'static str = pattern.into();
            engine.start(name);
            let len = pattern.beats().len();

            let mut completions = 0;
            for _ in 0..len * 30 {
                if engine.tick() == Progress::Complete {
                    completions += 1;
                }
            }

            assert_eq!(completions, 1, "{pattern:?}");
            assert_eq!(engine.beat_index(), len);
            assert!(!engine.is_active());
            assert_eq!(engine.tick(), Progress::Idle);
        }
    }

    #[test]
    fn completes_on_the_last_beat_tick() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        for _ in 0..8 * 30 - 1 {
            assert_eq!(engine.tick(), Progress::Running);
        }
        assert_eq!(engine.tick(), Progress::Complete);
    }

    #[test]
    fn unknown_pattern_plays_default() {
        let mut unknown = RhythmEngine::default();
        let mut default = RhythmEngine::default();
        assert!(unknown.start("polka").is_fallback());
        assert_eq!(default.start("default"), Lookup::Found(PatternName::Default));

        assert_eq!(unknown.pattern(), Some(PatternName::Default));
        assert_eq!(unknown.markers(), default.markers());
        for _ in 0..8 * 30 {
            assert_eq!(unknown.tick(), default.tick());
            assert_eq!(unknown.markers(), default.markers());
        }
    }

    #[test]
    fn markers_follow_struck_beats() {
        let mut engine = RhythmEngine::default();
        engine.start_pattern(PatternName::Default);
        let indices: Vec<usize> = engine.markers().iter().map(|m| m.beat_index).collect();
        assert_eq!(indices, vec![0, 2, 4, 5, 7]);

        let quarter = &engine.markers()[1];
        let pos = quarter.position(Vec2::new(120.0, 80.0), 60.0);
        assert!((pos.x - 120.0).abs() < 1e-3);
        assert!((pos.y - 140.0).abs() < 1e-3);
    }

    #[test]
    fn press_right_after_a_beat_is_perfect() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        for _ in 0..30 {
            engine.tick();
        }
        // Peak 12 decays once on the beat tick: 10.8, error 0.8.
        assert_eq!(engine.judge(), HitQuality::Perfect);
        assert_eq!(engine.combo().current, 1);
    }

    #[test]
    fn late_press_misses() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        for _ in 0..32 {
            engine.tick();
        }
        assert_eq!(engine.judge(), HitQuality::Miss);
    }

    #[test]
    fn no_checkable_marker_misses_and_clears_combo() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        strike_first_marker(&mut engine, 10.5);
        assert_eq!(engine.judge(), HitQuality::Perfect);
        strike_first_marker(&mut engine, 9.0);

        let quality = engine.judge();
        assert_eq!(quality, HitQuality::Miss);
        assert_eq!(quality.multiplier(), 1.0);
        assert_eq!(engine.combo().current, 0);
        assert_eq!(engine.combo().best, 1);
    }

    #[test]
    fn combo_over_mixed_presses() {
        let mut engine = RhythmEngine::default();
        engine.start("boss");

        strike_first_marker(&mut engine, 11.5);
        assert_eq!(engine.judge(), HitQuality::Good);
        strike_first_marker(&mut engine, 10.4);
        assert_eq!(engine.judge(), HitQuality::Perfect);
        strike_first_marker(&mut engine, 8.0);
        assert_eq!(engine.judge(), HitQuality::Miss);
        strike_first_marker(&mut engine, 10.9);
        assert_eq!(engine.judge(), HitQuality::Perfect);

        assert_eq!(engine.combo().current, 1);
        assert_eq!(engine.combo().best, 2);
    }

    #[test]
    fn decay_settles_on_the_floor() {
        let mut engine = RhythmEngine::default();
        engine.start("fast");
        for _ in 0..59 {
            engine.tick();
            for marker in engine.markers() {
                assert!(marker.radius >= 8.0);
            }
        }
        let first = &engine.markers()[0];
        assert!(first.active);
        assert_eq!(first.radius, 8.0);
    }

    #[test]
    fn judge_without_a_run_is_neutral() {
        let mut engine = RhythmEngine::default();
        assert_eq!(engine.judge(), HitQuality::Idle);
        assert_eq!(engine.combo(), Combo::default());
    }

    #[test]
    fn judge_after_completion_misses() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        while engine.tick() != Progress::Complete {}
        assert_eq!(engine.judge(), HitQuality::Miss);
    }

    #[test]
    fn restart_resets_combo_but_keeps_best() {
        let mut engine = RhythmEngine::default();
        engine.start("default");
        strike_first_marker(&mut engine, 10.5);
        engine.judge();
        engine.start("fast");
        assert_eq!(engine.combo().current, 0);
        assert_eq!(engine.combo().best, 1);
        assert_eq!(engine.beat_index(), 0);
    }
}
