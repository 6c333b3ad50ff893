// Story progression: chapter, scene, flags and party, advanced by scripted
// triggers and battle aftermaths.
pub mod script;
pub mod triggers;

use std::collections::HashSet;

use bevy::prelude::*;
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::battle::Encounter;
use crate::display::Rgb;
use crate::sections::Stage;
pub use script::DialogueId;
pub use triggers::evaluate;

/// One-shot story gates. Once set a flag is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StoryFlag {
    MetShroom,
    BeatGoombaSentinel,
    TraceJoined,
    MetRoyalKoopas,
    MetShadowLuigi,
    BeatFinalBoss,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFlags(HashSet<StoryFlag>);

impl StoryFlags {
    /// Returns true if the flag was not already set.
    pub fn set(&mut self, flag: StoryFlag) -> bool {
        self.0.insert(flag)
    }

    pub fn is_set(&self, flag: StoryFlag) -> bool {
        self.0.contains(&flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MapId {
    #[default]
    School,
    DarkForest,
    TwilightTown,
}

impl MapId {
    pub fn title(self) -> &'static str {
        match self {
            MapId::School => "Threshold Academy",
            MapId::DarkForest => "Dark Forest",
            MapId::TwilightTown => "Twilight Town",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum PartyMember {
    Joseph,
    Becca,
    Trace,
}

/// Display stats; battles do not change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberStats {
    pub hp: u32,
    pub max_hp: u32,
    pub tp: u32,
    pub level: u32,
}

impl PartyMember {
    pub fn stats(self) -> MemberStats {
        let (hp, tp) = match self {
            PartyMember::Joseph => (90, 50),
            PartyMember::Becca => (120, 30),
            PartyMember::Trace => (70, 80),
        };
        MemberStats {
            hp,
            max_hp: hp,
            tp,
            level: 1,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            PartyMember::Joseph => crate::display::BLUE,
            PartyMember::Becca => crate::display::PURPLE,
            PartyMember::Trace => crate::display::YELLOW,
        }
    }
}

/// A single consequence of a story trigger or a battle aftermath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoryEffect {
    AdvanceScene(u8),
    AdvanceChapter(u8),
    SetFlag(StoryFlag),
    ChangeMap(MapId),
    /// Move the player to a logical position on the current map.
    Teleport(Vec2),
    JoinParty(PartyMember),
    Dialogue(DialogueId),
    StartEncounter(Encounter),
}

/// Everything the story remembers between sections.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StoryState {
    pub chapter: u8,
    pub scene: u8,
    pub flags: StoryFlags,
    pub map: MapId,
    pub party: Vec<PartyMember>,
}

impl Default for StoryState {
    fn default() -> Self {
        Self {
            chapter: 1,
            scene: 0,
            flags: StoryFlags::default(),
            map: MapId::School,
            party: vec![PartyMember::Joseph, PartyMember::Becca],
        }
    }
}

impl StoryState {
    pub fn is_finished(&self) -> bool {
        self.flags.is_set(StoryFlag::BeatFinalBoss)
    }

    pub fn leader(&self) -> PartyMember {
        self.party.first().copied().unwrap_or(PartyMember::Joseph)
    }

    /// Apply the state part of an effect. Scene and chapter never move
    /// backwards. Returns false for effects that only concern the stage.
    pub fn apply(&mut self, effect: &StoryEffect) -> bool {
        match *effect {
            StoryEffect::AdvanceScene(scene) => self.scene = self.scene.max(scene),
            StoryEffect::AdvanceChapter(chapter) => self.chapter = self.chapter.max(chapter),
            StoryEffect::SetFlag(flag) => {
                self.flags.set(flag);
            }
            StoryEffect::ChangeMap(map) => self.map = map,
            StoryEffect::JoinParty(member) => {
                if !self.party.contains(&member) {
                    self.party.push(member);
                }
            }
            StoryEffect::Teleport(_)
            | StoryEffect::Dialogue(_)
            | StoryEffect::StartEncounter(_) => return false,
        }
        true
    }
}

/// Outcome of enacting effects that the caller must carry out itself.
#[derive(Debug, Default, PartialEq)]
pub struct Staging {
    pub teleport: Option<Vec2>,
    /// Title card to show because the map changed.
    pub card: Option<String>,
}

/// Apply effects in order: state effects go to `story`, dialogue and
/// encounters are queued on `stage`.
pub fn enact(effects: &[StoryEffect], story: &mut StoryState, stage: &mut Stage) -> Staging {
    let mut staging = Staging::default();
    let mut map_changed = false;
    for effect in effects {
        if story.apply(effect) {
            map_changed |= matches!(effect, StoryEffect::ChangeMap(_));
            continue;
        }
        match *effect {
            StoryEffect::Teleport(position) => staging.teleport = Some(position),
            StoryEffect::Dialogue(id) => stage.dialogue.push_back(id),
            StoryEffect::StartEncounter(encounter) => stage.encounter = Some(encounter),
            _ => {}
        }
    }
    if map_changed {
        staging.card = Some(format!("Chapter {}: {}", story.chapter, story.map.title()));
    }
    staging
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_set_once() {
        let mut flags = StoryFlags::default();
        assert!(flags.set(StoryFlag::MetShroom));
        assert!(!flags.set(StoryFlag::MetShroom));
        assert!(flags.is_set(StoryFlag::MetShroom));
        assert!(!flags.is_set(StoryFlag::TraceJoined));
    }

    #[test]
    fn scene_and_chapter_only_move_forward() {
        let mut story = StoryState::default();
        story.apply(&StoryEffect::AdvanceScene(2));
        story.apply(&StoryEffect::AdvanceScene(1));
        story.apply(&StoryEffect::AdvanceChapter(2));
        story.apply(&StoryEffect::AdvanceChapter(1));
        assert_eq!(story.scene, 2);
        assert_eq!(story.chapter, 2);
    }

    #[test]
    fn party_members_join_once() {
        let mut story = StoryState::default();
        story.apply(&StoryEffect::JoinParty(PartyMember::Trace));
        story.apply(&StoryEffect::JoinParty(PartyMember::Trace));
        assert_eq!(
            story.party,
            vec![PartyMember::Joseph, PartyMember::Becca, PartyMember::Trace]
        );
        assert_eq!(story.leader(), PartyMember::Joseph);
    }

    #[test]
    fn enact_splits_state_and_stage_effects() {
        let mut story = StoryState::default();
        let mut stage = Stage::default();
        let staging = enact(
            &[
                StoryEffect::SetFlag(StoryFlag::TraceJoined),
                StoryEffect::Dialogue(DialogueId::TraceJoins),
                StoryEffect::ChangeMap(MapId::TwilightTown),
                StoryEffect::AdvanceChapter(2),
                StoryEffect::Teleport(Vec2::new(30.0, 80.0)),
                StoryEffect::StartEncounter(Encounter::RoyalKoopas),
            ],
            &mut story,
            &mut stage,
        );

        assert!(story.flags.is_set(StoryFlag::TraceJoined));
        assert_eq!(story.map, MapId::TwilightTown);
        assert_eq!(staging.teleport, Some(Vec2::new(30.0, 80.0)));
        assert_eq!(staging.card.as_deref(), Some("Chapter 2: Twilight Town"));
        assert_eq!(stage.dialogue.front(), Some(&DialogueId::TraceJoins));
        assert_eq!(stage.encounter, Some(Encounter::RoyalKoopas));
    }

    #[test]
    fn enact_without_map_change_shows_no_card() {
        let mut story = StoryState::default();
        let mut stage = Stage::default();
        let staging = enact(
            &[StoryEffect::SetFlag(StoryFlag::MetShroom)],
            &mut story,
            &mut stage,
        );
        assert_eq!(staging, Staging::default());
        assert!(stage.dialogue.is_empty());
    }
}
