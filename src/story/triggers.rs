// Scripted story triggers, checked in narrative order.
use bevy::math::Vec2;
use strum::IntoStaticStr;

use super::{DialogueId, MapId, PartyMember, StoryEffect, StoryFlag, StoryState};
use crate::battle::Encounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TriggerId {
    SupplyRoom,
    ShroomScout,
    GoombaSentinel,
    TraceJoins,
    RoyalKoopas,
    ShadowLuigi,
    FinalBoss,
}

/// A guarded story transition. The guard sees the story state and the
/// player's logical position; the effects run in order when it passes.
pub struct Trigger {
    pub id: TriggerId,
    guard: fn(&StoryState, Vec2) -> bool,
    pub effects: &'static [StoryEffect],
}

impl Trigger {
    pub fn matches(&self, story: &StoryState, position: Vec2) -> bool {
        (self.guard)(story, position)
    }
}

/// Where the party lands after walking into a new map.
const MAP_ENTRY: Vec2 = Vec2::new(30.0, 80.0);

fn at(story: &StoryState, chapter: u8, scene: u8) -> bool {
    story.chapter == chapter && story.scene == scene
}

fn flag(story: &StoryState, flag: StoryFlag) -> bool {
    story.flags.is_set(flag)
}

fn supply_room(story: &StoryState, pos: Vec2) -> bool {
    at(story, 1, 0) && pos.x > 200.0
}

fn shroom_scout(story: &StoryState, pos: Vec2) -> bool {
    at(story, 1, 1) && !flag(story, StoryFlag::MetShroom) && pos.x > 100.0
}

fn goomba_sentinel(story: &StoryState, pos: Vec2) -> bool {
    at(story, 1, 1) && !flag(story, StoryFlag::BeatGoombaSentinel) && pos.x > 180.0
}

fn trace_joins(story: &StoryState, _: Vec2) -> bool {
    story.chapter == 1
        && flag(story, StoryFlag::BeatGoombaSentinel)
        && !flag(story, StoryFlag::TraceJoined)
}

fn royal_koopas(story: &StoryState, pos: Vec2) -> bool {
    story.chapter == 2 && !flag(story, StoryFlag::MetRoyalKoopas) && pos.x > 150.0
}

fn shadow_luigi(story: &StoryState, pos: Vec2) -> bool {
    story.chapter == 2
        && flag(story, StoryFlag::MetRoyalKoopas)
        && !flag(story, StoryFlag::MetShadowLuigi)
        && pos.x > 200.0
}

fn final_boss(story: &StoryState, pos: Vec2) -> bool {
    story.chapter == 2
        && flag(story, StoryFlag::MetShadowLuigi)
        && !flag(story, StoryFlag::BeatFinalBoss)
        && pos.x > 220.0
}

/// Story triggers in priority order. The first passing guard wins.
pub const TRIGGERS: &[Trigger] = &[
    Trigger {
        id: TriggerId::SupplyRoom,
        guard: supply_room,
        effects: &[
            StoryEffect::AdvanceScene(1),
            StoryEffect::Dialogue(DialogueId::SupplyRoom),
            StoryEffect::ChangeMap(MapId::DarkForest),
            StoryEffect::Teleport(MAP_ENTRY),
        ],
    },
    Trigger {
        id: TriggerId::ShroomScout,
        guard: shroom_scout,
        effects: &[
            StoryEffect::SetFlag(StoryFlag::MetShroom),
            StoryEffect::Dialogue(DialogueId::ShroomScout),
            StoryEffect::StartEncounter(Encounter::ShroomScout),
        ],
    },
    // Guarded by the flag the sentinel's defeat sets.
    Trigger {
        id: TriggerId::GoombaSentinel,
        guard: goomba_sentinel,
        effects: &[
            StoryEffect::Dialogue(DialogueId::GoombaSentinel),
            StoryEffect::StartEncounter(Encounter::GoombaSentinel),
        ],
    },
    Trigger {
        id: TriggerId::TraceJoins,
        guard: trace_joins,
        effects: &[
            StoryEffect::SetFlag(StoryFlag::TraceJoined),
            StoryEffect::Dialogue(DialogueId::TraceJoins),
            StoryEffect::JoinParty(PartyMember::Trace),
            StoryEffect::AdvanceChapter(2),
            StoryEffect::ChangeMap(MapId::TwilightTown),
            StoryEffect::Teleport(MAP_ENTRY),
        ],
    },
    Trigger {
        id: TriggerId::RoyalKoopas,
        guard: royal_koopas,
        effects: &[
            StoryEffect::SetFlag(StoryFlag::MetRoyalKoopas),
            StoryEffect::Dialogue(DialogueId::RoyalKoopas),
            StoryEffect::StartEncounter(Encounter::RoyalKoopas),
        ],
    },
    Trigger {
        id: TriggerId::ShadowLuigi,
        guard: shadow_luigi,
        effects: &[
            StoryEffect::SetFlag(StoryFlag::MetShadowLuigi),
            StoryEffect::Dialogue(DialogueId::ShadowLuigi),
            StoryEffect::StartEncounter(Encounter::ShadowLuigi),
        ],
    },
    // Guarded by the flag the final battle's aftermath sets.
    Trigger {
        id: TriggerId::FinalBoss,
        guard: final_boss,
        effects: &[
            StoryEffect::Dialogue(DialogueId::FinalBoss),
            StoryEffect::StartEncounter(Encounter::Bowser),
        ],
    },
];

/// First trigger whose guard passes, or `None` once the story is over.
pub fn evaluate(story: &StoryState, position: Vec2) -> Option<&'static Trigger> {
    if story.is_finished() {
        return None;
    }
    TRIGGERS.iter().find(|trigger| trigger.matches(story, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Stage;
    use crate::story::enact;

    fn fire(story: &mut StoryState, position: Vec2) -> Option<TriggerId> {
        let trigger = evaluate(story, position)?;
        enact(trigger.effects, story, &mut Stage::default());
        Some(trigger.id)
    }

    #[test]
    fn walking_to_the_door_opens_the_supply_room_once() {
        let mut story = StoryState::default();
        let door = Vec2::new(210.0, 80.0);

        assert_eq!(fire(&mut story, door), Some(TriggerId::SupplyRoom));
        assert_eq!(story.scene, 1);
        assert_eq!(story.map, MapId::DarkForest);

        let again = evaluate(&story, door).map(|t| t.id);
        assert_ne!(again, Some(TriggerId::SupplyRoom));
    }

    #[test]
    fn nothing_fires_before_a_threshold() {
        let story = StoryState::default();
        assert!(evaluate(&story, Vec2::new(200.0, 80.0)).is_none());
        assert!(evaluate(&story, Vec2::new(30.0, 80.0)).is_none());
    }

    #[test]
    fn first_match_wins() {
        let mut story = StoryState::default();
        story.scene = 1;
        // Past both the scout and the sentinel thresholds.
        let trigger = evaluate(&story, Vec2::new(190.0, 80.0)).map(|t| t.id);
        assert_eq!(trigger, Some(TriggerId::ShroomScout));
    }

    #[test]
    fn sentinel_waits_for_its_defeat() {
        let mut story = StoryState::default();
        story.scene = 1;
        story.flags.set(StoryFlag::MetShroom);
        let gate = Vec2::new(190.0, 80.0);

        assert_eq!(fire(&mut story, gate), Some(TriggerId::GoombaSentinel));
        assert_eq!(fire(&mut story, gate), Some(TriggerId::GoombaSentinel));

        story.flags.set(StoryFlag::BeatGoombaSentinel);
        assert_eq!(fire(&mut story, gate), Some(TriggerId::TraceJoins));
        assert_eq!(story.chapter, 2);
        assert!(story.party.contains(&PartyMember::Trace));
    }

    #[test]
    fn full_playthrough_fires_each_trigger_once() {
        let mut story = StoryState::default();
        let mut fired = Vec::new();

        for _ in 0..20 {
            let mut stepped = None;
            for x in (0..=240).step_by(5) {
                if let Some(id) = fire(&mut story, Vec2::new(x as f32, 80.0)) {
                    stepped = Some(id);
                    break;
                }
            }
            let Some(id) = stepped else {
                break;
            };
            fired.push(id);
            // Battles resolve in the player's favour.
            match id {
                TriggerId::GoombaSentinel => {
                    story.flags.set(StoryFlag::BeatGoombaSentinel);
                }
                TriggerId::FinalBoss => {
                    story.flags.set(StoryFlag::BeatFinalBoss);
                }
                _ => {}
            }
        }

        assert_eq!(
            fired,
            vec![
                TriggerId::SupplyRoom,
                TriggerId::ShroomScout,
                TriggerId::GoombaSentinel,
                TriggerId::TraceJoins,
                TriggerId::RoyalKoopas,
                TriggerId::ShadowLuigi,
                TriggerId::FinalBoss,
            ]
        );
        assert!(story.is_finished());
    }

    #[test]
    fn finished_story_never_fires() {
        let mut story = StoryState::default();
        story.chapter = 2;
        for flag in [
            StoryFlag::MetRoyalKoopas,
            StoryFlag::MetShadowLuigi,
            StoryFlag::BeatFinalBoss,
        ] {
            story.flags.set(flag);
        }
        for x in 0..=240 {
            assert!(evaluate(&story, Vec2::new(x as f32, 80.0)).is_none());
        }
    }

    #[test]
    fn trigger_ids_have_names() {
        let name: &'static str = TriggerId::GoombaSentinel.into();
        assert_eq!(name, "goomba_sentinel");
    }
}
