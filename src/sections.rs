/// Game sections and the hand-off between them.
use std::collections::VecDeque;

use bevy::prelude::*;

use crate::battle::Encounter;
use crate::story::DialogueId;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum Sections {
    #[default]
    Title,
    Overworld,
    Dialogue,
    Battle,
    Menu,
}

/// What the story has lined up for the next sections: dialogue still to be
/// shown and the encounter it leads into.
#[derive(Resource, Default, Debug)]
pub struct Stage {
    pub dialogue: VecDeque<DialogueId>,
    pub encounter: Option<Encounter>,
}

impl Stage {
    pub fn is_busy(&self) -> bool {
        !self.dialogue.is_empty() || self.encounter.is_some()
    }

    /// Dialogue plays before the encounter it introduces.
    pub fn next_section(&self) -> Sections {
        if !self.dialogue.is_empty() {
            Sections::Dialogue
        } else if self.encounter.is_some() {
            Sections::Battle
        } else {
            Sections::Overworld
        }
    }
}
