// Dialogue section: a typewriter box that works through the queued scripts.
use std::collections::VecDeque;

use bevy::prelude::*;

use crate::controls;
use crate::display::{WHITE, YELLOW, color};
use crate::sections::{Sections, Stage};
use crate::sfx::{AudioCue, PlayCue};
use crate::story::script::Line;
use crate::story::{DialogueId, StoryState};

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogueBox>()
            .add_systems(
                OnEnter(Sections::Dialogue),
                (open_queued_script, spawn_dialogue_box).chain(),
            )
            .add_systems(
                FixedUpdate,
                reveal_text.run_if(in_state(Sections::Dialogue)),
            )
            .add_systems(
                Update,
                (advance_dialogue, refresh_dialogue_box)
                    .chain()
                    .run_if(in_state(Sections::Dialogue)),
            );
    }
}

/// Ticks between reveals.
const REVEAL_INTERVAL: u32 = 2;
/// Characters revealed at a time.
const REVEAL_CHARS: usize = 2;

/// The open script: the line being typed out and the lines after it.
#[derive(Resource, Debug, Default)]
pub struct DialogueBox {
    pending: VecDeque<Line>,
    current: Option<Line>,
    shown: usize,
    timer: u32,
}

impl DialogueBox {
    pub fn open(&mut self, script: DialogueId) {
        self.pending = script.lines().iter().copied().collect();
        self.next_line();
    }

    fn next_line(&mut self) {
        self.current = self.pending.pop_front();
        self.shown = 0;
        self.timer = 0;
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// The whole line is on screen and the box waits for confirm.
    pub fn is_waiting(&self) -> bool {
        self.current
            .is_some_and(|line| self.shown >= line.text.chars().count())
    }

    pub fn tick(&mut self) {
        let Some(line) = self.current else {
            return;
        };
        let len = line.text.chars().count();
        if self.shown >= len {
            return;
        }
        self.timer += 1;
        if self.timer >= REVEAL_INTERVAL {
            self.timer = 0;
            self.shown = (self.shown + REVEAL_CHARS).min(len);
        }
    }

    /// Finish the line being typed, or move past a finished one. Returns
    /// false once the script is exhausted.
    pub fn advance(&mut self) -> bool {
        let Some(line) = self.current else {
            return false;
        };
        if self.is_waiting() {
            self.next_line();
        } else {
            self.shown = line.text.chars().count();
        }
        self.is_open()
    }

    pub fn speaker(&self) -> &'static str {
        self.current.map_or("", |line| line.speaker)
    }

    pub fn visible_text(&self) -> &'static str {
        let Some(line) = self.current else {
            return "";
        };
        match line.text.char_indices().nth(self.shown) {
            Some((end, _)) => &line.text[..end],
            None => line.text,
        }
    }
}

#[derive(Component)]
struct SpeakerText;

#[derive(Component)]
struct BodyText;

#[derive(Component)]
struct ContinueArrow;

fn open_queued_script(mut dialogue: ResMut<DialogueBox>, mut stage: ResMut<Stage>) {
    *dialogue = DialogueBox::default();
    if let Some(script) = stage.dialogue.pop_front() {
        debug!("dialogue {script:?}");
        dialogue.open(script);
    }
}

fn spawn_dialogue_box(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(30.0),
                top: Val::Px(300.0),
                width: Val::Px(660.0),
                height: Val::Px(150.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(8.0),
                padding: UiRect::all(Val::Px(14.0)),
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(color(WHITE)),
            BackgroundColor(Color::BLACK),
            GlobalZIndex(50),
            DespawnOnExit(Sections::Dialogue),
        ))
        .with_children(|parent| {
            parent.spawn((
                SpeakerText,
                Text::new(""),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(color(YELLOW)),
            ));
            parent.spawn((
                BodyText,
                Text::new(""),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(color(WHITE)),
            ));
            parent.spawn((
                ContinueArrow,
                Text::new("v"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(color(WHITE)),
                Node {
                    position_type: PositionType::Absolute,
                    right: Val::Px(16.0),
                    bottom: Val::Px(10.0),
                    ..default()
                },
                Visibility::Hidden,
            ));
        });
}

fn reveal_text(mut dialogue: ResMut<DialogueBox>) {
    dialogue.tick();
}

fn advance_dialogue(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut dialogue: ResMut<DialogueBox>,
    mut stage: ResMut<Stage>,
    story: Res<StoryState>,
    mut next_state: ResMut<NextState<Sections>>,
    mut cues: MessageWriter<PlayCue>,
) {
    if dialogue.is_open() {
        if !keyboard.just_pressed(controls::CONFIRM) {
            return;
        }
        cues.write(PlayCue(AudioCue::MenuMove));
        if dialogue.advance() {
            return;
        }
    }

    if let Some(script) = stage.dialogue.pop_front() {
        debug!("dialogue {script:?}");
        dialogue.open(script);
        return;
    }
    next_state.set(section_after_dialogue(&story, &stage));
}

/// The ending returns to the title screen; otherwise the pending encounter
/// or the overworld.
fn section_after_dialogue(story: &StoryState, stage: &Stage) -> Sections {
    if story.is_finished() && stage.encounter.is_none() {
        Sections::Title
    } else {
        stage.next_section()
    }
}

fn refresh_dialogue_box(
    dialogue: Res<DialogueBox>,
    mut speaker: Query<&mut Text, (With<SpeakerText>, Without<BodyText>)>,
    mut body: Query<&mut Text, (With<BodyText>, Without<SpeakerText>)>,
    mut arrow: Query<&mut Visibility, With<ContinueArrow>>,
) {
    if !dialogue.is_changed() {
        return;
    }
    if let Ok(mut text) = speaker.single_mut() {
        text.0 = dialogue.speaker().to_string();
    }
    if let Ok(mut text) = body.single_mut() {
        text.0 = dialogue.visible_text().to_string();
    }
    if let Ok(mut visibility) = arrow.single_mut() {
        *visibility = if dialogue.is_waiting() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}
