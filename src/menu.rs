// Title screen and pause menu

use bevy::prelude::*;

use crate::controls;
use crate::display::{BLUE, CYAN, GREEN, PURPLE, RED, Rgb, WHITE, YELLOW, color};
use crate::overworld::PlayerPosition;
use crate::sections::{Sections, Stage};
use crate::sfx::{AudioCue, PlayCue};
use crate::story::{DialogueId, StoryState};
use crate::transition::TitleCard;

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PauseCursor>()
            .add_systems(OnEnter(Sections::Title), setup_title)
            .add_systems(
                Update,
                (button_visuals, button_actions, title_keys).run_if(in_state(Sections::Title)),
            )
            .add_systems(OnEnter(Sections::Menu), setup_pause_menu)
            .add_systems(
                Update,
                (pause_keys, highlight_pause_options)
                    .chain()
                    .run_if(in_state(Sections::Menu)),
            );
    }
}

const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);

#[derive(Component)]
enum TitleButton {
    Start,
    #[cfg(not(target_arch = "wasm32"))]
    Exit,
}

/// Names shown on the title screen, in the party colours.
const SHOWCASE: [(&str, Rgb); 6] = [
    ("Joseph", BLUE),
    ("Becca", PURPLE),
    ("Trace", YELLOW),
    ("Gave", GREEN),
    ("John", RED),
    ("Summer", CYAN),
];

fn setup_title(mut commands: Commands, mut clear: ResMut<ClearColor>) {
    clear.0 = Color::BLACK;

    // Root container.
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(18.0),
                ..default()
            },
            DespawnOnExit(Sections::Title),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("TWILIGHT GATE"),
                TextFont {
                    font_size: 56.0,
                    ..default()
                },
                TextColor(color(PURPLE)),
            ));
            parent.spawn((
                Text::new("Chapters 1 + 2"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(color(YELLOW)),
            ));

            // Party showcase, two rows of three.
            for row in SHOWCASE.chunks(3) {
                parent
                    .spawn(Node {
                        column_gap: Val::Px(48.0),
                        ..default()
                    })
                    .with_children(|row_node| {
                        for (name, rgb) in row {
                            row_node.spawn((
                                Text::new(*name),
                                TextFont {
                                    font_size: 20.0,
                                    ..default()
                                },
                                TextColor(color(*rgb)),
                            ));
                        }
                    });
            }

            spawn_button(parent, "Start", TitleButton::Start);

            // Exit button (native only).
            #[cfg(not(target_arch = "wasm32"))]
            spawn_button(parent, "Exit", TitleButton::Exit);

            parent.spawn((
                Text::new("Press Z to Start  |  X to Quit"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(color(WHITE)),
            ));
        });
}

fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, marker: TitleButton) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                width: Val::Px(200.0),
                height: Val::Px(44.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(label),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<TitleButton>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        let (fill, edge) = match *interaction {
            Interaction::Pressed => (PRESSED_BUTTON, Color::WHITE),
            Interaction::Hovered => (HOVERED_BUTTON, Color::WHITE),
            Interaction::None => (NORMAL_BUTTON, Color::srgba(1.0, 1.0, 1.0, 0.3)),
        };
        *bg = fill.into();
        *border = BorderColor::all(edge);
    }
}

fn button_actions(
    query: Query<(&Interaction, &TitleButton), Changed<Interaction>>,
    mut commands: Commands,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            TitleButton::Start => commands.run_system_cached(start_new_game),
            #[cfg(not(target_arch = "wasm32"))]
            TitleButton::Exit => {
                exit.write(AppExit::Success);
            }
        }
    }
}

fn title_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(controls::CONFIRM) {
        commands.run_system_cached(start_new_game);
    }
    #[cfg(not(target_arch = "wasm32"))]
    if keyboard.just_pressed(controls::CANCEL) {
        exit.write(AppExit::Success);
    }
}

/// Fresh story, player back at the start, intro dialogue queued.
fn start_new_game(
    mut story: ResMut<StoryState>,
    mut stage: ResMut<Stage>,
    mut position: ResMut<PlayerPosition>,
    mut next_state: ResMut<NextState<Sections>>,
    mut cards: MessageWriter<TitleCard>,
    mut cues: MessageWriter<PlayCue>,
) {
    *story = StoryState::default();
    *stage = Stage::default();
    *position = PlayerPosition::default();
    stage.dialogue.push_back(DialogueId::Intro);

    cues.write(PlayCue(AudioCue::MenuSelect));
    cards.write(TitleCard(format!(
        "Chapter {}: {}",
        story.chapter,
        story.map.title()
    )));
    info!("new game");
    next_state.set(Sections::Dialogue);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOption {
    Items,
    Status,
    Save,
    Quit,
}

const PAUSE_OPTIONS: [PauseOption; 4] = [
    PauseOption::Items,
    PauseOption::Status,
    PauseOption::Save,
    PauseOption::Quit,
];

impl PauseOption {
    fn label(self) -> &'static str {
        match self {
            PauseOption::Items => "Items",
            PauseOption::Status => "Status",
            PauseOption::Save => "Save",
            PauseOption::Quit => "Quit",
        }
    }
}

/// Highlighted pause option, wrapping at both ends.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PauseCursor(usize);

impl PauseCursor {
    pub fn up(&mut self) {
        self.0 = (self.0 + PAUSE_OPTIONS.len() - 1) % PAUSE_OPTIONS.len();
    }

    pub fn down(&mut self) {
        self.0 = (self.0 + 1) % PAUSE_OPTIONS.len();
    }

    pub fn selected(self) -> PauseOption {
        PAUSE_OPTIONS[self.0 % PAUSE_OPTIONS.len()]
    }
}

#[derive(Component)]
struct PauseEntry(usize);

#[derive(Component)]
struct StatusPanel;

fn setup_pause_menu(mut commands: Commands, mut cursor: ResMut<PauseCursor>) {
    *cursor = PauseCursor::default();

    // Dimmed backdrop with a bordered box.
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                column_gap: Val::Px(24.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.5)),
            GlobalZIndex(60),
            DespawnOnExit(Sections::Menu),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Px(420.0),
                        flex_direction: FlexDirection::Column,
                        row_gap: Val::Px(18.0),
                        padding: UiRect::all(Val::Px(20.0)),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgb_u8(40, 40, 40)),
                    BorderColor::all(Color::WHITE),
                ))
                .with_children(|menu| {
                    for (i, option) in PAUSE_OPTIONS.iter().enumerate() {
                        menu.spawn((
                            PauseEntry(i),
                            Text::new(option.label()),
                            TextFont {
                                font_size: 28.0,
                                ..default()
                            },
                            TextColor(color(WHITE)),
                        ));
                    }
                });
        });
}

fn pause_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut cursor: ResMut<PauseCursor>,
    mut next_state: ResMut<NextState<Sections>>,
    mut cues: MessageWriter<PlayCue>,
    mut commands: Commands,
    story: Res<StoryState>,
    panels: Query<Entity, With<StatusPanel>>,
) {
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        cursor.up();
        cues.write(PlayCue(AudioCue::MenuMove));
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        cursor.down();
        cues.write(PlayCue(AudioCue::MenuMove));
    }
    if keyboard.just_pressed(controls::CANCEL) {
        next_state.set(Sections::Overworld);
        return;
    }
    if !keyboard.just_pressed(controls::CONFIRM) {
        return;
    }

    cues.write(PlayCue(AudioCue::MenuSelect));
    match cursor.selected() {
        PauseOption::Status => {
            if panels.is_empty() {
                spawn_status_panel(&mut commands, &story);
            } else {
                for entity in &panels {
                    commands.entity(entity).despawn();
                }
            }
        }
        PauseOption::Quit => next_state.set(Sections::Title),
        PauseOption::Items | PauseOption::Save => {}
    }
}

fn spawn_status_panel(commands: &mut Commands, story: &StoryState) {
    commands
        .spawn((
            StatusPanel,
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(30.0),
                top: Val::Px(30.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(8.0),
                padding: UiRect::all(Val::Px(12.0)),
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BackgroundColor(Color::BLACK),
            BorderColor::all(Color::WHITE),
            GlobalZIndex(70),
            DespawnOnExit(Sections::Menu),
        ))
        .with_children(|panel| {
            for member in &story.party {
                let stats = member.stats();
                let name: &'static str = (*member).into();
                panel.spawn((
                    Text::new(format!(
                        "{name}  LV {}  HP {}/{}  TP {}",
                        stats.level, stats.hp, stats.max_hp, stats.tp
                    )),
                    TextFont {
                        font_size: 18.0,
                        ..default()
                    },
                    TextColor(color(member.color())),
                ));
            }
        });
}

fn highlight_pause_options(
    cursor: Res<PauseCursor>,
    mut entries: Query<(&PauseEntry, &mut TextColor)>,
) {
    for (entry, mut text_color) in &mut entries {
        let rgb = if entry.0 == cursor.0 { YELLOW } else { WHITE };
        text_color.0 = color(rgb);
    }
}
