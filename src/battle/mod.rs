// Battle section: runs the encounter's timing engine on the fixed clock and
// hands the aftermath back to the story.
pub mod session;

pub use session::{ActiveEngine, BattleSession, Encounter};

use std::f32::consts::TAU;

use bevy::math::Isometry2d;
use bevy::prelude::*;

use crate::controls;
use crate::display::{CYAN, GBA_WIDTH, GRAY, GREEN, RED, Rgb, WHITE, YELLOW, color, to_world};
use crate::sections::{Sections, Stage};
use crate::sfx::{AudioCue, PlayCue};
use crate::sprites::{LARGE, SpriteSheet, enemy_grid};
use crate::story::{StoryState, enact};
use crate::timing::{HitQuality, TimingJudge};
use crate::transition::TitleCard;

pub struct BattlePlugin;

impl Plugin for BattlePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BattleSession>()
            .init_resource::<BattleInput>()
            .add_systems(
                OnEnter(Sections::Battle),
                (start_battle, spawn_battle_scene).chain(),
            )
            .add_systems(
                Update,
                (
                    latch_battle_input,
                    draw_beat_ring,
                    draw_timing_bar,
                    update_combo_text,
                )
                    .run_if(in_state(Sections::Battle)),
            )
            .add_systems(
                FixedUpdate,
                (judge_latched_input, tick_battle, float_hit_popups)
                    .chain()
                    .run_if(in_state(Sections::Battle)),
            );
    }
}

const BACKGROUND: Rgb = [10, 10, 30];
/// Logical x of the first enemy; the rest follow at `ENEMY_SPACING`.
const ENEMY_LEFT: f32 = 80.0;
const ENEMY_SPACING: f32 = 60.0;
/// Timing bar geometry in logical pixels.
const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 20.0;
const BAR_TOP: f32 = 120.0;
/// Dot marking the next beat on the ring.
const PLAYHEAD_RADIUS: f32 = 2.0;
/// Logical pixels a hit pop-up rises per tick.
const POPUP_RISE: f32 = 0.5;

/// Presses seen since the last fixed step.
#[derive(Resource, Default, Debug)]
struct BattleInput {
    confirm: bool,
    rhythm: bool,
}

impl BattleInput {
    /// Consume the latched presses. At most one judgement per step.
    fn take(&mut self, rhythm_battle: bool) -> bool {
        let pressed = self.confirm || (self.rhythm && rhythm_battle);
        *self = Self::default();
        pressed
    }
}

#[derive(Component)]
struct HitPopup {
    ticks_left: u32,
}

#[derive(Component)]
struct ComboText;

fn start_battle(
    mut stage: ResMut<Stage>,
    mut session: ResMut<BattleSession>,
    mut input: ResMut<BattleInput>,
    mut clear: ResMut<ClearColor>,
) {
    match stage.encounter.take() {
        Some(encounter) => session.start_encounter(encounter),
        None => {
            session.start("");
        }
    }
    *input = BattleInput::default();
    clear.0 = color(BACKGROUND);
    info!("battle started: {:?}", session.encounter());
}

fn spawn_battle_scene(
    mut commands: Commands,
    session: Res<BattleSession>,
    story: Res<StoryState>,
    sheet: Res<SpriteSheet>,
) {
    let Some(encounter) = session.encounter() else {
        return;
    };

    let size = enemy_grid(encounter).size() as f32;
    let top = if size >= LARGE as f32 { 30.0 } else { 40.0 };
    for (i, name) in encounter.enemies().iter().enumerate() {
        let corner = Vec2::new(ENEMY_LEFT + ENEMY_SPACING * i as f32, top);
        let center = to_world(corner + Vec2::splat(size / 2.0));
        commands.spawn((
            Sprite::from_image(sheet.enemy(encounter)),
            Transform::from_translation(center.extend(0.0)),
            DespawnOnExit(Sections::Battle),
        ));
        commands.spawn((
            Text2d::new(*name),
            TextFont {
                font_size: 6.0,
                ..default()
            },
            TextColor(color(WHITE)),
            Transform::from_translation(center.extend(1.0) - Vec3::Y * (size / 2.0 + 5.0)),
            DespawnOnExit(Sections::Battle),
        ));
    }

    // Party status, bottom left.
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(30.0),
                bottom: Val::Px(24.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.0),
                ..default()
            },
            DespawnOnExit(Sections::Battle),
        ))
        .with_children(|parent| {
            for member in &story.party {
                let stats = member.stats();
                let name: &'static str = (*member).into();
                parent.spawn((
                    Text::new(format!("{name}: HP {}/{}", stats.hp, stats.max_hp)),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                    TextColor(color(member.color())),
                ));
            }
        });

    commands.spawn((
        ComboText,
        Text::new(""),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(color(CYAN)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(30.0),
            top: Val::Px(30.0),
            ..default()
        },
        DespawnOnExit(Sections::Battle),
    ));
}

fn latch_battle_input(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<BattleInput>) {
    input.confirm |= keyboard.just_pressed(controls::CONFIRM);
    input.rhythm |= keyboard.just_pressed(controls::RHYTHM);
}

fn judge_latched_input(
    mut commands: Commands,
    mut input: ResMut<BattleInput>,
    mut session: ResMut<BattleSession>,
    mut cues: MessageWriter<PlayCue>,
) {
    let rhythm_battle = session.engine().is_rhythm();
    if !input.take(rhythm_battle) {
        return;
    }

    let quality = session.judge();
    debug!("judged {quality:?}, power {:.1}", session.power());
    if let Some(cue) = quality.cue() {
        cues.write(PlayCue(cue));
    }
    let Some((label, ticks)) = quality.popup() else {
        return;
    };
    let anchor = popup_anchor(session.engine());
    commands.spawn((
        HitPopup { ticks_left: ticks },
        Text2d::new(label),
        TextFont {
            font_size: 8.0,
            ..default()
        },
        TextColor(color(popup_color(quality))),
        Transform::from_translation(to_world(anchor).extend(2.0)),
        DespawnOnExit(Sections::Battle),
    ));
}

fn popup_color(quality: HitQuality) -> Rgb {
    match quality {
        HitQuality::Perfect => YELLOW,
        HitQuality::Good => GREEN,
        HitQuality::Miss | HitQuality::Idle => RED,
    }
}

/// Where hit pop-ups appear, in logical pixels.
fn popup_anchor(engine: &ActiveEngine) -> Vec2 {
    match engine {
        ActiveEngine::Rhythm(engine) => {
            let config = engine.config();
            config.center - Vec2::new(0.0, config.orbit + 12.0)
        }
        ActiveEngine::TimedHit(_) | ActiveEngine::None => {
            Vec2::new(GBA_WIDTH / 2.0, BAR_TOP - 12.0)
        }
    }
}

fn tick_battle(
    mut session: ResMut<BattleSession>,
    mut story: ResMut<StoryState>,
    mut stage: ResMut<Stage>,
    mut next_state: ResMut<NextState<Sections>>,
    mut cards: MessageWriter<TitleCard>,
    mut cues: MessageWriter<PlayCue>,
) {
    session.tick();
    let Some((encounter, aftermath)) = session.take_aftermath() else {
        return;
    };
    cues.write(PlayCue(AudioCue::Explosion));

    let staging = enact(aftermath, &mut story, &mut stage);
    if let Some(card) = staging.card {
        cards.write(TitleCard(card));
    }
    info!(
        "battle against {encounter:?} resolved with power {:.1}",
        session.power()
    );
    next_state.set(stage.next_section());
}

fn float_hit_popups(
    mut commands: Commands,
    mut popups: Query<(Entity, &mut HitPopup, &mut Transform)>,
) {
    for (entity, mut popup, mut transform) in &mut popups {
        popup.ticks_left = popup.ticks_left.saturating_sub(1);
        transform.translation.y += POPUP_RISE;
        if popup.ticks_left == 0 {
            commands.entity(entity).despawn();
        }
    }
}

fn draw_beat_ring(mut gizmos: Gizmos, session: Res<BattleSession>) {
    let ActiveEngine::Rhythm(engine) = session.engine() else {
        return;
    };
    if !engine.is_active() {
        return;
    }

    let config = engine.config();
    let beats = engine.pattern().map_or(1, |pattern| pattern.beats().len());
    let playhead = TAU * engine.beat_index() as f32 / beats as f32;
    let playhead = config.center + Vec2::new(playhead.cos(), playhead.sin()) * config.orbit;
    gizmos.circle_2d(
        Isometry2d::from_translation(to_world(playhead)),
        PLAYHEAD_RADIUS,
        color(WHITE),
    );

    for marker in engine.markers() {
        let center = to_world(marker.position(config.center, config.orbit));
        let tint = if marker.active { YELLOW } else { GRAY };
        gizmos.circle_2d(
            Isometry2d::from_translation(center),
            marker.radius,
            color(tint),
        );
    }
}

fn draw_timing_bar(mut gizmos: Gizmos, session: Res<BattleSession>) {
    let ActiveEngine::TimedHit(engine) = session.engine() else {
        return;
    };
    let Some(sequence) = engine.sequence() else {
        return;
    };
    if !engine.is_active() {
        return;
    }

    let horizon = engine.horizon().max(1) as f32;
    let left = (GBA_WIDTH - BAR_WIDTH) / 2.0;
    let middle = BAR_TOP + BAR_HEIGHT / 2.0;
    let bar_x = |tick: f32| left + tick / horizon * BAR_WIDTH;
    let zone = |half_width: u32| {
        Vec2::new(half_width as f32 * 2.0 / horizon * BAR_WIDTH, BAR_HEIGHT)
    };

    gizmos.rect_2d(
        Isometry2d::from_translation(to_world(Vec2::new(GBA_WIDTH / 2.0, middle))),
        Vec2::new(BAR_WIDTH, BAR_HEIGHT),
        color(WHITE),
    );

    let config = engine.config();
    for &offset in sequence.offsets {
        let at = to_world(Vec2::new(bar_x(offset as f32), middle));
        let at = Isometry2d::from_translation(at);
        gizmos.rect_2d(at, zone(config.good_zone), color(YELLOW));
        gizmos.rect_2d(at, zone(config.perfect_zone), color(GREEN));
    }

    let cursor = bar_x(engine.elapsed() as f32);
    gizmos.line_2d(
        to_world(Vec2::new(cursor, BAR_TOP - 4.0)),
        to_world(Vec2::new(cursor, BAR_TOP + BAR_HEIGHT + 4.0)),
        color(RED),
    );
}

fn update_combo_text(session: Res<BattleSession>, mut combo: Query<&mut Text, With<ComboText>>) {
    let Ok(mut text) = combo.single_mut() else {
        return;
    };

    let label = match session.engine() {
        ActiveEngine::Rhythm(engine) if engine.combo().current > 0 => {
            format!("COMBO: x{}", engine.combo().current)
        }
        ActiveEngine::TimedHit(engine) => {
            let tally = engine.tally();
            format!(
                "PERFECT {}  GOOD {}  MISS {}",
                tally.perfect, tally.good, tally.miss
            )
        }
        _ => String::new(),
    };
    if text.0 != label {
        text.0 = label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::state::app::StatesPlugin;

    use crate::story::{DialogueId, StoryFlag};

    fn battle_app(encounter: Encounter) -> App {
        let mut app = App::new();
        app.add_plugins(StatesPlugin)
            .init_state::<Sections>()
            .init_resource::<StoryState>()
            .init_resource::<Stage>()
            .init_resource::<BattleSession>()
            .add_message::<TitleCard>()
            .add_message::<PlayCue>();
        app.world_mut()
            .resource_mut::<BattleSession>()
            .start_encounter(encounter);
        app
    }

    fn run_ticks(app: &mut App, ticks: usize) {
        for _ in 0..ticks {
            app.world_mut()
                .run_system_once(tick_battle)
                .expect("tick_battle runs");
        }
    }

    fn pending_section(app: &App) -> Option<Sections> {
        match app.world().resource::<NextState<Sections>>() {
            NextState::Pending(section) => Some(*section),
            _ => None,
        }
    }

    #[test]
    fn beating_the_sentinel_sets_its_flag() {
        let mut app = battle_app(Encounter::GoombaSentinel);
        run_ticks(&mut app, 12 * 30 - 1);
        assert!(pending_section(&app).is_none());

        run_ticks(&mut app, 1);
        let story = app.world().resource::<StoryState>();
        assert!(story.flags.is_set(StoryFlag::BeatGoombaSentinel));
        assert_eq!(pending_section(&app), Some(Sections::Overworld));
    }

    #[test]
    fn final_battle_queues_the_ending() {
        let mut app = battle_app(Encounter::Bowser);
        run_ticks(&mut app, 71);

        let story = app.world().resource::<StoryState>();
        assert!(story.is_finished());
        let stage = app.world().resource::<Stage>();
        assert_eq!(stage.dialogue.front(), Some(&DialogueId::Ending));
        assert_eq!(pending_section(&app), Some(Sections::Dialogue));
    }

    #[test]
    fn aftermath_applies_once() {
        let mut app = battle_app(Encounter::Bowser);
        run_ticks(&mut app, 200);
        assert_eq!(app.world().resource::<Stage>().dialogue.len(), 1);
    }

    #[test]
    fn rhythm_button_ignored_in_timed_battles() {
        let mut input = BattleInput {
            confirm: false,
            rhythm: true,
        };
        assert!(!input.take(false));

        input.rhythm = true;
        assert!(input.take(true));
        assert!(!input.take(true));

        input.confirm = true;
        assert!(input.take(false));
    }
}
