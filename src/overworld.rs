// Overworld section: walking the current map, story triggers and random
// encounters.
use bevy::prelude::*;
use fast_poisson::Poisson2D;
use rand::Rng;

use crate::battle::Encounter;
use crate::controls;
use crate::display::{
    CYAN, ENEMY_BROWN, ENEMY_GREEN, GBA_HEIGHT, GBA_WIDTH, GRAY, PURPLE, Rgb, YELLOW, color,
    to_world,
};
use crate::sections::{Sections, Stage};
use crate::sprites::{SMALL, SpriteSheet};
use crate::story::{DialogueId, MapId, StoryState, enact, evaluate};
use crate::transition::TitleCard;

pub struct OverworldPlugin;

impl Plugin for OverworldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerPosition>()
            .add_systems(
                FixedUpdate,
                (move_player, check_story_triggers, roll_random_encounter)
                    .chain()
                    .run_if(in_state(Sections::Overworld)),
            )
            .add_systems(
                Update,
                overworld_actions.run_if(in_state(Sections::Overworld)),
            )
            .add_systems(
                Update,
                (stage_map, place_player).chain().run_if(
                    in_state(Sections::Overworld)
                        .or(in_state(Sections::Dialogue))
                        .or(in_state(Sections::Menu)),
                ),
            )
            .add_systems(OnEnter(Sections::Battle), clear_map)
            .add_systems(OnEnter(Sections::Title), clear_map);
    }
}

/// Logical pixels walked per tick on each held axis.
const WALK_SPEED: f32 = 2.0;
/// Chance per tick of a random encounter in the dark forest.
const ENCOUNTER_CHANCE: f64 = 0.002;
/// How far right the player must stand to hear the hint at school.
const HINT_REACH: f32 = 170.0;
/// Dark forest trees: minimum spacing and layout seed.
const TREE_SPACING: f32 = 28.0;
const FOREST_SEED: u64 = 0x7ee5;
/// Twilight town street lamps along the bottom edge.
const LAMP_SPACING: f32 = 45.0;
const TOWN_SEED: u64 = 0x1a4b;
/// Trees keep clear of the path the party walks along.
const PATH: std::ops::Range<f32> = 45.0..105.0;

/// Top-left of the player sprite, in logical pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition(pub Vec2);

impl Default for PlayerPosition {
    fn default() -> Self {
        Self(Vec2::new(GBA_WIDTH / 2.0, GBA_HEIGHT / 2.0))
    }
}

/// Step from `from`, keeping the whole sprite on screen.
pub fn walk(from: Vec2, step: Vec2) -> Vec2 {
    let size = SMALL as f32;
    (from + step).clamp(
        Vec2::ZERO,
        Vec2::new(GBA_WIDTH - size, GBA_HEIGHT - size),
    )
}

/// Everything spawned for a map; cleared when the map changes.
#[derive(Component)]
struct MapScenery(MapId);

#[derive(Component)]
struct Player;

fn background(map: MapId) -> Rgb {
    match map {
        MapId::School => [60, 60, 80],
        MapId::DarkForest => [20, 30, 20],
        MapId::TwilightTown => [40, 30, 50],
    }
}

fn move_player(keyboard: Res<ButtonInput<KeyCode>>, mut position: ResMut<PlayerPosition>) {
    let mut step = Vec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        step.x -= WALK_SPEED;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        step.x += WALK_SPEED;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        step.y -= WALK_SPEED;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        step.y += WALK_SPEED;
    }
    if step != Vec2::ZERO {
        position.0 = walk(position.0, step);
    }
}

fn check_story_triggers(
    mut story: ResMut<StoryState>,
    mut stage: ResMut<Stage>,
    mut position: ResMut<PlayerPosition>,
    mut next_state: ResMut<NextState<Sections>>,
    mut cards: MessageWriter<TitleCard>,
) {
    // Something is already lined up for the next section.
    if stage.is_busy() {
        return;
    }
    let Some(trigger) = evaluate(&story, position.0) else {
        return;
    };

    let name: &'static str = trigger.id.into();
    info!("story trigger {name} at x {:.0}", position.0.x);
    let staging = enact(trigger.effects, &mut story, &mut stage);
    if let Some(target) = staging.teleport {
        position.0 = target;
    }
    if let Some(card) = staging.card {
        cards.write(TitleCard(card));
    }
    let next = stage.next_section();
    if next != Sections::Overworld {
        next_state.set(next);
    }
}

fn roll_random_encounter(
    story: Res<StoryState>,
    mut stage: ResMut<Stage>,
    mut next_state: ResMut<NextState<Sections>>,
) {
    if story.map != MapId::DarkForest || stage.is_busy() {
        return;
    }
    if rand::rng().random_bool(ENCOUNTER_CHANCE) {
        debug!("random encounter");
        stage.encounter = Some(Encounter::ShroomScout);
        next_state.set(Sections::Battle);
    }
}

fn overworld_actions(
    keyboard: Res<ButtonInput<KeyCode>>,
    story: Res<StoryState>,
    position: Res<PlayerPosition>,
    mut stage: ResMut<Stage>,
    mut next_state: ResMut<NextState<Sections>>,
) {
    if stage.is_busy() {
        return;
    }
    if keyboard.just_pressed(controls::CONFIRM) {
        if story.map == MapId::School && position.0.x > HINT_REACH {
            stage.dialogue.push_back(DialogueId::SchoolHint);
            next_state.set(Sections::Dialogue);
        }
    } else if keyboard.just_pressed(controls::CANCEL) {
        next_state.set(Sections::Menu);
    } else if keyboard.just_pressed(controls::DEBUG_BATTLE) {
        stage.encounter = Some(Encounter::ShroomScout);
        next_state.set(Sections::Battle);
    }
}

fn stage_map(
    mut commands: Commands,
    story: Res<StoryState>,
    sheet: Res<SpriteSheet>,
    scenery: Query<(Entity, &MapScenery)>,
    mut clear: ResMut<ClearColor>,
) {
    let shown = scenery.iter().next().map(|(_, scenery)| scenery.0);
    if shown == Some(story.map) {
        return;
    }
    for (entity, _) in &scenery {
        commands.entity(entity).despawn();
    }

    let map = story.map;
    clear.0 = color(background(map));
    spawn_scenery(&mut commands, map);

    commands.spawn((
        MapScenery(map),
        Player,
        Sprite::from_image(sheet.member(story.leader())),
        Transform::default(),
    ));
    spawn_hud(&mut commands, &story);
    debug!("staged {}", map.title());
}

fn spawn_block(commands: &mut Commands, map: MapId, corner: Vec2, size: Vec2, rgb: Rgb) {
    commands.spawn((
        MapScenery(map),
        Sprite::from_color(color(rgb), size),
        Transform::from_translation(to_world(corner + size / 2.0).extend(-1.0)),
    ));
}

fn spawn_scenery(commands: &mut Commands, map: MapId) {
    match map {
        MapId::School => {
            // Supply room door.
            spawn_block(
                commands,
                map,
                Vec2::new(200.0, 50.0),
                Vec2::new(40.0, 100.0),
                ENEMY_BROWN,
            );
        }
        MapId::DarkForest => {
            let points = Poisson2D::new()
                .with_dimensions([GBA_WIDTH - 10.0, GBA_HEIGHT - 30.0], TREE_SPACING)
                .with_seed(FOREST_SEED)
                .generate();
            for [x, y] in points {
                if PATH.contains(&y) {
                    continue;
                }
                spawn_block(
                    commands,
                    map,
                    Vec2::new(x, y),
                    Vec2::new(10.0, 30.0),
                    ENEMY_GREEN,
                );
            }
        }
        MapId::TwilightTown => {
            spawn_block(
                commands,
                map,
                Vec2::new(100.0, 60.0),
                Vec2::new(40.0, 60.0),
                PURPLE,
            );
            let lamps = Poisson2D::new()
                .with_dimensions([GBA_WIDTH - 4.0, 20.0], LAMP_SPACING)
                .with_seed(TOWN_SEED)
                .generate();
            for [x, _] in lamps {
                spawn_block(
                    commands,
                    map,
                    Vec2::new(x + 1.0, 132.0),
                    Vec2::new(2.0, 14.0),
                    GRAY,
                );
                spawn_block(
                    commands,
                    map,
                    Vec2::new(x, 128.0),
                    Vec2::new(4.0, 4.0),
                    YELLOW,
                );
            }
        }
    }
}

fn spawn_hud(commands: &mut Commands, story: &StoryState) {
    commands.spawn((
        MapScenery(story.map),
        Text::new(story.map.title()),
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
    ));
    commands.spawn((
        MapScenery(story.map),
        Text::new(format!("Chapter {}", story.chapter)),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(color(YELLOW)),
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(30.0),
            top: Val::Px(30.0),
            ..default()
        },
    ));
}

fn place_player(
    position: Res<PlayerPosition>,
    mut player: Query<&mut Transform, With<Player>>,
) {
    let Ok(mut transform) = player.single_mut() else {
        return;
    };
    let center = position.0 + Vec2::splat(SMALL as f32 / 2.0);
    transform.translation = to_world(center).extend(1.0);
}

fn clear_map(mut commands: Commands, scenery: Query<Entity, With<MapScenery>>) {
    for entity in &scenery {
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::state::app::StatesPlugin;

    fn overworld_app(position: Vec2) -> App {
        let mut app = App::new();
        app.add_plugins(StatesPlugin)
            .init_state::<Sections>()
            .init_resource::<StoryState>()
            .init_resource::<Stage>()
            .insert_resource(PlayerPosition(position))
            .add_message::<TitleCard>();
        app
    }

    fn pending_section(app: &App) -> Option<Sections> {
        match app.world().resource::<NextState<Sections>>() {
            NextState::Pending(section) => Some(*section),
            _ => None,
        }
    }

    #[test]
    fn walking_is_clamped_to_the_screen() {
        assert_eq!(walk(Vec2::new(1.0, 1.0), Vec2::new(-2.0, -2.0)), Vec2::ZERO);
        assert_eq!(
            walk(Vec2::new(223.0, 143.0), Vec2::new(2.0, 2.0)),
            Vec2::new(224.0, 144.0)
        );
        assert_eq!(
            walk(Vec2::new(100.0, 80.0), Vec2::new(2.0, 0.0)),
            Vec2::new(102.0, 80.0)
        );
    }

    #[test]
    fn supply_room_door_leads_into_the_forest() {
        let mut app = overworld_app(Vec2::new(210.0, 80.0));
        app.world_mut()
            .run_system_once(check_story_triggers)
            .expect("trigger system runs");

        let story = app.world().resource::<StoryState>();
        assert_eq!(story.scene, 1);
        assert_eq!(story.map, MapId::DarkForest);
        assert_eq!(
            app.world().resource::<PlayerPosition>().0,
            Vec2::new(30.0, 80.0)
        );
        let stage = app.world().resource::<Stage>();
        assert_eq!(stage.dialogue.front(), Some(&DialogueId::SupplyRoom));
        assert_eq!(pending_section(&app), Some(Sections::Dialogue));
    }

    #[test]
    fn pending_dialogue_blocks_further_triggers() {
        let mut app = overworld_app(Vec2::new(210.0, 80.0));
        app.world_mut()
            .run_system_once(check_story_triggers)
            .expect("trigger system runs");
        app.world_mut().resource_mut::<PlayerPosition>().0 = Vec2::new(190.0, 80.0);
        app.world_mut()
            .run_system_once(check_story_triggers)
            .expect("trigger system runs");

        let story = app.world().resource::<StoryState>();
        assert!(!story.flags.is_set(crate::story::StoryFlag::MetShroom));
        assert_eq!(app.world().resource::<Stage>().dialogue.len(), 1);
    }

    #[test]
    fn quiet_spot_changes_nothing() {
        let mut app = overworld_app(Vec2::new(60.0, 80.0));
        app.world_mut()
            .run_system_once(check_story_triggers)
            .expect("trigger system runs");
        assert_eq!(*app.world().resource::<StoryState>(), StoryState::default());
        assert!(pending_section(&app).is_none());
    }
}
