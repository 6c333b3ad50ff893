// Main
mod battle;
mod controls;
mod dialogue;
mod display;
mod menu;
mod overworld;
mod sections;
mod sfx;
mod sprites;
mod story;
mod timing;
mod transition;

use bevy::prelude::*;
use battle::BattlePlugin;
use dialogue::DialoguePlugin;
use display::DisplayPlugin;
use menu::MenuPlugin;
use overworld::OverworldPlugin;
use sections::{Sections, Stage};
use sfx::SfxPlugin;
use sprites::SpritesPlugin;
use story::StoryState;
use transition::TransitionPlugin;

/// Simulation steps per second; all timing windows are counted in these.
const TICK_RATE: f64 = 60.0;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(display::window_plugin())
                .set(ImagePlugin::default_nearest()),
        )
        .insert_resource(Time::<Fixed>::from_hz(TICK_RATE))
        .init_state::<Sections>()
        .init_resource::<StoryState>()
        .init_resource::<Stage>()
        .add_plugins((
            DisplayPlugin,
            SfxPlugin,
            SpritesPlugin,
            TransitionPlugin,
            MenuPlugin,
            OverworldPlugin,
            DialoguePlugin,
            BattlePlugin,
        ))
        .run();
}
