// Full-screen title cards that fade in and out when a chapter or map begins.

use bevy::prelude::*;

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<TitleCard>()
            .add_systems(Update, (show_title_cards, fade_card).chain());
    }
}

/// Request a title card, e.g. "Chapter 2: Twilight Town".
#[derive(Message, Debug, Clone, PartialEq)]
pub struct TitleCard(pub String);

const FADE_IN: f32 = 0.1;
const HOLD: f32 = 1.2;
const FADE_OUT: f32 = 0.8;
const TOTAL: f32 = FADE_IN + HOLD + FADE_OUT;

#[derive(Resource)]
struct CardTimer(f32);

#[derive(Component)]
struct CardRoot;

#[derive(Component)]
struct CardText;

/// Text and backdrop alpha `t` seconds into a card.
fn card_alpha(t: f32) -> Option<(f32, f32)> {
    if t >= TOTAL {
        None
    } else if t < FADE_IN {
        Some((t / FADE_IN, 1.0))
    } else if t < FADE_IN + HOLD {
        Some((1.0, 1.0))
    } else {
        let fade = 1.0 - (t - FADE_IN - HOLD) / FADE_OUT;
        Some((fade, fade))
    }
}

fn show_title_cards(
    mut commands: Commands,
    mut cards: MessageReader<TitleCard>,
    roots: Query<Entity, With<CardRoot>>,
) {
    // Only the latest card of a frame is shown.
    let Some(TitleCard(title)) = cards.read().last() else {
        return;
    };

    for entity in &roots {
        commands.entity(entity).despawn();
    }
    commands.insert_resource(CardTimer(0.0));
    info!("title card: {title}");

    commands
        .spawn((
            CardRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(Color::BLACK),
            GlobalZIndex(100),
        ))
        .with_children(|parent| {
            parent.spawn((
                CardText,
                Text::new(title.clone()),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.0)),
            ));
        });
}

fn fade_card(
    mut commands: Commands,
    time: Res<Time>,
    mut timer: Option<ResMut<CardTimer>>,
    roots: Query<Entity, With<CardRoot>>,
    mut texts: Query<&mut TextColor, With<CardText>>,
    mut backgrounds: Query<&mut BackgroundColor, With<CardRoot>>,
) {
    let Some(timer) = timer.as_mut() else {
        return;
    };

    timer.0 += time.delta_secs();
    let Some((text_alpha, bg_alpha)) = card_alpha(timer.0) else {
        for entity in &roots {
            commands.entity(entity).despawn();
        }
        commands.remove_resource::<CardTimer>();
        return;
    };

    for mut color in &mut texts {
        color.0 = Color::srgba(1.0, 1.0, 1.0, text_alpha);
    }
    for mut bg in &mut backgrounds {
        bg.0 = Color::srgba(0.0, 0.0, 0.0, bg_alpha);
    }
}
