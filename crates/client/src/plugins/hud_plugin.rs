//! # HUD Plugin - On-screen clock, scene stats and view indicator
//!
//! - Clock `HH:MM (Día|Noche)` from the environment state
//! - Ingestion counts once the scene has loaded
//! - Layer toggles on keys 1/2/3 (buildings / streets / points)
//! - A centered view indicator shown for two seconds after each view switch

use bevy::prelude::*;
use bevy_camera_controller::{CameraMode, ViewModeChanged};
use geowalk_geo::ingest::SceneSource;
use geowalk_geo::{GeoLoadState, IngestStats, LayerVisibility, SceneLayer};

use crate::environment::EnvironmentState;

/// How long the view indicator stays on screen
const VIEW_INDICATOR_SECS: f32 = 2.0;

const PANEL_BACKGROUND: Color = Color::srgba(0.06, 0.09, 0.16, 0.9);
const ACCENT: Color = Color::srgb(0.39, 0.71, 0.96);

// ============================================================================
// Plugin
// ============================================================================

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewIndicatorTimer>()
            .add_systems(Startup, spawn_hud)
            .add_systems(Update, (
                toggle_layers,
                update_clock_text,
                update_status_text,
                show_view_indicator,
                hide_view_indicator,
            ).chain());
    }
}

#[derive(Component)]
struct ClockText;

#[derive(Component)]
struct StatusText;

/// Root of the centered view indicator
#[derive(Component)]
struct ViewIndicator;

#[derive(Component)]
struct ViewIndicatorText;

/// Countdown for the view indicator; `None` while hidden
#[derive(Resource, Default)]
struct ViewIndicatorTimer(Option<Timer>);

// ============================================================================
// Formatting
// ============================================================================

pub fn view_mode_label(mode: CameraMode) -> &'static str {
    match mode {
        CameraMode::FirstPerson => "Primera Persona - Click para bloquear cursor",
        CameraMode::Orbit => "Vista Orbital",
    }
}

/// Layer bound to a number key
pub fn layer_for_key(key: KeyCode) -> Option<SceneLayer> {
    match key {
        KeyCode::Digit1 => Some(SceneLayer::Buildings),
        KeyCode::Digit2 => Some(SceneLayer::Streets),
        KeyCode::Digit3 => Some(SceneLayer::Points),
        _ => None,
    }
}

pub fn status_line(load: &GeoLoadState, stats: &IngestStats, layers: &LayerVisibility) -> String {
    let source = match load.source {
        None if !load.scene_loaded => return "Cargando datos OSM...".to_string(),
        Some(SceneSource::Synthetic) => " (sintético)",
        _ => "",
    };
    let mark = |layer| if layers.is_visible(layer) { "x" } else { " " };
    format!(
        "Edificios: {}{}  Calles: {}  Puntos: {}\n[{}] 1 edificios  [{}] 2 calles  [{}] 3 puntos",
        stats.buildings,
        source,
        stats.streets,
        stats.points,
        mark(SceneLayer::Buildings),
        mark(SceneLayer::Streets),
        mark(SceneLayer::Points),
    )
}

// ============================================================================
// Startup
// ============================================================================

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Name::new("HUD Panel"),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(20.0),
                top: Val::Px(20.0),
                padding: UiRect::all(Val::Px(12.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.0),
                ..default()
            },
            BackgroundColor(PANEL_BACKGROUND),
        ))
        .with_children(|panel| {
            panel.spawn((
                ClockText,
                Text::new(""),
                TextFont::from_font_size(20.0),
                TextColor(Color::WHITE),
            ));
            panel.spawn((
                StatusText,
                Text::new(""),
                TextFont::from_font_size(13.0),
                TextColor(ACCENT),
            ));
        });

    commands
        .spawn((
            Name::new("View Indicator"),
            ViewIndicator,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                top: Val::Percent(45.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
            Visibility::Hidden,
        ))
        .with_children(|row| {
            row.spawn((
                Node {
                    padding: UiRect::axes(Val::Px(40.0), Val::Px(20.0)),
                    border: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(PANEL_BACKGROUND),
                BorderColor::all(ACCENT),
            ))
            .with_children(|frame| {
                frame.spawn((
                    ViewIndicatorText,
                    Text::new(""),
                    TextFont::from_font_size(18.0),
                    TextColor(Color::WHITE),
                ));
            });
        });
}

// ============================================================================
// Systems
// ============================================================================

fn toggle_layers(keys: Res<ButtonInput<KeyCode>>, mut layers: ResMut<LayerVisibility>) {
    for key in keys.get_just_pressed() {
        if let Some(layer) = layer_for_key(*key) {
            let shown = layers.toggle(layer);
            info!("Layer {}: {}", layer.label(), if shown { "shown" } else { "hidden" });
        }
    }
}

fn update_clock_text(state: Res<EnvironmentState>, mut query: Query<&mut Text, With<ClockText>>) {
    let label = state.clock.to_string();
    for mut text in query.iter_mut() {
        if text.0 != label {
            text.0 = label.clone();
        }
    }
}

fn update_status_text(
    load: Res<GeoLoadState>,
    stats: Res<IngestStats>,
    layers: Res<LayerVisibility>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    if !(load.is_changed() || stats.is_changed() || layers.is_changed()) {
        return;
    }
    let line = status_line(&load, &stats, &layers);
    for mut text in query.iter_mut() {
        text.0 = line.clone();
    }
}

fn show_view_indicator(
    mut changes: MessageReader<ViewModeChanged>,
    mut timer: ResMut<ViewIndicatorTimer>,
    mut texts: Query<&mut Text, With<ViewIndicatorText>>,
    mut indicators: Query<&mut Visibility, With<ViewIndicator>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    let label = view_mode_label(change.mode);
    for mut text in texts.iter_mut() {
        text.0 = label.to_string();
    }
    for mut visibility in indicators.iter_mut() {
        *visibility = Visibility::Inherited;
    }
    timer.0 = Some(Timer::from_seconds(VIEW_INDICATOR_SECS, TimerMode::Once));
}

fn hide_view_indicator(
    time: Res<Time>,
    mut timer: ResMut<ViewIndicatorTimer>,
    mut indicators: Query<&mut Visibility, With<ViewIndicator>>,
) {
    let Some(countdown) = timer.0.as_mut() else {
        return;
    };
    if !countdown.tick(time.delta()).just_finished() {
        return;
    }
    timer.0 = None;
    for mut visibility in indicators.iter_mut() {
        *visibility = Visibility::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_labels() {
        assert_eq!(view_mode_label(CameraMode::Orbit), "Vista Orbital");
        assert_eq!(
            view_mode_label(CameraMode::FirstPerson),
            "Primera Persona - Click para bloquear cursor"
        );
    }

    #[test]
    fn test_layer_keys() {
        assert_eq!(layer_for_key(KeyCode::Digit1), Some(SceneLayer::Buildings));
        assert_eq!(layer_for_key(KeyCode::Digit3), Some(SceneLayer::Points));
        assert_eq!(layer_for_key(KeyCode::KeyV), None);
    }

    #[test]
    fn test_status_line_while_loading() {
        let line = status_line(&GeoLoadState::default(), &IngestStats::default(), &LayerVisibility::default());
        assert_eq!(line, "Cargando datos OSM...");
    }

    #[test]
    fn test_status_line_marks_synthetic_scene_and_hidden_layers() {
        let load = GeoLoadState { scene_loaded: true, source: Some(SceneSource::Synthetic) };
        let stats = IngestStats { buildings: 15, ..Default::default() };
        let mut layers = LayerVisibility::default();
        layers.toggle(SceneLayer::Streets);
        let line = status_line(&load, &stats, &layers);
        assert!(line.starts_with("Edificios: 15 (sintético)"));
        assert!(line.contains("[x] 1 edificios  [ ] 2 calles  [x] 3 puntos"));
    }
}
