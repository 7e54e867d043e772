//! # ECS Components for Scene Layers
//!
//! Bevy components that tag spawned scene entities with their layer and
//! source feature, plus the resource that drives per-layer visibility.
//!
//! ## Table of Contents
//! 1. SceneLayer — Layer tag component
//! 2. LayerVisibility — Per-layer visibility switches
//! 3. GeoFeature — Source feature metadata
//! 4. MapGround — Ground plane marker

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// 1. SceneLayer — Layer tag component
// ============================================================================

/// Groups scene entities for visibility toggling
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[reflect(Component)]
pub enum SceneLayer {
    /// Extruded building volumes
    Buildings,
    /// Street line strips
    Streets,
    /// Street vertex markers
    Points,
}

impl SceneLayer {
    pub const ALL: [SceneLayer; 3] = [SceneLayer::Buildings, SceneLayer::Streets, SceneLayer::Points];

    pub fn label(&self) -> &'static str {
        match self {
            SceneLayer::Buildings => "buildings",
            SceneLayer::Streets => "streets",
            SceneLayer::Points => "points",
        }
    }
}

// ============================================================================
// 2. LayerVisibility — Per-layer visibility switches
// ============================================================================

/// Which scene layers are currently shown
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LayerVisibility {
    pub buildings: bool,
    pub streets: bool,
    pub points: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            buildings: true,
            streets: true,
            points: true,
        }
    }
}

impl LayerVisibility {
    pub fn is_visible(&self, layer: SceneLayer) -> bool {
        match layer {
            SceneLayer::Buildings => self.buildings,
            SceneLayer::Streets => self.streets,
            SceneLayer::Points => self.points,
        }
    }

    /// Flip a layer and return its new state
    pub fn toggle(&mut self, layer: SceneLayer) -> bool {
        let flag = match layer {
            SceneLayer::Buildings => &mut self.buildings,
            SceneLayer::Streets => &mut self.streets,
            SceneLayer::Points => &mut self.points,
        };
        *flag = !*flag;
        *flag
    }
}

// ============================================================================
// 3. GeoFeature — Source feature metadata
// ============================================================================

/// Marks an entity as generated from a dataset feature
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct GeoFeature {
    /// Source way id (`None` for synthetic fallback buildings)
    pub way_id: Option<String>,
}

// ============================================================================
// 4. MapGround — Ground plane marker
// ============================================================================

/// Marks the ground map plane entity
#[derive(Component, Debug, Default)]
pub struct MapGround;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_one_layer() {
        let mut vis = LayerVisibility::default();
        assert!(SceneLayer::ALL.iter().all(|l| vis.is_visible(*l)));

        assert!(!vis.toggle(SceneLayer::Streets));
        assert!(!vis.is_visible(SceneLayer::Streets));
        assert!(vis.is_visible(SceneLayer::Buildings));
        assert!(vis.is_visible(SceneLayer::Points));

        assert!(vis.toggle(SceneLayer::Streets));
        assert_eq!(vis, LayerVisibility::default());
    }
}
