//! # Coordinate Transforms
//!
//! Maps geographic coordinates (WGS84 lon/lat) onto the scene's ground plane.
//!
//! ## Pipeline
//! ```text
//! Geographic window        →   Ground plane (Bevy, Y-up)
//!   [min_lon, max_lon]          x ∈ [-width/2,  width/2]
//!   [min_lat, max_lat]          z ∈ [-height/2, height/2]  (building footprint plane)
//!                               z ∈ [height/2, -height/2]  (streets and markers)
//! ```
//!
//! Building footprints are laid out on their own sketch plane and extruded
//! along its normal; turning that sweep upright flips the sketch's second axis,
//! so the building mapping is the mirror of the street mapping and both land
//! on the same ground positions.
//!
//! ## Table of Contents
//! 1. MapPlane — Ground plane extents
//! 2. AxisMapping — Latitude mapping variant
//! 3. CoordinateProjector — Linear window → plane remap

use bevy::prelude::*;

use crate::config::{GeoConfig, GeoWindow};

// ============================================================================
// 1. MapPlane — Ground plane extents
// ============================================================================

/// Ground plane extents in scene units. Fixed once the ground texture is
/// resolved at startup.
#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct MapPlane {
    /// X extent
    pub width: f32,
    /// Z extent
    pub height: f32,
}

impl MapPlane {
    /// Plane sized from config and the ground image aspect ratio (width / height)
    pub fn from_aspect(config: &GeoConfig, aspect: f32) -> Self {
        let height = config.plane_height();
        Self {
            width: height * aspect,
            height,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }
}

// ============================================================================
// 2. AxisMapping — Latitude mapping variant
// ============================================================================

/// Which latitude orientation a projection uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMapping {
    /// Footprint sketch plane: min_lat → -height/2
    Building,
    /// Ground plane: min_lat → +height/2
    Street,
}

// ============================================================================
// 3. CoordinateProjector — Linear window → plane remap
// ============================================================================

/// Linear remap from a geographic window to plane coordinates.
///
/// No clamping: coordinates outside the window extrapolate.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateProjector {
    pub window: GeoWindow,
    pub plane: MapPlane,
}

impl CoordinateProjector {
    pub fn new(window: GeoWindow, plane: MapPlane) -> Self {
        Self { window, plane }
    }

    /// Project (lon, lat) to plane (x, z) using the given latitude mapping
    pub fn project(&self, lon: f64, lat: f64, mapping: AxisMapping) -> Vec2 {
        let half_w = self.plane.half_width() as f64;
        let half_h = self.plane.half_height() as f64;

        let x = map_to_range(lon, self.window.min_lon, self.window.max_lon, -half_w, half_w);
        let z = match mapping {
            AxisMapping::Building => {
                map_to_range(lat, self.window.min_lat, self.window.max_lat, -half_h, half_h)
            }
            AxisMapping::Street => {
                map_to_range(lat, self.window.min_lat, self.window.max_lat, half_h, -half_h)
            }
        };

        Vec2::new(x as f32, z as f32)
    }
}

/// Map `val` from `[src_min, src_max]` to `[dst_min, dst_max]`
pub fn map_to_range(val: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> f64 {
    let t = (val - src_min) / (src_max - src_min);
    dst_min + t * (dst_max - dst_min)
}
