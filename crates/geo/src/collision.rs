//! # Collision Field
//!
//! Axis-aligned collision volumes for generated buildings, indexed with an
//! R-tree over the XZ plane via the `rstar` crate. The tree is only a broad
//! phase; the inclusive 3-axis box test decides.
//!
//! ## Table of Contents
//! 1. CollisionVolume — Axis-aligned box
//! 2. CollisionField — R-tree resource

use bevy::prelude::*;
use rstar::{RTree, RTreeObject, AABB};

// ============================================================================
// 1. CollisionVolume — Axis-aligned box
// ============================================================================

/// Axis-aligned box in scene space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl CollisionVolume {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounding rectangle of `points` on XZ, spanning y ∈ [0, height].
    /// `None` for an empty point set.
    pub fn from_footprint(points: &[Vec3], height: f32) -> Option<Self> {
        let first = points.first()?;
        let (min_x, max_x, min_z, max_z) = points.iter().fold(
            (first.x, first.x, first.z, first.z),
            |(min_x, max_x, min_z, max_z), p| {
                (min_x.min(p.x), max_x.max(p.x), min_z.min(p.z), max_z.max(p.z))
            },
        );
        Some(Self {
            min: Vec3::new(min_x, 0.0, min_z),
            max: Vec3::new(max_x, height, max_z),
        })
    }

    /// Square probe centered on `position` in XZ, spanning y ∈ [0, height]
    pub fn probe(position: Vec3, half_width: f32, height: f32) -> Self {
        Self {
            min: Vec3::new(position.x - half_width, 0.0, position.z - half_width),
            max: Vec3::new(position.x + half_width, height, position.z + half_width),
        }
    }

    /// Inclusive overlap on all three axes (touching faces count)
    pub fn intersects(&self, other: &CollisionVolume) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

impl RTreeObject for CollisionVolume {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min.x, self.min.z], [self.max.x, self.max.z])
    }
}

// ============================================================================
// 2. CollisionField — R-tree resource
// ============================================================================

/// Static set of building collision volumes. Installed once when scene
/// ingestion finishes; empty until then.
#[derive(Resource)]
pub struct CollisionField {
    tree: RTree<CollisionVolume>,
}

impl Default for CollisionField {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl CollisionField {
    /// Bulk-load volumes into the R-tree
    pub fn bulk_load(volumes: Vec<CollisionVolume>) -> Self {
        Self {
            tree: RTree::bulk_load(volumes),
        }
    }

    /// Whether `volume` overlaps any stored volume
    pub fn intersects(&self, volume: &CollisionVolume) -> bool {
        self.tree
            .locate_in_envelope_intersecting(&volume.envelope())
            .any(|candidate| candidate.intersects(volume))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionVolume> {
        self.tree.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> CollisionVolume {
        CollisionVolume::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 50.0, 0.5))
    }

    #[test]
    fn test_from_footprint_bounds() {
        let pts = [
            Vec3::new(3.0, 0.0, -1.0),
            Vec3::new(-2.0, 0.0, 4.0),
            Vec3::new(1.0, 0.0, 2.0),
        ];
        let v = CollisionVolume::from_footprint(&pts, 50.0).unwrap();
        assert_eq!(v.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(v.max, Vec3::new(3.0, 50.0, 4.0));
        assert!(CollisionVolume::from_footprint(&[], 50.0).is_none());
    }

    #[test]
    fn test_intersects_is_inclusive() {
        let a = unit_box();
        let touching = CollisionVolume::probe(Vec3::new(1.0, 2.0, 0.0), 0.5, 50.0);
        assert!(a.intersects(&touching));
        let apart = CollisionVolume::probe(Vec3::new(1.01, 2.0, 0.0), 0.5, 50.0);
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_vertical_band_matters() {
        let a = unit_box();
        let above = CollisionVolume::new(Vec3::new(-1.0, 51.0, -1.0), Vec3::new(1.0, 60.0, 1.0));
        assert!(!a.intersects(&above));
    }

    #[test]
    fn test_field_queries() {
        let field = CollisionField::bulk_load(vec![
            unit_box(),
            CollisionVolume::new(Vec3::new(10.0, 0.0, 10.0), Vec3::new(12.0, 50.0, 12.0)),
        ]);
        assert_eq!(field.len(), 2);
        assert!(field.intersects(&CollisionVolume::probe(Vec3::new(11.0, 2.0, 11.0), 1.0, 50.0)));
        assert!(!field.intersects(&CollisionVolume::probe(Vec3::new(5.0, 2.0, 5.0), 1.0, 50.0)));
        assert!(CollisionField::default().is_empty());
    }
}
