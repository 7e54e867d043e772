//! # Vector Feature Rendering
//!
//! Converts projected OSM features into Bevy 3D meshes.
//! - Building footprint → extruded prism (earcut caps, flat-shaded walls)
//! - Street polyline → line strip + one sphere marker per vertex
//!
//! Footprints arrive in sketch-plane coordinates `(u, v)` from the building
//! projection. Standing the extrusion upright maps them to world `(u, 0, -v)`.
//!
//! ## Table of Contents
//! 1. GeometryBuilder — Feature → geometry dispatch
//! 2. BuildingMesh — Extruded footprint
//! 3. StreetFeature — Polyline + markers
//! 4. Mesh helpers

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use rand::Rng;

use crate::collision::CollisionVolume;

/// Building colors (sRGB): white, light grey, beige, light brown, blue grey
pub const BUILDING_PALETTE: [[u8; 3]; 5] = [
    [0xf5, 0xf5, 0xf5],
    [0xe0, 0xe0, 0xe0],
    [0xd7, 0xcc, 0xc8],
    [0xbc, 0xaa, 0xa4],
    [0x90, 0xa4, 0xae],
];

/// Street line color (sRGB)
pub const STREET_LINE_COLOR: [u8; 3] = [0x44, 0x44, 0x44];

/// Street marker color (sRGB)
pub const STREET_MARKER_COLOR: [u8; 3] = [0x7c, 0xb3, 0x42];

/// Street marker emissive tint (sRGB)
pub const STREET_MARKER_EMISSIVE: [u8; 3] = [0x55, 0x8b, 0x2f];

// ============================================================================
// 1. GeometryBuilder — Feature → geometry dispatch
// ============================================================================

/// Produces building and street geometry at a given world scale
#[derive(Debug, Clone, Copy)]
pub struct GeometryBuilder {
    pub world_scale: f32,
}

impl GeometryBuilder {
    pub fn new(world_scale: f32) -> Self {
        Self { world_scale }
    }

    /// Lower bound of the building height range (inclusive)
    pub fn min_building_height(&self) -> f32 {
        self.world_scale
    }

    /// Upper bound of the building height range (exclusive)
    pub fn max_building_height(&self) -> f32 {
        4.0 * self.world_scale
    }

    /// Fixed top of every collision volume, independent of building height
    pub fn collision_height(&self) -> f32 {
        10.0 * self.world_scale
    }

    /// Street marker sphere radius, also its center height
    pub fn marker_radius(&self) -> f32 {
        0.15 * self.world_scale
    }

    /// Extrude a footprint given in sketch-plane coordinates.
    ///
    /// Returns `None` for fewer than 3 vertices.
    pub fn build_building(&self, footprint: &[Vec2], rng: &mut impl Rng) -> Option<BuildingMesh> {
        if footprint.len() < 3 {
            return None;
        }

        let world: Vec<Vec3> = footprint.iter().map(|p| Vec3::new(p.x, 0.0, -p.y)).collect();
        let collision = CollisionVolume::from_footprint(&world, self.collision_height())?;
        let height = rng.gen_range(self.min_building_height()..self.max_building_height());
        let [r, g, b] = BUILDING_PALETTE[rng.gen_range(0..BUILDING_PALETTE.len())];

        Some(BuildingMesh {
            footprint: world,
            height,
            color: Color::srgb_u8(r, g, b),
            collision,
        })
    }

    /// Street polyline on the ground plane through `vertices` (street mapping).
    ///
    /// Returns `None` for an empty vertex list.
    pub fn build_street(&self, vertices: &[Vec2]) -> Option<StreetFeature> {
        if vertices.is_empty() {
            return None;
        }

        let marker_y = self.marker_radius();
        Some(StreetFeature {
            vertices: vertices.iter().map(|p| Vec3::new(p.x, 0.0, p.y)).collect(),
            markers: vertices.iter().map(|p| Vec3::new(p.x, marker_y, p.y)).collect(),
        })
    }

    /// Shared sphere mesh for every street marker
    pub fn marker_mesh(&self) -> Mesh {
        Mesh::from(bevy::math::primitives::Sphere::new(self.marker_radius()))
    }
}

// ============================================================================
// 2. BuildingMesh — Extruded footprint
// ============================================================================

/// An extruded building with its collision volume
#[derive(Debug, Clone)]
pub struct BuildingMesh {
    /// Ground ring in world space (y = 0), path order
    pub footprint: Vec<Vec3>,
    /// Extrusion height
    pub height: f32,
    /// Palette color
    pub color: Color,
    /// Bounding box of the footprint, y ∈ [0, 10 × world scale]
    pub collision: CollisionVolume,
}

impl BuildingMesh {
    /// Triangle-list prism: earcut caps and one flat quad per wall edge
    pub fn to_mesh(&self) -> Mesh {
        let ring = open_ring(&self.footprint);
        let up = Vec3::Y * self.height;

        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();

        let flat: Vec<f64> = ring
            .iter()
            .flat_map(|p| [p.x as f64, p.z as f64])
            .collect();
        let caps = match earcutr::earcut(&flat, &[], 2) {
            Ok(indices) => indices,
            Err(e) => {
                tracing::debug!("Footprint cap triangulation failed: {:?}", e);
                Vec::new()
            }
        };

        for tri in caps.chunks_exact(3) {
            let (a, b, c) = (ring[tri[0]], ring[tri[1]], ring[tri[2]]);
            push_triangle(&mut positions, &mut normals, [a + up, b + up, c + up], Vec3::Y);
            push_triangle(&mut positions, &mut normals, [a, b, c], Vec3::NEG_Y);
        }

        let winding = signed_area_xz(&ring).signum();
        for i in 0..ring.len() {
            let p = ring[i];
            let q = ring[(i + 1) % ring.len()];
            let edge = q - p;
            if edge.length_squared() <= f32::EPSILON {
                continue;
            }
            let outward = Vec3::new(edge.z, 0.0, -edge.x).normalize() * winding;
            push_triangle(&mut positions, &mut normals, [p, q, q + up], outward);
            push_triangle(&mut positions, &mut normals, [p, q + up, p + up], outward);
        }

        let indices: Vec<u32> = (0..positions.len() as u32).collect();
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_indices(Indices::U32(indices));
        mesh
    }
}

// ============================================================================
// 3. StreetFeature — Polyline + markers
// ============================================================================

/// A street polyline on the ground plane with one marker per vertex
#[derive(Debug, Clone)]
pub struct StreetFeature {
    /// Polyline vertices (y = 0)
    pub vertices: Vec<Vec3>,
    /// Marker sphere centers
    pub markers: Vec<Vec3>,
}

impl StreetFeature {
    /// Line strip through every vertex
    pub fn to_line_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.to_array()).collect();
        let normals: Vec<[f32; 3]> = vec![[0.0, 1.0, 0.0]; positions.len()];

        let mut mesh = Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh
    }
}

// ============================================================================
// 4. Mesh helpers
// ============================================================================

/// Drop a trailing vertex that repeats the first (closed OSM ways)
fn open_ring(points: &[Vec3]) -> Vec<Vec3> {
    let mut ring = points.to_vec();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Twice the signed area of the ring on XZ
fn signed_area_xz(ring: &[Vec3]) -> f32 {
    (0..ring.len())
        .map(|i| {
            let p = ring[i];
            let q = ring[(i + 1) % ring.len()];
            p.x * q.z - q.x * p.z
        })
        .sum()
}

/// Push one flat-shaded triangle, wound so its face normal agrees with `normal`
fn push_triangle(
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    [a, b, c]: [Vec3; 3],
    normal: Vec3,
) {
    let (b, c) = if (b - a).cross(c - a).dot(normal) < 0.0 { (c, b) } else { (b, c) };
    for v in [a, b, c] {
        positions.push(v.to_array());
        normals.push(normal.to_array());
    }
}
