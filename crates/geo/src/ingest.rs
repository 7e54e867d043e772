//! # Scene Ingestion
//!
//! Turns an OSM dataset into scene contents: parse → node index → classify →
//! project → build geometry. When the dataset cannot be read, a synthetic set
//! of rectangular buildings stands in for it.
//!
//! ## Table of Contents
//! 1. IngestStats — Aggregate counts
//! 2. SceneContents — Ingestion output
//! 3. SceneIngestionPipeline — Dataset → scene
//! 4. Synthetic fallback

use bevy::prelude::*;
use rand::Rng;
use std::path::Path;

use crate::classify::{classify, FeatureKind};
use crate::collision::CollisionVolume;
use crate::config::GeoConfig;
use crate::coords::{AxisMapping, CoordinateProjector, MapPlane};
use crate::osm_import::{read_dataset, OsmDataset};
use crate::vector_render::{BuildingMesh, GeometryBuilder, StreetFeature};

// ============================================================================
// 1. IngestStats — Aggregate counts
// ============================================================================

/// Counts reported after ingestion
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Buildings produced
    pub buildings: usize,
    /// Streets produced
    pub streets: usize,
    /// Resolved vertices across every way that resolved at least one
    pub points: usize,
    /// Ways with no building/highway tag or no resolvable nodes
    pub ignored: usize,
    /// Building ways with fewer than 3 resolved vertices
    pub degenerate: usize,
}

// ============================================================================
// 2. SceneContents — Ingestion output
// ============================================================================

/// Where the scene contents came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSource {
    Dataset,
    Synthetic,
}

/// A building plus the way it came from
#[derive(Debug, Clone)]
pub struct SceneBuilding {
    /// Source way id (`None` for synthetic buildings)
    pub way_id: Option<String>,
    pub mesh: BuildingMesh,
}

/// A street plus the way it came from
#[derive(Debug, Clone)]
pub struct SceneStreet {
    pub way_id: String,
    pub feature: StreetFeature,
}

/// Everything ingestion produced
#[derive(Debug, Clone)]
pub struct SceneContents {
    pub source: SceneSource,
    pub buildings: Vec<SceneBuilding>,
    pub streets: Vec<SceneStreet>,
    pub stats: IngestStats,
}

impl SceneContents {
    fn empty(source: SceneSource) -> Self {
        Self {
            source,
            buildings: Vec::new(),
            streets: Vec::new(),
            stats: IngestStats::default(),
        }
    }

    /// One collision volume per building, in building order
    pub fn collision_volumes(&self) -> Vec<CollisionVolume> {
        self.buildings.iter().map(|b| b.mesh.collision).collect()
    }
}

// ============================================================================
// 3. SceneIngestionPipeline — Dataset → scene
// ============================================================================

/// Dataset → scene conversion for a fixed projection and scale
#[derive(Debug, Clone, Copy)]
pub struct SceneIngestionPipeline {
    pub projector: CoordinateProjector,
    pub builder: GeometryBuilder,
    /// Synthetic building count used when the dataset is unavailable
    pub fallback_buildings: usize,
}

impl SceneIngestionPipeline {
    pub fn from_config(config: &GeoConfig, plane: MapPlane) -> Self {
        Self {
            projector: CoordinateProjector::new(config.window, plane),
            builder: GeometryBuilder::new(config.world.world_scale),
            fallback_buildings: config.data.fallback_buildings,
        }
    }

    /// Read and ingest the dataset at `path`, falling back to synthetic
    /// buildings when it cannot be read
    pub fn load(&self, path: &Path, rng: &mut impl Rng) -> SceneContents {
        match read_dataset(path) {
            Ok(text) => self.ingest(&text, rng),
            Err(e) => {
                tracing::warn!("{}; generating {} sample buildings", e, self.fallback_buildings);
                self.synthetic_scene(rng)
            }
        }
    }

    /// Ingest an OSM XML document
    pub fn ingest(&self, text: &str, rng: &mut impl Rng) -> SceneContents {
        let dataset = OsmDataset::parse(text);
        let index = dataset.node_index();
        let mut contents = SceneContents::empty(SceneSource::Dataset);

        for way in &dataset.ways {
            let classification = classify(way, &index);
            contents.stats.points += classification.nodes.len();

            match classification.kind {
                FeatureKind::Building => {
                    let footprint: Vec<Vec2> = classification
                        .nodes
                        .iter()
                        .map(|n| self.projector.project(n.lon, n.lat, AxisMapping::Building))
                        .collect();
                    match self.builder.build_building(&footprint, rng) {
                        Some(mesh) => {
                            contents.stats.buildings += 1;
                            contents.buildings.push(SceneBuilding {
                                way_id: Some(way.id.clone()),
                                mesh,
                            });
                        }
                        None => {
                            tracing::debug!(
                                "Skipping building way {}: {} resolved vertices",
                                way.id,
                                footprint.len()
                            );
                            contents.stats.degenerate += 1;
                        }
                    }
                }
                FeatureKind::Street => {
                    let vertices: Vec<Vec2> = classification
                        .nodes
                        .iter()
                        .map(|n| self.projector.project(n.lon, n.lat, AxisMapping::Street))
                        .collect();
                    if let Some(feature) = self.builder.build_street(&vertices) {
                        contents.stats.streets += 1;
                        contents.streets.push(SceneStreet {
                            way_id: way.id.clone(),
                            feature,
                        });
                    }
                }
                FeatureKind::Ignored => contents.stats.ignored += 1,
            }
        }

        tracing::info!(
            "Loaded: {} buildings, {} streets ({} points, {} ignored, {} degenerate)",
            contents.stats.buildings,
            contents.stats.streets,
            contents.stats.points,
            contents.stats.ignored,
            contents.stats.degenerate
        );

        contents
    }

    // ========================================================================
    // 4. Synthetic fallback
    // ========================================================================

    /// Random rectangular buildings scattered over the central 60% of the plane
    pub fn synthetic_scene(&self, rng: &mut impl Rng) -> SceneContents {
        let plane = self.projector.plane;
        let ws = self.builder.world_scale;
        let mut contents = SceneContents::empty(SceneSource::Synthetic);

        for _ in 0..self.fallback_buildings {
            let x = (rng.gen::<f32>() - 0.5) * plane.width * 0.6;
            let z = (rng.gen::<f32>() - 0.5) * plane.height * 0.6;
            let w = (2.0 + rng.gen::<f32>() * 4.0) * ws;
            let d = (2.0 + rng.gen::<f32>() * 4.0) * ws;

            let footprint = [
                Vec2::new(x, z),
                Vec2::new(x + w, z),
                Vec2::new(x + w, z + d),
                Vec2::new(x, z + d),
            ];
            if let Some(mesh) = self.builder.build_building(&footprint, rng) {
                contents.stats.buildings += 1;
                contents.stats.points += footprint.len();
                contents.buildings.push(SceneBuilding { way_id: None, mesh });
            }
        }

        tracing::info!("Sample buildings created: {}", contents.stats.buildings);
        contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionField;
    use crate::config::GeoWindow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Window [-1, 1]² stretched over a 2 × 2 plane: x = lon, building z = -lat
    fn pipeline() -> SceneIngestionPipeline {
        SceneIngestionPipeline {
            projector: CoordinateProjector::new(
                GeoWindow { min_lon: -1.0, max_lon: 1.0, min_lat: -1.0, max_lat: 1.0 },
                MapPlane { width: 2.0, height: 2.0 },
            ),
            builder: GeometryBuilder::new(5.0),
            fallback_buildings: 15,
        }
    }

    const SQUARE_OSM: &str = r#"<osm>
  <node id="1" lat="-0.5" lon="-0.5"/>
  <node id="2" lat="-0.5" lon="0.5"/>
  <node id="3" lat="0.5" lon="0.5"/>
  <node id="4" lat="0.5" lon="-0.5"/>
  <way id="100">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="4"/>
    <tag k="building" v="yes"/>
  </way>
</osm>"#;

    #[test]
    fn test_unit_square_building_at_center() {
        let mut rng = StdRng::seed_from_u64(1);
        let contents = pipeline().ingest(SQUARE_OSM, &mut rng);

        assert_eq!(contents.source, SceneSource::Dataset);
        assert_eq!(contents.stats.buildings, 1);
        assert_eq!(contents.buildings.len(), 1);
        assert_eq!(contents.buildings[0].way_id.as_deref(), Some("100"));

        let volumes = contents.collision_volumes();
        assert_eq!(volumes.len(), 1);
        assert!((volumes[0].min - Vec3::new(-0.5, 0.0, -0.5)).length() < 1e-5);
        assert!((volumes[0].max - Vec3::new(0.5, 50.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_missing_dataset_falls_back_to_fifteen_buildings() {
        let mut rng = StdRng::seed_from_u64(2);
        let contents = pipeline().load(Path::new("/no/such/dataset.osm"), &mut rng);

        assert_eq!(contents.source, SceneSource::Synthetic);
        assert_eq!(contents.stats.buildings, 15);
        assert_eq!(contents.stats.streets, 0);
        let field = CollisionField::bulk_load(contents.collision_volumes());
        assert_eq!(field.len(), 15);
    }

    #[test]
    fn test_synthetic_footprints_stay_in_central_area() {
        let p = SceneIngestionPipeline {
            projector: CoordinateProjector::new(
                GeoWindow::default(),
                MapPlane { width: 1125.0, height: 750.0 },
            ),
            builder: GeometryBuilder::new(5.0),
            fallback_buildings: 15,
        };
        let mut rng = StdRng::seed_from_u64(3);
        for b in p.synthetic_scene(&mut rng).buildings {
            let size = b.mesh.collision.max - b.mesh.collision.min;
            assert!(size.x >= 10.0 && size.x < 30.0);
            assert!(size.z >= 10.0 && size.z < 30.0);
            assert!(b.mesh.collision.min.x >= -1125.0 * 0.3);
            assert!(b.mesh.collision.max.z <= 750.0 * 0.3);
        }
    }

    #[test]
    fn test_building_and_street_on_same_nodes_coincide() {
        let text = r#"<osm>
  <node id="1" lat="0.2" lon="-0.4"/>
  <node id="2" lat="0.6" lon="0.1"/>
  <node id="3" lat="-0.3" lon="0.7"/>
  <way id="b"><nd ref="1"/><nd ref="2"/><nd ref="3"/><tag k="building" v="yes"/></way>
  <way id="s"><nd ref="1"/><nd ref="2"/><nd ref="3"/><tag k="highway" v="residential"/></way>
</osm>"#;
        let mut rng = StdRng::seed_from_u64(4);
        let contents = pipeline().ingest(text, &mut rng);
        let building = &contents.buildings[0].mesh;
        let street = &contents.streets[0].feature;
        for (b, s) in building.footprint.iter().zip(&street.vertices) {
            assert!((*b - *s).length() < 1e-5);
        }
    }

    #[test]
    fn test_stats_count_ignored_degenerate_and_points() {
        let text = r#"<osm>
  <node id="1" lat="0.0" lon="0.0"/>
  <node id="2" lat="0.1" lon="0.1"/>
  <way id="a"><nd ref="1"/><nd ref="2"/><tag k="building" v="yes"/></way>
  <way id="b"><nd ref="1"/><nd ref="2"/><tag k="highway" v="primary"/><tag k="building" v="yes"/></way>
  <way id="c"><nd ref="1"/><nd ref="2"/><tag k="highway" v="primary"/></way>
  <way id="d"><nd ref="1"/><tag k="natural" v="tree"/></way>
  <way id="e"><nd ref="9"/><tag k="highway" v="primary"/></way>
</osm>"#;
        let mut rng = StdRng::seed_from_u64(5);
        let stats = pipeline().ingest(text, &mut rng).stats;
        assert_eq!(stats.buildings, 0);
        assert_eq!(stats.degenerate, 2);
        assert_eq!(stats.streets, 1);
        assert_eq!(stats.ignored, 2);
        assert_eq!(stats.points, 7);
    }

    #[test]
    fn test_empty_document_is_an_empty_scene() {
        let mut rng = StdRng::seed_from_u64(6);
        let contents = pipeline().ingest("", &mut rng);
        assert_eq!(contents.source, SceneSource::Dataset);
        assert_eq!(contents.stats, IngestStats::default());
    }
}
