//! # Feature Classification
//!
//! Decides what a parsed way becomes in the scene and resolves its node
//! references. A `building` tag wins over `highway`; ways with neither, or with
//! no resolvable nodes, are ignored.

use crate::osm_import::{GeoNode, GeoWay, NodeIndex};

/// What a way turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Extruded footprint with a collision volume
    Building,
    /// Polyline with point markers
    Street,
    /// Produces no geometry
    Ignored,
}

/// Classification result with the way's resolved nodes in path order
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub kind: FeatureKind,
    pub nodes: Vec<&'a GeoNode>,
}

/// Classify a way and resolve its node references. Unknown references are
/// skipped.
pub fn classify<'a>(way: &GeoWay, index: &NodeIndex<'a>) -> Classification<'a> {
    let mut is_building = false;
    let mut is_highway = false;
    for key in way.tags.keys() {
        match key.as_str() {
            "building" => is_building = true,
            "highway" => is_highway = true,
            _ => {}
        }
    }

    let nodes: Vec<&'a GeoNode> = way
        .node_refs
        .iter()
        .filter_map(|r| index.get(r.as_str()).copied())
        .collect();

    let kind = if nodes.is_empty() || !(is_building || is_highway) {
        FeatureKind::Ignored
    } else if is_building {
        FeatureKind::Building
    } else {
        FeatureKind::Street
    };

    Classification { kind, nodes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_import::OsmDataset;

    fn way(refs: &[&str], tags: &[(&str, &str)]) -> GeoWay {
        GeoWay {
            id: "w".into(),
            node_refs: refs.iter().map(|r| r.to_string()).collect(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    fn dataset() -> OsmDataset {
        OsmDataset {
            nodes: vec![
                GeoNode { id: "a".into(), lon: 0.0, lat: 0.0 },
                GeoNode { id: "b".into(), lon: 1.0, lat: 0.0 },
                GeoNode { id: "c".into(), lon: 1.0, lat: 1.0 },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_building_and_street() {
        let ds = dataset();
        let index = ds.node_index();

        let b = classify(&way(&["a", "b", "c"], &[("building", "yes")]), &index);
        assert_eq!(b.kind, FeatureKind::Building);
        assert_eq!(b.nodes.len(), 3);

        let s = classify(&way(&["a", "b"], &[("highway", "primary")]), &index);
        assert_eq!(s.kind, FeatureKind::Street);
        assert_eq!(s.nodes[1].id, "b");
    }

    #[test]
    fn test_building_wins_over_highway() {
        let ds = dataset();
        let index = ds.node_index();
        let c = classify(
            &way(&["a", "b", "c"], &[("highway", "service"), ("building", "roof")]),
            &index,
        );
        assert_eq!(c.kind, FeatureKind::Building);
    }

    #[test]
    fn test_untagged_is_ignored_but_resolves() {
        let ds = dataset();
        let index = ds.node_index();
        let c = classify(&way(&["a", "b"], &[("landuse", "grass")]), &index);
        assert_eq!(c.kind, FeatureKind::Ignored);
        assert_eq!(c.nodes.len(), 2);
    }

    #[test]
    fn test_unresolved_refs_are_skipped() {
        let ds = dataset();
        let index = ds.node_index();
        let c = classify(&way(&["a", "zz", "c"], &[("highway", "path")]), &index);
        assert_eq!(c.kind, FeatureKind::Street);
        let ids: Vec<&str> = c.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let none = classify(&way(&["x", "y"], &[("building", "yes")]), &index);
        assert_eq!(none.kind, FeatureKind::Ignored);
        assert!(none.nodes.is_empty());
    }
}
