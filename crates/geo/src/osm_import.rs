//! # OSM Data Import
//!
//! Parses OpenStreetMap XML into plain node and way collections. Only `node`,
//! `way`, and the way's `nd` / `tag` children are read; relations, bounds and
//! node tags are skipped.
//!
//! Parsing is tolerant: a node without a usable id or coordinate, an `nd`
//! without `ref`, or a `tag` without `k` is dropped on its own. A structural
//! XML error stops the scan but keeps everything read up to that point.
//!
//! ## Table of Contents
//! 1. GeoNode / GeoWay — Parsed elements
//! 2. OsmDataset — Parsed document + node index
//! 3. XML scanning
//! 4. Dataset retrieval

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

// ============================================================================
// 1. GeoNode / GeoWay — Parsed elements
// ============================================================================

/// A single geographic point
#[derive(Debug, Clone, PartialEq)]
pub struct GeoNode {
    /// Opaque identifier, unique within the dataset
    pub id: String,
    /// Longitude (WGS84 degrees)
    pub lon: f64,
    /// Latitude (WGS84 degrees)
    pub lat: f64,
}

/// An ordered list of node references plus descriptive tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoWay {
    pub id: String,
    /// Node identifiers in path order
    pub node_refs: Vec<String>,
    /// Tag key → value
    pub tags: BTreeMap<String, String>,
}

impl GeoWay {
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }
}

// ============================================================================
// 2. OsmDataset — Parsed document + node index
// ============================================================================

/// Identifier → node lookup, built once per dataset
pub type NodeIndex<'a> = HashMap<&'a str, &'a GeoNode>;

/// Nodes and ways parsed from an OSM XML document
#[derive(Debug, Clone, Default)]
pub struct OsmDataset {
    pub nodes: Vec<GeoNode>,
    pub ways: Vec<GeoWay>,
    /// Elements dropped because of missing or unparseable attributes
    pub skipped_elements: usize,
    /// Whether the scan stopped early on an XML error
    pub truncated: bool,
}

impl OsmDataset {
    /// Parse an OSM XML document. Never fails; see module docs.
    pub fn parse(text: &str) -> Self {
        let mut dataset = OsmDataset::default();
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut current_way: Option<GeoWay> = None;

        loop {
            let (element, has_children) = match reader.read_event() {
                Ok(Event::Start(e)) => (e, true),
                Ok(Event::Empty(e)) => (e, false),
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"way" {
                        if let Some(way) = current_way.take() {
                            dataset.ways.push(way);
                        }
                    }
                    continue;
                }
                Ok(Event::Eof) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(
                        "OSM parse stopped at byte {}: {} (keeping {} nodes, {} ways)",
                        reader.buffer_position(),
                        e,
                        dataset.nodes.len(),
                        dataset.ways.len()
                    );
                    dataset.truncated = true;
                    break;
                }
            };

            match element.name().as_ref() {
                b"node" => match parse_node(&element) {
                    Some(node) => dataset.nodes.push(node),
                    None => dataset.skipped_elements += 1,
                },
                b"way" => {
                    let way = GeoWay {
                        id: attribute(&element, b"id").unwrap_or_default(),
                        ..Default::default()
                    };
                    if has_children {
                        current_way = Some(way);
                    } else {
                        dataset.ways.push(way);
                    }
                }
                b"nd" => {
                    if let Some(way) = current_way.as_mut() {
                        match attribute(&element, b"ref") {
                            Some(node_ref) => way.node_refs.push(node_ref),
                            None => dataset.skipped_elements += 1,
                        }
                    }
                }
                b"tag" => {
                    if let Some(way) = current_way.as_mut() {
                        match attribute(&element, b"k") {
                            Some(key) => {
                                let value = attribute(&element, b"v").unwrap_or_default();
                                way.tags.insert(key, value);
                            }
                            None => dataset.skipped_elements += 1,
                        }
                    }
                }
                _ => {}
            }
        }

        // An unterminated way at EOF still carries usable references
        if let Some(way) = current_way.take() {
            dataset.ways.push(way);
        }

        tracing::debug!(
            "Parsed OSM: {} nodes, {} ways, {} skipped elements",
            dataset.nodes.len(),
            dataset.ways.len(),
            dataset.skipped_elements
        );

        dataset
    }

    /// Build the identifier → node map. The first node with a given id wins.
    pub fn node_index(&self) -> NodeIndex<'_> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        index
    }
}

// ============================================================================
// 3. XML scanning
// ============================================================================

fn parse_node(element: &BytesStart<'_>) -> Option<GeoNode> {
    let id = attribute(element, b"id")?;
    let lat = parse_coordinate(element, b"lat")?;
    let lon = parse_coordinate(element, b"lon")?;
    Some(GeoNode { id, lon, lat })
}

fn parse_coordinate(element: &BytesStart<'_>, name: &[u8]) -> Option<f64> {
    attribute(element, name)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Unescaped value of the named attribute; malformed attributes are ignored
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

// ============================================================================
// 4. Dataset retrieval
// ============================================================================

/// Read the dataset document from disk
pub fn read_dataset(path: &Path) -> Result<String, DatasetError> {
    std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors retrieving the dataset
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// File I/O error
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
