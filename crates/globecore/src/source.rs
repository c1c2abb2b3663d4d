//! Land dataset acquisition: walk the mirror list in order, parse the
//! topology, and split the result into the sampler-facing polygon sets.

use crate::error::LandError;
use crate::geo::{decimate_polygon, GeoPolygon, DECIMATE_MAX_VERTS};
use crate::topology;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// world-atlas land boundaries at 1:110m, the resolution the globe needs.
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://cdn.jsdelivr.net/npm/world-atlas@2/land-110m.json",
    "https://unpkg.com/world-atlas@2/land-110m.json",
];

const CACHE_FILE: &str = "land-110m.json";

/// Parsed land polygons, ready for the two samplers. `fill_polygons` are the
/// source geometry untouched; `edge_polygons` carry decimated outer rings
/// (holes verbatim) so coastline walks stay bounded.
#[derive(Debug)]
pub struct LandGeometry {
    pub edge_polygons: Arc<[GeoPolygon]>,
    pub fill_polygons: Arc<[GeoPolygon]>,
}

/// Decode topology text into the edge/fill polygon split.
pub fn land_from_str(text: &str) -> Result<LandGeometry, LandError> {
    let fill = topology::parse_land(text)?;
    let edge: Vec<GeoPolygon> = fill
        .iter()
        .map(|p| decimate_polygon(p, DECIMATE_MAX_VERTS))
        .collect();
    Ok(LandGeometry {
        edge_polygons: Arc::from(edge),
        fill_polygons: Arc::from(fill),
    })
}

/// Where the land topology comes from. Stateless; process-lifetime
/// memoization lives in [`crate::cache::GlobeCaches`].
#[derive(Debug, Clone)]
pub struct LandSource {
    mirrors: Vec<String>,
    cache_dir: Option<PathBuf>,
    local_file: Option<PathBuf>,
}

impl Default for LandSource {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            cache_dir: None,
            local_file: None,
        }
    }
}

impl LandSource {
    pub fn new(mirrors: Vec<String>) -> Self {
        Self {
            mirrors,
            ..Self::default()
        }
    }

    /// Reuse raw fetched bytes across runs from this directory.
    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Read the topology from disk instead of the network.
    pub fn with_local_file(mut self, path: Option<PathBuf>) -> Self {
        self.local_file = path;
        self
    }

    /// Fetch and decode the dataset. A mirror only counts as succeeded once
    /// its payload parses; unparseable responses move on to the next mirror.
    pub fn load(&self) -> Result<LandGeometry, LandError> {
        if let Some(path) = &self.local_file {
            log::info!("loading land topology from {}", path.display());
            let text = fs::read_to_string(path)?;
            return land_from_str(&text);
        }

        if let Some(text) = self.read_disk_cache() {
            match land_from_str(&text) {
                Ok(geometry) => {
                    log::info!("loaded land topology from disk cache");
                    return Ok(geometry);
                }
                Err(e) => log::warn!("discarding stale disk cache: {e}"),
            }
        }

        for url in &self.mirrors {
            let text = match fetch_text(url) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("land mirror {url} failed: {e}");
                    continue;
                }
            };
            match land_from_str(&text) {
                Ok(geometry) => {
                    log::info!(
                        "fetched land topology from {url} ({} polygons)",
                        geometry.fill_polygons.len()
                    );
                    self.write_disk_cache(&text);
                    return Ok(geometry);
                }
                Err(e) => log::warn!("land mirror {url} returned unparseable data: {e}"),
            }
        }

        Err(LandError::Unavailable {
            tried: self.mirrors.len(),
        })
    }

    fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|d| d.join(CACHE_FILE))
    }

    fn read_disk_cache(&self) -> Option<String> {
        let path = self.cache_path()?;
        read_if_present(&path)
    }

    /// Best effort; a read-only cache directory only costs the reuse.
    fn write_disk_cache(&self, text: &str) {
        let Some(path) = self.cache_path() else {
            return;
        };
        let write = self
            .cache_dir
            .as_deref()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::write(&path, text));
        if let Err(e) = write {
            log::warn!("could not write land cache {}: {e}", path.display());
        }
    }
}

fn read_if_present(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("could not read land cache {}: {e}", path.display());
            None
        }
    }
}

fn fetch_text(url: &str) -> Result<String, LandError> {
    let response = ureq::get(url).call()?;
    Ok(response.into_string()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A two-polygon topology: a large quantized square and a small triangle.
    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1.0, 1.0], "translate": [-10.0, -10.0] },
        "arcs": [
            [[0,0],[20,0],[0,20],[-20,0],[0,-20]],
            [[5,5],[3,0],[0,3],[-3,-3]]
        ],
        "objects": {
            "land": { "type": "MultiPolygon", "arcs": [[[0]], [[1]]] }
        }
    }"#;

    #[test]
    fn multipolygon_splits_one_geo_polygon_per_ring_set() {
        let land = land_from_str(TOPOLOGY).unwrap();
        assert_eq!(land.fill_polygons.len(), 2);
        assert_eq!(land.edge_polygons.len(), 2);
        assert_eq!(
            land.fill_polygons[0].outer(),
            &vec![
                [-10.0, -10.0],
                [10.0, -10.0],
                [10.0, 10.0],
                [-10.0, 10.0],
                [-10.0, -10.0]
            ]
        );
    }

    #[test]
    fn short_rings_survive_the_edge_split_unchanged() {
        let land = land_from_str(TOPOLOGY).unwrap();
        assert_eq!(land.edge_polygons[0].rings, land.fill_polygons[0].rings);
    }

    #[test]
    fn local_file_parse_failure_propagates() {
        let dir = std::env::temp_dir().join("globecore-source-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        fs::write(&path, "{}").unwrap();
        let source = LandSource::default().with_local_file(Some(path));
        assert!(source.load().is_err());
    }

    #[test]
    fn empty_mirror_list_reports_unavailable() {
        let source = LandSource::new(Vec::new());
        match source.load() {
            Err(LandError::Unavailable { tried }) => assert_eq!(tried, 0),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
