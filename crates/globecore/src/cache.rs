//! Process-wide caches, held as an explicit object the application owns and
//! hands to each mount. Entries are write-once: stores check for an existing
//! value first and return it untouched, so a racing recompute can never
//! replace a buffer another mount already holds.

use crate::source::LandGeometry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One density's worth of sampled geometry: flat xyz buffers on the unit
/// sphere. Immutable once cached; shared by every mount at that density.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePair {
    pub edge: Vec<f32>,
    pub fill: Vec<f32>,
}

impl SamplePair {
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge.len() / 3
    }

    #[inline]
    pub fn fill_count(&self) -> usize {
        self.fill.len() / 3
    }
}

#[derive(Default)]
pub struct GlobeCaches {
    land: Mutex<Option<Arc<LandGeometry>>>,
    samples: Mutex<HashMap<u64, Arc<SamplePair>>>,
}

/// Density keys are the exact f64 bit pattern; densities are caller-supplied
/// constants, so near-equal keys are not a concern.
#[inline]
fn density_key(density_deg: f64) -> u64 {
    density_deg.to_bits()
}

impl GlobeCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn land(&self) -> Option<Arc<LandGeometry>> {
        self.land.lock().unwrap().clone()
    }

    /// Store the parsed land geometry unless a previous mount already did;
    /// either way the cached value comes back.
    pub fn store_land(&self, geometry: LandGeometry) -> Arc<LandGeometry> {
        let mut slot = self.land.lock().unwrap();
        match &*slot {
            Some(existing) => Arc::clone(existing),
            None => {
                let arc = Arc::new(geometry);
                *slot = Some(Arc::clone(&arc));
                arc
            }
        }
    }

    pub fn samples(&self, density_deg: f64) -> Option<Arc<SamplePair>> {
        self.samples
            .lock()
            .unwrap()
            .get(&density_key(density_deg))
            .cloned()
    }

    /// Insert a sampled pair for a density unless one exists; returns the
    /// cached value in both cases.
    pub fn store_samples(&self, density_deg: f64, pair: SamplePair) -> Arc<SamplePair> {
        let mut map = self.samples.lock().unwrap();
        Arc::clone(
            map.entry(density_key(density_deg))
                .or_insert_with(|| Arc::new(pair)),
        )
    }

    /// Drop everything. Intended for tests and explicit host resets.
    pub fn clear(&self) {
        self.land.lock().unwrap().take();
        self.samples.lock().unwrap().clear();
    }
}
