//! Polygon rings in geographic degrees: bounding boxes, decimation, and the
//! point-in-polygon test the fill sampler depends on.

/// A closed sequence of (longitude, latitude) vertices in degrees. The first
/// vertex is repeated at the end, matching the stitched topology arcs.
pub type Ring = Vec<[f64; 2]>;

/// One polygon: ring 0 is the outer boundary, rings 1.. are holes.
/// Hole ordering is preserved exactly as parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPolygon {
    pub rings: Vec<Ring>,
}

impl GeoPolygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    #[inline]
    pub fn outer(&self) -> &Ring {
        &self.rings[0]
    }

    #[inline]
    pub fn holes(&self) -> &[Ring] {
        &self.rings[1..]
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BboxDeg {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BboxDeg {
    /// None for rings with fewer than three distinct vertices worth of data.
    pub fn of_ring(ring: &Ring) -> Option<Self> {
        if ring.len() < 3 {
            return None;
        }
        let mut b = BboxDeg {
            lon_min: f64::INFINITY,
            lon_max: f64::NEG_INFINITY,
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
        };
        for p in ring {
            b.lon_min = b.lon_min.min(p[0]);
            b.lon_max = b.lon_max.max(p[0]);
            b.lat_min = b.lat_min.min(p[1]);
            b.lat_max = b.lat_max.max(p[1]);
        }
        Some(b)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }
}

/// Outer rings longer than this are strided down before edge sampling.
pub const DECIMATE_MAX_VERTS: usize = 400;

/// Uniform-stride decimation. Rings at or under `max_verts` come back
/// unchanged; longer rings keep roughly every len/max_verts-th vertex and
/// always both endpoints so closure survives.
pub fn decimate_ring(ring: &Ring, max_verts: usize) -> Ring {
    if ring.len() <= max_verts || max_verts == 0 {
        return ring.clone();
    }
    let stride = ring.len().div_ceil(max_verts);
    let mut out: Ring = ring.iter().step_by(stride).copied().collect();
    if out.last() != ring.last() {
        // step_by already kept the first vertex; restore the closing one.
        if let Some(&last) = ring.last() {
            out.push(last);
        }
    }
    out
}

/// Decimate a polygon's outer ring only. Holes are assumed small and pass
/// through untouched.
pub fn decimate_polygon(poly: &GeoPolygon, max_verts: usize) -> GeoPolygon {
    let mut rings = Vec::with_capacity(poly.rings.len());
    rings.push(decimate_ring(poly.outer(), max_verts));
    rings.extend(poly.holes().iter().cloned());
    GeoPolygon::new(rings)
}

/// Even-odd point-in-polygon over all rings at once. A point inside a hole
/// crosses the outer ring once and the hole once, so the parity rule handles
/// holes without special casing.
pub fn point_in_polygon(poly: &GeoPolygon, lon: f64, lat: f64) -> bool {
    let mut inside = false;
    for ring in &poly.rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (ring[i][0], ring[i][1]);
            let (xj, yj) = (ring[j][0], ring[j][1]);
            if (yi > lat) != (yj > lat) {
                let x_inter = (xj - xi) * (lat - yi) / (yj - yi + 1e-20) + xi;
                if lon < x_inter {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> Ring {
        vec![
            [-half, -half],
            [half, -half],
            [half, half],
            [-half, half],
            [-half, -half],
        ]
    }

    #[test]
    fn decimate_short_ring_is_identity() {
        let ring = square(10.0);
        assert_eq!(decimate_ring(&ring, DECIMATE_MAX_VERTS), ring);
    }

    #[test]
    fn decimate_at_threshold_is_identity() {
        let ring: Ring = (0..DECIMATE_MAX_VERTS)
            .map(|i| [i as f64 * 0.1, i as f64 * 0.05])
            .collect();
        assert_eq!(decimate_ring(&ring, DECIMATE_MAX_VERTS), ring);
    }

    #[test]
    fn decimate_long_ring_keeps_endpoints() {
        let ring: Ring = (0..2000).map(|i| [i as f64, -(i as f64)]).collect();
        let out = decimate_ring(&ring, DECIMATE_MAX_VERTS);
        assert!(out.len() < ring.len());
        assert!(out.len() <= DECIMATE_MAX_VERTS + 1);
        assert_eq!(out.first(), ring.first());
        assert_eq!(out.last(), ring.last());
    }

    #[test]
    fn decimate_polygon_leaves_holes_alone() {
        let outer: Ring = (0..1000)
            .map(|i| {
                let a = i as f64 / 1000.0 * std::f64::consts::TAU;
                [a.cos() * 20.0, a.sin() * 20.0]
            })
            .collect();
        let hole = square(1.0);
        let poly = GeoPolygon::new(vec![outer.clone(), hole.clone()]);
        let out = decimate_polygon(&poly, DECIMATE_MAX_VERTS);
        assert!(out.outer().len() < outer.len());
        assert_eq!(out.holes(), &[hole]);
    }

    #[test]
    fn pip_respects_outer_and_hole() {
        let poly = GeoPolygon::new(vec![square(10.0), square(2.0)]);
        assert!(point_in_polygon(&poly, 5.0, 5.0));
        assert!(!point_in_polygon(&poly, 0.0, 0.0)); // inside the hole
        assert!(!point_in_polygon(&poly, 11.0, 0.0)); // outside entirely
    }

    #[test]
    fn pip_outside_bbox_is_false() {
        let poly = GeoPolygon::new(vec![square(1.0)]);
        assert!(!point_in_polygon(&poly, 100.0, 0.0));
        assert!(!point_in_polygon(&poly, 0.0, -80.0));
    }
}
