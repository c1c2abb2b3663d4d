//! Unit-sphere point sampling: seam-aware edge interpolation along rings,
//! jittered-grid interior fill, and the fill-count cap.
//!
//! Both samplers are pure functions of (polygons, density); the fill path is
//! additionally resumable so a render loop can advance it one polygon per
//! frame tick.

use crate::geo::{point_in_polygon, BboxDeg, GeoPolygon};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Sampling never subdivides finer than this, whatever density is asked for.
pub const EDGE_DENSITY_FLOOR: f64 = 0.2;

/// Hard cap on interior fill points, applied by [`limit_points`].
pub const MAX_FILL_POINTS: usize = 12_000;

/// Near-pole guard for the east-west step compensation.
const MIN_COS_LAT: f64 = 1e-2;

/// Wrap a longitude into [-180, 180).
#[inline]
pub fn wrap_lon(mut lon: f64) -> f64 {
    while lon >= 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Project (lon, lat) in degrees onto the unit sphere. Colatitude from
/// latitude, longitude offset by 180° so the antimeridian seam lands where
/// the renderer expects it; Y is up.
#[inline]
pub fn project_unit(lon_deg: f64, lat_deg: f64) -> [f32; 3] {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lon_deg + 180.0).to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    [
        (-sin_phi * cos_theta) as f32,
        cos_phi as f32,
        (sin_phi * sin_theta) as f32,
    ]
}

/// Shorter-path longitude delta between two vertices: raw deltas beyond
/// ±180° are pulled across the seam before interpolation.
#[inline]
fn seam_delta_lon(from: f64, to: f64) -> f64 {
    let mut dlon = to - from;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    dlon
}

/// Interpolate one ring segment into (lon, lat) samples, seam-aware.
/// The end vertex is excluded; it opens the next segment.
fn sample_segment(from: [f64; 2], to: [f64; 2], step: f64, out: &mut Vec<[f64; 2]>) {
    let dlon = seam_delta_lon(from[0], to[0]);
    let dlat = to[1] - from[1];
    let span = dlon.abs().max(dlat.abs());
    let steps = ((span / step).ceil() as usize).max(1);
    for s in 0..steps {
        let t = s as f64 / steps as f64;
        out.push([wrap_lon(from[0] + dlon * t), from[1] + dlat * t]);
    }
}

/// Coastline sampling: every ring of every polygon, walked vertex pair by
/// vertex pair with `ceil(max(|Δlon|,|Δlat|) / max(0.2, density))` subdivision
/// steps, projected to the unit sphere. Output is one flat xyz buffer,
/// order-preserving across rings and polygons.
pub fn edge_points(polygons: &[GeoPolygon], density_deg: f64) -> Vec<f32> {
    let step = density_deg.max(EDGE_DENSITY_FLOOR);
    let mut lonlat: Vec<[f64; 2]> = Vec::new();
    let mut out: Vec<f32> = Vec::new();
    for poly in polygons {
        for ring in &poly.rings {
            lonlat.clear();
            for pair in ring.windows(2) {
                sample_segment(pair[0], pair[1], step, &mut lonlat);
            }
            out.reserve(lonlat.len() * 3);
            for p in &lonlat {
                out.extend_from_slice(&project_unit(p[0], p[1]));
            }
        }
    }
    out
}

/// Sample one polygon's interior into `out`.
///
/// A jittered grid over the outer-ring bbox: north-south rows at `step`
/// degrees, east-west columns widened by 1/cos(lat) so on-sphere density
/// stays visually uniform toward the poles. The RNG is seeded from the
/// polygon index, so reruns produce identical fills. Candidates keep only if
/// the even-odd test against the unprojected polygon (holes included) passes.
fn fill_polygon(poly: &GeoPolygon, poly_index: usize, density_deg: f64, out: &mut Vec<f32>) {
    let step = density_deg.max(EDGE_DENSITY_FLOOR);
    let Some(bbox) = BboxDeg::of_ring(poly.outer()) else {
        return;
    };
    // Too small to usefully fill: not even one grid cell per axis.
    if bbox.width() < step || bbox.height() < step {
        return;
    }

    let mut rng = StdRng::seed_from_u64(poly_index as u64);
    let mut lat = bbox.lat_min;
    while lat < bbox.lat_max {
        let lon_step = step / lat.to_radians().cos().abs().max(MIN_COS_LAT);
        let mut lon = bbox.lon_min;
        while lon < bbox.lon_max {
            let jlon = lon + (rng.gen::<f64>() - 0.5) * lon_step;
            let mut jlat = lat + (rng.gen::<f64>() - 0.5) * step;
            // Reflect a jitter that stepped over a pole back into range.
            if jlat > 90.0 {
                jlat = 180.0 - jlat;
            } else if jlat < -90.0 {
                jlat = -180.0 - jlat;
            }
            if point_in_polygon(poly, jlon, jlat) {
                out.extend_from_slice(&project_unit(jlon, jlat));
            }
            lon += lon_step;
        }
        lat += step;
    }
}

/// Resumable interior fill: `step()` processes exactly one polygon and
/// reports fractional progress, so the caller can interleave sampling with
/// rendering. `finish()` applies the fill cap.
pub struct FillSampler {
    polygons: Arc<[GeoPolygon]>,
    density_deg: f64,
    next: usize,
    points: Vec<f32>,
}

impl FillSampler {
    pub fn new(polygons: Arc<[GeoPolygon]>, density_deg: f64) -> Self {
        Self {
            polygons,
            density_deg,
            next: 0,
            points: Vec::new(),
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.next >= self.polygons.len()
    }

    /// Fraction of polygons processed, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.polygons.is_empty() {
            1.0
        } else {
            self.next as f32 / self.polygons.len() as f32
        }
    }

    /// Process one polygon; returns the updated progress fraction.
    pub fn step(&mut self) -> f32 {
        if !self.is_done() {
            let idx = self.next;
            fill_polygon(&self.polygons[idx], idx, self.density_deg, &mut self.points);
            self.next += 1;
        }
        self.progress()
    }

    /// Consume the sampler, capping the accepted points at
    /// [`MAX_FILL_POINTS`]. The cap shuffle is seeded from the accepted
    /// count, so identical inputs cap identically.
    pub fn finish(self) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(self.points.len() as u64);
        limit_points(self.points, MAX_FILL_POINTS, &mut rng)
    }
}

/// Drive a full fill pass in one call. Used where there is no render loop to
/// interleave with.
pub fn fill_points(polygons: &Arc<[GeoPolygon]>, density_deg: f64) -> Vec<f32> {
    let mut sampler = FillSampler::new(Arc::clone(polygons), density_deg);
    while !sampler.is_done() {
        sampler.step();
    }
    sampler.finish()
}

/// Uniform down-sample without replacement: shuffle the full index array,
/// truncate to the cap, gather. Buffers at or under the cap pass through
/// untouched.
pub fn limit_points(points: Vec<f32>, cap: usize, rng: &mut impl Rng) -> Vec<f32> {
    let n = points.len() / 3;
    if n <= cap {
        return points;
    }
    let mut indices: Vec<u32> = (0..n as u32).collect();
    indices.shuffle(rng);
    indices.truncate(cap);
    let mut out = Vec::with_capacity(cap * 3);
    for i in indices {
        let base = i as usize * 3;
        out.extend_from_slice(&points[base..base + 3]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Ring;

    fn square(half: f64) -> Ring {
        vec![
            [-half, -half],
            [half, -half],
            [half, half],
            [-half, half],
            [-half, -half],
        ]
    }

    /// Recover (lon, lat) samples the way edge_points generates them, so the
    /// longitude-domain properties can be checked directly.
    fn segment_lonlat(from: [f64; 2], to: [f64; 2], step: f64) -> Vec<[f64; 2]> {
        let mut out = Vec::new();
        sample_segment(from, to, step, &mut out);
        out
    }

    #[test]
    fn wrap_lon_stays_in_domain() {
        for lon in [-720.0, -180.0, -179.9, 0.0, 179.9, 180.0, 359.0, 540.0] {
            let w = wrap_lon(lon);
            assert!((-180.0..180.0).contains(&w), "{lon} wrapped to {w}");
        }
    }

    #[test]
    fn segment_lons_always_in_domain() {
        let samples = segment_lonlat([170.0, 10.0], [-170.0, -10.0], 0.5);
        assert!(!samples.is_empty());
        for p in &samples {
            assert!((-180.0..180.0).contains(&p[0]), "lon {} out of domain", p[0]);
        }
    }

    #[test]
    fn antimeridian_interpolates_the_short_way() {
        let samples = segment_lonlat([179.0, 0.0], [-179.0, 0.0], 0.25);
        // Short way spans 2 degrees; every sample sits within a degree of
        // the seam and consecutive samples never jump the long way round.
        for p in &samples {
            assert!(p[0].abs() >= 179.0, "sample lon {} strayed off the seam", p[0]);
        }
        for pair in samples.windows(2) {
            let mut d = (pair[1][0] - pair[0][0]).abs();
            if d > 180.0 {
                d = 360.0 - d;
            }
            assert!(d <= 1.0, "consecutive step of {d} degrees");
        }
    }

    #[test]
    fn duplicate_vertices_still_emit_the_vertex() {
        let samples = segment_lonlat([10.0, 10.0], [10.0, 10.0], 0.5);
        assert_eq!(samples, vec![[10.0, 10.0]]);
    }

    #[test]
    fn edge_buffer_is_flat_xyz_on_the_unit_sphere() {
        let poly = GeoPolygon::new(vec![square(10.0)]);
        let buf = edge_points(&[poly], 2.0);
        assert!(buf.len() >= 3);
        assert_eq!(buf.len() % 3, 0);
        for xyz in buf.chunks_exact(3) {
            let r2 = xyz[0] * xyz[0] + xyz[1] * xyz[1] + xyz[2] * xyz[2];
            assert!((r2 - 1.0).abs() < 1e-4, "|p|^2 = {r2}");
        }
    }

    #[test]
    fn fill_points_pass_pip_against_the_original_polygon() {
        // The generator only projects candidates that already passed the
        // even-odd test, so replaying it in lockstep (same seed, same walk)
        // recovers exactly the accepted (lon, lat) set. Every replayed point
        // must test inside the original polygon and match the 3D buffer.
        let poly = GeoPolygon::new(vec![square(20.0), square(4.0)]);
        let polys: Arc<[GeoPolygon]> = Arc::from(vec![poly.clone()]);
        let sampler_out = fill_points(&polys, 2.0);
        assert!(!sampler_out.is_empty());

        let mut expected = Vec::new();
        let step = 2.0_f64;
        let mut rng = StdRng::seed_from_u64(0);
        let mut lat = -20.0_f64;
        while lat < 20.0 {
            let lon_step = step / lat.to_radians().cos().abs().max(MIN_COS_LAT);
            let mut lon = -20.0_f64;
            while lon < 20.0 {
                let jlon = lon + (rng.gen::<f64>() - 0.5) * lon_step;
                let mut jlat = lat + (rng.gen::<f64>() - 0.5) * step;
                if jlat > 90.0 {
                    jlat = 180.0 - jlat;
                } else if jlat < -90.0 {
                    jlat = -180.0 - jlat;
                }
                if point_in_polygon(&poly, jlon, jlat) {
                    expected.extend_from_slice(&project_unit(jlon, jlat));
                }
                lon += lon_step;
            }
            lat += step;
        }
        assert_eq!(sampler_out, expected);

        // No accepted point may sit inside the hole.
        for xyz in sampler_out.chunks_exact(3) {
            let y = xyz[1] as f64;
            let lat = 90.0 - y.clamp(-1.0, 1.0).acos().to_degrees();
            let theta = (xyz[2] as f64).atan2(-(xyz[0] as f64));
            let lon = wrap_lon(theta.to_degrees() - 180.0);
            assert!(
                lon.abs() > 3.5 || lat.abs() > 3.5,
                "point ({lon:.3}, {lat:.3}) landed in the hole"
            );
        }
    }

    #[test]
    fn fill_skips_sub_cell_polygons() {
        let tiny = GeoPolygon::new(vec![square(0.4)]);
        let polys: Arc<[GeoPolygon]> = Arc::from(vec![tiny]);
        assert!(fill_points(&polys, 2.0).is_empty());
    }

    #[test]
    fn fill_progress_is_fractional_per_polygon() {
        let polys: Arc<[GeoPolygon]> = Arc::from(vec![
            GeoPolygon::new(vec![square(5.0)]),
            GeoPolygon::new(vec![square(6.0)]),
            GeoPolygon::new(vec![square(7.0)]),
            GeoPolygon::new(vec![square(8.0)]),
        ]);
        let mut s = FillSampler::new(polys, 3.0);
        assert_eq!(s.progress(), 0.0);
        assert_eq!(s.step(), 0.25);
        assert_eq!(s.step(), 0.5);
        assert_eq!(s.step(), 0.75);
        assert_eq!(s.step(), 1.0);
        assert!(s.is_done());
    }

    #[test]
    fn limit_points_returns_exactly_cap_distinct_originals() {
        let n = 500;
        let cap = 123;
        // Encode the index into x so every original point is identifiable.
        let mut points = Vec::with_capacity(n * 3);
        for i in 0..n {
            points.extend_from_slice(&[i as f32, 1.0, 2.0]);
        }
        let mut rng = StdRng::seed_from_u64(7);
        let out = limit_points(points, cap, &mut rng);
        assert_eq!(out.len(), cap * 3);

        let mut seen = std::collections::HashSet::new();
        for xyz in out.chunks_exact(3) {
            let idx = xyz[0] as usize;
            assert!(idx < n, "point not from the original set");
            assert_eq!((xyz[1], xyz[2]), (1.0, 2.0));
            assert!(seen.insert(idx), "duplicate original index {idx}");
        }
    }

    #[test]
    fn limit_points_under_cap_is_identity() {
        let points = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(limit_points(points.clone(), 10, &mut rng), points);
    }
}
