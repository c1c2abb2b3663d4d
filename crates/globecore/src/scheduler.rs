//! Offloads coastline sampling to a background thread. The worker runs the
//! exact function the caller would run, so a fallback is indistinguishable
//! from a worker result.

use crate::geo::GeoPolygon;
use crate::sample;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::Arc;

struct EdgeInputs {
    polygons: Arc<[GeoPolygon]>,
    density_deg: f64,
}

impl EdgeInputs {
    fn run(&self) -> Vec<f32> {
        sample::edge_points(&self.polygons, self.density_deg)
    }
}

/// In-flight edge sampling request. Poll once per frame until it yields.
pub struct EdgeJob {
    rx: Receiver<Vec<f32>>,
    // Kept alive so a dead worker can be replayed inline.
    inputs: Option<EdgeInputs>,
    ready: Option<Vec<f32>>,
}

/// Start sampling coastline points on a dedicated worker thread.
pub fn run_edge_sampling(polygons: Arc<[GeoPolygon]>, density_deg: f64) -> EdgeJob {
    let (tx, rx) = bounded(1);
    let inputs = EdgeInputs {
        polygons,
        density_deg,
    };

    let worker_polygons = inputs.polygons.clone();
    let spawned = std::thread::Builder::new()
        .name("edge-sampler".into())
        .spawn(move || {
            let points = sample::edge_points(&worker_polygons, density_deg);
            let _ = tx.send(points);
        });

    let ready = match spawned {
        Ok(_) => None,
        Err(e) => {
            log::warn!("edge sampler thread failed to spawn, sampling inline: {e}");
            Some(inputs.run())
        }
    };

    EdgeJob {
        rx,
        inputs: Some(inputs),
        ready,
    }
}

impl EdgeJob {
    /// Non-blocking check for the worker result. A worker that died without
    /// sending is replaced by an inline run over the same inputs.
    pub fn poll(&mut self) -> Option<Vec<f32>> {
        if let Some(points) = self.ready.take() {
            self.inputs = None;
            return Some(points);
        }
        match self.rx.try_recv() {
            Ok(points) => {
                self.inputs = None;
                Some(points)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("edge sampler worker died, sampling inline");
                self.inputs.take().map(|inputs| inputs.run())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn band_polygon() -> Arc<[GeoPolygon]> {
        let ring = vec![
            [-60.0, -20.0],
            [60.0, -20.0],
            [60.0, 20.0],
            [-60.0, 20.0],
            [-60.0, -20.0],
        ];
        Arc::from(vec![GeoPolygon { rings: vec![ring] }])
    }

    #[test]
    fn worker_result_matches_inline_sampling() {
        let polygons = band_polygon();
        let expected = sample::edge_points(&polygons, 2.0);

        let mut job = run_edge_sampling(polygons, 2.0);
        let mut points = None;
        for _ in 0..500 {
            points = job.poll();
            if points.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(points.expect("worker never finished"), expected);
    }

    #[test]
    fn dead_worker_falls_back_to_inline_sampling() {
        let polygons = band_polygon();
        let expected = sample::edge_points(&polygons, 2.0);

        let (tx, rx) = bounded(1);
        drop(tx);
        let mut job = EdgeJob {
            rx,
            inputs: Some(EdgeInputs {
                polygons,
                density_deg: 2.0,
            }),
            ready: None,
        };
        assert_eq!(job.poll(), Some(expected));
    }
}
