//! Staged scene construction. One `poll` per event-loop turn advances the
//! pipeline at most one step, so interior sampling spreads across frames
//! instead of stalling input. Disposal is a flag checked on entry to every
//! poll, which makes teardown safe no matter which stage is in flight.

use crate::cache::{GlobeCaches, SamplePair};
use crate::error::LandError;
use crate::sample::FillSampler;
use crate::scheduler::{self, EdgeJob};
use crate::source::{LandGeometry, LandSource};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Edges,
    Filling,
    Ready,
    Failed,
}

impl Stage {
    /// Short status line for overlays.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetching => "fetching land outlines",
            Stage::Edges => "tracing coastlines",
            Stage::Filling => "filling interiors",
            Stage::Ready => "ready",
            Stage::Failed => "land unavailable",
        }
    }
}

#[derive(Debug)]
pub enum SetupEvent {
    Progress { stage: Stage, fraction: f32 },
    /// Scene points are final. Emitted exactly once.
    Ready(Arc<SamplePair>),
    /// Every mirror failed. Emitted exactly once.
    Failed(LandError),
}

enum State {
    /// Sample cache hit at start; deliver on the next poll.
    CachedReady(Arc<SamplePair>),
    Fetching {
        rx: Receiver<Result<LandGeometry, LandError>>,
        // Replayed inline if the fetch worker dies without reporting.
        source: Option<LandSource>,
    },
    Edges {
        job: EdgeJob,
        land: Arc<LandGeometry>,
    },
    Filling {
        sampler: FillSampler,
        edge: Vec<f32>,
    },
    Terminal(Stage),
}

pub struct SetupPipeline {
    caches: Arc<GlobeCaches>,
    density_deg: f64,
    state: State,
    disposed: bool,
}

impl SetupPipeline {
    /// Begin building the scene. Cache hits skip the stages they make
    /// redundant: cached samples resolve on the first poll, cached land
    /// geometry goes straight to sampling.
    pub fn start(source: LandSource, caches: Arc<GlobeCaches>, density_deg: f64) -> Self {
        let state = if let Some(pair) = caches.samples(density_deg) {
            log::info!("sample cache hit for density {density_deg}");
            State::CachedReady(pair)
        } else if let Some(land) = caches.land() {
            log::info!("land geometry cached, skipping fetch");
            let job = scheduler::run_edge_sampling(land.edge_polygons.clone(), density_deg);
            State::Edges { job, land }
        } else {
            let (tx, rx) = bounded(1);
            let fetch_source = source.clone();
            let spawned = std::thread::Builder::new()
                .name("land-fetch".into())
                .spawn(move || {
                    let _ = tx.send(fetch_source.load());
                });
            // A failed spawn drops the sender, so the first poll sees a
            // disconnected channel and loads inline.
            if let Err(e) = spawned {
                log::warn!("land fetch thread failed to spawn, loading inline: {e}");
            }
            State::Fetching {
                rx,
                source: Some(source),
            }
        };

        Self {
            caches,
            density_deg,
            state,
            disposed: false,
        }
    }

    pub fn stage(&self) -> Stage {
        match &self.state {
            State::CachedReady(_) => Stage::Ready,
            State::Fetching { .. } => Stage::Fetching,
            State::Edges { .. } => Stage::Edges,
            State::Filling { .. } => Stage::Filling,
            State::Terminal(stage) => *stage,
        }
    }

    /// Fraction of interior fill completed, 1.0 once the scene is ready.
    pub fn progress(&self) -> f32 {
        match &self.state {
            State::Filling { sampler, .. } => sampler.progress(),
            State::CachedReady(_) | State::Terminal(Stage::Ready) => 1.0,
            _ => 0.0,
        }
    }

    /// Stop the pipeline. Polls after this return nothing and no stage
    /// result reaches the caches, even if a worker is mid-flight.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Advance one step. Returns at most one event per call.
    pub fn poll(&mut self) -> Option<SetupEvent> {
        if self.disposed {
            return None;
        }
        let state = std::mem::replace(&mut self.state, State::Terminal(Stage::Failed));
        let (next, event) = self.advance(state);
        self.state = next;
        event
    }

    fn advance(&mut self, state: State) -> (State, Option<SetupEvent>) {
        match state {
            State::CachedReady(pair) => {
                (State::Terminal(Stage::Ready), Some(SetupEvent::Ready(pair)))
            }
            State::Fetching { rx, mut source } => match rx.try_recv() {
                Ok(Ok(land)) => {
                    let land = self.caches.store_land(land);
                    self.begin_edges(land)
                }
                Ok(Err(e)) => (State::Terminal(Stage::Failed), Some(SetupEvent::Failed(e))),
                Err(TryRecvError::Empty) => (State::Fetching { rx, source }, None),
                Err(TryRecvError::Disconnected) => {
                    log::warn!("land fetch worker died, loading inline");
                    match source.take().map(|s| s.load()) {
                        Some(Ok(land)) => {
                            let land = self.caches.store_land(land);
                            self.begin_edges(land)
                        }
                        Some(Err(e)) => {
                            (State::Terminal(Stage::Failed), Some(SetupEvent::Failed(e)))
                        }
                        None => (
                            State::Terminal(Stage::Failed),
                            Some(SetupEvent::Failed(LandError::Unavailable { tried: 0 })),
                        ),
                    }
                }
            },
            State::Edges { mut job, land } => match job.poll() {
                Some(edge) => {
                    let sampler = FillSampler::new(land.fill_polygons.clone(), self.density_deg);
                    (
                        State::Filling { sampler, edge },
                        Some(SetupEvent::Progress {
                            stage: Stage::Filling,
                            fraction: 0.0,
                        }),
                    )
                }
                None => (State::Edges { job, land }, None),
            },
            State::Filling { mut sampler, edge } => {
                let fraction = sampler.step();
                if sampler.is_done() {
                    let pair = SamplePair {
                        edge,
                        fill: sampler.finish(),
                    };
                    let pair = self.caches.store_samples(self.density_deg, pair);
                    log::info!(
                        "scene samples ready: {} edge + {} fill points",
                        pair.edge_count(),
                        pair.fill_count()
                    );
                    (State::Terminal(Stage::Ready), Some(SetupEvent::Ready(pair)))
                } else {
                    (
                        State::Filling { sampler, edge },
                        Some(SetupEvent::Progress {
                            stage: Stage::Filling,
                            fraction,
                        }),
                    )
                }
            }
            State::Terminal(stage) => (State::Terminal(stage), None),
        }
    }

    fn begin_edges(&self, land: Arc<LandGeometry>) -> (State, Option<SetupEvent>) {
        let job = scheduler::run_edge_sampling(land.edge_polygons.clone(), self.density_deg);
        (
            State::Edges { job, land },
            Some(SetupEvent::Progress {
                stage: Stage::Edges,
                fraction: 0.0,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPolygon;
    use crate::sample;
    use std::time::Duration;

    fn square_land() -> LandGeometry {
        let ring = vec![
            [-10.0, -10.0],
            [10.0, -10.0],
            [10.0, 10.0],
            [-10.0, 10.0],
            [-10.0, -10.0],
        ];
        let polys = vec![GeoPolygon { rings: vec![ring] }];
        LandGeometry {
            edge_polygons: Arc::from(polys.clone()),
            fill_polygons: Arc::from(polys),
        }
    }

    fn poll_until_event(pipeline: &mut SetupPipeline) -> Option<SetupEvent> {
        for _ in 0..500 {
            if let Some(event) = pipeline.poll() {
                return Some(event);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn cached_samples_resolve_on_the_first_poll() {
        let caches = Arc::new(GlobeCaches::new());
        let stored = caches.store_samples(
            2.0,
            SamplePair {
                edge: vec![1.0, 0.0, 0.0],
                fill: vec![0.0, 1.0, 0.0],
            },
        );

        let mut pipeline = SetupPipeline::start(LandSource::new(Vec::new()), caches, 2.0);
        match pipeline.poll() {
            Some(SetupEvent::Ready(pair)) => assert!(Arc::ptr_eq(&pair, &stored)),
            other => panic!("expected immediate Ready, got {other:?}"),
        }
        assert!(pipeline.poll().is_none());
        assert_eq!(pipeline.stage(), Stage::Ready);
    }

    #[test]
    fn cached_land_skips_the_fetch_entirely() {
        let caches = Arc::new(GlobeCaches::new());
        let land = caches.store_land(square_land());

        // Empty mirror list: reaching Ready proves no fetch was attempted.
        let mut pipeline = SetupPipeline::start(LandSource::new(Vec::new()), caches.clone(), 2.0);

        let mut saw_fill_progress = false;
        let pair = loop {
            match poll_until_event(&mut pipeline) {
                Some(SetupEvent::Progress { stage, .. }) => {
                    saw_fill_progress |= stage == Stage::Filling;
                }
                Some(SetupEvent::Ready(pair)) => break pair,
                Some(SetupEvent::Failed(e)) => panic!("setup failed: {e}"),
                None => panic!("pipeline stalled"),
            }
        };

        assert!(saw_fill_progress);
        assert_eq!(pair.edge, sample::edge_points(&land.edge_polygons, 2.0));
        assert_eq!(pair.fill, sample::fill_points(&land.fill_polygons, 2.0));
        let cached = caches.samples(2.0).expect("samples memoized");
        assert!(Arc::ptr_eq(&cached, &pair));
    }

    #[test]
    fn mirror_exhaustion_fails_exactly_once() {
        let caches = Arc::new(GlobeCaches::new());
        let mut pipeline = SetupPipeline::start(LandSource::new(Vec::new()), caches, 2.0);

        match poll_until_event(&mut pipeline) {
            Some(SetupEvent::Failed(LandError::Unavailable { tried })) => assert_eq!(tried, 0),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(pipeline.poll().is_none());
        assert_eq!(pipeline.stage(), Stage::Failed);
    }

    #[test]
    fn dispose_during_fetch_suppresses_events_and_cache_writes() {
        let caches = Arc::new(GlobeCaches::new());
        let mut pipeline = SetupPipeline::start(LandSource::new(Vec::new()), caches.clone(), 2.0);
        pipeline.dispose();

        for _ in 0..50 {
            assert!(pipeline.poll().is_none());
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(caches.land().is_none());
        assert!(caches.samples(2.0).is_none());
    }

    #[test]
    fn dispose_mid_fill_stops_the_sampler() {
        let caches = Arc::new(GlobeCaches::new());
        caches.store_land(square_land());
        let mut pipeline = SetupPipeline::start(LandSource::new(Vec::new()), caches.clone(), 2.0);

        // Run until the fill stage announces itself, then tear down.
        loop {
            match poll_until_event(&mut pipeline) {
                Some(SetupEvent::Progress {
                    stage: Stage::Filling,
                    ..
                }) => break,
                Some(SetupEvent::Ready(_)) => panic!("finished before fill progress"),
                Some(_) => continue,
                None => panic!("pipeline stalled"),
            }
        }
        pipeline.dispose();
        assert!(pipeline.poll().is_none());
        assert!(caches.samples(2.0).is_none());
    }
}
