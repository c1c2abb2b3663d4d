//! Offline probe for the globe's land pipeline. Loads a topology the same
//! way the viewer does, prints geometry and sampling statistics, and can
//! dump the sampled point clouds as JSON for inspection.

use anyhow::{Context, Result};
use clap::Parser;
use globecore::{
    sample::{edge_points, fill_points},
    scheduler::run_edge_sampling,
    LandSource,
};
use log::info;
use std::{
    fs,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(name = "landprobe", version)]
struct Args {
    /// Read the land topology from this file instead of the network.
    #[arg(long)]
    land_file: Option<PathBuf>,

    /// Directory where a downloaded topology is kept between runs.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Topology mirror URL; may be given multiple times, tried in order.
    #[arg(long = "mirror")]
    mirrors: Vec<String>,

    /// Sampling density in degrees.
    #[arg(long, default_value_t = 2.0)]
    density: f64,

    /// Also run the outline sampling on a worker thread and compare it
    /// against the inline result.
    #[arg(long, default_value_t = false)]
    offload: bool,

    /// Write the sampled points to this JSON file.
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct Dump<'a> {
    density_deg: f64,
    edge: &'a [f32],
    fill: &'a [f32],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let source = if args.mirrors.is_empty() {
        LandSource::default()
    } else {
        LandSource::new(args.mirrors.clone())
    }
    .with_cache_dir(args.cache_dir.clone())
    .with_local_file(args.land_file.clone());

    let t0 = Instant::now();
    let land = source.load().context("loading land topology")?;
    info!("topology loaded in {:.1?}", t0.elapsed());

    let fill_rings: usize = land.fill_polygons.iter().map(|p| p.rings.len()).sum();
    let fill_verts: usize = land
        .fill_polygons
        .iter()
        .flat_map(|p| p.rings.iter())
        .map(|r| r.len())
        .sum();
    let edge_verts: usize = land
        .edge_polygons
        .iter()
        .flat_map(|p| p.rings.iter())
        .map(|r| r.len())
        .sum();

    info!(
        "{} polygons, {} rings, {} vertices ({} after outline decimation)",
        land.fill_polygons.len(),
        fill_rings,
        fill_verts,
        edge_verts
    );

    let t1 = Instant::now();
    let edge = edge_points(&land.edge_polygons, args.density);
    info!(
        "outline sampling at {}°: {} points in {:.1?}",
        args.density,
        edge.len() / 3,
        t1.elapsed()
    );

    let t2 = Instant::now();
    let fill = fill_points(&land.fill_polygons, args.density);
    info!(
        "interior sampling at {}°: {} points in {:.1?}",
        args.density,
        fill.len() / 3,
        t2.elapsed()
    );

    if args.offload {
        let mut job = run_edge_sampling(land.edge_polygons.clone(), args.density);
        let worker = loop {
            if let Some(points) = job.poll() {
                break points;
            }
            thread::sleep(Duration::from_millis(2));
        };
        anyhow::ensure!(
            worker == edge,
            "worker outline sampling diverged from the inline result"
        );
        info!("worker outline sampling matches inline ({} points)", worker.len() / 3);
    }

    if let Some(path) = &args.dump {
        let dump = Dump {
            density_deg: args.density,
            edge: &edge,
            fill: &fill,
        };
        fs::write(path, serde_json::to_vec(&dump)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("dumped point clouds to {}", path.display());
    }

    Ok(())
}
