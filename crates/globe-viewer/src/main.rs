//! Entry point for the storefront globe viewer.

use anyhow::Result;
use clap::Parser;
use globe_viewer::app::App;
use globecore::{
    config::{demo_pins, load_config, load_pins},
    GlobeCaches, GlobeConfig, LandSource,
};
use std::{path::PathBuf, sync::Arc};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

#[derive(Parser, Debug)]
#[command(
    name = "globe-viewer",
    version,
    about = "Dotted-globe viewer with storefront pins"
)]
struct Args {
    /// JSON file with the pin list. Defaults to a built-in demo set.
    #[arg(long)]
    pins: Option<PathBuf>,

    /// JSON file with display settings (colors, density, rotation speed).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory where the downloaded land topology is kept between runs.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Read the land topology from this file instead of the network.
    #[arg(long)]
    land_file: Option<PathBuf>,

    /// Override the sampling density in degrees.
    #[arg(long)]
    density: Option<f64>,

    /// Topology mirror URL; may be given multiple times, tried in order.
    #[arg(long = "mirror")]
    mirrors: Vec<String>,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GlobeConfig::default(),
    };
    if let Some(density) = args.density {
        config.density_deg = density;
    }

    let pins = match &args.pins {
        Some(path) => load_pins(path)?,
        None => demo_pins(),
    };

    let source = if args.mirrors.is_empty() {
        LandSource::default()
    } else {
        LandSource::new(args.mirrors)
    }
    .with_cache_dir(args.cache_dir)
    .with_local_file(args.land_file);

    // One cache object per process; every mount shares it.
    let caches = Arc::new(GlobeCaches::default());

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Storefront Globe")
            .with_inner_size(winit::dpi::LogicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), config, pins, source, caches))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => {
                            app.dispose();
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state.is_pressed() {
                                match event.physical_key {
                                    PhysicalKey::Code(KeyCode::Escape) => {
                                        app.dispose();
                                        elwt.exit();
                                    }
                                    PhysicalKey::Code(KeyCode::Space) => {
                                        app.toggle_pause(&window);
                                    }
                                    _ => {}
                                }
                            }
                        }
                        WindowEvent::RedrawRequested => match app.frame(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                app.resize(app.renderer.gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory - exiting.");
                                app.dispose();
                                elwt.exit();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                // Request a redraw each frame.
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
