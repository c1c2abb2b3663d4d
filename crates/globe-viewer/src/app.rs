use crate::{
    camera::{Camera, CameraController},
    data::{
        types::{CloudUniformStd140, PinUniformStd140, SceneGpu},
        upload::{upload_cloud, upload_pins},
    },
    renderer::{
        pipelines::pins::{HALO_SIZE_PX, MARKER_SIZE_PX},
        Renderer,
    },
    ui::{self, LabelScreen},
};
use anyhow::Result;
use glam::{Mat4, Vec3};
use globecore::{
    pins::{build_pin_scene, pins_signature, PinScene},
    GlobeCaches, GlobeConfig, GlobePhase, LandSource, LoopController, Pin, SamplePair, SetupEvent,
    SetupPipeline, Stage,
};
use std::{sync::Arc, time::Instant};
use winit::{event::WindowEvent, window::Window};

/// A label is dropped once its anchor swings this far past the limb. Slightly
/// above zero so text never hangs off the silhouette edge.
const LABEL_FACING_MIN: f32 = 0.12;

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,

    config: GlobeConfig,
    setup: SetupPipeline,
    controller: LoopController,
    scene: Option<SceneGpu>,

    pins: Vec<Pin>,
    pin_scene: PinScene,
    pins_sig: u64,
    selected_pin: Option<usize>,

    last_tick: Instant,
    visible: bool,
    scale_factor: f64,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        config: GlobeConfig,
        pins: Vec<Pin>,
        source: LandSource,
        caches: Arc<GlobeCaches>,
    ) -> Result<Self> {
        let scale_factor = window.scale_factor();
        let renderer = Renderer::new(window.clone(), scale_factor).await?;
        let size = renderer.gfx.size;

        let camera = Camera::new(size.width as f32 / size.height.max(1) as f32);
        let camera_controller = CameraController::new(config.enable_zoom);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let setup = SetupPipeline::start(source, caches, config.density_deg);
        let pin_scene = build_pin_scene(&pins);
        let pins_sig = pins_signature(&pins);

        Ok(Self {
            renderer,
            camera,
            camera_controller,
            egui_ctx,
            egui_state,
            config,
            setup,
            controller: LoopController::new(),
            scene: None,
            pins,
            pin_scene,
            pins_sig,
            selected_pin: None,
            last_tick: Instant::now(),
            visible: true,
            scale_factor,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size, self.scale_factor);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.handle_event(event, &mut self.camera);

        match event {
            WindowEvent::Resized(physical_size) => self.resize(*physical_size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
                let size = self.renderer.gfx.size;
                self.renderer.resize(size, self.scale_factor);
            }
            WindowEvent::Occluded(occluded) => self.set_visible(window, !occluded),
            _ => {}
        }

        false
    }

    /// Hidden windows stop drawing and stop paying for it; becoming visible
    /// again draws one frame immediately instead of waiting out the frame
    /// interval.
    pub fn set_visible(&mut self, window: &Window, visible: bool) {
        self.visible = visible;
        if !visible {
            self.controller.pause();
        } else if self.controller.resume() {
            self.render_now(window);
        }
    }

    /// Space bar handler.
    pub fn toggle_pause(&mut self, window: &Window) {
        match self.controller.phase() {
            GlobePhase::Running => self.controller.pause(),
            GlobePhase::Paused => {
                if self.controller.resume() {
                    self.render_now(window);
                }
            }
            _ => {}
        }
    }

    /// Swaps in a new pin list. No-op when the list is unchanged; otherwise
    /// the whole marker batch is rebuilt from scratch.
    pub fn set_pins(&mut self, pins: Vec<Pin>) {
        let sig = pins_signature(&pins);
        if sig == self.pins_sig {
            return;
        }
        log::info!("pin list changed, rebuilding {} markers", pins.len());
        self.pins_sig = sig;
        self.pin_scene = build_pin_scene(&pins);
        self.pins = pins;
        self.selected_pin = None;
        if let Some(scene) = &mut self.scene {
            scene.pins = upload_pins(
                &self.renderer.gfx.device,
                &self.renderer.pins.pin_layout,
                &self.pin_scene,
            );
        }
    }

    pub fn dispose(&mut self) {
        self.setup.dispose();
        self.controller.dispose();
        self.scene = None;
        log::info!(
            "globe disposed after {} rendered frames",
            self.controller.frames_rendered()
        );
    }

    /// Per-redraw driver: advances setup and animation, draws when the frame
    /// interval says so. Rotation accrues on every tick whether or not this
    /// one draws.
    pub fn frame(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.poll_setup();

        let now = Instant::now();
        let dt = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;

        let tick = self.controller.tick(dt, self.visible);
        self.camera.advance(self.config.rotation_speed * tick.advance_dt);

        // While loading there is no frame pacing yet; keep presenting so the
        // progress HUD stays live.
        if tick.render || self.controller.phase() == GlobePhase::Loading {
            self.render(window)?;
        }
        Ok(())
    }

    fn poll_setup(&mut self) {
        match self.setup.poll() {
            Some(SetupEvent::Progress { stage, fraction }) => {
                log::debug!("{}: {:.0}%", stage.label(), fraction * 100.0);
            }
            Some(SetupEvent::Ready(pair)) => {
                self.build_scene(&pair);
                self.controller.begin_running();
            }
            Some(SetupEvent::Failed(err)) => {
                log::error!("globe setup failed: {err}");
            }
            None => {}
        }
    }

    fn build_scene(&mut self, pair: &SamplePair) {
        let device = &self.renderer.gfx.device;
        let edge = upload_cloud(
            device,
            &self.renderer.points.cloud_layout,
            &pair.edge,
            "edge",
            self.config.point_color,
            1.0,
        );
        let fill = upload_cloud(
            device,
            &self.renderer.points.cloud_layout,
            &pair.fill,
            "fill",
            self.config.fill_color,
            self.config.fill_opacity,
        );
        let pins = upload_pins(device, &self.renderer.pins.pin_layout, &self.pin_scene);
        self.scene = Some(SceneGpu { edge, fill, pins });
    }

    fn render_now(&mut self, window: &Window) {
        match self.render(window) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                let size = self.renderer.gfx.size;
                self.resize(size);
            }
            Err(e) => log::warn!("resume redraw failed: {e:?}"),
        }
    }

    /// Projects labelled pins into egui screen points. Visibility combines
    /// the facing test against the camera with a loose viewport bound.
    fn project_labels(&self, points_size: egui::Vec2) -> Vec<LabelScreen> {
        let view_proj = self.camera.view_proj();
        let eye_dir = self.camera.eye_dir();

        self.pin_scene
            .labels
            .iter()
            .map(|label| {
                let (pos, visible) =
                    project_anchor(view_proj, eye_dir, label.position, points_size);
                LabelScreen {
                    pin_index: label.pin_index,
                    pos,
                    visible,
                    title: label.title.clone(),
                }
            })
            .collect()
    }

    /// Draws one full frame: uniform refresh, globe pass, blit, egui overlay.
    fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // The clouds and pins are sized against the offscreen target, not
        // the swapchain, so the cap on pixel ratio also caps sprite cost.
        let viewport_size = [
            self.renderer.targets.size.width as f32,
            self.renderer.targets.size.height as f32,
        ];
        let view_proj = self.camera.view_proj().to_cols_array_2d();
        let eye_dir = self.camera.eye_dir();

        if let Some(scene) = &self.scene {
            for cloud in [&scene.edge, &scene.fill] {
                let ubo_data = CloudUniformStd140 {
                    view_proj,
                    eye_dir: eye_dir.to_array(),
                    point_size_px: self.config.point_size,
                    color: cloud.color,
                    opacity: cloud.opacity,
                    viewport_size,
                    back_opacity: self.config.back_opacity,
                    _pad0: 0.0,
                };
                self.renderer
                    .gfx
                    .queue
                    .write_buffer(&cloud.ubo, 0, bytemuck::bytes_of(&ubo_data));
            }

            let pin_data = PinUniformStd140 {
                view_proj,
                marker_color: self.config.pin_color,
                marker_size_px: MARKER_SIZE_PX,
                halo_color: self.config.halo_color,
                halo_size_px: HALO_SIZE_PX,
                viewport_size,
                _pad0: [0.0; 2],
            };
            self.renderer
                .gfx
                .queue
                .write_buffer(&scene.pins.ubo, 0, bytemuck::bytes_of(&pin_data));
        }

        self.renderer.render(&swap_view, self.scene.as_ref());

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_hud(
            &self.egui_ctx,
            self.setup.stage(),
            self.setup.progress(),
            self.scene
                .as_ref()
                .map(|s| (s.edge.instances_len as usize, s.fill.instances_len as usize)),
            self.controller.phase() == GlobePhase::Paused,
        );

        if self.setup.stage() == Stage::Ready {
            let ppp = self.egui_ctx.pixels_per_point();
            let points_size = egui::vec2(
                self.renderer.gfx.config.width as f32 / ppp,
                self.renderer.gfx.config.height as f32 / ppp,
            );
            let labels = self.project_labels(points_size);
            ui::draw_pin_labels(
                &self.egui_ctx,
                &self.config,
                &self.pins,
                &labels,
                &mut self.selected_pin,
            );
        }

        let egui_output = self.egui_ctx.end_frame();
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}

/// One label anchor into egui screen points. Visible means: in front of the
/// camera plane, facing it by at least [`LABEL_FACING_MIN`], and inside a
/// loose viewport bound so half-off-screen chips still draw.
fn project_anchor(
    view_proj: Mat4,
    eye_dir: Vec3,
    position: [f32; 3],
    points_size: egui::Vec2,
) -> (egui::Pos2, bool) {
    let pos = Vec3::from_array(position);
    let clip = view_proj * pos.extend(1.0);
    if clip.w <= 0.0 {
        return (egui::Pos2::ZERO, false);
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let screen = egui::pos2(
        (ndc_x * 0.5 + 0.5) * points_size.x,
        (0.5 - ndc_y * 0.5) * points_size.y,
    );
    let facing = pos.normalize().dot(eye_dir) > LABEL_FACING_MIN;
    (screen, facing && ndc_x.abs() <= 1.05 && ndc_y.abs() <= 1.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_view() -> (Mat4, Vec3) {
        let camera = Camera::new(4.0 / 3.0);
        (camera.view_proj(), camera.eye_dir())
    }

    #[test]
    fn near_side_anchor_projects_onto_the_center_column() {
        let (view_proj, eye_dir) = default_view();
        let size = egui::vec2(400.0, 300.0);

        let (pos, visible) = project_anchor(view_proj, eye_dir, [0.0, 0.0, 1.035], size);
        assert!(visible);
        // The camera orbits in the x = 0 plane at the default azimuth, so an
        // anchor there lands exactly on the middle column.
        assert!((pos.x - 200.0).abs() < 1e-3, "x = {}", pos.x);
        assert!(pos.y > 0.0 && pos.y < 300.0, "y = {}", pos.y);
    }

    #[test]
    fn far_side_anchor_fails_the_facing_test() {
        let (view_proj, eye_dir) = default_view();
        let size = egui::vec2(400.0, 300.0);

        // The antipode is still in front of the camera plane; it is rejected
        // purely for pointing away.
        let (_, visible) = project_anchor(view_proj, eye_dir, [0.0, 0.0, -1.035], size);
        assert!(!visible);
    }

    #[test]
    fn anchors_behind_the_camera_are_never_visible() {
        let camera = Camera::new(4.0 / 3.0);
        let size = egui::vec2(400.0, 300.0);

        // Past the camera along its own axis the w component flips sign. The
        // facing test alone would accept this point.
        let behind = (camera.eye() * 1.5).to_array();
        let (pos, visible) = project_anchor(camera.view_proj(), camera.eye_dir(), behind, size);
        assert!(!visible);
        assert_eq!(pos, egui::Pos2::ZERO);
    }
}
