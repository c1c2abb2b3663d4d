//! The main rendering orchestrator. Owns the GPU context, render targets,
//! and all the individual render pass pipelines.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{blit::BlitPass, pins::PinsPipeline, points::PointsPipeline},
    targets::Targets,
};
use crate::data::types::SceneGpu;
use std::sync::Arc;
use winit::window::Window;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.010,
    g: 0.015,
    b: 0.030,
    a: 1.0,
};

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub pins: PinsPipeline,
    pub blit: BlitPass,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, scale_factor: f64) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;

        let targets = Targets::new(&gfx.device, size, scale_factor);
        let points = PointsPipeline::new(&gfx.device, targets.color_fmt, targets.depth_fmt);
        let pins = PinsPipeline::new(&gfx.device, targets.color_fmt, targets.depth_fmt);
        let blit = BlitPass::new(&gfx.device, gfx.config.format);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            pins,
            blit,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size, scale_factor);
        }
    }

    /// Scene pass into the offscreen target, then a fullscreen copy onto the
    /// swapchain image. `scene` is `None` while geometry is still loading;
    /// the pass still runs so the window shows the cleared backdrop.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, scene: Option<&SceneGpu>) {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Pass 1: globe geometry into the capped-resolution target
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(scene) = scene {
                self.points.draw_cloud(&mut pass, &scene.fill);
                self.points.draw_cloud(&mut pass, &scene.edge);
                self.pins.draw_batch(&mut pass, &scene.pins);
            }
        }

        // Pass 2: upscale onto the swapchain image
        self.blit
            .execute_pass(&self.gfx.device, &mut encoder, &self.targets.color, swap_view);

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
