//! Builds GPU buffers from sampled points and pin scenes.

use crate::data::types::{
    CloudUniformStd140, PinBatchGpu, PinUniformStd140, PointCloudGpu, PointInstance,
};
use globecore::pins::PinScene;
use wgpu::util::DeviceExt;

fn instances_from_flat(points: &[f32]) -> Vec<PointInstance> {
    points
        .chunks_exact(3)
        .map(|p| PointInstance {
            pos: [p[0], p[1], p[2]],
        })
        .collect()
}

/// Upload one point cloud. `points` is the flat xyz buffer the samplers
/// produce. Uniform contents are written per rendered frame, so the UBO
/// starts out zeroed.
pub fn upload_cloud(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    points: &[f32],
    kind: &'static str,
    color: [f32; 3],
    opacity: f32,
) -> PointCloudGpu {
    let mut instances = instances_from_flat(points);
    let instances_len = instances.len() as u32;
    if instances.is_empty() {
        // Zero-sized buffers are not worth the validation trouble; keep one
        // slot and draw zero instances.
        instances.push(PointInstance { pos: [0.0; 3] });
    }

    let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Cloud Instances"),
        contents: bytemuck::cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Cloud UBO"),
        size: std::mem::size_of::<CloudUniformStd140>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Cloud Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }],
    });

    log::info!("uploaded {kind} cloud: {instances_len} points");

    PointCloudGpu {
        kind,
        color,
        opacity,
        instances_len,
        vtx,
        ubo,
        bind,
    }
}

/// Upload the pin marker positions. Markers and halos are instanced from
/// the same buffer.
pub fn upload_pins(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    scene: &PinScene,
) -> PinBatchGpu {
    let mut instances: Vec<PointInstance> = scene
        .nodes
        .iter()
        .map(|node| PointInstance {
            pos: node.position,
        })
        .collect();
    let instances_len = instances.len() as u32;
    if instances.is_empty() {
        instances.push(PointInstance { pos: [0.0; 3] });
    }

    let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pin Instances"),
        contents: bytemuck::cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Pin UBO"),
        size: std::mem::size_of::<PinUniformStd140>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Pin Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }],
    });

    log::info!("uploaded pin batch: {instances_len} markers");

    PinBatchGpu {
        instances_len,
        vtx,
        ubo,
        bind,
    }
}
