//! GPU-facing data layouts for the globe scene.

/// Per-instance data for every sprite the globe draws: cloud points, pin
/// markers, and pin halos all share this layout.
/// Must match the instance inputs in `points.wgsl` / `pins.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct PointInstance {
    /// Position in globe space (unit sphere, Y up).
    pub pos: [f32; 3],
}

/// Per-cloud uniform buffer, std140 layout.
/// Must match `CloudUniform` in `points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CloudUniformStd140 {
    pub view_proj: [[f32; 4]; 4],
    /// Unit vector from globe center toward the camera.
    pub eye_dir: [f32; 3],
    pub point_size_px: f32,
    pub color: [f32; 3],
    pub opacity: f32,
    pub viewport_size: [f32; 2],
    /// Opacity floor for points on the far hemisphere.
    pub back_opacity: f32,
    pub _pad0: f32,
}

// Buffer size must match the WGSL-reflected size.
const _: [(); 112] = [(); core::mem::size_of::<CloudUniformStd140>()];

/// Shared uniform for the pin marker and halo passes.
/// Must match `PinUniform` in `pins.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PinUniformStd140 {
    pub view_proj: [[f32; 4]; 4],
    pub marker_color: [f32; 3],
    pub marker_size_px: f32,
    pub halo_color: [f32; 3],
    pub halo_size_px: f32,
    pub viewport_size: [f32; 2],
    pub _pad0: [f32; 2],
}

const _: [(); 112] = [(); core::mem::size_of::<PinUniformStd140>()];

/// One uploaded point cloud plus the uniforms that style it.
pub struct PointCloudGpu {
    pub kind: &'static str,
    pub color: [f32; 3],
    pub opacity: f32,
    pub instances_len: u32,

    /// Vertex buffer of `PointInstance` data.
    pub vtx: wgpu::Buffer,
    /// Uniform buffer holding `CloudUniformStd140`.
    pub ubo: wgpu::Buffer,
    pub bind: wgpu::BindGroup,
}

/// All pin markers in one instanced buffer; markers and halos draw from it.
pub struct PinBatchGpu {
    pub instances_len: u32,
    pub vtx: wgpu::Buffer,
    pub ubo: wgpu::Buffer,
    pub bind: wgpu::BindGroup,
}

/// Everything the render pass needs once setup finished.
pub struct SceneGpu {
    pub edge: PointCloudGpu,
    pub fill: PointCloudGpu,
    pub pins: PinBatchGpu,
}
