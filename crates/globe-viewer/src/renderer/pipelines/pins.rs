use crate::data::types::{PinBatchGpu, PinUniformStd140, PointInstance};
use wgpu::util::DeviceExt;

pub const MARKER_SIZE_PX: f32 = 10.0;
pub const HALO_SIZE_PX: f32 = 28.0;

/// Two passes over the same instance buffer: solid markers with depth, then
/// additive halos on top.
pub struct PinsPipeline {
    marker: wgpu::RenderPipeline,
    halo: wgpu::RenderPipeline,
    pub pin_layout: wgpu::BindGroupLayout,
    quad_vb: wgpu::Buffer,
}

impl PinsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let pin_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pin UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PinUniformStd140>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/pins.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/pins.wgsl").into()),
        });

        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];

        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Pin Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pins PipelineLayout"),
            bind_group_layouts: &[&pin_layout],
            push_constant_ranges: &[],
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            },
        ];

        let make_pipeline = |label: &str,
                             vs_entry: &str,
                             fs_entry: &str,
                             blend: wgpu::BlendState,
                             depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: vs_entry,
                    buffers: &vbuf_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_fmt,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: fs_entry,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_fmt,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let marker = make_pipeline(
            "Pin Marker Pipeline",
            "vs_marker",
            "fs_marker",
            wgpu::BlendState::ALPHA_BLENDING,
            true,
        );
        let halo = make_pipeline("Pin Halo Pipeline", "vs_halo", "fs_halo", additive, false);

        Self {
            marker,
            halo,
            pin_layout,
            quad_vb,
        }
    }

    pub fn draw_batch<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, pins: &'a PinBatchGpu) {
        if pins.instances_len == 0 {
            return;
        }
        rpass.set_bind_group(0, &pins.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, pins.vtx.slice(..));

        rpass.set_pipeline(&self.marker);
        rpass.draw(0..6, 0..pins.instances_len);

        rpass.set_pipeline(&self.halo);
        rpass.draw(0..6, 0..pins.instances_len);
    }
}
