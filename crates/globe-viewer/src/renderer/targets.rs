//! Offscreen scene targets. The globe renders at a device pixel ratio capped
//! to a fixed maximum and gets blitted up to the swapchain, which bounds
//! fill cost on high-density displays.

use winit::dpi::PhysicalSize;

pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Scene resolution for a window: physical pixels, but never more than
/// `MAX_PIXEL_RATIO` times the logical size.
pub fn render_size(physical: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    let factor = if scale_factor > MAX_PIXEL_RATIO {
        MAX_PIXEL_RATIO / scale_factor
    } else {
        1.0
    };
    PhysicalSize::new(
        ((physical.width as f64 * factor).round() as u32).max(1),
        ((physical.height as f64 * factor).round() as u32).max(1),
    )
}

pub struct Targets {
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,

    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,

    pub color_fmt: wgpu::TextureFormat,
    pub depth_fmt: wgpu::TextureFormat,

    /// Capped scene resolution, not the window's physical size.
    pub size: PhysicalSize<u32>,
}

impl Targets {
    pub fn new(device: &wgpu::Device, physical: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let size = render_size(physical, scale_factor);
        let tex_size = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };

        let color_fmt = wgpu::TextureFormat::Rgba16Float;
        let depth_fmt = wgpu::TextureFormat::Depth32Float;

        let create_tex = |label: &str, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: tex_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let color_tex = create_tex(
            "Scene Color Target",
            color_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth_tex = create_tex(
            "Scene Depth Target",
            depth_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            color_fmt,
            depth_fmt,
            size,
        }
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        physical: PhysicalSize<u32>,
        scale_factor: f64,
    ) {
        *self = Self::new(device, physical, scale_factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_density_renders_at_physical_size() {
        let size = render_size(PhysicalSize::new(1280, 720), 1.0);
        assert_eq!((size.width, size.height), (1280, 720));
        let size = render_size(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!((size.width, size.height), (2560, 1440));
    }

    #[test]
    fn high_density_is_capped_at_the_ratio_limit() {
        // 3x display: scene renders at 2/3 of physical resolution.
        let size = render_size(PhysicalSize::new(3000, 1500), 3.0);
        assert_eq!((size.width, size.height), (2000, 1000));
    }

    #[test]
    fn degenerate_windows_stay_at_least_one_pixel() {
        let size = render_size(PhysicalSize::new(1, 1), 4.0);
        assert_eq!((size.width, size.height), (1, 1));
    }
}
