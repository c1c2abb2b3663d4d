use glam::{Mat4, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Orbit bounds around the unit sphere. The near bound keeps the camera off
/// the surface, the far bound keeps the globe from shrinking to a dot.
const RADIUS_MIN: f32 = 1.4;
const RADIUS_MAX: f32 = 10.0;

/// Orbital camera around the globe center. Azimuth spins about +Y, matching
/// the sphere projection used for the point clouds.
#[derive(Debug, Clone)]
pub struct Camera {
    pub azimuth_rad: f32,
    pub elevation_rad: f32,
    pub radius: f32,
    pub proj: Mat4,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            azimuth_rad: 0.0,
            elevation_rad: 18.0f32.to_radians(),
            radius: 3.0,
            proj: Self::projection(aspect),
        }
    }

    fn projection(aspect: f32) -> Mat4 {
        // glam's perspective_rh maps depth to [0,1], which is what wgpu wants.
        Mat4::perspective_rh(45.0f32.to_radians(), aspect.max(1e-3), 0.1, 100.0)
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.proj = Self::projection(width as f32 / height.max(1) as f32);
    }

    /// Auto-rotation: the camera ambles around the globe instead of the
    /// globe spinning under a fixed camera. Same relative motion, and pin
    /// positions stay valid without a model matrix.
    pub fn advance(&mut self, d_azimuth_rad: f32) {
        self.azimuth_rad += d_azimuth_rad;
    }

    /// Camera position in globe space.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        Vec3::new(
            self.radius * cos_el * sin_az,
            self.radius * sin_el,
            self.radius * cos_el * cos_az,
        )
    }

    /// Unit vector from globe center toward the camera, the reference the
    /// far-hemisphere fade measures against.
    pub fn eye_dir(&self) -> Vec3 {
        self.eye().normalize()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }
}

pub struct CameraController {
    pub zoom_enabled: bool,
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new(zoom_enabled: bool) -> Self {
        Self {
            zoom_enabled,
            mouse_down: false,
            last_mouse: None,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_orbit((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.handle_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    /// Scroll up zooms in. Disabled entirely when the embedder turned the
    /// zoom flag off, so the wheel scrolls whatever hosts the view.
    fn handle_scroll(&mut self, delta: f32, camera: &mut Camera) {
        if !self.zoom_enabled {
            return;
        }
        camera.radius *= 1.1f32.powf(-delta);
        camera.radius = camera.radius.clamp(RADIUS_MIN, RADIUS_MAX);
    }

    fn handle_cursor_orbit(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down {
                let dx = ((xy.0 - last.0) * 0.005) as f32;
                let dy = ((last.1 - xy.1) * 0.005) as f32;

                camera.azimuth_rad -= dx;
                camera.elevation_rad -= dy;

                // Keep away from the poles so look_at never degenerates.
                camera.elevation_rad = camera
                    .elevation_rad
                    .clamp(-88.0f32.to_radians(), 88.0f32.to_radians());
            }
        }
        self.last_mouse = Some(xy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_zoom_clamps_to_orbit_bounds() {
        let mut camera = Camera::new(16.0 / 9.0);
        let mut controller = CameraController::new(true);

        for _ in 0..200 {
            controller.handle_scroll(5.0, &mut camera);
        }
        assert_eq!(camera.radius, RADIUS_MIN);

        for _ in 0..200 {
            controller.handle_scroll(-5.0, &mut camera);
        }
        assert_eq!(camera.radius, RADIUS_MAX);
    }

    #[test]
    fn disabled_zoom_ignores_the_wheel() {
        let mut camera = Camera::new(1.0);
        let start = camera.radius;
        let mut controller = CameraController::new(false);
        controller.handle_scroll(3.0, &mut camera);
        assert_eq!(camera.radius, start);
    }

    #[test]
    fn advance_orbits_at_constant_radius() {
        let mut camera = Camera::new(1.0);
        let r0 = camera.eye().length();
        camera.advance(1.3);
        camera.advance(2.9);
        assert!((camera.eye().length() - r0).abs() < 1e-5);
        assert!((camera.eye_dir().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn drag_clamps_elevation_short_of_the_poles() {
        let mut camera = Camera::new(1.0);
        let mut controller = CameraController::new(true);
        controller.mouse_down = true;
        controller.last_mouse = Some((0.0, 0.0));
        controller.handle_cursor_orbit((0.0, 10_000.0), &mut camera);
        assert_eq!(camera.elevation_rad, 88.0f32.to_radians());
        controller.handle_cursor_orbit((0.0, -10_000.0), &mut camera);
        assert_eq!(camera.elevation_rad, -88.0f32.to_radians());
    }
}
