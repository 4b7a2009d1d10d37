//! First-person fly camera, projection and input controller.
//!
//! The camera owns its position, yaw/pitch orientation and a zoom value in
//! field-of-view degrees. The projection derives its fov from the camera
//! zoom every frame; near and far planes are fixed. [`CameraController`]
//! folds winit events into pending movement/rotation/zoom amounts that
//! [`CameraController::update`] applies scaled by the frame's elapsed time.

use instant::Duration;

use cgmath::{Angle, Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const MIN_ZOOM_DEGREES: f32 = 1.0;
pub const MAX_ZOOM_DEGREES: f32 = 45.0;

const MAX_PITCH: Deg<f32> = Deg(89.0);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    /// Field-of-view in degrees, narrowed by scrolling.
    pub zoom: Deg<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, yaw: Deg<f32>, pitch: Deg<f32>) -> Self {
        Self {
            position: position.into(),
            yaw,
            pitch,
            zoom: Deg(MAX_ZOOM_DEGREES),
        }
    }

    /// Direction the camera looks along.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = Rad::from(self.yaw).sin_cos();
        let (sin_pitch, cos_pitch) = Rad::from(self.pitch).sin_cos();
        Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
    }

    /// Strafe direction, perpendicular to forward in the ground plane.
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(Vector3::unit_y()).normalize()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

/// Perspective projection with fixed near/far planes; the fov comes from the
/// camera's zoom state at matrix-calculation time.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self, fovy: Deg<f32>) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Accumulates input and applies it to a [`Camera`] once per frame.
#[derive(Debug)]
pub struct CameraController {
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_left: 0.0,
            amount_right: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.process_keyboard(*key, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.process_scroll(delta);
            }
            _ => (),
        }
    }

    /// Returns whether the key is one the controller consumes.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed {
            1.0
        } else {
            0.0
        };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.amount_right = amount;
                true
            }
            _ => false,
        }
    }

    /// Fold a raw mouse delta into the pending rotation.
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.rotate_horizontal += mouse_dx as f32;
        self.rotate_vertical += mouse_dy as f32;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
        };
    }

    /// Apply the pending input to the camera, scaled by elapsed time.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        let forward = camera.forward();
        let right = camera.right();
        camera.position += forward * (self.amount_forward - self.amount_backward) * self.speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * self.speed * dt;

        camera.yaw += Deg(self.rotate_horizontal * self.sensitivity);
        camera.pitch += Deg(-self.rotate_vertical * self.sensitivity);
        // Looking straight up or down would flip the view; stop short of the pole.
        camera.pitch = Deg(camera.pitch.0.clamp(-MAX_PITCH.0, MAX_PITCH.0));
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        // Scrolling narrows the field of view.
        camera.zoom = Deg((camera.zoom.0 - self.scroll).clamp(MIN_ZOOM_DEGREES, MAX_ZOOM_DEGREES));
        self.scroll = 0.0;
    }
}

/// View and projection matrices as laid out in the camera uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view: Matrix4::identity().into(),
            proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view = camera.view_matrix().into();
        self.proj = projection.calc_matrix(camera.zoom).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state together with its GPU-side resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: CameraController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn scroll_zoom_clamps_to_range() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0));
        let mut controller = CameraController::new(2.5, 0.1);

        controller.scroll = 100.0;
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.zoom, Deg(MIN_ZOOM_DEGREES));

        controller.scroll = -100.0;
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.zoom, Deg(MAX_ZOOM_DEGREES));
    }

    #[test]
    fn pitch_clamps_short_of_the_poles() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0));
        let mut controller = CameraController::new(2.5, 0.1);

        controller.handle_mouse(0.0, -10_000.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.pitch, MAX_PITCH);

        controller.handle_mouse(0.0, 10_000.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.pitch, -MAX_PITCH);
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = Camera::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0));
        let forward = camera.forward();
        assert_close(forward.x, 0.0);
        assert_close(forward.y, 0.0);
        assert_close(forward.z, -1.0);
    }

    #[test]
    fn forward_movement_scales_with_elapsed_time() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0));
        let mut controller = CameraController::new(2.0, 0.1);
        controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        controller.update(&mut camera, Duration::from_millis(500));
        assert_close(camera.position.z, 2.0);
        controller.process_keyboard(KeyCode::KeyW, ElementState::Released);
        controller.update(&mut camera, Duration::from_millis(500));
        assert_close(camera.position.z, 2.0);
    }
}
