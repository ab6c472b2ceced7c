use crate::engine::utils::math::{ mat4x4_look_at, mat4x4_mul, mat4x4_perspective, Mat4x4, Vec3 };

/// Camera orbiting the origin in the XZ plane, always looking at it.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    angle: f32,
    radius: f32,
    fov_y: f32,
    near: f32,
    aspect: f32,
    eye: Vec3,
    view: Mat4x4,
    projection: Mat4x4,
}

impl OrbitCamera {
    pub const NEAR: f32 = 0.1;

    pub fn new(radius: f32, fov_y_degrees: f32) -> Self {
        let mut camera = Self {
            angle: 0.01,
            radius,
            fov_y: fov_y_degrees.to_radians(),
            near: Self::NEAR,
            aspect: 1.0,
            eye: [0.0; 3],
            view: [0.0; 16],
            projection: [0.0; 16],
        };
        camera.update();
        camera
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = (width as f32) / (height as f32);
        }
    }

    pub fn rotate(&mut self, angle: f32) {
        self.angle += angle;
        self.update();
    }

    /// Recomputes eye, view and projection from the current radius and
    /// angle. The far plane follows the radius so zooming out never clips
    /// the scene.
    pub fn update(&mut self) {
        self.eye = [self.angle.sin() * self.radius, 0.0, self.angle.cos() * self.radius];
        self.view = mat4x4_look_at(self.eye, [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        self.projection = mat4x4_perspective(self.fov_y, self.aspect, self.near, self.radius * 4.0);
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view(&self) -> Mat4x4 {
        self.view
    }

    pub fn projection(&self) -> Mat4x4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4x4 {
        mat4x4_mul(self.projection, self.view)
    }
}
