use crate::engine::components::camera::OrbitCamera;
use crate::engine::components::light::{ pack_lights, Light };
use crate::engine::components::mesh_object::SceneObject;
use crate::engine::rendering::binding::UniformSemantic;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::rendering::frame::Frame;
use crate::engine::utils::math::{
    mat4x4_identity,
    mat4x4_mul,
    mat4x4_rot_x,
    mat4x4_rot_y,
    mat4x4_scale,
    mat4x4_translate,
    Mat4x4,
};
use crate::engine::utils::Bounds;

/// Radians every light moves per drawn frame, before its speed factor.
pub const LIGHT_STEP: f32 = 0.01;

/// Scale and translation that fit `bounds` into a box of diagonal 2 around
/// the origin, flipping Z.
///
/// An empty or zero-size box cannot be divided by; it falls back to unit
/// scale, and an empty box to no translation.
pub fn fit_transform(bounds: &Bounds) -> Mat4x4 {
    if bounds.is_empty() {
        log::warn!("scene bounds are empty; using an identity fit");
        return mat4x4_scale(1.0, 1.0, -1.0);
    }

    let center = bounds.center();
    let diagonal = bounds.diagonal();
    let scale = if diagonal > 0.0 && diagonal.is_finite() {
        2.0 / diagonal
    } else {
        log::warn!("scene bounds have diagonal {}; using unit scale", diagonal);
        1.0
    };

    mat4x4_mul(mat4x4_scale(scale, scale, -scale), mat4x4_translate(-center[0], -center[1], -center[2]))
}

pub struct Scene<D: RenderDevice> {
    objects: Vec<Box<dyn SceneObject<D>>>,
    bounds: Bounds,
    model_matrix: Mat4x4,
    lights: Vec<Light>,
}

impl<D: RenderDevice> Scene<D> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bounds: Bounds::empty(),
            model_matrix: mat4x4_identity(),
            lights: Vec::new(),
        }
    }

    /// Appends an object and refits the scene to the merged bounds.
    pub fn add_object(&mut self, object: Box<dyn SceneObject<D>>) {
        self.bounds.merge(&object.bounds());
        self.objects.push(object);
        self.model_matrix = fit_transform(&self.bounds);
    }

    /// Pops the most recently added object and releases its buffers. The
    /// scene bounds keep their extent.
    pub fn remove_object(&mut self, device: &D) -> Option<Box<dyn SceneObject<D>>> {
        let mut object = self.objects.pop()?;
        object.delete_buffers(device);
        Some(object)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn model_matrix(&self) -> &Mat4x4 {
        &self.model_matrix
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Replaces the scene transform with the fit transform rotated by
    /// `angles` degrees about X, then Y. Angles are totals, not deltas.
    pub fn mouse_rotate(&mut self, angles: [f32; 2]) {
        let fit = fit_transform(&self.bounds);
        let rotated = mat4x4_mul(fit, mat4x4_rot_x(angles[0].to_radians()));
        self.model_matrix = mat4x4_mul(rotated, mat4x4_rot_y(angles[1].to_radians()));
    }

    /// Camera uniforms, then one light step and the light uniforms, then
    /// every object in insertion order.
    pub fn draw(&mut self, frame: &Frame<'_, D>, camera: &OrbitCamera) {
        let (device, bindings) = (frame.device, frame.bindings);

        bindings.set_matrix4(device, UniformSemantic::ViewProjectionMatrix, &camera.view_projection());
        bindings.set_matrix4(device, UniformSemantic::ViewMatrix, &camera.view());
        bindings.set_matrix4(device, UniformSemantic::ProjectionMatrix, &camera.projection());
        bindings.set_floats(device, UniformSemantic::Eye, &camera.eye());

        for light in &mut self.lights {
            light.advance(LIGHT_STEP);
        }
        let packed = pack_lights(&self.lights);
        bindings.set_floats(device, UniformSemantic::L, &packed.positions);
        bindings.set_floats(device, UniformSemantic::I0, &packed.intensities);
        bindings.set_floats(device, UniformSemantic::Ia, &packed.ambient);

        for object in &self.objects {
            object.draw(frame, &self.model_matrix);
        }
    }

    /// Releases every object's buffers, newest first.
    pub fn clear(&mut self, device: &D) {
        while self.remove_object(device).is_some() {}
    }
}

impl<D: RenderDevice> Default for Scene<D> {
    fn default() -> Self {
        Self::new()
    }
}
