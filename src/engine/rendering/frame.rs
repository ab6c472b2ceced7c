use crate::engine::rendering::binding::{ BindingTable, UniformSemantic };
use crate::engine::rendering::context::RendererContext;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::utils::math::{ mat3x3_normal_from_mat4x4, mat4x4_mul, Mat3x3, Mat4x4 };

const MAT3X3_IDENTITY: Mat3x3 = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Everything a scene object needs while drawing one frame.
pub struct Frame<'a, D: RenderDevice> {
    pub device: &'a D,
    pub context: &'a RendererContext<D>,
    pub bindings: &'a BindingTable<D>,
    pub view: Mat4x4,
    pub projection: Mat4x4,
}

impl<'a, D: RenderDevice> Frame<'a, D> {
    /// Pushes the per-node matrix uniforms for a node whose world transform
    /// (scene transform included) is `model`.
    pub fn push_model_matrix(&self, model: &Mat4x4) {
        let bindings = self.bindings;
        bindings.set_matrix4(self.device, UniformSemantic::ModelMatrix, model);

        if bindings.has(UniformSemantic::NormalMatrix) {
            // The previous node's normal matrix must not stay bound.
            let normal = mat3x3_normal_from_mat4x4(model).unwrap_or_else(|| {
                log::warn!("model matrix is singular; using the identity normal matrix");
                MAT3X3_IDENTITY
            });
            bindings.set_matrix3(self.device, UniformSemantic::NormalMatrix, &normal);
        }

        if bindings.has(UniformSemantic::ModelViewMatrix) || bindings.has(UniformSemantic::ModelViewProjectionMatrix) {
            let model_view = mat4x4_mul(self.view, *model);
            bindings.set_matrix4(self.device, UniformSemantic::ModelViewMatrix, &model_view);
            bindings.set_matrix4(
                self.device,
                UniformSemantic::ModelViewProjectionMatrix,
                &mat4x4_mul(self.projection, model_view)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingDevice;
    use crate::engine::utils::math::{ mat4x4_identity, mat4x4_scale };

    #[test]
    fn singular_model_replaces_the_previous_normal_matrix() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let device = RecordingDevice::with_phong_program();
        let context = RendererContext::new(&device, runtime.handle().clone()).unwrap();
        let bindings = BindingTable::negotiate(&device, device.program());
        let frame = Frame {
            device: &device,
            context: &context,
            bindings: &bindings,
            view: mat4x4_identity(),
            projection: mat4x4_identity(),
        };
        device.clear_calls();

        frame.push_model_matrix(&mat4x4_scale(2.0, 2.0, 2.0));
        frame.push_model_matrix(&mat4x4_scale(0.0, 0.0, 0.0));

        let uploads = device.float_uploads("normalMatrix");
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0], vec![0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5]);
        assert_eq!(uploads[1], MAT3X3_IDENTITY.to_vec());
    }
}
