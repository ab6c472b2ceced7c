use std::rc::Rc;

use crate::engine::components::material::{ Material, MaterialData };
use crate::engine::components::mesh::Submesh;
use crate::engine::components::mesh_object::SceneObject;
use crate::engine::managers::buffers::MeshData;
use crate::engine::rendering::context::RendererContext;
use crate::engine::rendering::device::{ DrawMode, RenderDevice };
use crate::engine::rendering::frame::Frame;
use crate::engine::utils::math::{ mat4x4_identity, mat4x4_mul, mat4x4_transform_point, Mat4x4, Vec3 };
use crate::engine::utils::Bounds;

/// A single submesh built from in-memory data, with its own model matrix.
pub struct SimpleMeshObject<D: RenderDevice> {
    submesh: Submesh<D>,
    points: Vec<Vec3>,
    model_matrix: Mat4x4,
    bounds: Bounds,
    mode: DrawMode,
}

impl<D: RenderDevice> SimpleMeshObject<D> {
    pub fn new(
        device: &D,
        context: &mut RendererContext<D>,
        mesh: &MeshData,
        material: Option<&MaterialData>,
        mode: DrawMode
    ) -> Self {
        let material = match material {
            Some(data) => Material::new(device, context, data),
            None => Material::empty(),
        };
        let points: Vec<Vec3> = mesh.points().collect();
        let model_matrix = mat4x4_identity();
        let bounds = bounds_of(&points, &model_matrix);

        Self {
            submesh: Submesh::new(device, mesh, Rc::new(material)),
            points,
            model_matrix,
            bounds,
            mode,
        }
    }

    /// Unit quad in the XY plane with texture coordinates, drawn when no
    /// model is configured.
    pub fn textured_quad(device: &D, context: &mut RendererContext<D>, texture: Option<String>) -> Self {
        let mesh = MeshData {
            positions: vec![-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0],
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            tex_coords: Some(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]),
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            ..Default::default()
        };
        let material = MaterialData {
            kd: Some([1.0, 1.0, 1.0]),
            ks: Some([0.2, 0.2, 0.2]),
            shininess: Some(16.0),
            emission: Some([0.0, 0.0, 0.0]),
            diffuse_map: texture,
            ..Default::default()
        };
        Self::new(device, context, &mesh, Some(&material), DrawMode::Triangles)
    }

    pub fn set_model_matrix(&mut self, matrix: Mat4x4) {
        self.model_matrix = matrix;
        self.bounds = bounds_of(&self.points, &self.model_matrix);
    }

    pub fn model_matrix(&self) -> &Mat4x4 {
        &self.model_matrix
    }
}

fn bounds_of(points: &[Vec3], matrix: &Mat4x4) -> Bounds {
    let mut bounds = Bounds::empty();
    for &p in points {
        bounds.include_point(mat4x4_transform_point(matrix, p));
    }
    bounds
}

impl<D: RenderDevice> SceneObject<D> for SimpleMeshObject<D> {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn draw(&self, frame: &Frame<'_, D>, scene_transform: &Mat4x4) {
        frame.push_model_matrix(&mat4x4_mul(*scene_transform, self.model_matrix));
        self.submesh.draw(frame, self.mode);
    }

    fn delete_buffers(&mut self, device: &D) {
        self.submesh.release(device);
    }
}
