use std::path::Path;
use std::rc::Rc;

use crate::engine::components::material::Material;
use crate::engine::components::mesh::Submesh;
use crate::engine::error::RenderResult;
use crate::engine::loaders::{ self, ModelData };
use crate::engine::rendering::context::RendererContext;
use crate::engine::rendering::device::{ DrawMode, RenderDevice };
use crate::engine::rendering::frame::Frame;
use crate::engine::utils::math::{ mat4x4_identity, mat4x4_mul, Mat4x4 };
use crate::engine::utils::Bounds;

/// Anything the scene can frame and draw.
pub trait SceneObject<D: RenderDevice> {
    /// World-space box, fixed at load time.
    fn bounds(&self) -> Bounds;

    fn draw(&self, frame: &Frame<'_, D>, scene_transform: &Mat4x4);

    /// Releases GPU buffers. Calling it again does nothing.
    fn delete_buffers(&mut self, device: &D);
}

/// Node of the flat dialect: an absolute transform and the meshes it draws.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode {
    pub world: Mat4x4,
    pub meshes: Vec<usize>,
}

/// Node of the hierarchical dialect. `local` is relative to the parent and
/// already in the row-major layout used by the math helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub local: Mat4x4,
    pub meshes: Vec<usize>,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeGraph {
    Flat(Vec<FlatNode>),
    Hierarchy(HierarchyNode),
}

impl NodeGraph {
    /// Calls `f(world, meshes)` for every node that owns meshes, in list
    /// order for flat graphs and depth-first pre-order for hierarchies.
    /// `root` is applied on the left of every node transform.
    pub fn visit<F>(&self, root: Mat4x4, f: &mut F) where F: FnMut(&Mat4x4, &[usize]) {
        match self {
            NodeGraph::Flat(nodes) => {
                for node in nodes {
                    if !node.meshes.is_empty() {
                        f(&mat4x4_mul(root, node.world), &node.meshes);
                    }
                }
            }
            NodeGraph::Hierarchy(node) => visit_node(node, root, f),
        }
    }
}

fn visit_node<F>(node: &HierarchyNode, parent: Mat4x4, f: &mut F) where F: FnMut(&Mat4x4, &[usize]) {
    let world = mat4x4_mul(parent, node.local);
    if !node.meshes.is_empty() {
        f(&world, &node.meshes);
    }
    for child in &node.children {
        visit_node(child, world, f);
    }
}

/// A model loaded from either JSON dialect.
pub struct MeshObject<D: RenderDevice> {
    name: String,
    graph: NodeGraph,
    submeshes: Vec<Submesh<D>>,
    bounds: Bounds,
    mode: DrawMode,
}

impl<D: RenderDevice> MeshObject<D> {
    pub fn load(device: &D, context: &mut RendererContext<D>, path: &Path, mode: DrawMode) -> RenderResult<Self> {
        let model = loaders::load_model(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(device, context, &name, model, mode))
    }

    pub fn new(device: &D, context: &mut RendererContext<D>, name: &str, model: ModelData, mode: DrawMode) -> Self {
        let bounds = model.bounds();

        let materials: Vec<Rc<Material<D>>> = model.materials
            .iter()
            .map(|data| Rc::new(Material::new(device, context, data)))
            .collect();
        let fallback = Rc::new(Material::empty());

        let submeshes = model.meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let material = match mesh.material_index.and_then(|m| materials.get(m)) {
                    Some(material) => Rc::clone(material),
                    None => {
                        log::warn!("{}: mesh {} has no valid material; using defaults", name, i);
                        Rc::clone(&fallback)
                    }
                };
                Submesh::new(device, &mesh.data, material)
            })
            .collect::<Vec<_>>();

        log::info!(
            "{}: {} materials, {} meshes, bounds {:?}..{:?}",
            name,
            materials.len(),
            submeshes.len(),
            bounds.min,
            bounds.max
        );

        Self {
            name: name.to_string(),
            graph: model.graph,
            submeshes,
            bounds,
            mode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn submeshes(&self) -> &[Submesh<D>] {
        &self.submeshes
    }
}

impl<D: RenderDevice> SceneObject<D> for MeshObject<D> {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn draw(&self, frame: &Frame<'_, D>, scene_transform: &Mat4x4) {
        self.graph.visit(*scene_transform, &mut |world, meshes| {
            frame.push_model_matrix(world);
            for &index in meshes {
                if let Some(submesh) = self.submeshes.get(index) {
                    submesh.draw(frame, self.mode);
                }
            }
        });
    }

    fn delete_buffers(&mut self, device: &D) {
        for submesh in &mut self.submeshes {
            submesh.release(device);
        }
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        NodeGraph::Flat(Vec::new())
    }
}

impl FlatNode {
    pub fn identity(meshes: Vec<usize>) -> Self {
        Self { world: mat4x4_identity(), meshes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::managers::buffers::MeshData;
    use crate::engine::loaders::ModelMesh;
    use crate::engine::rendering::binding::{ BindingTable, UniformSemantic };
    use crate::engine::testing::{ DeviceCall, RecordingDevice };
    use crate::engine::utils::math::mat4x4_translate;

    fn collect(graph: &NodeGraph, root: Mat4x4) -> Vec<(Mat4x4, Vec<usize>)> {
        let mut seen = Vec::new();
        graph.visit(root, &mut |world, meshes| seen.push((*world, meshes.to_vec())));
        seen
    }

    fn triangle(indices: Option<Vec<u32>>) -> ModelMesh {
        ModelMesh {
            data: MeshData {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                indices,
                ..Default::default()
            },
            material_index: Some(0),
        }
    }

    #[test]
    fn hierarchy_accumulates_parent_before_child() {
        let graph = NodeGraph::Hierarchy(HierarchyNode {
            local: mat4x4_translate(0.0, 2.0, 0.0),
            meshes: vec![],
            children: vec![HierarchyNode {
                local: mat4x4_translate(1.0, 0.0, 0.0),
                meshes: vec![0],
                children: vec![HierarchyNode {
                    local: mat4x4_translate(0.0, 0.0, 3.0),
                    meshes: vec![1],
                    children: vec![],
                }],
            }],
        });

        let seen = collect(&graph, mat4x4_identity());
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (mat4x4_translate(1.0, 2.0, 0.0), vec![0]));
        assert_eq!(seen[1], (mat4x4_translate(1.0, 2.0, 3.0), vec![1]));
    }

    #[test]
    fn siblings_do_not_share_accumulation() {
        let leaf = |x: f32, mesh: usize| HierarchyNode {
            local: mat4x4_translate(x, 0.0, 0.0),
            meshes: vec![mesh],
            children: vec![],
        };
        let graph = NodeGraph::Hierarchy(HierarchyNode {
            local: mat4x4_identity(),
            meshes: vec![],
            children: vec![leaf(1.0, 0), leaf(5.0, 1)],
        });

        let seen = collect(&graph, mat4x4_identity());
        assert_eq!(seen[0].0, mat4x4_translate(1.0, 0.0, 0.0));
        assert_eq!(seen[1].0, mat4x4_translate(5.0, 0.0, 0.0));
    }

    #[test]
    fn flat_nodes_apply_root_on_the_left() {
        let graph = NodeGraph::Flat(vec![FlatNode { world: mat4x4_translate(1.0, 0.0, 0.0), meshes: vec![0] }]);
        let seen = collect(&graph, mat4x4_translate(0.0, 1.0, 0.0));
        assert_eq!(seen[0].0, mat4x4_translate(1.0, 1.0, 0.0));
    }

    #[test]
    fn draws_each_node_mesh_with_its_world_matrix() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let device = RecordingDevice::with_phong_program();
        let mut context = RendererContext::new(&device, runtime.handle().clone()).unwrap();
        let bindings = BindingTable::negotiate(&device, device.program());

        let model = ModelData {
            materials: vec![Default::default()],
            meshes: vec![triangle(None), triangle(Some(vec![0, 1, 2]))],
            graph: NodeGraph::Flat(vec![
                FlatNode::identity(vec![0]),
                FlatNode { world: mat4x4_translate(2.0, 0.0, 0.0), meshes: vec![1, 7] },
            ]),
        };
        let object = MeshObject::new(&device, &mut context, "test", model, DrawMode::Triangles);
        assert_eq!(object.bounds(), Bounds::new([0.0, 0.0, 0.0], [3.0, 1.0, 0.0]));
        device.clear_calls();

        let frame = Frame {
            device: &device,
            context: &context,
            bindings: &bindings,
            view: mat4x4_identity(),
            projection: mat4x4_identity(),
        };
        object.draw(&frame, &mat4x4_identity());

        let draws = device.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].0, draws[0].1, draws[0].2.is_some()), (DrawMode::Triangles, 3, false));
        assert_eq!((draws[1].1, draws[1].2.is_some()), (3, true));
        assert_eq!(device.float_uploads("modelMatrix"), vec![
            mat4x4_identity().to_vec(),
            mat4x4_translate(2.0, 0.0, 0.0).to_vec(),
        ]);
        assert_eq!(device.int_uploads("texCoordFlag"), vec![0, 0]);
    }

    #[test]
    fn out_of_range_material_uses_defaults() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let device = RecordingDevice::with_phong_program();
        let mut context = RendererContext::new(&device, runtime.handle().clone()).unwrap();

        let mut mesh = triangle(None);
        mesh.material_index = Some(4);
        let model = ModelData {
            materials: vec![],
            meshes: vec![mesh],
            graph: NodeGraph::Flat(vec![FlatNode::identity(vec![0])]),
        };
        let object = MeshObject::new(&device, &mut context, "test", model, DrawMode::Points);
        assert_eq!(object.submeshes().len(), 1);
        assert!(object.submeshes()[0].material().map(UniformSemantic::DiffuseMap).is_none());
    }

    #[test]
    fn delete_buffers_twice_is_harmless() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let device = RecordingDevice::new();
        let mut context = RendererContext::new(&device, runtime.handle().clone()).unwrap();
        let model = ModelData {
            materials: vec![Default::default()],
            meshes: vec![triangle(Some(vec![0, 1, 2]))],
            graph: NodeGraph::Flat(vec![FlatNode::identity(vec![0])]),
        };
        let mut object = MeshObject::new(&device, &mut context, "test", model, DrawMode::Triangles);
        device.clear_calls();

        object.delete_buffers(&device);
        object.delete_buffers(&device);

        let deletes = device
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::DeleteBuffer(_)))
            .count();
        assert_eq!(deletes, 2);
    }
}
