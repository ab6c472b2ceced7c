pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod mesh_object;
pub mod simple_mesh_object;

pub use camera::OrbitCamera;
pub use light::{ pack_lights, Light, LightKind, PackedLights };
pub use material::{ Material, MaterialData };
pub use mesh::Submesh;
pub use mesh_object::{ FlatNode, HierarchyNode, MeshObject, NodeGraph, SceneObject };
pub use simple_mesh_object::SimpleMeshObject;
