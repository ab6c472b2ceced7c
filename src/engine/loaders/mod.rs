//! Model loading for the two JSON dialects.
//!
//! The flat dialect lists materials, meshes and nodes with absolute
//! column-major matrices. The hierarchical dialect is assimp's JSON export:
//! property-list materials and a `rootnode` tree of relative transforms.
//! Both are turned into the same [`ModelData`].

pub mod assimp_json;
pub mod flat_json;

use std::path::Path;

use crate::engine::components::material::MaterialData;
use crate::engine::components::mesh_object::NodeGraph;
use crate::engine::error::{ RenderError, RenderResult };
use crate::engine::managers::buffers::MeshData;
use crate::engine::utils::math::{ mat4x4_identity, mat4x4_transform_point, Mat4x4, Vec3 };
use crate::engine::utils::Bounds;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub data: MeshData,
    pub material_index: Option<usize>,
}

/// A parsed model, independent of the dialect it came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    pub materials: Vec<MaterialData>,
    pub meshes: Vec<ModelMesh>,
    pub graph: NodeGraph,
}

impl ModelData {
    /// World-space box of every vertex each node draws, under the node's
    /// accumulated transform.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        self.graph.visit(mat4x4_identity(), &mut |world, meshes| {
            for &index in meshes {
                match self.meshes.get(index) {
                    Some(mesh) => {
                        for point in mesh.data.points() {
                            bounds.include_point(mat4x4_transform_point(world, point));
                        }
                    }
                    None => {
                        log::warn!("node references mesh {} but the model has {}", index, self.meshes.len());
                    }
                }
            }
        });
        bounds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Flat,
    Hierarchical,
}

pub fn detect_dialect(value: &serde_json::Value) -> Dialect {
    if value.get("rootnode").is_some() { Dialect::Hierarchical } else { Dialect::Flat }
}

pub fn load_model(path: &Path) -> RenderResult<ModelData> {
    log::info!("loading model {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_model(&text, model_dir).map_err(|source| RenderError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses either dialect; texture paths are resolved against `model_dir`.
pub fn parse_model(text: &str, model_dir: &Path) -> Result<ModelData, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match detect_dialect(&value) {
        Dialect::Flat => flat_json::parse(value, model_dir),
        Dialect::Hierarchical => assimp_json::parse(value, model_dir),
    }
}

/// Joins a texture reference onto the model directory, with `/` as the only
/// separator.
pub fn resolve_texture_path(model_dir: &Path, raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    let dir = model_dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || normalized.starts_with('/') {
        normalized
    } else {
        format!("{}/{}", dir, normalized)
    }
}

/// First three components of a colour; alpha and anything after it is
/// dropped. A non-finite component makes the whole colour absent.
pub(crate) fn rgb(values: &[f32]) -> Option<Vec3> {
    match values {
        [r, g, b, ..] if [r, g, b].iter().all(|c| c.is_finite()) => Some([*r, *g, *b]),
        _ => None,
    }
}

pub(crate) fn matrix(values: &[f32]) -> Option<Mat4x4> {
    values.try_into().ok()
}
