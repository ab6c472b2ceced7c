use std::path::Path;

use serde::Deserialize;

use crate::engine::components::material::MaterialData;
use crate::engine::components::mesh_object::{ HierarchyNode, NodeGraph };
use crate::engine::loaders::{ matrix, resolve_texture_path, rgb, ModelData, ModelMesh };
use crate::engine::managers::buffers::{ lenient_float_sets, lenient_floats, lenient_index_sets, MeshData };
use crate::engine::utils::math::{ mat4x4_identity, Vec3 };

#[derive(Debug, Deserialize)]
struct AssimpModel {
    #[serde(default)]
    materials: Vec<AssimpMaterial>,
    #[serde(default)]
    meshes: Vec<AssimpMesh>,
    rootnode: AssimpNode,
}

#[derive(Debug, Deserialize)]
struct AssimpMaterial {
    #[serde(default)]
    properties: Vec<AssimpProperty>,
}

#[derive(Debug, Deserialize)]
struct AssimpProperty {
    key: String,
    #[serde(default)]
    semantic: u32,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AssimpMesh {
    #[serde(default, deserialize_with = "lenient_floats")]
    vertices: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    normals: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    tangents: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    bitangents: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_float_sets")]
    texturecoords: Option<Vec<Vec<f32>>>,
    #[serde(default, deserialize_with = "lenient_index_sets")]
    faces: Option<Vec<Vec<u32>>>,
    materialindex: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AssimpNode {
    #[serde(default)]
    name: String,
    transformation: Option<Vec<f32>>,
    #[serde(default)]
    meshes: Vec<usize>,
    #[serde(default)]
    children: Vec<AssimpNode>,
}

const TEXTURE_DIFFUSE: u32 = 1;
const TEXTURE_SPECULAR: u32 = 2;
const TEXTURE_HEIGHT: u32 = 5;
const TEXTURE_NORMALS: u32 = 6;

pub fn parse(value: serde_json::Value, model_dir: &Path) -> Result<ModelData, serde_json::Error> {
    let model: AssimpModel = serde_json::from_value(value)?;

    let materials = model.materials
        .iter()
        .map(|m| to_material(m, model_dir))
        .collect();
    let meshes = model.meshes.into_iter().enumerate().map(to_mesh).collect();
    let graph = NodeGraph::Hierarchy(to_node(model.rootnode));

    Ok(ModelData { materials, meshes, graph })
}

fn color(key: &str, value: &serde_json::Value) -> Option<Vec3> {
    let values: Vec<f32> = value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map_or(f32::NAN, |f| f as f32))
        .collect();
    let c = rgb(&values);
    if c.is_none() {
        log::warn!("{} {} is not an RGB colour; ignored", key, value);
    }
    c
}

fn to_material(m: &AssimpMaterial, model_dir: &Path) -> MaterialData {
    let mut data = MaterialData::default();

    for prop in &m.properties {
        match prop.key.as_str() {
            "$tex.file" => {
                let Some(file) = prop.value.as_str().filter(|f| !f.is_empty()) else {
                    log::warn!("$tex.file without a file name");
                    continue;
                };
                let path = Some(resolve_texture_path(model_dir, file));
                match prop.semantic {
                    TEXTURE_DIFFUSE => data.diffuse_map = path,
                    TEXTURE_SPECULAR => data.specular_map = path,
                    TEXTURE_HEIGHT => data.bump_map = path,
                    TEXTURE_NORMALS => data.normal_map = path,
                    other => log::debug!("texture {} with semantic {} ignored", file, other),
                }
            }
            "$clr.diffuse" => data.kd = color(&prop.key, &prop.value),
            "$clr.specular" => data.ks = color(&prop.key, &prop.value),
            "$clr.ambient" => data.ambient = color(&prop.key, &prop.value),
            "$clr.emissive" => data.emission = color(&prop.key, &prop.value),
            "$mat.shininess" => {
                data.shininess = prop.value.as_f64().map(|v| v as f32);
                if data.shininess.is_none() {
                    log::warn!("$mat.shininess {} is not a number; ignored", prop.value);
                }
            }
            _ => {}
        }
    }

    data
}

fn to_mesh((index, m): (usize, AssimpMesh)) -> ModelMesh {
    let indices = m.faces.map(|faces| {
        let mut indices = Vec::with_capacity(faces.len() * 3);
        for face in &faces {
            match face.as_slice() {
                [a, b, c, ..] => indices.extend_from_slice(&[*a, *b, *c]),
                _ => log::warn!("mesh {}: face with {} indices skipped", index, face.len()),
            }
        }
        indices
    });

    let positions = m.vertices.unwrap_or_else(|| {
        log::warn!("mesh {} has no vertices", index);
        Vec::new()
    });

    ModelMesh {
        data: MeshData {
            positions,
            normals: m.normals,
            tangents: m.tangents,
            bitangents: m.bitangents,
            tex_coords: m.texturecoords.and_then(|sets| sets.into_iter().next()),
            indices,
        },
        material_index: m.materialindex,
    }
}

/// The file stores row-major transforms, which is what the math helpers use,
/// so composing parent × local needs no transpose here.
fn to_node(node: AssimpNode) -> HierarchyNode {
    let local = match node.transformation.as_deref().map(matrix) {
        Some(Some(m)) => m,
        Some(None) => {
            log::warn!("node {} transformation is not 16 floats; using identity", node.name);
            mat4x4_identity()
        }
        None => mat4x4_identity(),
    };

    HierarchyNode {
        local,
        meshes: node.meshes,
        children: node.children.into_iter().map(to_node).collect(),
    }
}
