use std::path::Path;

use serde::Deserialize;

use crate::engine::components::material::MaterialData;
use crate::engine::components::mesh_object::{ FlatNode, NodeGraph };
use crate::engine::loaders::{ matrix, resolve_texture_path, rgb, ModelData, ModelMesh };
use crate::engine::managers::buffers::{ lenient_float, lenient_float_sets, lenient_floats, lenient_indices, MeshData };
use crate::engine::utils::math::{ mat4x4_identity, mat4x4_transpose };

#[derive(Debug, Deserialize)]
struct FlatModel {
    #[serde(default)]
    materials: Vec<FlatMaterial>,
    #[serde(default)]
    meshes: Vec<FlatMesh>,
    nodes: Option<Vec<FlatJsonNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatMaterial {
    #[serde(default, deserialize_with = "lenient_floats")]
    diffuse_reflectance: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    specular_reflectance: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    ambient_reflectance: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    emission_color: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_float")]
    shininess: Option<f32>,
    #[serde(default)]
    diffuse_texture: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatMesh {
    #[serde(default, deserialize_with = "lenient_floats")]
    vertex_positions: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    vertex_normals: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    vertex_tangents: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_floats")]
    vertex_bi_tangents: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "lenient_float_sets")]
    vertex_tex_coordinates: Option<Vec<Vec<f32>>>,
    #[serde(default, deserialize_with = "lenient_indices")]
    indices: Option<Vec<u32>>,
    material_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatJsonNode {
    model_matrix: Option<Vec<f32>>,
    #[serde(default)]
    mesh_indices: Vec<usize>,
}

pub fn parse(value: serde_json::Value, model_dir: &Path) -> Result<ModelData, serde_json::Error> {
    let model: FlatModel = serde_json::from_value(value)?;

    let materials = model.materials
        .iter()
        .map(|m| to_material(m, model_dir))
        .collect();

    let meshes: Vec<ModelMesh> = model.meshes.into_iter().enumerate().map(to_mesh).collect();

    let graph = match model.nodes {
        Some(nodes) => NodeGraph::Flat(nodes.into_iter().enumerate().map(to_node).collect()),
        None => {
            log::debug!("model has no nodes; drawing every mesh once");
            NodeGraph::Flat(vec![FlatNode::identity((0..meshes.len()).collect())])
        }
    };

    Ok(ModelData { materials, meshes, graph })
}

fn to_material(m: &FlatMaterial, model_dir: &Path) -> MaterialData {
    let color = |values: &Option<Vec<f32>>, name: &str| {
        values.as_deref().and_then(|v| {
            let c = rgb(v);
            if c.is_none() {
                log::warn!("{} {:?} is not an RGB colour; ignored", name, v);
            }
            c
        })
    };

    MaterialData {
        kd: color(&m.diffuse_reflectance, "diffuseReflectance"),
        ks: color(&m.specular_reflectance, "specularReflectance"),
        ambient: color(&m.ambient_reflectance, "ambientReflectance"),
        emission: color(&m.emission_color, "emissionColor"),
        shininess: m.shininess.filter(|s| {
            let valid = s.is_finite();
            if !valid {
                log::warn!("shininess is not a number; ignored");
            }
            valid
        }),
        diffuse_map: m.diffuse_texture
            .first()
            .filter(|t| !t.is_empty())
            .map(|t| resolve_texture_path(model_dir, t)),
        ..Default::default()
    }
}

fn to_mesh((index, m): (usize, FlatMesh)) -> ModelMesh {
    let positions = m.vertex_positions.unwrap_or_else(|| {
        log::warn!("mesh {} has no vertexPositions", index);
        Vec::new()
    });

    ModelMesh {
        data: MeshData {
            positions,
            normals: m.vertex_normals,
            tangents: m.vertex_tangents,
            bitangents: m.vertex_bi_tangents,
            tex_coords: m.vertex_tex_coordinates.and_then(|sets| sets.into_iter().next()),
            indices: m.indices,
        },
        material_index: m.material_index,
    }
}

fn to_node((index, node): (usize, FlatJsonNode)) -> FlatNode {
    // Stored column-major; the math helpers are row-major.
    let world = match node.model_matrix.as_deref().map(matrix) {
        Some(Some(m)) => mat4x4_transpose(m),
        Some(None) => {
            log::warn!("node {} modelMatrix is not 16 floats; using identity", index);
            mat4x4_identity()
        }
        None => mat4x4_identity(),
    };
    FlatNode { world, meshes: node.mesh_indices }
}
