use serde::{ Deserialize, Deserializer };

use crate::engine::rendering::binding::AttributeSemantic;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::utils::math::Vec3;

/// Vertex data of one submesh as read from a model file, before upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub tangents: Option<Vec<f32>>,
    pub bitangents: Option<Vec<f32>>,
    pub tex_coords: Option<Vec<f32>>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    /// Index count when indexed, otherwise the number of positions.
    pub fn vertex_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.positions.len() / 3,
        }
    }

    pub fn has_tex_coords(&self) -> bool {
        self.tex_coords.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    fn channel(&self, semantic: AttributeSemantic) -> Option<&[f32]> {
        match semantic {
            AttributeSemantic::Position => Some(&self.positions),
            AttributeSemantic::Normal => self.normals.as_deref(),
            AttributeSemantic::Tangent => self.tangents.as_deref(),
            AttributeSemantic::Bitangent => self.bitangents.as_deref(),
            AttributeSemantic::TexCoord => self.tex_coords.as_deref(),
        }
    }
}

/// GPU buffers of one submesh: one optional buffer per attribute channel
/// and an optional index buffer.
#[derive(Debug)]
pub struct GpuBuffers<B> {
    attributes: [Option<B>; AttributeSemantic::COUNT],
    index: Option<B>,
}

impl<B: Copy> GpuBuffers<B> {
    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<B> {
        self.attributes[semantic.index()]
    }

    pub fn index(&self) -> Option<B> {
        self.index
    }

    pub fn is_released(&self) -> bool {
        self.index.is_none() && self.attributes.iter().all(Option::is_none)
    }

    /// Deletes every buffer still held. Slots are emptied, so a second call
    /// does nothing.
    pub fn release<D: RenderDevice<Buffer = B>>(&mut self, device: &D) {
        for slot in self.attributes.iter_mut() {
            if let Some(buffer) = slot.take() {
                device.delete_buffer(buffer);
            }
        }
        if let Some(buffer) = self.index.take() {
            device.delete_buffer(buffer);
        }
    }
}

/// Uploads every present channel. Channels containing NaN are rejected and
/// left without a buffer; the attribute is then disabled at draw time. An
/// index channel with an entry outside the vertex range is rejected the same
/// way and the submesh draws unindexed.
pub fn create_buffers<D: RenderDevice>(device: &D, mesh: &MeshData) -> GpuBuffers<D::Buffer> {
    let mut buffers = GpuBuffers {
        attributes: [None; AttributeSemantic::COUNT],
        index: None,
    };

    for semantic in AttributeSemantic::ALL {
        let Some(data) = mesh.channel(semantic) else {
            continue;
        };
        if data.is_empty() {
            continue;
        }
        if data.iter().any(|v| v.is_nan()) {
            log::error!("{} data contains NaN; buffer not created", semantic.name());
            continue;
        }
        match device.create_array_buffer(data) {
            Ok(buffer) => buffers.attributes[semantic.index()] = Some(buffer),
            Err(e) => log::error!("{} buffer: {}", semantic.name(), e),
        }
    }

    if let Some(indices) = &mesh.indices {
        let vertices = mesh.positions.len() / 3;
        if let Some(bad) = indices.iter().position(|&i| (i as usize) >= vertices) {
            log::error!(
                "index {} is not a vertex of this mesh ({} vertices); drawing without indices",
                bad,
                vertices
            );
            return buffers;
        }
        match device.create_index_buffer(indices) {
            Ok(buffer) => buffers.index = Some(buffer),
            Err(e) => log::error!("index buffer: {}", e),
        }
    }

    buffers
}

fn lenient_f32(value: &serde_json::Value) -> f32 {
    value.as_f64().map(|v| v as f32).unwrap_or(f32::NAN)
}

/// Float array where anything that is not a number (`"NaN"`, `null`, ...)
/// reads as NaN instead of failing the whole model.
pub fn lenient_floats<'de, De>(deserializer: De) -> Result<Option<Vec<f32>>, De::Error>
    where De: Deserializer<'de>
{
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| values.iter().map(lenient_f32).collect()))
}

/// Single float; anything that is not a number reads as NaN.
pub fn lenient_float<'de, De>(deserializer: De) -> Result<Option<f32>, De::Error>
    where De: Deserializer<'de>
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| lenient_f32(&v)))
}

/// Stands in for an index entry that is not a non-negative integer. It is
/// never a valid vertex, so `create_buffers` drops the whole index channel.
pub const INVALID_INDEX: u32 = u32::MAX;

fn lenient_u32(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(INVALID_INDEX)
}

/// Index array where junk entries read as [`INVALID_INDEX`].
pub fn lenient_indices<'de, De>(deserializer: De) -> Result<Option<Vec<u32>>, De::Error>
    where De: Deserializer<'de>
{
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| values.iter().map(lenient_u32).collect()))
}

/// Face list (one index array per face) with the same junk handling.
pub fn lenient_index_sets<'de, De>(deserializer: De) -> Result<Option<Vec<Vec<u32>>>, De::Error>
    where De: Deserializer<'de>
{
    let sets: Option<Vec<Vec<serde_json::Value>>> = Option::deserialize(deserializer)?;
    Ok(sets.map(|sets| sets.iter().map(|set| set.iter().map(lenient_u32).collect()).collect()))
}

/// Array of float arrays, e.g. one texture-coordinate set per channel.
pub fn lenient_float_sets<'de, De>(deserializer: De) -> Result<Option<Vec<Vec<f32>>>, De::Error>
    where De: Deserializer<'de>
{
    let sets: Option<Vec<Vec<serde_json::Value>>> = Option::deserialize(deserializer)?;
    Ok(sets.map(|sets| sets.iter().map(|set| set.iter().map(lenient_f32).collect()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ DeviceCall, RecordingDevice };

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            tex_coords: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            ..Default::default()
        }
    }

    #[test]
    fn vertex_count_prefers_indices() {
        let mut mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        mesh.indices = Some(vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn creates_one_buffer_per_present_channel() {
        let device = RecordingDevice::new();
        let buffers = create_buffers(&device, &triangle());

        assert!(buffers.attribute(AttributeSemantic::Position).is_some());
        assert!(buffers.attribute(AttributeSemantic::Normal).is_some());
        assert!(buffers.attribute(AttributeSemantic::TexCoord).is_some());
        assert!(buffers.attribute(AttributeSemantic::Tangent).is_none());
        assert!(buffers.index().is_none());
    }

    #[test]
    fn index_buffer_uses_its_own_target() {
        let device = RecordingDevice::new();
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, 1, 2]);
        let buffers = create_buffers(&device, &mesh);

        let index = buffers.index().unwrap();
        assert!(device.calls().contains(&DeviceCall::CreateIndexBuffer { id: index, len: 3 }));
    }

    #[test]
    fn nan_channel_is_not_uploaded() {
        let device = RecordingDevice::new();
        let mut mesh = triangle();
        mesh.normals = Some(vec![0.0, f32::NAN, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let buffers = create_buffers(&device, &mesh);

        assert!(buffers.attribute(AttributeSemantic::Normal).is_none());
        assert!(buffers.attribute(AttributeSemantic::Position).is_some());
        let uploads = device
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::CreateArrayBuffer { .. }))
            .count();
        assert_eq!(uploads, 2);
    }

    #[test]
    fn release_is_idempotent() {
        let device = RecordingDevice::new();
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, 1, 2]);
        let mut buffers = create_buffers(&device, &mesh);
        device.clear_calls();

        buffers.release(&device);
        assert!(buffers.is_released());
        let deleted = device.calls().len();
        assert_eq!(deleted, 4);

        buffers.release(&device);
        assert_eq!(device.calls().len(), deleted);
    }

    #[test]
    fn out_of_range_index_channel_is_dropped() {
        let device = RecordingDevice::new();
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, INVALID_INDEX, 2]);
        let buffers = create_buffers(&device, &mesh);

        assert!(buffers.index().is_none());
        assert!(buffers.attribute(AttributeSemantic::Position).is_some());
        assert!(!device.calls().iter().any(|c| matches!(c, DeviceCall::CreateIndexBuffer { .. })));

        mesh.indices = Some(vec![0, 1, 3]);
        assert!(create_buffers(&device, &mesh).index().is_none());
    }

    #[test]
    fn lenient_indices_mark_junk_entries() {
        #[derive(Deserialize)]
        struct Mesh {
            #[serde(default, deserialize_with = "lenient_indices")]
            indices: Option<Vec<u32>>,
            #[serde(default, deserialize_with = "lenient_index_sets")]
            faces: Option<Vec<Vec<u32>>>,
        }

        let parsed: Mesh = serde_json::from_str(
            r#"{"indices":[0,"NaN",-1,2.5,7],"faces":[[0,null,2]]}"#
        ).unwrap();
        assert_eq!(parsed.indices, Some(vec![0, INVALID_INDEX, INVALID_INDEX, INVALID_INDEX, 7]));
        assert_eq!(parsed.faces, Some(vec![vec![0, INVALID_INDEX, 2]]));
    }

    #[test]
    fn lenient_floats_turn_junk_into_nan() {
        #[derive(Deserialize)]
        struct Channel {
            #[serde(default, deserialize_with = "lenient_floats")]
            data: Option<Vec<f32>>,
        }

        let parsed: Channel = serde_json::from_str(r#"{"data":[1.5,"NaN",null,2]}"#).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data[0], 1.5);
        assert!(data[1].is_nan());
        assert!(data[2].is_nan());
        assert_eq!(data[3], 2.0);

        let absent: Channel = serde_json::from_str("{}").unwrap();
        assert!(absent.data.is_none());
    }
}
