//! In-memory `RenderDevice` that records every call, for tests that never
//! see a GL context.

use std::cell::{ Cell, RefCell };

use crate::engine::error::{ RenderError, RenderResult };
use crate::engine::rendering::device::{ ActiveResource, DrawMode, RenderDevice, UniformKind };

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CompileProgram,
    DeleteProgram(u32),
    CreateArrayBuffer { id: u32, len: usize },
    CreateIndexBuffer { id: u32, len: usize },
    DeleteBuffer(u32),
    CreateTexture(u32),
    UploadSolid { texture: u32, rgba: [u8; 4] },
    UploadImage { texture: u32, width: u32, height: u32 },
    DeleteTexture(u32),
    SetFloats { name: String, kind: UniformKind, data: Vec<f32> },
    SetInt { name: String, value: i32 },
    BindTexture { unit: u32, texture: u32, name: String },
    BindAttribute { location: u32, components: i32, buffer: Option<u32> },
    BeginFrame { width: u32, height: u32 },
    Draw { mode: DrawMode, count: usize, indices: Option<u32> },
}

pub struct RecordingDevice {
    uniforms: Vec<ActiveResource>,
    attributes: Vec<ActiveResource>,
    calls: RefCell<Vec<DeviceCall>>,
    next_id: Cell<u32>,
    fail_allocations: Cell<bool>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::with_program(&[], &[])
    }

    /// A device whose single program reports the given active uniforms
    /// (name, size) and attributes.
    pub fn with_program(uniforms: &[(&str, i32)], attributes: &[&str]) -> Self {
        Self {
            uniforms: uniforms
                .iter()
                .map(|(name, size)| ActiveResource { name: name.to_string(), size: *size })
                .collect(),
            attributes: attributes
                .iter()
                .map(|name| ActiveResource { name: name.to_string(), size: 1 })
                .collect(),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            fail_allocations: Cell::new(false),
        }
    }

    /// Every uniform and attribute the bundled phong shaders declare.
    pub fn with_phong_program() -> Self {
        Self::with_program(
            &[
                ("modelMatrix", 1),
                ("viewProjectionMatrix", 1),
                ("normalMatrix", 1),
                ("eye", 1),
                ("kd", 1),
                ("ks", 1),
                ("ambient", 1),
                ("emission", 1),
                ("shininess", 1),
                ("diffuseMap", 1),
                ("specularMap", 1),
                ("normalMap", 1),
                ("L[0]", 3),
                ("I0[0]", 3),
                ("Ia", 1),
                ("texCoordFlag", 1),
            ],
            &["position", "normal", "tangent", "bitangent", "texCoord"]
        )
    }

    pub fn program(&self) -> u32 {
        1
    }

    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.set(fail);
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Data of every float upload to `name`, oldest first.
    pub fn float_uploads(&self, name: &str) -> Vec<Vec<f32>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetFloats { name: n, data, .. } if n == name => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn int_uploads(&self, name: &str) -> Vec<i32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetInt { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn textures_bound_to(&self, name: &str) -> Vec<u32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::BindTexture { name: n, texture, .. } if n == name => Some(*texture),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<(DrawMode, usize, Option<u32>)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Draw { mode, count, indices } => Some((*mode, *count, *indices)),
                _ => None,
            })
            .collect()
    }

    pub fn solid_color_of(&self, texture: u32) -> Option<[u8; 4]> {
        self.calls.borrow().iter().find_map(|c| match c {
            DeviceCall::UploadSolid { texture: t, rgba } if *t == texture => Some(*rgba),
            _ => None,
        })
    }

    fn record(&self, call: DeviceCall) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self) -> RenderResult<u32> {
        if self.fail_allocations.get() {
            return Err(RenderError::Allocation("out of memory".to_string()));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(id)
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for RecordingDevice {
    type Buffer = u32;
    type Texture = u32;
    type Program = u32;
    type UniformLocation = String;

    fn compile_program(&self, _vertex_src: &str, _fragment_src: &str) -> RenderResult<u32> {
        self.record(DeviceCall::CompileProgram);
        Ok(self.program())
    }

    fn delete_program(&self, program: u32) {
        self.record(DeviceCall::DeleteProgram(program));
    }

    fn active_uniforms(&self, _program: u32) -> Vec<ActiveResource> {
        self.uniforms.clone()
    }

    fn active_attributes(&self, _program: u32) -> Vec<ActiveResource> {
        self.attributes.clone()
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<String> {
        let known = self.uniforms.iter().any(|u| u.name == name);
        known.then(|| name.trim_end_matches("[0]").to_string())
    }

    fn attribute_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes.iter().position(|a| a.name == name).map(|i| i as u32)
    }

    fn create_array_buffer(&self, data: &[f32]) -> RenderResult<u32> {
        let id = self.allocate()?;
        self.record(DeviceCall::CreateArrayBuffer { id, len: data.len() });
        Ok(id)
    }

    fn create_index_buffer(&self, data: &[u32]) -> RenderResult<u32> {
        let id = self.allocate()?;
        self.record(DeviceCall::CreateIndexBuffer { id, len: data.len() });
        Ok(id)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(DeviceCall::DeleteBuffer(buffer));
    }

    fn create_texture(&self) -> RenderResult<u32> {
        let id = self.allocate()?;
        self.record(DeviceCall::CreateTexture(id));
        Ok(id)
    }

    fn upload_solid_texture(&self, texture: u32, rgba: [u8; 4]) {
        self.record(DeviceCall::UploadSolid { texture, rgba });
    }

    fn upload_texture_image(&self, texture: u32, width: u32, height: u32, _pixels: &[u8]) {
        self.record(DeviceCall::UploadImage { texture, width, height });
    }

    fn delete_texture(&self, texture: u32) {
        self.record(DeviceCall::DeleteTexture(texture));
    }

    fn set_uniform_floats(&self, location: &String, kind: UniformKind, data: &[f32]) {
        self.record(DeviceCall::SetFloats { name: location.clone(), kind, data: data.to_vec() });
    }

    fn set_uniform_int(&self, location: &String, value: i32) {
        self.record(DeviceCall::SetInt { name: location.clone(), value });
    }

    fn bind_texture_unit(&self, unit: u32, texture: u32, location: &String) {
        self.record(DeviceCall::BindTexture { unit, texture, name: location.clone() });
    }

    fn bind_attribute(&self, location: u32, components: i32, buffer: Option<u32>) {
        self.record(DeviceCall::BindAttribute { location, components, buffer });
    }

    fn begin_frame(&self, _program: u32, width: u32, height: u32) {
        self.record(DeviceCall::BeginFrame { width, height });
    }

    fn draw(&self, mode: DrawMode, count: usize, index_buffer: Option<u32>) {
        self.record(DeviceCall::Draw { mode, count, indices: index_buffer });
    }
}
