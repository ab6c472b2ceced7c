use std::rc::Rc;

use crate::engine::components::material::Material;
use crate::engine::managers::buffers::{ create_buffers, GpuBuffers, MeshData };
use crate::engine::rendering::binding::UniformSemantic;
use crate::engine::rendering::device::{ DrawMode, RenderDevice };
use crate::engine::rendering::frame::Frame;

/// One drawable piece of geometry with its material.
pub struct Submesh<D: RenderDevice> {
    buffers: GpuBuffers<D::Buffer>,
    vertex_count: usize,
    has_tex_coords: bool,
    material: Rc<Material<D>>,
}

impl<D: RenderDevice> Submesh<D> {
    pub fn new(device: &D, data: &MeshData, material: Rc<Material<D>>) -> Self {
        let buffers = create_buffers(device, data);
        // A rejected index channel falls back to drawing the positions in order.
        let vertex_count = if buffers.index().is_some() { data.vertex_count() } else { data.positions.len() / 3 };
        Self {
            buffers,
            vertex_count,
            has_tex_coords: data.has_tex_coords(),
            material,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn is_indexed(&self) -> bool {
        self.buffers.index().is_some()
    }

    pub fn material(&self) -> &Rc<Material<D>> {
        &self.material
    }

    pub fn draw(&self, frame: &Frame<'_, D>, mode: DrawMode) {
        let bindings = frame.bindings;
        bindings.set_int(frame.device, UniformSemantic::TexCoordFlag, self.has_tex_coords as i32);
        self.material.set_uniforms(frame.device, frame.context, bindings);
        bindings.bind_attributes(frame.device, |semantic| self.buffers.attribute(semantic));
        frame.device.draw(mode, self.vertex_count, self.buffers.index());
    }

    pub fn release(&mut self, device: &D) {
        self.buffers.release(device);
    }
}
