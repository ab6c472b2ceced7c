use std::path::Path;

use crate::engine::error::{ RenderError, RenderResult };
use crate::engine::rendering::binding::BindingTable;
use crate::engine::rendering::device::RenderDevice;

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../../../assets/shaders/phong.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../../../assets/shaders/phong.frag");

/// A linked program together with the bindings negotiated for it.
pub struct ShaderProgram<D: RenderDevice> {
    pub bindings: BindingTable<D>,
}

impl<D: RenderDevice> ShaderProgram<D> {
    pub fn build(device: &D, vertex_src: &str, fragment_src: &str) -> RenderResult<Self> {
        let program = device.compile_program(vertex_src, fragment_src)?;
        let bindings = BindingTable::negotiate(device, program);
        Ok(Self { bindings })
    }

    /// Builds from optional shader files, falling back to the bundled Phong
    /// shaders for whichever stage is not given.
    pub fn from_files(device: &D, vertex: Option<&Path>, fragment: Option<&Path>) -> RenderResult<Self> {
        let vertex_src = read_source(vertex, DEFAULT_VERTEX_SHADER)?;
        let fragment_src = read_source(fragment, DEFAULT_FRAGMENT_SHADER)?;
        Self::build(device, &vertex_src, &fragment_src)
    }

    pub fn program(&self) -> D::Program {
        self.bindings.program()
    }

    pub fn release(&self, device: &D) {
        device.delete_program(self.bindings.program());
    }
}

fn read_source(path: Option<&Path>, fallback: &str) -> RenderResult<String> {
    match path {
        Some(path) => {
            log::info!("loading shader {}", path.display());
            std::fs::read_to_string(path).map_err(|source| RenderError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        None => Ok(fallback.to_string()),
    }
}
