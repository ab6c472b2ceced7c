//! Shader binding negotiation.
//!
//! After a program links, its active uniforms and attributes are matched
//! against the fixed vocabularies below. Each recognised name gets a slot in
//! the [`BindingTable`]; names outside every vocabulary are logged and never
//! driven.

use crate::engine::rendering::device::{ RenderDevice, UniformKind };
use crate::engine::utils::math::{ Mat3x3, Mat4x4 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformCategory {
    Matrix,
    MaterialScalar,
    MaterialMap,
    Light,
    Misc,
    Int,
}

impl UniformCategory {
    pub const ALL: [UniformCategory; 6] = [
        UniformCategory::Misc,
        UniformCategory::MaterialScalar,
        UniformCategory::MaterialMap,
        UniformCategory::Light,
        UniformCategory::Matrix,
        UniformCategory::Int,
    ];

    fn index(self) -> usize {
        match self {
            UniformCategory::Misc => 0,
            UniformCategory::MaterialScalar => 1,
            UniformCategory::MaterialMap => 2,
            UniformCategory::Light => 3,
            UniformCategory::Matrix => 4,
            UniformCategory::Int => 5,
        }
    }
}

/// Every uniform the renderer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSemantic {
    ModelMatrix,
    ViewMatrix,
    ProjectionMatrix,
    ModelViewMatrix,
    ViewProjectionMatrix,
    ModelViewProjectionMatrix,
    NormalMatrix,
    Kd,
    Ks,
    Ambient,
    Emission,
    Shininess,
    DiffuseMap,
    SpecularMap,
    NormalMap,
    L,
    I0,
    Ia,
    Eye,
    TexCoordFlag,
}

impl UniformSemantic {
    pub const COUNT: usize = 20;

    pub const ALL: [UniformSemantic; Self::COUNT] = [
        UniformSemantic::ModelMatrix,
        UniformSemantic::ViewMatrix,
        UniformSemantic::ProjectionMatrix,
        UniformSemantic::ModelViewMatrix,
        UniformSemantic::ViewProjectionMatrix,
        UniformSemantic::ModelViewProjectionMatrix,
        UniformSemantic::NormalMatrix,
        UniformSemantic::Kd,
        UniformSemantic::Ks,
        UniformSemantic::Ambient,
        UniformSemantic::Emission,
        UniformSemantic::Shininess,
        UniformSemantic::DiffuseMap,
        UniformSemantic::SpecularMap,
        UniformSemantic::NormalMap,
        UniformSemantic::L,
        UniformSemantic::I0,
        UniformSemantic::Ia,
        UniformSemantic::Eye,
        UniformSemantic::TexCoordFlag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UniformSemantic::ModelMatrix => "modelMatrix",
            UniformSemantic::ViewMatrix => "viewMatrix",
            UniformSemantic::ProjectionMatrix => "projectionMatrix",
            UniformSemantic::ModelViewMatrix => "modelViewMatrix",
            UniformSemantic::ViewProjectionMatrix => "viewProjectionMatrix",
            UniformSemantic::ModelViewProjectionMatrix => "modelViewProjectionMatrix",
            UniformSemantic::NormalMatrix => "normalMatrix",
            UniformSemantic::Kd => "kd",
            UniformSemantic::Ks => "ks",
            UniformSemantic::Ambient => "ambient",
            UniformSemantic::Emission => "emission",
            UniformSemantic::Shininess => "shininess",
            UniformSemantic::DiffuseMap => "diffuseMap",
            UniformSemantic::SpecularMap => "specularMap",
            UniformSemantic::NormalMap => "normalMap",
            UniformSemantic::L => "L",
            UniformSemantic::I0 => "I0",
            UniformSemantic::Ia => "Ia",
            UniformSemantic::Eye => "eye",
            UniformSemantic::TexCoordFlag => "texCoordFlag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn category(self) -> UniformCategory {
        use UniformSemantic::*;
        match self {
            ModelMatrix | ViewMatrix | ProjectionMatrix | ModelViewMatrix | ViewProjectionMatrix
            | ModelViewProjectionMatrix | NormalMatrix => UniformCategory::Matrix,
            Kd | Ks | Ambient | Emission | Shininess => UniformCategory::MaterialScalar,
            DiffuseMap | SpecularMap | NormalMap => UniformCategory::MaterialMap,
            L | I0 | Ia => UniformCategory::Light,
            Eye => UniformCategory::Misc,
            TexCoordFlag => UniformCategory::Int,
        }
    }

    pub fn kind(self) -> UniformKind {
        use UniformSemantic::*;
        match self {
            NormalMatrix => UniformKind::Mat3,
            ModelMatrix | ViewMatrix | ProjectionMatrix | ModelViewMatrix | ViewProjectionMatrix
            | ModelViewProjectionMatrix => UniformKind::Mat4,
            Kd | Ks | Ambient | Emission | I0 | Ia | Eye => UniformKind::Vec3,
            Shininess => UniformKind::Float,
            L => UniformKind::Vec4,
            DiffuseMap | SpecularMap | NormalMap => UniformKind::Sampler,
            TexCoordFlag => UniformKind::Int,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    Bitangent,
    TexCoord,
}

impl AttributeSemantic {
    pub const COUNT: usize = 5;

    pub const ALL: [AttributeSemantic; Self::COUNT] = [
        AttributeSemantic::Position,
        AttributeSemantic::Normal,
        AttributeSemantic::Tangent,
        AttributeSemantic::Bitangent,
        AttributeSemantic::TexCoord,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AttributeSemantic::Position => "position",
            AttributeSemantic::Normal => "normal",
            AttributeSemantic::Tangent => "tangent",
            AttributeSemantic::Bitangent => "bitangent",
            AttributeSemantic::TexCoord => "texCoord",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn components(self) -> i32 {
        match self {
            AttributeSemantic::TexCoord => 2,
            _ => 3,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone)]
pub struct UniformBinding<L> {
    pub location: L,
    pub kind: UniformKind,
    /// Declared element count; above one for array uniforms such as `L[0]`.
    pub size: i32,
    pub texture_unit: Option<u32>,
}

/// Setter table built once per linked program.
pub struct BindingTable<D: RenderDevice> {
    program: D::Program,
    uniforms: Vec<Option<UniformBinding<D::UniformLocation>>>,
    attributes: [Option<u32>; AttributeSemantic::COUNT],
    declared: [Vec<UniformSemantic>; 6],
    texture_units: u32,
}

impl<D: RenderDevice> BindingTable<D> {
    /// Introspects `program` and builds the table. Never fails: anything
    /// unrecognised is logged and left out.
    pub fn negotiate(device: &D, program: D::Program) -> Self {
        let mut table = Self {
            program,
            uniforms: vec![None; UniformSemantic::COUNT],
            attributes: [None; AttributeSemantic::COUNT],
            declared: Default::default(),
            texture_units: 0,
        };

        for active in device.active_uniforms(program) {
            table.register_uniform(device, &active.name, active.size);
        }

        for active in device.active_attributes(program) {
            let Some(semantic) = AttributeSemantic::from_name(&active.name) else {
                log::error!(
                    "attribute {} is declared in the program but not supported by the renderer",
                    active.name
                );
                continue;
            };
            match device.attribute_location(program, &active.name) {
                Some(location) => table.attributes[semantic.index()] = Some(location),
                None => log::warn!("attribute {} is active but has no location", active.name),
            }
        }

        log::info!("active uniforms: {}", table.describe_uniforms());
        log::info!(
            "active attributes: {}",
            AttributeSemantic::ALL
                .iter()
                .filter(|a| table.attributes[a.index()].is_some())
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(",")
        );

        table
    }

    fn register_uniform(&mut self, device: &D, raw_name: &str, size: i32) {
        let (name, is_array) = match raw_name.strip_suffix("[0]") {
            Some(stripped) => (stripped, true),
            None => (raw_name, false),
        };
        if is_array {
            log::debug!("{} size = {} is an array", name, size);
        }

        let Some(semantic) = UniformSemantic::from_name(name) else {
            log::error!("uniform {} is declared in the program but not supported by the renderer", name);
            return;
        };
        let Some(location) = device.uniform_location(self.program, raw_name) else {
            log::warn!("uniform {} is active but has no location", raw_name);
            return;
        };

        let texture_unit = if semantic.category() == UniformCategory::MaterialMap {
            let unit = self.texture_units;
            self.texture_units += 1;
            Some(unit)
        } else {
            None
        };

        self.uniforms[semantic.index()] = Some(UniformBinding {
            location,
            kind: semantic.kind(),
            size,
            texture_unit,
        });
        self.declared[semantic.category().index()].push(semantic);
    }

    fn describe_uniforms(&self) -> String {
        UniformCategory::ALL
            .iter()
            .flat_map(|c| self.declared[c.index()].iter())
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn program(&self) -> D::Program {
        self.program
    }

    pub fn has(&self, semantic: UniformSemantic) -> bool {
        self.uniforms[semantic.index()].is_some()
    }

    pub fn uniform(&self, semantic: UniformSemantic) -> Option<&UniformBinding<D::UniformLocation>> {
        self.uniforms[semantic.index()].as_ref()
    }

    /// Declared semantics of one category, in program enumeration order.
    pub fn declared(&self, category: UniformCategory) -> &[UniformSemantic] {
        &self.declared[category.index()]
    }

    pub fn attribute_location(&self, semantic: AttributeSemantic) -> Option<u32> {
        self.attributes[semantic.index()]
    }

    /// Uploads float data (vectors, vector arrays or matrices). Returns false
    /// when the program does not declare the semantic.
    ///
    /// Data beyond the declared array length is dropped.
    pub fn set_floats(&self, device: &D, semantic: UniformSemantic, data: &[f32]) -> bool {
        match self.uniform(semantic) {
            Some(binding) => {
                let limit = binding.kind.components() * (binding.size.max(1) as usize);
                device.set_uniform_floats(&binding.location, binding.kind, &data[..data.len().min(limit)]);
                true
            }
            None => false,
        }
    }

    pub fn set_matrix4(&self, device: &D, semantic: UniformSemantic, matrix: &Mat4x4) -> bool {
        self.set_floats(device, semantic, matrix)
    }

    pub fn set_matrix3(&self, device: &D, semantic: UniformSemantic, matrix: &Mat3x3) -> bool {
        self.set_floats(device, semantic, matrix)
    }

    pub fn set_int(&self, device: &D, semantic: UniformSemantic, value: i32) -> bool {
        match self.uniform(semantic) {
            Some(binding) => {
                device.set_uniform_int(&binding.location, value);
                true
            }
            None => false,
        }
    }

    pub fn set_texture(&self, device: &D, semantic: UniformSemantic, texture: D::Texture) -> bool {
        match self.uniform(semantic) {
            Some(UniformBinding { location, texture_unit: Some(unit), .. }) => {
                device.bind_texture_unit(*unit, texture, location);
                true
            }
            Some(_) => {
                log::error!("{} is not a texture map uniform", semantic.name());
                false
            }
            None => false,
        }
    }

    /// Binds every declared attribute; channels the mesh lacks are disabled.
    pub fn bind_attributes(&self, device: &D, buffer_for: impl Fn(AttributeSemantic) -> Option<D::Buffer>) {
        for semantic in AttributeSemantic::ALL {
            if let Some(location) = self.attribute_location(semantic) {
                device.bind_attribute(location, semantic.components(), buffer_for(semantic));
            }
        }
    }
}
