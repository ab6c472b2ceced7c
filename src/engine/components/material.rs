use std::cell::Cell;

use crate::engine::managers::texture_cache::TextureHandle;
use crate::engine::rendering::binding::{ BindingTable, UniformCategory, UniformSemantic };
use crate::engine::rendering::context::{ MaterialDefaults, RendererContext };
use crate::engine::rendering::device::RenderDevice;
use crate::engine::utils::math::Vec3;

/// Material fields as read from a model, with texture paths already
/// resolved against the model's directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialData {
    pub kd: Option<Vec3>,
    pub ks: Option<Vec3>,
    pub ambient: Option<Vec3>,
    pub emission: Option<Vec3>,
    pub shininess: Option<f32>,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub normal_map: Option<String>,
    pub bump_map: Option<String>,
}

pub struct Material<D: RenderDevice> {
    kd: Option<Vec3>,
    ks: Option<Vec3>,
    ambient: Option<Vec3>,
    emission: Option<Vec3>,
    shininess: Option<f32>,
    diffuse_map: Option<TextureHandle<D>>,
    specular_map: Option<TextureHandle<D>>,
    normal_map: Option<TextureHandle<D>>,
    // Loaded so the cache knows about it; no shader slot samples it.
    bump_map: Option<TextureHandle<D>>,
    reported: Cell<bool>,
}

impl<D: RenderDevice> Material<D> {
    /// Requests every named texture from the cache. Loads finish later; the
    /// material is usable immediately.
    pub fn new(device: &D, context: &mut RendererContext<D>, data: &MaterialData) -> Self {
        let mut texture = |path: &Option<String>| {
            path.as_deref().and_then(|p| context.textures.get_or_create(device, p))
        };

        Self {
            kd: data.kd,
            ks: data.ks,
            ambient: data.ambient,
            emission: data.emission,
            shininess: data.shininess,
            diffuse_map: texture(&data.diffuse_map),
            specular_map: texture(&data.specular_map),
            normal_map: texture(&data.normal_map),
            bump_map: texture(&data.bump_map),
            reported: Cell::new(false),
        }
    }

    /// A material with nothing specified; every uniform resolves to its
    /// default or dummy.
    pub fn empty() -> Self {
        Self {
            kd: None,
            ks: None,
            ambient: None,
            emission: None,
            shininess: None,
            diffuse_map: None,
            specular_map: None,
            normal_map: None,
            bump_map: None,
            reported: Cell::new(false),
        }
    }

    pub fn map(&self, semantic: UniformSemantic) -> Option<&TextureHandle<D>> {
        match semantic {
            UniformSemantic::DiffuseMap => self.diffuse_map.as_ref(),
            UniformSemantic::SpecularMap => self.specular_map.as_ref(),
            UniformSemantic::NormalMap => self.normal_map.as_ref(),
            _ => None,
        }
    }

    pub fn bump_map(&self) -> Option<&TextureHandle<D>> {
        self.bump_map.as_ref()
    }

    fn value(&self, semantic: UniformSemantic) -> Option<&[f32]> {
        match semantic {
            UniformSemantic::Kd => self.kd.as_ref().map(|v| v.as_slice()),
            UniformSemantic::Ks => self.ks.as_ref().map(|v| v.as_slice()),
            UniformSemantic::Ambient => self.ambient.as_ref().map(|v| v.as_slice()),
            UniformSemantic::Emission => self.emission.as_ref().map(|v| v.as_slice()),
            UniformSemantic::Shininess => self.shininess.as_ref().map(std::slice::from_ref),
            _ => None,
        }
    }

    /// Pushes every material uniform the program declares.
    ///
    /// Maps: a ready texture is bound as is, a pending or failed one is
    /// replaced by the white placeholder, and an absent one by the role's
    /// dummy. Scalars: explicit value, else the renderer default, else the
    /// uniform is left untouched. Missing data is reported once per
    /// material.
    pub fn set_uniforms(&self, device: &D, context: &RendererContext<D>, table: &BindingTable<D>) {
        let report = !self.reported.replace(true);

        for &semantic in table.declared(UniformCategory::MaterialMap) {
            let texture = match self.map(semantic) {
                Some(slot) if slot.is_ready() => slot.texture(),
                Some(_) => context.placeholder(),
                None => context.dummy_for(semantic),
            };
            table.set_texture(device, semantic, texture);
        }

        for &semantic in table.declared(UniformCategory::MaterialScalar) {
            if let Some(value) = self.value(semantic) {
                table.set_floats(device, semantic, value);
                continue;
            }

            match default_value(context.defaults(), semantic) {
                Some(value) => {
                    if report {
                        log::warn!("material has no {}; using the default {:?}", semantic.name(), value);
                    }
                    table.set_floats(device, semantic, value);
                }
                None => {
                    if report {
                        log::error!("material has no {} and there is no default; uniform not set", semantic.name());
                    }
                }
            }
        }
    }
}

fn default_value(defaults: &MaterialDefaults, semantic: UniformSemantic) -> Option<&[f32]> {
    match semantic {
        UniformSemantic::Kd => Some(defaults.kd.as_slice()),
        UniformSemantic::Ks => Some(defaults.ks.as_slice()),
        UniformSemantic::Ambient => Some(defaults.ambient.as_slice()),
        UniformSemantic::Shininess => Some(std::slice::from_ref(&defaults.shininess)),
        _ => None,
    }
}
