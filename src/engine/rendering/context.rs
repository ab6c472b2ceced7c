use tokio::runtime::Handle;

use crate::engine::error::RenderResult;
use crate::engine::managers::texture_cache::TextureCache;
use crate::engine::rendering::binding::UniformSemantic;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::utils::math::Vec3;

/// Values pushed for material uniforms a material leaves unspecified.
/// Emission has no default on purpose: a material without it skips the
/// uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDefaults {
    pub kd: Vec3,
    pub ks: Vec3,
    pub ambient: Vec3,
    pub shininess: f32,
}

impl Default for MaterialDefaults {
    fn default() -> Self {
        Self {
            kd: [1.0, 1.0, 1.0],
            ks: [0.0, 0.0, 0.0],
            ambient: [0.0, 0.0, 0.0],
            shininess: 1.0,
        }
    }
}

/// 1x1 solid textures bound in place of missing or unfinished maps.
#[derive(Debug, Clone, Copy)]
pub struct DummyTextures<T> {
    pub white: T,
    pub gray: T,
    pub black: T,
    pub flat_normal: T,
}

const WHITE: [u8; 4] = [255, 255, 255, 255];
const GRAY: [u8; 4] = [128, 128, 128, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// Renderer-wide state shared by every material and mesh: the texture
/// cache, placeholder textures and material defaults. Built once after the
/// device exists and released before it goes away.
pub struct RendererContext<D: RenderDevice> {
    pub textures: TextureCache<D>,
    dummies: DummyTextures<D::Texture>,
    defaults: MaterialDefaults,
}

impl<D: RenderDevice> RendererContext<D> {
    pub fn new(device: &D, runtime: Handle) -> RenderResult<Self> {
        let solid = |rgba: [u8; 4]| -> RenderResult<D::Texture> {
            let texture = device.create_texture()?;
            device.upload_solid_texture(texture, rgba);
            Ok(texture)
        };

        let dummies = DummyTextures {
            white: solid(WHITE)?,
            gray: solid(GRAY)?,
            black: solid(BLACK)?,
            flat_normal: solid(FLAT_NORMAL)?,
        };

        Ok(Self {
            textures: TextureCache::new(runtime),
            dummies,
            defaults: MaterialDefaults::default(),
        })
    }

    pub fn defaults(&self) -> &MaterialDefaults {
        &self.defaults
    }

    pub fn dummies(&self) -> &DummyTextures<D::Texture> {
        &self.dummies
    }

    /// Bound while a map's texture is pending or failed.
    pub fn placeholder(&self) -> D::Texture {
        self.dummies.white
    }

    /// Bound when a material never named a texture for the role.
    pub fn dummy_for(&self, semantic: UniformSemantic) -> D::Texture {
        match semantic {
            UniformSemantic::DiffuseMap => self.dummies.gray,
            UniformSemantic::SpecularMap => self.dummies.black,
            UniformSemantic::NormalMap => self.dummies.flat_normal,
            _ => self.dummies.white,
        }
    }

    pub fn resources_ready(&self) -> bool {
        self.textures.pending() == 0
    }

    pub fn release(&mut self, device: &D) {
        self.textures.release(device);
        for texture in [self.dummies.white, self.dummies.gray, self.dummies.black, self.dummies.flat_normal] {
            device.delete_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingDevice;

    #[test]
    fn dummies_match_their_roles() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let device = RecordingDevice::new();
        let context = RendererContext::new(&device, runtime.handle().clone()).unwrap();

        let color = |semantic| device.solid_color_of(context.dummy_for(semantic));
        assert_eq!(color(UniformSemantic::DiffuseMap), Some(GRAY));
        assert_eq!(color(UniformSemantic::SpecularMap), Some(BLACK));
        assert_eq!(color(UniformSemantic::NormalMap), Some(FLAT_NORMAL));
        assert_eq!(device.solid_color_of(context.placeholder()), Some(WHITE));
        assert!(context.resources_ready());
    }

    #[test]
    fn defaults_follow_documented_values() {
        let defaults = MaterialDefaults::default();
        assert_eq!(defaults.kd, [1.0, 1.0, 1.0]);
        assert_eq!(defaults.ks, [0.0, 0.0, 0.0]);
        assert_eq!(defaults.ambient, [0.0, 0.0, 0.0]);
        assert_eq!(defaults.shininess, 1.0);
    }
}
