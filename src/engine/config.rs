//! Viewer configuration.
//!
//! Everything has a default, so an empty JSON object (or no file at all)
//! is a valid configuration. Command-line arguments:
//!
//! ```text
//! scene-viewer [--config <file.json>] [model.json]
//! ```

use std::path::{ Path, PathBuf };

use serde::Deserialize;

use crate::engine::components::light::{ Light, LightKind };
use crate::engine::error::{ RenderError, RenderResult };
use crate::engine::rendering::device::DrawMode;
use crate::engine::utils::math::Vec3;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    /// Model in either JSON dialect. Without one a textured quad is shown.
    pub model: Option<PathBuf>,
    /// Diffuse texture for the built-in quad.
    pub quad_texture: Option<String>,
    pub shaders: ShaderConfig,
    pub camera: CameraConfig,
    pub draw_mode: DrawMode,
    pub lights: Vec<LightConfig>,
    pub log_filter: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            model: None,
            quad_texture: None,
            shaders: ShaderConfig::default(),
            camera: CameraConfig::default(),
            draw_mode: DrawMode::Triangles,
            lights: default_lights(),
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Viewer".to_string(),
            width: 800,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Radius change per tick while a zoom key is held.
    pub zoom_step: f32,
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 1.5,
            min_radius: 0.8,
            max_radius: 10.0,
            zoom_step: 0.05,
            fov_degrees: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightConfig {
    pub intensity: Vec3,
    pub ambient: Vec3,
    pub angle: f32,
    pub radius: f32,
    /// Height above the XZ plane; `None` places the light at the height of
    /// the scene's center.
    #[serde(default)]
    pub height: Option<f32>,
    pub speed: f32,
    pub kind: LightKind,
}

impl LightConfig {
    pub fn build(&self, scene_center_y: f32) -> Light {
        Light::new(
            self.intensity,
            self.ambient,
            self.angle,
            self.radius,
            self.height.unwrap_or(scene_center_y),
            self.speed,
            self.kind
        )
    }
}

/// Two point lights circling in opposite directions and a fixed, distant
/// directional light.
pub fn default_lights() -> Vec<LightConfig> {
    let distance = 0.5;
    let light = |angle: f32, radius: f32, height: Option<f32>, speed: f32, kind: LightKind| LightConfig {
        intensity: [1.0, 1.0, 1.0],
        ambient: [0.1, 0.1, 0.1],
        angle,
        radius,
        height,
        speed,
        kind,
    };

    vec![
        light(-0.5, distance, Some(0.0), 1.0, LightKind::Point),
        light(0.5, distance, Some(0.0), -1.0, LightKind::Point),
        light(-std::f32::consts::PI, 10_000.0 * distance, None, 0.0, LightKind::Directional)
    ]
}

impl ViewerConfig {
    pub fn load(path: &Path) -> RenderResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ViewerConfig = serde_json::from_str(&text).map_err(|source| RenderError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from command-line arguments (without the
    /// program name).
    pub fn from_args<I>(args: I) -> RenderResult<Self> where I: IntoIterator<Item = String> {
        let mut config_path: Option<PathBuf> = None;
        let mut model: Option<PathBuf> = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| RenderError::Config("--config needs a file path".to_string()))?;
                    config_path = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => {
                    return Err(RenderError::Config(format!("unknown option {}", flag)));
                }
                _ if model.is_none() => model = Some(PathBuf::from(arg)),
                _ => {
                    return Err(RenderError::Config(format!("unexpected argument {}", arg)));
                }
            }
        }

        let mut config = match config_path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        if model.is_some() {
            config.model = model;
        }
        Ok(config)
    }

    pub fn validate(&self) -> RenderResult<()> {
        let camera = &self.camera;
        if !(camera.min_radius > 0.0 && camera.min_radius <= camera.max_radius) {
            return Err(
                RenderError::Config(
                    format!("camera radius range [{}, {}] is invalid", camera.min_radius, camera.max_radius)
                )
            );
        }
        if !(camera.zoom_step > 0.0) {
            return Err(RenderError::Config("camera zoom_step must be positive".to_string()));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(RenderError::Config(format!("fov {} is out of range", camera.fov_degrees)));
        }
        Ok(())
    }
}
