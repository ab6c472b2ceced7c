pub mod error;
pub mod config;
pub mod logging;
pub mod utils;
pub mod rendering;
pub mod managers;
pub mod components;
pub mod loaders;
pub mod scene;
pub mod systems;

#[cfg(test)]
pub mod testing;

pub use error::{ RenderError, RenderResult };
pub use config::ViewerConfig;
pub use scene::Scene;
pub use systems::{ FrameAction, Viewer };
