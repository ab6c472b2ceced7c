pub mod binding;
pub mod context;
pub mod device;
pub mod frame;
pub mod program;

pub use binding::{ AttributeSemantic, BindingTable, UniformCategory, UniformSemantic };
pub use context::{ MaterialDefaults, RendererContext };
pub use device::{ DrawMode, GlDevice, RenderDevice, UniformKind };
pub use frame::Frame;
pub use program::ShaderProgram;
