pub mod buffers;
pub mod texture_cache;

pub use buffers::{ create_buffers, GpuBuffers, MeshData };
pub use texture_cache::{ TextureCache, TextureHandle, TextureSlot, TextureState };
