pub mod bounds;
pub mod math;

pub use bounds::Bounds;
pub use math::*;
