pub mod frame_driver;
pub mod viewer;

pub use frame_driver::{ FrameAction, FrameDriver, Zoom };
pub use viewer::Viewer;
