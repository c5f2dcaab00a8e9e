mod canvas;
mod component;

pub use canvas::CanvasSurface;
pub use component::MindGraphCanvas;
