mod fractal;
mod palette;
mod particles;
mod renderer;
mod scope;
mod surface;

pub use fractal::FractalParamsUpdate;
pub use renderer::{RenderConfig, SignalRenderer, SignalTap, VizType, ANALYSIS_WINDOW};
pub use surface::{Color, PixelSurface, Surface};
