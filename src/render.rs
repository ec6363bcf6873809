//! CPU raster helpers shared by the card rasterizers and the fireworks canvas.

pub mod blur;
pub mod composite;
pub mod cpu;
pub mod svg;

pub use blur::{blur_rgba8_premul, downsample_factor, kernel_for_blur_px, upscale_bilinear_rgba8};
pub use composite::{fill_over_in_place, over_in_place};
pub use svg::rasterize_svg_to_premul_rgba8;
