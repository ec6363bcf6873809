use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{CardError, CardResult};
use crate::render::blur::{
    blur_rgba8_premul, downsample_factor, kernel_for_blur_px, upscale_bilinear_rgba8,
};

/// Path flattening tolerance for rounded shapes, in device pixels.
const TOLERANCE: f64 = 0.1;

/// A `vello_cpu` render target size, checked against its `u16` limits.
pub fn surface_size(width: u32, height: u32) -> CardResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::rasterization("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::rasterization("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(CardError::rasterization("surface size must be non-zero"));
    }
    Ok((w, h))
}

pub fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

pub fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Rounded rectangle outline; a radius of zero gives a plain rectangle.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> vello_cpu::kurbo::BezPath {
    let max_r = (rect.width().min(rect.height()) / 2.0).max(0.0);
    let r = radius.clamp(0.0, max_r);
    bezpath_to_cpu(&kurbo::RoundedRect::from_rect(rect, r).to_path(TOLERANCE))
}

pub fn circle_path(center: Point, radius: f64) -> vello_cpu::kurbo::BezPath {
    bezpath_to_cpu(&kurbo::Circle::new(center, radius).to_path(TOLERANCE))
}

pub fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

/// Wrap premultiplied RGBA8 bytes in a `vello_cpu` pixmap.
pub fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CardResult<vello_cpu::Pixmap> {
    let (w, h) = surface_size(width, height)?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CardError::rasterization("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

pub fn image_paint(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

/// Flush `ctx` into a fresh transparent pixmap and return its bytes.
pub fn render_to_bytes(ctx: &mut vello_cpu::RenderContext, width: u16, height: u16) -> Vec<u8> {
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data_as_u8_slice().to_vec()
}

/// Gaussian-blurred layer of `width`x`height` premultiplied pixels.
///
/// `draw` receives a fresh context and the transform to draw with: `base` followed by the
/// downsampling scale. Large blurs are drawn and blurred at reduced size, then scaled back up.
pub fn blurred_layer(
    width: u16,
    height: u16,
    base: Affine,
    blur_px: f32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext, vello_cpu::kurbo::Affine),
) -> CardResult<Vec<u8>> {
    let (w, h) = (u32::from(width), u32::from(height));
    let factor = downsample_factor(blur_px);
    let (sw, sh) = surface_size(w.div_ceil(factor), h.div_ceil(factor))?;

    let mut ctx = vello_cpu::RenderContext::new(sw, sh);
    draw(
        &mut ctx,
        affine_to_cpu(Affine::scale(1.0 / f64::from(factor)) * base),
    );
    let small = render_to_bytes(&mut ctx, sw, sh);

    let (sw, sh) = (u32::from(sw), u32::from(sh));
    let (radius, sigma) = kernel_for_blur_px(blur_px / factor as f32);
    let small = blur_rgba8_premul(&small, sw, sh, radius, sigma)?;
    if factor == 1 {
        return Ok(small);
    }
    let big = upscale_bilinear_rgba8(&small, sw, sh, sw * factor, sh * factor)?;
    Ok(crop_rows(&big, sw * factor, w, h))
}

/// Top-left `w`x`h` block of a wider, taller RGBA8 buffer.
fn crop_rows(src: &[u8], src_w: u32, w: u32, h: u32) -> Vec<u8> {
    let row = w as usize * 4;
    let stride = src_w as usize * 4;
    let mut out = Vec::with_capacity(row * h as usize);
    for y in 0..h as usize {
        out.extend_from_slice(&src[y * stride..y * stride + row]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
