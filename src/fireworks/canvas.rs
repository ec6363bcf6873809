use rand::Rng;

use crate::config::FireworksConfig;
use crate::fireworks::engine::FireworksEngine;
use crate::foundation::core::{Affine, Bitmap, Rgba8, Rgba8Premul, Vec2};
use crate::foundation::error::CardResult;
use crate::render::composite::{fill_over_in_place, over_in_place};
use crate::render::cpu::{
    blurred_layer, circle_path, color_to_cpu, point_to_cpu, render_to_bytes, surface_size,
};

const ROCKET_RADIUS: f64 = 3.0;
const TRAIL_LENGTH: f64 = 10.0;
const TRAIL_WIDTH: f64 = 2.0;

/// Persistent frame buffer the fireworks are drawn into.
///
/// Each frame darkens the previous one with a translucent overlay instead of clearing it,
/// which leaves fading trails behind everything that moves.
#[derive(Debug)]
pub struct FireworksCanvas {
    width: u16,
    height: u16,
    frame: Vec<u8>,
    fade: Rgba8Premul,
    glow_px: f32,
}

impl FireworksCanvas {
    pub fn new(width: u32, height: u32, cfg: &FireworksConfig) -> CardResult<Self> {
        let (w, h) = surface_size(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            frame: vec![0; usize::from(w) * usize::from(h) * 4],
            fade: Rgba8::BLACK.with_opacity(cfg.trail_fade).to_premul(),
            glow_px: cfg.glow_px,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Reallocate the buffer. Like a resized canvas, the new one starts transparent.
    ///
    /// Each side is clamped to `1..=u16::MAX`, so a collapsed or oversized view still has a
    /// drawable buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (clamp_side(width), clamp_side(height));
        if (u32::from(w), u32::from(h)) != (width, height) {
            tracing::debug!(width, height, clamped_w = w, clamped_h = h, "clamped canvas size");
        }
        self.width = w;
        self.height = h;
        self.frame = vec![0; usize::from(w) * usize::from(h) * 4];
    }

    /// Premultiplied RGBA8 pixels of the current frame.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn to_bitmap(&self) -> CardResult<Bitmap> {
        Bitmap::from_premul(self.size().0, self.size().1, self.frame.clone())
    }

    /// Fade the previous frame and draw the engine's current state over it.
    pub fn draw<R: Rng>(&mut self, engine: &FireworksEngine<R>) -> CardResult<()> {
        fill_over_in_place(&mut self.frame, self.fade)?;

        let has_particles = engine.particle_count() > 0;
        if self.glow_px > 0.0 && has_particles {
            let glow = blurred_layer(
                self.width,
                self.height,
                Affine::IDENTITY,
                self.glow_px,
                |ctx, base| {
                    ctx.set_transform(base);
                    draw_particles(ctx, engine);
                },
            )?;
            over_in_place(&mut self.frame, &glow, 1.0)?;
        }

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        for p in engine.projectiles().iter().filter(|p| p.is_rising()) {
            let paint = color_to_cpu(p.color);
            ctx.set_paint(paint);
            ctx.fill_path(&circle_path(p.pos, ROCKET_RADIUS));

            let mut trail = vello_cpu::kurbo::BezPath::new();
            trail.move_to(point_to_cpu(p.pos));
            trail.line_to(point_to_cpu(p.pos + Vec2::new(0.0, TRAIL_LENGTH)));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(TRAIL_WIDTH));
            ctx.stroke_path(&trail);
        }
        if has_particles {
            draw_particles(&mut ctx, engine);
        }
        let layer = render_to_bytes(&mut ctx, self.width, self.height);
        over_in_place(&mut self.frame, &layer, 1.0)
    }
}

fn clamp_side(v: u32) -> u16 {
    u16::try_from(v.max(1)).unwrap_or(u16::MAX)
}

fn draw_particles<R: Rng>(ctx: &mut vello_cpu::RenderContext, engine: &FireworksEngine<R>) {
    for p in engine.projectiles().iter().filter(|p| p.exploded) {
        for part in &p.particles {
            ctx.set_paint(color_to_cpu(part.color.with_opacity(part.alpha)));
            ctx.fill_path(&circle_path(part.pos, part.radius));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fireworks/canvas.rs"]
mod tests;
