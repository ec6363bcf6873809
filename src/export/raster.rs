use std::sync::Arc;

use crate::assets::decode::parse_svg;
use crate::card::text::{FontBook, TextBrush, TextShaper, embolden_stroke_width};
use crate::card::tree::{BoxNode, CardNode, CardTree, ImageNode, Paint, TextLine, TextNode, VectorNode};
use crate::export::images::ResolvedImages;
use crate::foundation::core::{Affine, Bitmap, Rect, Rgba8, Vec2};
use crate::foundation::error::CardResult;
use crate::render::composite::over_in_place;
use crate::render::cpu::{
    affine_to_cpu, blurred_layer, color_to_cpu, image_paint, premul_bytes_to_pixmap,
    rect_to_cpu, render_to_bytes, rounded_rect_path, surface_size,
};
use crate::render::rasterize_svg_to_premul_rgba8;

/// Everything a rasterizer needs to turn an isolated surface into pixels.
pub struct RasterRequest<'a> {
    pub tree: &'a CardTree,
    pub images: &'a ResolvedImages,
    pub fonts: &'a FontBook,
    /// Device pixels per logical unit.
    pub scale: u32,
}

impl RasterRequest<'_> {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.tree.width.saturating_mul(self.scale),
            self.tree.height.saturating_mul(self.scale),
        )
    }
}

/// Turns a card tree into a premultiplied RGBA8 bitmap.
pub trait Rasterizer: Send {
    fn name(&self) -> &'static str;
    fn rasterize(&mut self, req: &RasterRequest<'_>) -> CardResult<Bitmap>;
}

/// Primary rasterizer: draws the tree directly with `vello_cpu`.
#[derive(Clone, Copy, Debug, Default)]
pub struct VelloRasterizer;

impl Rasterizer for VelloRasterizer {
    fn name(&self) -> &'static str {
        "vello_cpu"
    }

    fn rasterize(&mut self, req: &RasterRequest<'_>) -> CardResult<Bitmap> {
        let (width, height) = req.pixel_size();
        let mut painter = Painter::new(req, width, height)?;
        if !painter.shaper.has_faces() {
            tracing::warn!("no font faces available; card text is not drawn");
        }
        painter.node(&req.tree.root)?;
        let data = painter.finish()?;
        Bitmap::from_premul(width, height, data)
    }
}

struct ShapedLine {
    font: vello_cpu::peniko::FontData,
    embolden: bool,
    glyphs: Vec<vello_cpu::Glyph>,
}

impl ShapedLine {
    fn draw(&self, ctx: &mut vello_cpu::RenderContext, size: f32) {
        ctx.glyph_run(&self.font)
            .font_size(size)
            .fill_glyphs(self.glyphs.iter().copied());
        if self.embolden {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(embolden_stroke_width(size)));
            ctx.glyph_run(&self.font)
                .font_size(size)
                .stroke_glyphs(self.glyphs.iter().copied());
        }
    }
}

struct Painter<'a> {
    w: u16,
    h: u16,
    scale: f64,
    canvas: Vec<u8>,
    ctx: vello_cpu::RenderContext,
    pending: bool,
    shaper: TextShaper,
    images: &'a ResolvedImages,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl<'a> Painter<'a> {
    fn new(req: &RasterRequest<'a>, width: u32, height: u32) -> CardResult<Self> {
        let (w, h) = surface_size(width, height)?;
        Ok(Self {
            w,
            h,
            scale: f64::from(req.scale),
            canvas: vec![0; usize::from(w) * usize::from(h) * 4],
            ctx: vello_cpu::RenderContext::new(w, h),
            pending: false,
            shaper: TextShaper::new(req.fonts),
            images: req.images,
            fontdb: req.fonts.fontdb(),
        })
    }

    fn base(&self) -> vello_cpu::kurbo::Affine {
        affine_to_cpu(Affine::scale(self.scale))
    }

    /// Composite queued vector work onto the canvas.
    fn flush(&mut self) -> CardResult<()> {
        if !self.pending {
            return Ok(());
        }
        let layer = render_to_bytes(&mut self.ctx, self.w, self.h);
        over_in_place(&mut self.canvas, &layer, 1.0)?;
        self.ctx = vello_cpu::RenderContext::new(self.w, self.h);
        self.pending = false;
        Ok(())
    }

    fn finish(mut self) -> CardResult<Vec<u8>> {
        self.flush()?;
        Ok(self.canvas)
    }

    fn begin(&mut self) -> &mut vello_cpu::RenderContext {
        let base = self.base();
        self.pending = true;
        self.ctx.set_transform(base);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        &mut self.ctx
    }

    fn node(&mut self, node: &CardNode) -> CardResult<()> {
        match node {
            CardNode::Box(b) => self.draw_box(b),
            CardNode::Text(t) => self.draw_text(t),
            CardNode::Image(img) => self.draw_image(img),
            CardNode::Vector(v) => self.draw_vector(v),
        }
    }

    fn draw_box(&mut self, b: &BoxNode) -> CardResult<()> {
        if let Some(sh) = b.shadow {
            let shape = b.rect.inflate(sh.spread, sh.spread) + sh.offset;
            let radius = (b.radius + sh.spread).max(0.0);
            let paint = color_to_cpu(sh.color);
            self.blurred_layer(sh.blur, Some((b.rect, b.radius)), |ctx, base| {
                ctx.set_transform(base);
                ctx.set_paint(paint);
                ctx.fill_path(&rounded_rect_path(shape, radius));
            })?;
        }

        match &b.background {
            Some(Paint::Solid { color }) => {
                let path = rounded_rect_path(b.rect, b.radius);
                let ctx = self.begin();
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_path(&path);
            }
            Some(Paint::LinearGradient(g)) => {
                if let Some((paint, origin)) = self.gradient_paint(g, b.rect)? {
                    let inv = 1.0 / self.scale;
                    let paint_xform = affine_to_cpu(
                        Affine::translate(origin) * Affine::scale(inv),
                    );
                    let path = rounded_rect_path(b.rect, b.radius);
                    let ctx = self.begin();
                    ctx.set_paint(paint);
                    ctx.set_paint_transform(paint_xform);
                    ctx.fill_path(&path);
                }
            }
            None => {}
        }

        if let Some(border) = b.border.filter(|br| br.width > 0.0 && br.color.a > 0) {
            let half = border.width / 2.0;
            let path = rounded_rect_path(b.rect.inset(-half), (b.radius - half).max(0.0));
            let ctx = self.begin();
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(border.width));
            ctx.set_paint(color_to_cpu(border.color));
            ctx.stroke_path(&path);
        }

        for child in &b.children {
            self.node(child)?;
        }
        Ok(())
    }

    /// Gradient pixels covering `rect` in device space, plus the logical origin of the first
    /// pixel. `None` when the rect is entirely off the canvas.
    fn gradient_paint(
        &self,
        g: &crate::card::tree::LinearGradient,
        rect: Rect,
    ) -> CardResult<Option<(vello_cpu::Image, Vec2)>> {
        let s = self.scale;
        let x0 = (rect.x0 * s).floor().max(0.0) as u32;
        let y0 = (rect.y0 * s).floor().max(0.0) as u32;
        let x1 = ((rect.x1 * s).ceil() as u32).min(u32::from(self.w));
        let y1 = ((rect.y1 * s).ceil() as u32).min(u32::from(self.h));
        if x1 <= x0 || y1 <= y0 {
            return Ok(None);
        }
        let (gw, gh) = (x1 - x0, y1 - y0);

        let (start, end) = g.line_for(rect);
        let axis = end - start;
        let len2 = axis.hypot2().max(f64::EPSILON);

        let mut px = Vec::with_capacity(gw as usize * gh as usize * 4);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new((f64::from(x) + 0.5) / s, (f64::from(y) + 0.5) / s);
                let t = (p - start).dot(axis) / len2;
                px.extend_from_slice(&g.color_at(t as f32).to_premul().to_array());
            }
        }

        let pixmap = premul_bytes_to_pixmap(&px, gw, gh)?;
        Ok(Some((
            image_paint(pixmap),
            Vec2::new(f64::from(x0) / s, f64::from(y0) / s),
        )))
    }

    fn draw_text(&mut self, t: &TextNode) -> CardResult<()> {
        if !self.shaper.has_faces() {
            return Ok(());
        }
        let shaped: Vec<ShapedLine> = t
            .lines
            .iter()
            .filter_map(|line| shape_line(&mut self.shaper, line, t.font_size, t.bold))
            .collect();

        if let Some(sh) = t.shadow {
            let paint = color_to_cpu(sh.color);
            let offset = affine_to_cpu(Affine::translate(sh.offset));
            let size = t.font_size;
            let glyph_lines = &shaped;
            self.blurred_layer(sh.blur, None, |ctx, base| {
                ctx.set_transform(base * offset);
                ctx.set_paint(paint);
                for line in glyph_lines {
                    line.draw(ctx, size);
                }
            })?;
        }

        let size = t.font_size;
        let paint = color_to_cpu(t.color);
        let ctx = self.begin();
        ctx.set_paint(paint);
        for line in &shaped {
            line.draw(ctx, size);
        }
        Ok(())
    }

    fn draw_image(&mut self, img: &ImageNode) -> CardResult<()> {
        let Some(decoded) = self.images.get(&img.src) else {
            tracing::debug!("image unresolved; drawing its frame only");
            return Ok(());
        };
        if decoded.width == 0 || decoded.height == 0 {
            return Ok(());
        }
        let pixmap = premul_bytes_to_pixmap(&decoded.rgba8_premul, decoded.width, decoded.height)?;
        let paint_xform = affine_to_cpu(cover_transform(
            img.rect,
            f64::from(decoded.width),
            f64::from(decoded.height),
            img.mirror_x,
        ));
        let path = rounded_rect_path(img.rect, img.radius);
        let ctx = self.begin();
        ctx.set_paint(image_paint(pixmap));
        ctx.set_paint_transform(paint_xform);
        ctx.fill_path(&path);
        Ok(())
    }

    fn draw_vector(&mut self, v: &VectorNode) -> CardResult<()> {
        let dw = (v.rect.width() * self.scale).ceil().max(1.0) as u32;
        let dh = (v.rect.height() * self.scale).ceil().max(1.0) as u32;
        let tree = parse_svg(&v.svg, Some(self.fontdb.clone()))?;
        let px = rasterize_svg_to_premul_rgba8(&tree, dw, dh)?;
        let pixmap = premul_bytes_to_pixmap(&px, dw, dh)?;
        let paint_xform = affine_to_cpu(
            Affine::translate(v.rect.origin().to_vec2())
                * Affine::scale_non_uniform(
                    v.rect.width() / f64::from(dw),
                    v.rect.height() / f64::from(dh),
                ),
        );
        let ctx = self.begin();
        ctx.set_paint(image_paint(pixmap));
        ctx.set_paint_transform(paint_xform);
        ctx.fill_rect(&rect_to_cpu(v.rect));
        Ok(())
    }

    /// Draw with `draw` (given the layer's logical-to-device transform) into a separate layer, blur it by `blur` logical px and composite it.
    /// With `clip_out`, the layer is erased under that rounded rect (outer box shadows).
    fn blurred_layer(
        &mut self,
        blur: f64,
        clip_out: Option<(Rect, f64)>,
        draw: impl FnOnce(&mut vello_cpu::RenderContext, vello_cpu::kurbo::Affine),
    ) -> CardResult<()> {
        self.flush()?;
        let blur_px = (blur * self.scale) as f32;
        let mut layer = blurred_layer(self.w, self.h, Affine::scale(self.scale), blur_px, draw)?;

        if let Some((rect, r)) = clip_out {
            let mut mctx = vello_cpu::RenderContext::new(self.w, self.h);
            mctx.set_transform(self.base());
            mctx.set_paint(color_to_cpu(Rgba8::WHITE));
            mctx.fill_path(&rounded_rect_path(rect, r));
            let mask = render_to_bytes(&mut mctx, self.w, self.h);
            erase_under(&mut layer, &mask);
        }

        over_in_place(&mut self.canvas, &layer, 1.0)
    }
}

fn shape_line(shaper: &mut TextShaper, line: &TextLine, size: f32, bold: bool) -> Option<ShapedLine> {
    let (layout, face) = shaper.layout_line(&line.text, size, bold, TextBrush::default())?;
    let first = layout.lines().next()?;
    let baseline = first.metrics().baseline;
    let (dx, dy) = (line.x as f32, line.baseline as f32 - baseline);

    let mut glyphs = Vec::new();
    for item in first.items() {
        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
            continue;
        };
        // Glyph 0 is .notdef: the face has no outline for that character.
        glyphs.extend(run.positioned_glyphs().filter(|g| g.id != 0).map(|g| {
            vello_cpu::Glyph {
                id: g.id,
                x: g.x + dx,
                y: g.y + dy,
            }
        }));
    }
    Some(ShapedLine {
        font: face.font,
        embolden: face.embolden,
        glyphs,
    })
}

/// Paint transform mapping an `iw`x`ih` image onto `rect` with `object-fit: cover`.
pub(crate) fn cover_transform(rect: Rect, iw: f64, ih: f64, mirror_x: bool) -> Affine {
    let k = (rect.width() / iw).max(rect.height() / ih);
    let sx = if mirror_x { -k } else { k };
    Affine::translate(rect.center().to_vec2())
        * Affine::scale_non_uniform(sx, k)
        * Affine::translate(Vec2::new(-iw / 2.0, -ih / 2.0))
}

fn erase_under(layer: &mut [u8], mask: &[u8]) {
    for (px, m) in layer.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let keep = 255 - u16::from(m[3]);
        for c in px.iter_mut() {
            *c = ((u16::from(*c) * keep + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/raster.rs"]
mod tests;
