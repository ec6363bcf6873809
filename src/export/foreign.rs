use std::fmt::Write as _;

use base64::Engine as _;

use crate::assets::decode::parse_svg;
use crate::card::tree::{BoxNode, CardNode, CardTree, ImageNode, Paint, Shadow, TextNode, VectorNode};
use crate::export::images::ResolvedImages;
use crate::export::raster::{RasterRequest, Rasterizer};
use crate::foundation::core::{Bitmap, Rect, Rgba8};
use crate::foundation::error::CardResult;
use crate::render::rasterize_svg_to_premul_rgba8;

/// Fallback rasterizer: wraps the card in a standalone SVG document and decodes it with
/// `resvg`, producing the same bitmap shape as the primary path.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgForeignRasterizer;

impl Rasterizer for SvgForeignRasterizer {
    fn name(&self) -> &'static str {
        "svg_foreign_object"
    }

    fn rasterize(&mut self, req: &RasterRequest<'_>) -> CardResult<Bitmap> {
        let (width, height) = req.pixel_size();
        let svg = card_to_svg(req.tree, req.images, req.scale, req.fonts.family());
        tracing::debug!(bytes = svg.len(), "serialized card to svg");

        let tree = parse_svg(&svg, Some(req.fonts.fontdb()))?;
        let data = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
        Bitmap::from_premul(width, height, data)
    }
}

/// Standalone SVG document for `tree` at `scale` device pixels per logical unit.
///
/// Only images present in `images` are embedded; the rest keep their empty frame.
pub fn card_to_svg(
    tree: &CardTree,
    images: &ResolvedImages,
    scale: u32,
    family: Option<&str>,
) -> String {
    let mut w = SvgWriter {
        defs: String::new(),
        body: String::new(),
        next_id: 0,
        images,
        font_family: match family {
            Some(f) => format!("'{}', sans-serif", escape(f)),
            None => "sans-serif".to_string(),
        },
    };
    w.node(&tree.root);

    let mut out = String::with_capacity(w.defs.len() + w.body.len() + 512);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        tree.width.saturating_mul(scale),
        tree.height.saturating_mul(scale),
        tree.width,
        tree.height
    );
    let _ = write!(
        out,
        r#"<defs>{}<clipPath id="viewport"><rect width="{}" height="{}"/></clipPath></defs>"#,
        w.defs, tree.width, tree.height
    );
    let _ = write!(out, r#"<g clip-path="url(#viewport)">{}</g></svg>"#, w.body);
    out
}

struct SvgWriter<'a> {
    defs: String,
    body: String,
    next_id: u32,
    images: &'a ResolvedImages,
    font_family: String,
}

impl SvgWriter<'_> {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn node(&mut self, node: &CardNode) {
        match node {
            CardNode::Box(b) => self.boxed(b),
            CardNode::Text(t) => self.text(t),
            CardNode::Image(img) => self.image(img),
            CardNode::Vector(v) => self.vector(v),
        }
    }

    fn shadow_filter(&mut self, sh: &Shadow) -> String {
        let id = self.id("shadow");
        let _ = write!(
            self.defs,
            r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%"><feGaussianBlur stdDeviation="{}"/></filter>"#,
            (sh.blur / 2.0).max(0.0)
        );
        id
    }

    fn boxed(&mut self, b: &BoxNode) {
        if let Some(sh) = &b.shadow {
            let filter = self.shadow_filter(sh);
            let mask = self.id("outside");
            let _ = write!(
                self.defs,
                r##"<mask id="{mask}" maskUnits="userSpaceOnUse" x="-10000" y="-10000" width="20000" height="20000"><rect x="-10000" y="-10000" width="20000" height="20000" fill="#fff"/>{}</mask>"##,
                rect_el(b.rect, b.radius, r##"fill="#000""##)
            );
            let shape = b.rect.inflate(sh.spread, sh.spread) + sh.offset;
            let _ = write!(
                self.body,
                r#"<g mask="url(#{mask})">{}</g>"#,
                rect_el(
                    shape,
                    (b.radius + sh.spread).max(0.0),
                    &format!(r#"{} filter="url(#{filter})""#, fill_attrs(sh.color)),
                )
            );
        }

        match &b.background {
            Some(Paint::Solid { color }) => {
                self.body
                    .push_str(&rect_el(b.rect, b.radius, &fill_attrs(*color)));
            }
            Some(Paint::LinearGradient(g)) => {
                let id = self.id("gradient");
                let (start, end) = g.line_for(b.rect);
                let _ = write!(
                    self.defs,
                    r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                    start.x, start.y, end.x, end.y
                );
                for stop in &g.stops {
                    let _ = write!(
                        self.defs,
                        r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
                        stop.offset,
                        stop.color.to_hex_rgb(),
                        stop.color.opacity()
                    );
                }
                self.defs.push_str("</linearGradient>");
                self.body
                    .push_str(&rect_el(b.rect, b.radius, &format!(r#"fill="url(#{id})""#)));
            }
            None => {}
        }

        if let Some(border) = b.border.filter(|br| br.width > 0.0) {
            let half = border.width / 2.0;
            self.body.push_str(&rect_el(
                b.rect.inset(-half),
                (b.radius - half).max(0.0),
                &format!(
                    r#"fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
                    border.color.to_hex_rgb(),
                    border.color.opacity(),
                    border.width
                ),
            ));
        }

        for child in &b.children {
            self.node(child);
        }
    }

    fn text(&mut self, t: &TextNode) {
        let weight = if t.bold { "bold" } else { "normal" };
        let family = self.font_family.clone();
        let runs = |color: Rgba8, dx: f64, dy: f64, extra: &str| -> String {
            let mut out = String::new();
            for line in &t.lines {
                let _ = write!(
                    out,
                    r#"<text x="{}" y="{}" font-size="{}" font-weight="{weight}" font-family="{family}" {} {extra} xml:space="preserve">{}</text>"#,
                    line.x + dx,
                    line.baseline + dy,
                    t.font_size,
                    fill_attrs(color),
                    escape(&line.text)
                );
            }
            out
        };

        if let Some(sh) = &t.shadow {
            let filter = self.shadow_filter(sh);
            let shadow = runs(
                sh.color,
                sh.offset.x,
                sh.offset.y,
                &format!(r#"filter="url(#{filter})""#),
            );
            self.body.push_str(&shadow);
        }
        let main = runs(t.color, 0.0, 0.0, "");
        self.body.push_str(&main);
    }

    fn image(&mut self, img: &ImageNode) {
        if self.images.get(&img.src).is_none() {
            return;
        }
        let clip = self.id("clip");
        let _ = write!(
            self.defs,
            r#"<clipPath id="{clip}">{}</clipPath>"#,
            rect_el(img.rect, img.radius, "")
        );
        let mirror = if img.mirror_x {
            format!(
                r#" transform="matrix(-1 0 0 1 {} 0)""#,
                2.0 * img.rect.center().x
            )
        } else {
            String::new()
        };
        let _ = write!(
            self.body,
            r#"<g clip-path="url(#{clip})"><image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice"{mirror} xlink:href="{}"/></g>"#,
            img.rect.x0,
            img.rect.y0,
            img.rect.width(),
            img.rect.height(),
            escape(&img.src)
        );
    }

    fn vector(&mut self, v: &VectorNode) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(v.svg.as_bytes());
        let _ = write!(
            self.body,
            r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" xlink:href="data:image/svg+xml;base64,{encoded}"/>"#,
            v.rect.x0,
            v.rect.y0,
            v.rect.width(),
            v.rect.height()
        );
    }
}

fn rect_el(r: Rect, radius: f64, attrs: &str) -> String {
    format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{radius}" ry="{radius}" {attrs}/>"#,
        r.x0,
        r.y0,
        r.width().max(0.0),
        r.height().max(0.0)
    )
}

fn fill_attrs(c: Rgba8) -> String {
    format!(r#"fill="{}" fill-opacity="{}""#, c.to_hex_rgb(), c.opacity())
}

/// XML text and attribute escaping.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/export/foreign.rs"]
mod tests;
