use serde::{Deserialize, Serialize};

use crate::foundation::core::{Rect, Rgba8, Vec2};
use crate::foundation::error::{CardError, CardResult};

/// A laid-out card: logical size plus the root node.
///
/// Every style value is resolved (pixel geometry, RGBA colors, pixel font sizes, explicit line
/// boxes), so the tree renders the same without any outside stylesheet. Its JSON form is the
/// frozen markup handed to the isolated export surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardTree {
    pub width: u32,
    pub height: u32,
    pub root: CardNode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardNode {
    Box(BoxNode),
    Text(TextNode),
    Image(ImageNode),
    Vector(VectorNode),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    pub rect: Rect,
    pub radius: f64,
    pub background: Option<Paint>,
    pub border: Option<Border>,
    pub shadow: Option<Shadow>,
    pub children: Vec<CardNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Paint {
    Solid { color: Rgba8 },
    LinearGradient(LinearGradient),
}

/// CSS-style linear gradient: `angle_deg` 0 points up, 90 points right.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
    pub angle_deg: f64,
    pub stops: Vec<GradientStop>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba8,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f64,
    pub color: Rgba8,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub offset: Vec2,
    pub blur: f64,
    pub spread: f64,
    pub color: Rgba8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub font_size: f32,
    pub bold: bool,
    pub color: Rgba8,
    pub shadow: Option<Shadow>,
    pub lines: Vec<TextLine>,
}

/// One already-broken line; `x` is the left edge and `baseline` the alphabetic baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    pub rect: Rect,
    pub radius: f64,
    /// `data:` URI of the encoded image.
    pub src: String,
    /// Mirror horizontally, as a selfie preview does.
    pub mirror_x: bool,
}

/// Inline vector artwork (a standalone SVG document) drawn into `rect`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorNode {
    pub rect: Rect,
    pub svg: String,
}

impl CardTree {
    /// Serialize to the static markup string.
    pub fn to_markup(&self) -> CardResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CardError::rasterization(format!("serialize card markup: {e}")))
    }

    pub fn from_markup(markup: &str) -> CardResult<Self> {
        serde_json::from_str(markup)
            .map_err(|e| CardError::rasterization(format!("parse card markup: {e}")))
    }

    /// All text lines in document order, joined by newlines.
    pub fn text_content(&self) -> String {
        let mut lines = Vec::new();
        self.root.visit(&mut |node| {
            if let CardNode::Text(t) = node {
                lines.extend(t.lines.iter().map(|l| l.text.as_str()));
            }
        });
        lines.join("\n")
    }

    pub fn images(&self) -> Vec<&ImageNode> {
        let mut out = Vec::new();
        collect_images(&self.root, &mut out);
        out
    }
}

fn collect_images<'a>(node: &'a CardNode, out: &mut Vec<&'a ImageNode>) {
    match node {
        CardNode::Image(img) => out.push(img),
        CardNode::Box(b) => {
            for child in &b.children {
                collect_images(child, out);
            }
        }
        CardNode::Text(_) | CardNode::Vector(_) => {}
    }
}

impl CardNode {
    /// Pre-order traversal.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a CardNode)) {
        f(self);
        if let CardNode::Box(b) = self {
            for child in &b.children {
                child.visit(f);
            }
        }
    }
}

impl LinearGradient {
    /// Start and end points of the gradient line for `rect`, following CSS angle semantics.
    pub fn line_for(&self, rect: Rect) -> (Vec2, Vec2) {
        let theta = self.angle_deg.to_radians();
        let dir = Vec2::new(theta.sin(), -theta.cos());
        let half_len = (rect.width() * theta.sin().abs() + rect.height() * theta.cos().abs()) / 2.0;
        let c = rect.center().to_vec2();
        (c - dir * half_len, c + dir * half_len)
    }

    /// Interpolated color at `t` in `[0, 1]` along the gradient line.
    pub fn color_at(&self, t: f32) -> Rgba8 {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Rgba8::rgba(0, 0, 0, 0);
        };
        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = (b.offset - a.offset).max(f32::EPSILON);
                let u = (t - a.offset) / span;
                let lerp = |x: u8, y: u8| -> u8 {
                    (f32::from(x) + (f32::from(y) - f32::from(x)) * u).round() as u8
                };
                return Rgba8::rgba(
                    lerp(a.color.r, b.color.r),
                    lerp(a.color.g, b.color.g),
                    lerp(a.color.b, b.color.b),
                    lerp(a.color.a, b.color.a),
                );
            }
        }
        self.stops.last().map_or(first.color, |s| s.color)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/tree.rs"]
mod tests;
