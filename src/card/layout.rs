use crate::card::hat::{HAT_HEIGHT, HAT_SVG, HAT_WIDTH};
use crate::card::model::CardData;
use crate::card::text::{FontBook, TextShaper, wrap_words};
use crate::card::tree::{
    Border, BoxNode, CardNode, CardTree, GradientStop, ImageNode, LinearGradient, Paint, Shadow,
    TextLine, TextNode, VectorNode,
};
use crate::foundation::core::{Rect, Rgba8, Vec2};

pub const CARD_WIDTH: u32 = 1400;
pub const CARD_HEIGHT: u32 = 700;

const PANEL_MAX_WIDTH: f64 = 1000.0;
const PANEL_PADDING: f64 = 48.0;
const PANEL_RADIUS: f64 = 32.0;
const SECTION_GAP: f64 = 32.0;
const HEADER_GAP: f64 = 12.0;

const PHOTO_SIZE: f64 = 200.0;
const PHOTO_BORDER: f64 = 6.0;
const PHOTO_RADIUS: f64 = 24.0;
const HAT_OFFSET_Y: f64 = 40.0;

const WISH_PADDING: f64 = 32.0;
const WISH_RADIUS: f64 = 24.0;
const WISH_FONT_PX: f32 = 24.0;
const WISH_LINE_HEIGHT: f64 = 1.6;

/// `line-height: normal`, as a multiple of the font size.
const NORMAL_LINE_HEIGHT: f64 = 1.2;

const CLOSING_PRIMARY: &str = "✨ May all your dreams come true! ✨";
const CLOSING_SECONDARY: &str = "Wishing you a year filled with joy, love, and endless happiness! 🎂";
const HEADLINE: &str = "🎉 Happy Birthday!";

enum Anchor {
    Top(f64),
    Bottom(f64),
}

enum Side {
    Left(f64),
    Right(f64),
}

/// Floating glyphs: glyph, font size, vertical anchor, horizontal anchor (fractions of the card).
const DECORATIONS: [(&str, f32, Anchor, Side); 8] = [
    ("🎈", 24.0, Anchor::Top(0.10), Side::Left(0.05)),
    ("⭐", 20.0, Anchor::Top(0.30), Side::Right(0.08)),
    ("💖", 20.0, Anchor::Bottom(0.15), Side::Left(0.10)),
    ("⭐", 24.0, Anchor::Top(0.50), Side::Right(0.05)),
    ("🎉", 20.0, Anchor::Bottom(0.25), Side::Right(0.15)),
    ("💖", 18.0, Anchor::Top(0.20), Side::Left(0.15)),
    ("⭐", 16.0, Anchor::Bottom(0.35), Side::Left(0.08)),
    ("💖", 18.0, Anchor::Top(0.70), Side::Right(0.12)),
];

/// Lay out the export card as a detached tree with every style value resolved.
///
/// This is a pure function of its inputs: the same data and fonts always give the same tree.
pub fn build_card_tree(data: &CardData, fonts: &FontBook) -> CardTree {
    let mut shaper = TextShaper::new(fonts);
    let mut lay = Layout {
        shaper: &mut shaper,
    };

    let width = f64::from(CARD_WIDTH);
    let height = f64::from(CARD_HEIGHT);

    let mut children: Vec<CardNode> = DECORATIONS
        .iter()
        .map(|(glyph, size, anchor, side)| lay.decoration(glyph, *size, anchor, side, width, height))
        .collect();
    children.push(lay.panel(data, width, height));

    tracing::debug!(
        name = %data.name,
        has_photo = data.photo.is_some(),
        has_date = !data.birth_date.is_empty(),
        "built card tree"
    );

    CardTree {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        root: CardNode::Box(BoxNode {
            rect: Rect::new(0.0, 0.0, width, height),
            radius: 0.0,
            background: Some(Paint::LinearGradient(LinearGradient {
                angle_deg: 135.0,
                stops: vec![
                    GradientStop {
                        offset: 0.0,
                        color: Rgba8::rgb(0x7c, 0x3a, 0xed),
                    },
                    GradientStop {
                        offset: 0.5,
                        color: Rgba8::rgb(0xdb, 0x27, 0x77),
                    },
                    GradientStop {
                        offset: 1.0,
                        color: Rgba8::rgb(0x3b, 0x82, 0xf6),
                    },
                ],
            })),
            border: None,
            shadow: None,
            children,
        }),
    }
}

/// Alphabetic baseline of a `size_px` font centred in a line box starting at `top`.
pub(crate) fn baseline_in_line(top: f64, line_height: f64, size_px: f32) -> f64 {
    let s = f64::from(size_px);
    top + (line_height - s) / 2.0 + 0.8 * s
}

struct TextStyle {
    size_px: f32,
    bold: bool,
    color: Rgba8,
    shadow: Option<Shadow>,
    line_height: f64,
}

impl TextStyle {
    fn plain(size_px: f32, color: Rgba8) -> Self {
        Self {
            size_px,
            bold: false,
            color,
            shadow: None,
            line_height: f64::from(size_px) * NORMAL_LINE_HEIGHT,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A wrapped, not yet positioned, text block.
struct Block {
    style: TextStyle,
    lines: Vec<(String, f64)>,
}

impl Block {
    fn width(&self) -> f64 {
        self.lines.iter().map(|(_, w)| *w).fold(0.0, f64::max)
    }

    fn height(&self) -> f64 {
        self.lines.len() as f64 * self.style.line_height
    }

    /// Place the block with its lines centred inside `[left, left + width)` from `top` down.
    fn place_centered(self, left: f64, width: f64, top: f64) -> CardNode {
        let lh = self.style.line_height;
        let size = self.style.size_px;
        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, (text, w))| {
                let line_top = top + i as f64 * lh;
                TextLine {
                    text,
                    x: left + (width - w) / 2.0,
                    baseline: baseline_in_line(line_top, lh, size),
                    width: w,
                }
            })
            .collect();
        CardNode::Text(TextNode {
            font_size: size,
            bold: self.style.bold,
            color: self.style.color,
            shadow: self.style.shadow,
            lines,
        })
    }
}

struct Layout<'a> {
    shaper: &'a mut TextShaper,
}

impl Layout<'_> {
    fn wrap(&mut self, text: &str, style: TextStyle, max_width: f64) -> Block {
        let (size, bold) = (style.size_px, style.bold);
        let shaper = &mut *self.shaper;
        let lines = wrap_words(text, max_width, |s| shaper.measure(s, size, bold));
        Block { style, lines }
    }

    fn decoration(
        &mut self,
        glyph: &str,
        size_px: f32,
        anchor: &Anchor,
        side: &Side,
        width: f64,
        height: f64,
    ) -> CardNode {
        let style = TextStyle::plain(size_px, Rgba8::BLACK);
        let lh = style.line_height;
        let w = self.shaper.measure(glyph, size_px, false);
        let top = match *anchor {
            Anchor::Top(f) => f * height,
            Anchor::Bottom(f) => height - f * height - lh,
        };
        let x = match *side {
            Side::Left(f) => f * width,
            Side::Right(f) => width - f * width - w,
        };
        CardNode::Text(TextNode {
            font_size: size_px,
            bold: false,
            color: style.color,
            shadow: None,
            lines: vec![TextLine {
                text: glyph.to_string(),
                x,
                baseline: baseline_in_line(top, lh, size_px),
                width: w,
            }],
        })
    }

    fn panel(&mut self, data: &CardData, width: f64, height: f64) -> CardNode {
        let panel_w = PANEL_MAX_WIDTH.min(width);
        let panel_x = (width - panel_w) / 2.0;
        let content_x = panel_x + PANEL_PADDING;
        let content_w = panel_w - 2.0 * PANEL_PADDING;

        // Lay out at y = 0, then shift everything once the panel height is known.
        let mut nodes = Vec::new();
        let mut y = PANEL_PADDING;

        let header_h = self.header(data, content_x, content_w, y, &mut nodes);
        y += header_h + SECTION_GAP;

        if let Some(photo) = &data.photo {
            self.photo(photo.data_uri(), content_x, content_w, y, &mut nodes);
            y += PHOTO_SIZE + SECTION_GAP;
        }

        y += self.wish(&data.wish, content_x, content_w, y, &mut nodes) + SECTION_GAP;
        y += self.closing(content_x, content_w, y, &mut nodes);
        let panel_h = y + PANEL_PADDING;

        let top = (height - panel_h) / 2.0;
        for node in &mut nodes {
            translate_y(node, top);
        }

        CardNode::Box(BoxNode {
            rect: Rect::new(panel_x, top, panel_x + panel_w, top + panel_h),
            radius: PANEL_RADIUS,
            background: Some(Paint::Solid {
                color: Rgba8::WHITE.with_opacity(0.25),
            }),
            border: Some(Border {
                width: 1.0,
                color: Rgba8::WHITE.with_opacity(0.4),
            }),
            shadow: Some(Shadow {
                offset: Vec2::new(0.0, 25.0),
                blur: 50.0,
                spread: -12.0,
                color: Rgba8::BLACK.with_opacity(0.25),
            }),
            children: nodes,
        })
    }

    /// Centred, wrapping flex row; returns its height.
    fn header(
        &mut self,
        data: &CardData,
        left: f64,
        width: f64,
        top: f64,
        out: &mut Vec<CardNode>,
    ) -> f64 {
        let mut items = vec![self.wrap(
            HEADLINE,
            TextStyle::plain(48.0, Rgba8::WHITE).bold(),
            width,
        )];
        if !data.name.trim().is_empty() {
            let mut style = TextStyle::plain(48.0, Rgba8::rgb(0xfb, 0xbf, 0x24)).bold();
            style.shadow = Some(Shadow {
                offset: Vec2::new(2.0, 2.0),
                blur: 4.0,
                spread: 0.0,
                color: Rgba8::BLACK.with_opacity(0.3),
            });
            items.push(self.wrap(&data.name, style, width));
        }
        if !data.birth_date.is_empty() {
            items.push(self.wrap("•", TextStyle::plain(32.0, Rgba8::WHITE.with_opacity(0.5)), width));
            items.push(self.wrap(
                &data.birth_date,
                TextStyle::plain(32.0, Rgba8::WHITE.with_opacity(0.8)),
                width,
            ));
        }

        // Greedy flex-wrap into rows.
        let mut rows: Vec<Vec<Block>> = Vec::new();
        let mut row_w = 0.0;
        for item in items {
            let w = item.width();
            match rows.last_mut() {
                Some(row) if row_w + HEADER_GAP + w <= width => {
                    row_w += HEADER_GAP + w;
                    row.push(item);
                }
                _ => {
                    row_w = w;
                    rows.push(vec![item]);
                }
            }
        }

        let mut y = top;
        let row_count = rows.len();
        for (i, row) in rows.into_iter().enumerate() {
            let row_h = row.iter().map(Block::height).fold(0.0, f64::max);
            let total_w: f64 = row.iter().map(Block::width).sum::<f64>()
                + HEADER_GAP * row.len().saturating_sub(1) as f64;
            let mut x = left + (width - total_w) / 2.0;
            for item in row {
                let (w, h) = (item.width(), item.height());
                out.push(item.place_centered(x, w, y + (row_h - h) / 2.0));
                x += w + HEADER_GAP;
            }
            y += row_h;
            if i + 1 < row_count {
                y += HEADER_GAP;
            }
        }
        y - top
    }

    fn photo(&mut self, src: String, left: f64, width: f64, top: f64, out: &mut Vec<CardNode>) {
        let x = left + (width - PHOTO_SIZE) / 2.0;
        let frame = Rect::new(x, top, x + PHOTO_SIZE, top + PHOTO_SIZE);
        let inner = frame.inset(-PHOTO_BORDER);

        out.push(CardNode::Box(BoxNode {
            rect: frame,
            radius: PHOTO_RADIUS,
            background: Some(Paint::Solid {
                color: Rgba8::WHITE.with_opacity(0.1),
            }),
            border: Some(Border {
                width: PHOTO_BORDER,
                color: Rgba8::WHITE.with_opacity(0.4),
            }),
            shadow: Some(Shadow {
                offset: Vec2::new(0.0, 25.0),
                blur: 50.0,
                spread: -12.0,
                color: Rgba8::BLACK.with_opacity(0.5),
            }),
            children: vec![CardNode::Image(ImageNode {
                rect: inner,
                radius: PHOTO_RADIUS - PHOTO_BORDER,
                src,
                mirror_x: true,
            })],
        }));

        let hat_x = frame.center().x - HAT_WIDTH / 2.0;
        let hat_y = top - HAT_OFFSET_Y;
        out.push(CardNode::Vector(VectorNode {
            rect: Rect::new(hat_x, hat_y, hat_x + HAT_WIDTH, hat_y + HAT_HEIGHT),
            svg: HAT_SVG.to_string(),
        }));
    }

    /// Wish box; returns its height.
    fn wish(&mut self, wish: &str, left: f64, width: f64, top: f64, out: &mut Vec<CardNode>) -> f64 {
        let mut style = TextStyle::plain(WISH_FONT_PX, Rgba8::WHITE);
        style.line_height = f64::from(WISH_FONT_PX) * WISH_LINE_HEIGHT;
        let text_w = width - 2.0 * WISH_PADDING;
        let block = self.wrap(&format!("\"{wish}\""), style, text_w);
        let h = 2.0 * WISH_PADDING + block.height();
        let text = block.place_centered(left + WISH_PADDING, text_w, top + WISH_PADDING);

        out.push(CardNode::Box(BoxNode {
            rect: Rect::new(left, top, left + width, top + h),
            radius: WISH_RADIUS,
            background: Some(Paint::Solid {
                color: Rgba8::WHITE.with_opacity(0.2),
            }),
            border: Some(Border {
                width: 1.0,
                color: Rgba8::WHITE.with_opacity(0.3),
            }),
            shadow: None,
            children: vec![text],
        }));
        h
    }

    fn closing(&mut self, left: f64, width: f64, top: f64, out: &mut Vec<CardNode>) -> f64 {
        let first = self.wrap(
            CLOSING_PRIMARY,
            TextStyle::plain(20.0, Rgba8::WHITE.with_opacity(0.9)),
            width,
        );
        let second = self.wrap(
            CLOSING_SECONDARY,
            TextStyle::plain(16.0, Rgba8::WHITE.with_opacity(0.7)),
            width,
        );
        let first_h = first.height();
        let second_h = second.height();
        out.push(first.place_centered(left, width, top));
        out.push(second.place_centered(left, width, top + first_h + 8.0));
        first_h + 8.0 + second_h
    }
}

fn translate_y(node: &mut CardNode, dy: f64) {
    let shift = Vec2::new(0.0, dy);
    match node {
        CardNode::Box(b) => {
            b.rect = b.rect + shift;
            for child in &mut b.children {
                translate_y(child, dy);
            }
        }
        CardNode::Text(t) => {
            for line in &mut t.lines {
                line.baseline += dy;
            }
        }
        CardNode::Image(img) => img.rect = img.rect + shift,
        CardNode::Vector(v) => v.rect = v.rect + shift,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/layout.rs"]
mod tests;
