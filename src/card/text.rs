use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::config::ExportConfig;
use crate::foundation::error::CardResult;

/// Raw bytes of one font face (index selects the face inside a collection).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceBytes {
    pub data: Arc<Vec<u8>>,
    pub index: u32,
}

/// Fonts available to card layout and rasterization.
///
/// Layout never fails for lack of fonts: without faces, text widths are estimated and the
/// rasterizers skip glyph drawing.
#[derive(Clone)]
pub struct FontBook {
    regular: Option<FaceBytes>,
    bold: Option<FaceBytes>,
    family: Option<String>,
    db: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("regular", &self.regular.as_ref().map(|f| f.data.len()))
            .field("bold", &self.bold.as_ref().map(|f| f.data.len()))
            .field("family", &self.family)
            .field("db_faces", &self.db.len())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    pub fn empty() -> Self {
        Self {
            regular: None,
            bold: None,
            family: None,
            db: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_font_data(regular.clone());
        let family = first_family(&db, db.faces().next().map(|f| f.id));
        if let Some(b) = &bold {
            db.load_font_data(b.clone());
        }
        Self {
            regular: Some(FaceBytes {
                data: Arc::new(regular),
                index: 0,
            }),
            bold: bold.map(|b| FaceBytes {
                data: Arc::new(b),
                index: 0,
            }),
            family,
            db: Arc::new(db),
        }
    }

    pub fn from_files(regular: &Path, bold: Option<&Path>) -> CardResult<Self> {
        let r = std::fs::read(regular)
            .with_context(|| format!("read font '{}'", regular.display()))?;
        let b = match bold {
            Some(p) => Some(std::fs::read(p).with_context(|| format!("read font '{}'", p.display()))?),
            None => None,
        };
        Ok(Self::from_bytes(r, b))
    }

    /// Sans-serif faces from the system font database, if any are installed.
    pub fn system() -> Self {
        use usvg::fontdb::{Family, Query, Style, Weight};

        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let find = |weight: Weight| -> Option<usvg::fontdb::ID> {
            db.query(&Query {
                families: &[Family::SansSerif],
                weight,
                ..Query::default()
            })
            .or_else(|| {
                db.faces()
                    .find(|f| f.weight == weight && f.style == Style::Normal)
                    .map(|f| f.id)
            })
        };
        let bytes = |id: usvg::fontdb::ID| -> Option<FaceBytes> {
            db.with_face_data(id, |data, index| FaceBytes {
                data: Arc::new(data.to_vec()),
                index,
            })
        };

        let regular_id = find(Weight::NORMAL).or_else(|| db.faces().next().map(|f| f.id));
        let regular = regular_id.and_then(bytes);
        // The query returns the closest weight; a regular face is no bold face.
        let bold = find(Weight::BOLD)
            .filter(|&id| Some(id) != regular_id)
            .filter(|&id| db.face(id).is_some_and(|f| f.weight.0 >= Weight::SEMIBOLD.0))
            .and_then(bytes);
        let family = first_family(&db, regular_id);

        if regular.is_none() {
            tracing::warn!("no system fonts found; card text will be measured by estimate only");
        }
        tracing::debug!(faces = db.len(), has_bold = bold.is_some(), "loaded system fonts");

        Self {
            regular,
            bold,
            family,
            db: Arc::new(db),
        }
    }

    /// Explicit font files from the config win; otherwise the system faces are used.
    pub fn from_config(cfg: &ExportConfig) -> CardResult<Self> {
        match &cfg.font_regular {
            Some(regular) => Self::from_files(regular, cfg.font_bold.as_deref()),
            None => Ok(Self::system()),
        }
    }

    pub fn has_faces(&self) -> bool {
        self.regular.is_some()
    }

    /// Bold text is drawn from the regular face with emboldened outlines.
    pub fn synthesizes_bold(&self) -> bool {
        self.regular.is_some() && self.bold.is_none()
    }

    /// Face used for the requested weight; bold falls back to regular.
    pub fn face(&self, bold: bool) -> Option<&FaceBytes> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }
    }

    /// Family name of the regular face, as the SVG renderer knows it.
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    /// Font database handed to the SVG renderer.
    pub fn fontdb(&self) -> Arc<usvg::fontdb::Database> {
        self.db.clone()
    }
}

fn first_family(db: &usvg::fontdb::Database, id: Option<usvg::fontdb::ID>) -> Option<String> {
    let face = db.face(id?)?;
    face.families.first().map(|(name, _)| name.clone())
}

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Face a shaped line is drawn with.
pub(crate) struct LineFace {
    pub(crate) font: vello_cpu::peniko::FontData,
    /// Stroke the glyph outlines on top of the fill to fake a bold weight.
    pub(crate) embolden: bool,
}

/// Outline stroke width for faux bold: 2px at 48px.
pub(crate) fn embolden_stroke_width(size_px: f32) -> f64 {
    f64::from(size_px.max(0.0)) / 24.0
}

struct RegisteredFace {
    family: String,
    font: vello_cpu::peniko::FontData,
    synthetic_weight: bool,
}

/// Parley-backed shaping for single lines, with a deterministic estimate when no face exists.
pub(crate) struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    regular: Option<RegisteredFace>,
    bold: Option<RegisteredFace>,
}

impl TextShaper {
    pub(crate) fn new(fonts: &FontBook) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let mut register = |face: &FaceBytes, synthetic_weight: bool| -> Option<RegisteredFace> {
            let families = font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(face.data.as_ref().clone()),
                None,
            );
            let family_id = families.first().map(|(id, _)| *id)?;
            let family = font_ctx.collection.family_name(family_id)?.to_string();
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(face.data.as_ref().clone()),
                face.index,
            );
            Some(RegisteredFace {
                family,
                font,
                synthetic_weight,
            })
        };

        let regular = fonts.regular.as_ref().and_then(|f| register(f, false));
        let bold = match (&fonts.bold, &fonts.regular) {
            (Some(b), _) => register(b, false),
            (None, Some(r)) => register(r, true),
            (None, None) => None,
        };

        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            regular,
            bold,
        }
    }

    pub(crate) fn has_faces(&self) -> bool {
        self.regular.is_some()
    }

    /// Advance width of `text` on one line.
    pub(crate) fn measure(&mut self, text: &str, size_px: f32, bold: bool) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        match self.layout_line(text, size_px, bold, TextBrush::default()) {
            Some((layout, _)) => f64::from(layout.width()),
            None => estimate_width(text, size_px, bold),
        }
    }

    /// Shape `text` as a single unbroken line; also returns the face to draw its glyphs with.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        bold: bool,
        brush: TextBrush,
    ) -> Option<(parley::Layout<TextBrush>, LineFace)> {
        let face = if bold {
            self.bold.as_ref().or(self.regular.as_ref())?
        } else {
            self.regular.as_ref()?
        };
        if !size_px.is_finite() || size_px <= 0.0 {
            return None;
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        if bold && !face.synthetic_weight {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Some((
            layout,
            LineFace {
                font: face.font.clone(),
                embolden: bold && face.synthetic_weight,
            },
        ))
    }
}

/// Width estimate used when no font face is available.
pub(crate) fn estimate_width(text: &str, size_px: f32, bold: bool) -> f64 {
    let em = f64::from(size_px);
    let narrow = if bold { 0.6 } else { 0.55 };
    text.chars()
        .map(|c| {
            if c == ' ' {
                0.28 * em
            } else if c.is_ascii() {
                narrow * em
            } else {
                em
            }
        })
        .sum()
}

/// Greedy word wrap. Runs of whitespace collapse to one space, as in HTML flow text; a word
/// wider than `max_width` sits alone on its line.
pub(crate) fn wrap_words(
    text: &str,
    max_width: f64,
    mut measure: impl FnMut(&str) -> f64,
) -> Vec<(String, f64)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measure(&candidate) <= max_width {
            current = candidate;
        } else {
            let w = measure(&current);
            lines.push((std::mem::take(&mut current), w));
            current = word.to_string();
        }
    }
    let w = measure(&current);
    lines.push((current, w));
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/card/text.rs"]
mod tests;
