use std::fmt::Write as _;
use std::io::Cursor;

use crate::foundation::error::{CardError, CardResult};

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Page size in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    /// 297 x 148.5 mm landscape, half an A4 sheet.
    pub const CARD_LANDSCAPE: Self = Self {
        width_mm: 297.0,
        height_mm: 148.5,
    };

    pub fn points(self) -> (f64, f64) {
        (self.width_mm * POINTS_PER_MM, self.height_mm * POINTS_PER_MM)
    }
}

/// Builds a downloadable page document around one encoded PNG.
pub trait DocumentEncoder: Send {
    fn name(&self) -> &'static str;

    /// Single-page document showing `png` scaled to fill a `page`-sized page.
    fn encode(&self, png: &[u8], page: PageSize, title: &str) -> CardResult<Vec<u8>>;
}

/// Minimal PDF 1.4 writer. The PNG's compressed image data is embedded as-is, using the
/// Flate PNG predictors, so the page image is lossless.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfEncoder;

impl DocumentEncoder for PdfEncoder {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn encode(&self, png: &[u8], page: PageSize, title: &str) -> CardResult<Vec<u8>> {
        if !(page.width_mm > 0.0 && page.height_mm > 0.0) {
            return Err(CardError::encoding("page size must be > 0"));
        }
        let images = PdfImages::from_png(png)?;
        let (pw, ph) = page.points();
        let pdf = write_pdf(&images, pw, ph, title);
        tracing::debug!(
            width = images.color.width,
            height = images.color.height,
            smask = images.alpha.is_some(),
            bytes = pdf.len(),
            "encoded pdf"
        );
        Ok(pdf)
    }
}

/// Flate-compressed, PNG-predicted image data lifted from a PNG stream.
#[derive(Debug)]
struct PngData {
    width: u32,
    height: u32,
    colors: u8,
    idat: Vec<u8>,
}

impl PngData {
    /// `Some` when the PNG can be embedded directly: 8-bit gray or RGB, not interlaced.
    fn parse(png: &[u8]) -> CardResult<Option<Self>> {
        let mut rest = png
            .strip_prefix(PNG_SIGNATURE.as_slice())
            .ok_or_else(|| CardError::encoding("not a PNG stream"))?;

        let mut header = None;
        let mut idat = Vec::new();
        while rest.len() >= 12 {
            let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
            let kind = &rest[4..8];
            let end = 8usize
                .checked_add(len)
                .filter(|&e| e + 4 <= rest.len())
                .ok_or_else(|| CardError::encoding("truncated PNG chunk"))?;
            let data = &rest[8..end];
            match kind {
                b"IHDR" if data.len() >= 13 => {
                    header = Some((
                        u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
                        u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
                        data[8],
                        data[9],
                        data[12],
                    ));
                }
                b"IDAT" => idat.extend_from_slice(data),
                b"IEND" => break,
                _ => {}
            }
            rest = &rest[end + 4..];
        }

        let (width, height, depth, color_type, interlace) =
            header.ok_or_else(|| CardError::encoding("PNG has no IHDR chunk"))?;
        if idat.is_empty() {
            return Err(CardError::encoding("PNG has no image data"));
        }
        let colors = match color_type {
            0 => 1,
            2 => 3,
            _ => return Ok(None),
        };
        if depth != 8 || interlace != 0 {
            return Ok(None);
        }
        Ok(Some(Self {
            width,
            height,
            colors,
            idat,
        }))
    }
}

struct PdfImages {
    color: PngData,
    alpha: Option<PngData>,
}

impl PdfImages {
    fn from_png(png: &[u8]) -> CardResult<Self> {
        if let Some(color) = PngData::parse(png)? {
            return Ok(Self { color, alpha: None });
        }

        // Alpha, palette or interlaced PNGs are re-encoded as an RGB image plus a gray mask.
        let rgba = image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .map_err(|e| CardError::encoding(format!("decode png for pdf: {e}")))?
            .to_rgba8();
        let (w, h) = rgba.dimensions();
        let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
        let mut alpha = Vec::with_capacity(w as usize * h as usize);
        for px in rgba.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        let opaque = alpha.iter().all(|&a| a == 255);

        let color = reencode(image::DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(w, h, rgb)
                .ok_or_else(|| CardError::encoding("rgb buffer size mismatch"))?,
        ))?;
        let alpha = if opaque {
            None
        } else {
            Some(reencode(image::DynamicImage::ImageLuma8(
                image::GrayImage::from_raw(w, h, alpha)
                    .ok_or_else(|| CardError::encoding("alpha buffer size mismatch"))?,
            ))?)
        };
        Ok(Self { color, alpha })
    }
}

fn reencode(img: image::DynamicImage) -> CardResult<PngData> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CardError::encoding(format!("png encode: {e}")))?;
    PngData::parse(&bytes)?.ok_or_else(|| CardError::encoding("re-encoded PNG is not embeddable"))
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn begin(&mut self, id: usize) {
        self.offsets[id - 1] = self.buf.len();
        self.text(&format!("{id} 0 obj\n"));
    }

    fn end(&mut self) {
        self.text("\nendobj\n");
    }

    fn text(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn object(&mut self, id: usize, body: &str) {
        self.begin(id);
        self.text(body);
        self.end();
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.begin(id);
        self.text(&format!("<< {dict} /Length {} >>\nstream\n", data.len()));
        self.buf.extend_from_slice(data);
        self.text("\nendstream");
        self.end();
    }
}

fn image_dict(img: &PngData, smask: Option<usize>) -> String {
    let mut d = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 \
         /Filter /FlateDecode /DecodeParms << /Predictor 15 /Colors {} /BitsPerComponent 8 /Columns {} >>",
        img.width,
        img.height,
        if img.colors == 1 { "/DeviceGray" } else { "/DeviceRGB" },
        img.colors,
        img.width
    );
    if let Some(id) = smask {
        let _ = write!(d, " /SMask {id} 0 R");
    }
    d
}

fn write_pdf(images: &PdfImages, page_w: f64, page_h: f64, title: &str) -> Vec<u8> {
    const CATALOG: usize = 1;
    const PAGES: usize = 2;
    const PAGE: usize = 3;
    const CONTENT: usize = 4;
    const IMAGE: usize = 5;
    const INFO: usize = 6;
    const SMASK: usize = 7;

    let count = if images.alpha.is_some() { SMASK } else { INFO };
    let mut w = PdfWriter {
        buf: Vec::new(),
        offsets: vec![0; count],
    };
    w.text("%PDF-1.4\n");
    w.buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let (pw, ph) = (num(page_w), num(page_h));
    w.object(CATALOG, &format!("<< /Type /Catalog /Pages {PAGES} 0 R >>"));
    w.object(PAGES, &format!("<< /Type /Pages /Kids [{PAGE} 0 R] /Count 1 >>"));
    w.object(
        PAGE,
        &format!(
            "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {pw} {ph}] \
             /Resources << /XObject << /Im0 {IMAGE} 0 R >> >> /Contents {CONTENT} 0 R >>"
        ),
    );
    let content = format!("q {pw} 0 0 {ph} 0 0 cm /Im0 Do Q");
    w.stream(CONTENT, "", content.as_bytes());
    w.stream(
        IMAGE,
        &image_dict(&images.color, images.alpha.as_ref().map(|_| SMASK)),
        &images.color.idat,
    );
    w.object(
        INFO,
        &format!(
            "<< /Title {} /Producer (birthday-card) >>",
            utf16_hex_string(title)
        ),
    );
    if let Some(alpha) = &images.alpha {
        w.stream(SMASK, &image_dict(alpha, None), &alpha.idat);
    }

    let xref_at = w.buf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count + 1);
    for off in &w.offsets {
        let _ = writeln!(xref, "{off:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root {CATALOG} 0 R /Info {INFO} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        count + 1
    );
    w.text(&xref);
    w.buf
}

/// Compact PDF number: at most two decimals, no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// PDF text string as UTF-16BE hex with a byte order mark.
fn utf16_hex_string(s: &str) -> String {
    let mut out = String::from("<FEFF");
    for unit in s.encode_utf16() {
        let _ = write!(out, "{unit:04X}");
    }
    out.push('>');
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/pdf.rs"]
mod tests;
