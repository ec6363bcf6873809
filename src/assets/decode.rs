use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;

use crate::assets::DecodedImage;
use crate::foundation::error::{CardError, CardResult};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CardResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Parse SVG text into a `usvg` tree using only the supplied font database.
pub fn parse_svg(text: &str, fontdb: Option<Arc<usvg::fontdb::Database>>) -> CardResult<usvg::Tree> {
    let mut opts = usvg::Options::default();
    if let Some(db) = fontdb {
        opts.fontdb = db;
    }
    let tree = usvg::Tree::from_str(text, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// MIME type of an encoded raster image, sniffed from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> CardResult<&'static str> {
    let format = image::guess_format(bytes).context("sniff image format")?;
    Ok(format.to_mime_type())
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> CardResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CardError::validation("image source is not a data: uri"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CardError::validation("data: uri has no payload separator"))?;
    if !header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(CardError::validation(
            "only base64 data: uris are supported for images",
        ));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decode base64 image payload")?;
    Ok(bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
