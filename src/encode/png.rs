use std::io::Cursor;

use crate::foundation::core::Bitmap;
use crate::foundation::error::{CardError, CardResult};

/// Encode `bitmap` as an RGBA8 PNG.
pub fn encode_png(bitmap: &Bitmap) -> CardResult<Vec<u8>> {
    let rgba = image::RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.to_straight_rgba8())
        .ok_or_else(|| CardError::encoding("bitmap byte length does not match its size"))?;

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| CardError::encoding(format!("png encode: {e}")))?;
    tracing::debug!(
        width = bitmap.width,
        height = bitmap.height,
        bytes = out.len(),
        "encoded png"
    );
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
