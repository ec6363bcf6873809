use crate::foundation::core::byte_len;
use crate::foundation::error::{CardError, CardResult};

/// Separable gaussian blur over premultiplied RGBA8.
///
/// Used for particle glow and panel drop shadows. Edges clamp.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> CardResult<Vec<u8>> {
    let expected_len = byte_len(width, height)?;
    if src.len() != expected_len {
        return Err(CardError::rasterization(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// CSS-style blur radius to a kernel `(radius, sigma)` pair.
pub fn kernel_for_blur_px(blur_px: f32) -> (u32, f32) {
    if !blur_px.is_finite() || blur_px <= 0.0 {
        return (0, 1.0);
    }
    let sigma = (blur_px / 2.0).max(0.5);
    ((sigma * 3.0).ceil() as u32, sigma)
}

/// Resolution divisor for blurring `blur_px` cheaply: large blurs are drawn and blurred at a
/// reduced size, then scaled back up.
pub fn downsample_factor(blur_px: f32) -> u32 {
    let (_, sigma) = kernel_for_blur_px(blur_px);
    ((sigma / 2.0).floor() as u32).max(1)
}

/// Bilinear upscale of premultiplied RGBA8 from `sw`x`sh` to `dw`x`dh`.
pub fn upscale_bilinear_rgba8(
    src: &[u8],
    sw: u32,
    sh: u32,
    dw: u32,
    dh: u32,
) -> CardResult<Vec<u8>> {
    if src.len() != byte_len(sw, sh)? || sw == 0 || sh == 0 {
        return Err(CardError::rasterization(
            "upscale_bilinear_rgba8 expects a non-empty src matching sw*sh*4",
        ));
    }
    let mut out = vec![0u8; byte_len(dw, dh)?];
    let fx = sw as f32 / dw.max(1) as f32;
    let fy = sh as f32 / dh.max(1) as f32;
    let at = |x: u32, y: u32| ((y * sw + x) as usize) * 4;

    for y in 0..dh {
        let sy = ((y as f32 + 0.5) * fy - 0.5).clamp(0.0, (sh - 1) as f32);
        let y0 = sy.floor() as u32;
        let y1 = (y0 + 1).min(sh - 1);
        let ty = sy - y0 as f32;
        for x in 0..dw {
            let sx = ((x as f32 + 0.5) * fx - 0.5).clamp(0.0, (sw - 1) as f32);
            let x0 = sx.floor() as u32;
            let x1 = (x0 + 1).min(sw - 1);
            let tx = sx - x0 as f32;
            let (a, b, c, d) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));
            let o = ((y * dw + x) as usize) * 4;
            for ch in 0..4 {
                let top = f32::from(src[a + ch]) * (1.0 - tx) + f32::from(src[b + ch]) * tx;
                let bottom = f32::from(src[c + ch]) * (1.0 - tx) + f32::from(src[d + ch]) * tx;
                out[o + ch] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CardResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(CardError::rasterization("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Put the rounding residue on the center tap so the kernel sums to exactly 1.0 in Q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
