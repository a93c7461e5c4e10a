use image::imageops::FilterType;

use crate::foundation::core::{BackgroundImage, Canvas, Rect, Rgba8};
use crate::foundation::error::{LabelError, LabelResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// How the background is laid onto the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Copy pixels at the origin without scaling, clipped to the smaller size.
    ///
    /// A background smaller than the canvas leaves the remainder transparent black.
    DirectCopy,
    /// Bilinear resample to exactly fill the canvas, composited with "over".
    #[default]
    Resample,
}

/// Allocate a `width` x `height` canvas and fill it from `bg`.
#[tracing::instrument(skip(bg), fields(bg_w = bg.width(), bg_h = bg.height()))]
pub fn composite_background(
    bg: &BackgroundImage,
    width: u32,
    height: u32,
    policy: FillPolicy,
) -> LabelResult<Canvas> {
    let mut canvas = Canvas::new(width, height)?;
    match policy {
        FillPolicy::DirectCopy => {
            if bg.width() < width || bg.height() < height {
                tracing::warn!(
                    "background {}x{} is smaller than canvas {width}x{height}; uncovered pixels stay transparent",
                    bg.width(),
                    bg.height()
                );
            }
            copy_direct(&mut canvas, bg);
        }
        FillPolicy::Resample => scale_over(&mut canvas, bg)?,
    }
    Ok(canvas)
}

/// Lossless copy of the overlapping `min(W, bgW) x min(H, bgH)` region.
pub fn copy_direct(canvas: &mut Canvas, bg: &BackgroundImage) {
    let cw = canvas.width() as usize;
    let w = canvas.width().min(bg.width()) as usize;
    let h = canvas.height().min(bg.height()) as usize;
    let bw = bg.width() as usize;

    let src = bg.as_premul_bytes();
    let dst = canvas.premul_bytes_mut();
    for y in 0..h {
        let s = y * bw * 4;
        let d = y * cw * 4;
        dst[d..d + w * 4].copy_from_slice(&src[s..s + w * 4]);
    }
}

/// Resample `bg` to the canvas size and composite it over the current canvas content.
pub fn scale_over(canvas: &mut Canvas, bg: &BackgroundImage) -> LabelResult<()> {
    // Resampling premultiplied data keeps transparent edges from bleeding color.
    let src = image::RgbaImage::from_raw(bg.width(), bg.height(), bg.as_premul_bytes().to_vec())
        .ok_or_else(|| LabelError::decode("background byte length does not match its dimensions"))?;
    let scaled = if src.dimensions() == (canvas.width(), canvas.height()) {
        src
    } else {
        image::imageops::resize(&src, canvas.width(), canvas.height(), FilterType::Triangle)
    };
    premul_over_in_place(canvas.premul_bytes_mut(), scaled.as_raw())
}

/// Paint `rect` (clipped to the canvas) with a straight-alpha `color` using "over".
///
/// Returns the clipped pixel bounds `(x0, y0, x1, y1)` actually painted, if any.
pub fn fill_rect_over(
    canvas: &mut Canvas,
    rect: Rect,
    color: Rgba8,
) -> Option<(u32, u32, u32, u32)> {
    let clip = |v: f64, max: u32| -> u32 { v.round().clamp(0.0, f64::from(max)) as u32 };
    let (x0, x1) = (clip(rect.x0, canvas.width()), clip(rect.x1, canvas.width()));
    let (y0, y1) = (clip(rect.y0, canvas.height()), clip(rect.y1, canvas.height()));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let src = color.to_premul();
    let width = canvas.width() as usize;
    let data = canvas.premul_bytes_mut();
    for y in y0..y1 {
        let row = (y as usize) * width;
        for x in x0..x1 {
            let idx = (row + x as usize) * 4;
            let d = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
            data[idx..idx + 4].copy_from_slice(&over(d, src));
        }
    }
    Some((x0, y0, x1, y1))
}

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = src[3].saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        out[c] = src[c].saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
    }
    out
}

pub fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> LabelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LabelError::validation(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}
