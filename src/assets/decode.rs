use std::io::{BufRead, Cursor, Read, Seek, SeekFrom};

use image::ImageFormat;

use crate::foundation::core::BackgroundImage;
use crate::foundation::error::{LabelError, LabelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Number of leading bytes inspected to classify a background.
pub const SNIFF_LEN: usize = 512;

/// Classify a byte prefix by signature. Only JPEG and PNG are accepted.
pub fn sniff_format(prefix: &[u8]) -> LabelResult<ImageFormat> {
    match image::guess_format(prefix) {
        Ok(ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(other) => Err(LabelError::unsupported(other.to_mime_type())),
        Err(_) => Err(LabelError::unsupported(describe_unknown(prefix))),
    }
}

/// Sniff, rewind, and decode a background stream into premultiplied RGBA8.
#[tracing::instrument(skip(src))]
pub fn decode_background<R: BufRead + Seek>(mut src: R) -> LabelResult<BackgroundImage> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    src.by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| LabelError::decode(format!("read background prefix: {e}")))?;

    let format = sniff_format(&prefix)?;
    tracing::debug!(?format, sniffed = prefix.len(), "classified background");

    src.seek(SeekFrom::Start(0))
        .map_err(|e| LabelError::decode(format!("rewind background stream: {e}")))?;

    let dyn_img = image::load(src, format)
        .map_err(|e| LabelError::decode(format!("decode {format:?} background: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(width, height, "decoded background");
    BackgroundImage::from_premul(width, height, rgba8_premul)
}

pub fn decode_background_bytes(bytes: &[u8]) -> LabelResult<BackgroundImage> {
    decode_background(Cursor::new(bytes))
}

// Coarse label for content with no image signature, only used in error messages.
fn describe_unknown(prefix: &[u8]) -> String {
    if prefix.is_empty() {
        return "empty input".to_string();
    }
    let texty = std::str::from_utf8(prefix).is_ok_and(|s| {
        s.chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t' | '\x0c'))
    });
    if texty {
        "text/plain".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}
