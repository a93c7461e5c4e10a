use crate::foundation::error::{LabelError, LabelResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

pub use kurbo::{Point, Rect};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_premul(self) -> [u8; 4] {
        crate::foundation::math::premul_rgba8(self.to_array())
    }
}

/// Largest edge accepted for a canvas; the glyph rasterizer addresses pixels with `u16`.
pub const MAX_CANVAS_EDGE: u32 = u16::MAX as u32;

/// Destination raster for one run.
///
/// Pixels are premultiplied RGBA8, row-major and tightly packed. Width and height are fixed at
/// allocation. A freshly allocated canvas is fully transparent black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> LabelResult<Self> {
        if width == 0 || height == 0 {
            return Err(LabelError::validation(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(LabelError::validation(format!(
                "canvas {width}x{height} exceeds {MAX_CANVAS_EDGE} pixels per edge"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LabelError::validation("canvas buffer size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Build a canvas from straight-alpha pixels.
    pub fn from_rgba_image(img: &image::RgbaImage) -> LabelResult<Self> {
        let mut canvas = Self::new(img.width(), img.height())?;
        canvas.data.copy_from_slice(img.as_raw());
        premultiply_rgba8_in_place(&mut canvas.data);
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_premul_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn premul_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        pixel_at(&self.data, self.width, self.height, x, y)
    }

    /// Export as straight-alpha pixels, the layout PNG stores.
    pub fn to_rgba_image(&self) -> LabelResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| LabelError::encode("canvas byte length does not match its dimensions"))
    }
}

/// Decoded background photograph, read-only once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundImage {
    width: u32,
    height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    rgba8_premul: Vec<u8>,
}

impl BackgroundImage {
    pub(crate) fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> LabelResult<Self> {
        if width == 0 || height == 0 {
            return Err(LabelError::decode(format!(
                "decoded image has empty dimensions {width}x{height}"
            )));
        }
        if rgba8_premul.len() != (width as usize) * (height as usize) * 4 {
            return Err(LabelError::decode("decoded image byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_premul_bytes(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        pixel_at(&self.rgba8_premul, self.width, self.height, x, y)
    }
}

fn pixel_at(data: &[u8], width: u32, height: u32, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= width || y >= height {
        return None;
    }
    let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
    Some([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]])
}
