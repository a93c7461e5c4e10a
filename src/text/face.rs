use std::borrow::Cow;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{LabelError, LabelResult};

/// Largest pixel size a face may be built at.
pub const MAX_FONT_SIZE_PX: f32 = 4096.0;

/// Rasterization resolution; point sizes convert to pixels as `pt * dpi / 72`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dpi {
    #[default]
    Print72,
    Screen96,
}

impl Dpi {
    pub fn value(self) -> u32 {
        match self {
            Self::Print72 => 72,
            Self::Screen96 => 96,
        }
    }
}

impl TryFrom<u32> for Dpi {
    type Error = String;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            72 => Ok(Self::Print72),
            96 => Ok(Self::Screen96),
            other => Err(format!("unsupported dpi {other}, expected 72 or 96")),
        }
    }
}

impl From<Dpi> for u32 {
    fn from(d: Dpi) -> Self {
        d.value()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hinting {
    None,
    #[default]
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FaceOptions {
    pub size_pt: f32,
    pub dpi: Dpi,
    pub hinting: Hinting,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            size_pt: 64.0,
            dpi: Dpi::Print72,
            hinting: Hinting::Full,
        }
    }
}

impl FaceOptions {
    pub fn size_px(&self) -> f32 {
        self.size_pt * self.dpi.value() as f32 / 72.0
    }
}

/// Vertical metrics in pixels at the face's size. `descent` is positive (below the baseline).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub line_height: f32,
}

/// A label shaped against one face: glyph layout plus its measurements.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<Rgba8>,
    /// Total horizontal advance in pixels.
    pub(crate) advance: f32,
    /// Baseline offset from the layout's top edge.
    pub(crate) baseline: f32,
}

/// A parsed font program at a fixed size, ready to measure and draw.
///
/// The face owns its shaping contexts and font data for the duration of one render. Dropping it,
/// or calling [`FontFace::release`], frees them.
pub struct FontFace {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    family: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
    hinting: Hinting,
    metrics: VMetrics,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("size_px", &self.size_px)
            .field("hinting", &self.hinting)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl FontFace {
    #[tracing::instrument(skip(font_bytes), fields(bytes = font_bytes.len()))]
    pub fn load(font_bytes: Vec<u8>, opts: FaceOptions) -> LabelResult<Self> {
        if font_bytes.is_empty() {
            return Err(LabelError::font_parse("font data is empty"));
        }
        let size_px = opts.size_px();
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(LabelError::face_creation(format!(
                "font size must be finite and > 0, got {}pt at {} dpi",
                opts.size_pt,
                opts.dpi.value()
            )));
        }
        if size_px > MAX_FONT_SIZE_PX {
            return Err(LabelError::face_creation(format!(
                "font size {size_px}px exceeds {MAX_FONT_SIZE_PX}px"
            )));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| LabelError::font_parse("no font faces found in font data"))?;

        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LabelError::face_creation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);

        let mut face = Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font,
            size_px,
            hinting: opts.hinting,
            metrics: VMetrics::default(),
        };

        let probe = face.shape("Hg", Rgba8::WHITE)?;
        face.metrics = line_metrics(&probe.layout).ok_or_else(|| {
            LabelError::face_creation(format!("font '{}' produced no line metrics", face.family))
        })?;

        tracing::debug!(family = %face.family, size_px, metrics = ?face.metrics, "loaded font face");
        Ok(face)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn hinting(&self) -> Hinting {
        self.hinting
    }

    pub fn metrics(&self) -> VMetrics {
        self.metrics
    }

    /// Total horizontal advance of `text` at this face's size, kerning included.
    pub fn measure(&mut self, text: &str) -> LabelResult<f32> {
        self.shape(text, Rgba8::WHITE).map(|s| s.advance)
    }

    /// Release the face. Consuming `self` makes a second release impossible.
    pub fn release(self) {
        drop(self);
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Labels are a single line: hard breaks are shaped as spaces.
    pub(crate) fn shape(&mut self, text: &str, color: Rgba8) -> LabelResult<ShapedText> {
        let text = single_line(text);
        let text = text.as_ref();
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(color));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);

        // An empty layout still holds one placeholder space.
        let advance = if text.is_empty() {
            0.0
        } else {
            layout
                .lines()
                .map(|line| line.metrics().advance)
                .fold(0.0f32, f32::max)
        };
        let baseline = layout
            .lines()
            .next()
            .map(|line| line.metrics().baseline)
            .unwrap_or(self.metrics.ascent);

        Ok(ShapedText {
            layout,
            advance,
            baseline,
        })
    }
}

impl Drop for FontFace {
    fn drop(&mut self) {
        tracing::debug!(family = %self.family, "released font face");
    }
}

fn single_line(text: &str) -> Cow<'_, str> {
    let is_break = |c: char| {
        matches!(
            c,
            '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
        )
    };
    if !text.contains(is_break) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", " ").replace(is_break, " "))
}

fn line_metrics(layout: &parley::Layout<Rgba8>) -> Option<VMetrics> {
    let line = layout.lines().next()?;
    let m = line.metrics();
    let descent = m.descent.abs();
    Some(VMetrics {
        ascent: m.ascent,
        descent,
        leading: m.leading,
        line_height: m.ascent + descent + m.leading,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts/DejaVuSans.ttf");

    fn font_bytes() -> Vec<u8> {
        std::fs::read(FONT).unwrap()
    }

    fn face(size_pt: f32) -> FontFace {
        FontFace::load(
            font_bytes(),
            FaceOptions {
                size_pt,
                ..FaceOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn load_exposes_family_and_metrics() {
        let f = face(64.0);
        assert_eq!(f.family(), "DejaVu Sans");
        assert_eq!(f.size_px(), 64.0);
        let m = f.metrics();
        assert!(m.ascent > 0.0 && m.descent > 0.0, "{m:?}");
        assert!(m.line_height >= m.ascent + m.descent);
        assert!(m.line_height < 64.0 * 2.0);
    }

    #[test]
    fn dpi_scales_pixel_size() {
        let opts = FaceOptions {
            size_pt: 48.0,
            dpi: Dpi::Screen96,
            hinting: Hinting::Full,
        };
        assert_eq!(opts.size_px(), 64.0);
        assert_eq!(FaceOptions::default().size_px(), 64.0);
    }

    #[test]
    fn measure_grows_with_text_and_size() {
        let mut small = face(32.0);
        let w1 = small.measure("W").unwrap();
        let w2 = small.measure("WW").unwrap();
        assert!(w1 > 0.0);
        assert!((w2 - 2.0 * w1).abs() < 1.0, "{w1} {w2}");
        assert_eq!(small.measure("").unwrap(), 0.0);

        let mut big = face(64.0);
        let ratio = big.measure("Vlad").unwrap() / small.measure("Vlad").unwrap();
        assert!((ratio - 2.0).abs() < 0.15, "{ratio}");
    }

    #[test]
    fn line_breaks_shape_on_one_baseline() {
        let mut f = face(20.0);
        let flat = f.measure("ab cd").unwrap();
        assert_eq!(f.measure("ab\ncd").unwrap(), flat);
        assert_eq!(f.measure("ab\r\ncd").unwrap(), flat);

        let shaped = f.shape("ab\ncd\u{2028}ef", Rgba8::WHITE).unwrap();
        assert_eq!(shaped.layout.lines().count(), 1);
    }

    #[test]
    fn empty_text_has_no_advance_but_keeps_baseline() {
        let mut f = face(32.0);
        let shaped = f.shape("", Rgba8::WHITE).unwrap();
        assert_eq!(shaped.advance, 0.0);
        assert!(shaped.baseline > 0.0);
    }

    #[test]
    fn malformed_font_is_parse_error() {
        let err = FontFace::load(b"not a font program".to_vec(), FaceOptions::default()).unwrap_err();
        assert!(matches!(err, LabelError::FontParse(_)), "{err:?}");
        let err = FontFace::load(Vec::new(), FaceOptions::default()).unwrap_err();
        assert!(matches!(err, LabelError::FontParse(_)), "{err:?}");
    }

    #[test]
    fn invalid_size_is_face_creation_error() {
        for size_pt in [0.0, -3.0, f32::NAN, f32::INFINITY, 100_000.0] {
            let err = FontFace::load(
                font_bytes(),
                FaceOptions {
                    size_pt,
                    ..FaceOptions::default()
                },
            )
            .unwrap_err();
            assert!(matches!(err, LabelError::FaceCreation(_)), "{size_pt}: {err:?}");
        }
    }

    #[test]
    fn dpi_parses_only_supported_values() {
        assert_eq!(Dpi::try_from(72).unwrap(), Dpi::Print72);
        assert_eq!(Dpi::try_from(96).unwrap(), Dpi::Screen96);
        assert!(Dpi::try_from(300).is_err());
        let d: Dpi = serde_json::from_str("96").unwrap();
        assert_eq!(d, Dpi::Screen96);
        assert_eq!(serde_json::to_string(&Dpi::Print72).unwrap(), "72");
    }

    #[test]
    fn release_is_clean() {
        let mut f = face(24.0);
        f.measure("bye").unwrap();
        f.release();
    }
}
