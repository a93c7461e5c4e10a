use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{LabelError, LabelResult};
use crate::render::composite::{fill_rect_over, premul_over_in_place};
use crate::text::face::{FontFace, Hinting, ShapedText, VMetrics};

/// Vertical placement of the baseline relative to the reference point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Reference marks the bottom edge of the composition; the baseline sits `offset_px` above it.
    BottomOffset { offset_px: f32 },
    /// Reference marks the vertical center; the baseline drops by half the line height.
    Centered,
}

impl Default for Placement {
    fn default() -> Self {
        Self::BottomOffset { offset_px: 30.0 }
    }
}

impl Placement {
    /// Reference point used when the caller does not supply one.
    pub fn default_reference(self, width: u32, height: u32) -> Point {
        let x = f64::from(width) / 2.0;
        match self {
            Self::BottomOffset { .. } => Point::new(x, f64::from(height)),
            Self::Centered => Point::new(x, f64::from(height) / 2.0),
        }
    }

    pub fn baseline_y(self, reference_y: f64, metrics: VMetrics) -> f64 {
        match self {
            Self::BottomOffset { offset_px } => reference_y - f64::from(offset_px),
            Self::Centered => reference_y + f64::from(metrics.line_height) / 2.0,
        }
    }
}

/// Horizontal extent of the contrast panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelSpan {
    #[default]
    FullCanvas,
    /// `width_px` wide, centered on the reference x.
    Centered { width_px: f32 },
}

/// Translucent band painted behind the label.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PanelSpec {
    pub color: Rgba8,
    pub padding_px: f32,
    pub span: PanelSpan,
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self {
            color: Rgba8::new(0, 0, 0, 128),
            padding_px: 30.0,
            span: PanelSpan::FullCanvas,
        }
    }
}

impl PanelSpec {
    /// Band from half a line above the baseline (plus padding) down to padding below it.
    pub fn rect(&self, reference: Point, baseline_y: f64, metrics: VMetrics, canvas_width: u32) -> Rect {
        let pad = f64::from(self.padding_px);
        let y0 = (baseline_y - f64::from(metrics.line_height) / 2.0 - pad).floor();
        let y1 = (baseline_y + pad).ceil();
        let (x0, x1) = match self.span {
            PanelSpan::FullCanvas => (0.0, f64::from(canvas_width)),
            PanelSpan::Centered { width_px } => {
                let half = f64::from(width_px) / 2.0;
                (reference.x - half, reference.x + half)
            }
        };
        Rect::new(x0, y0, x1, y1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub color: Rgba8,
    pub placement: Placement,
    pub panel: Option<PanelSpec>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            placement: Placement::default(),
            panel: Some(PanelSpec::default()),
        }
    }
}

/// Where a label lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLayout {
    pub reference: Point,
    /// Left end of the baseline; glyph drawing starts here.
    pub origin: Point,
    pub advance: f64,
    pub metrics: VMetrics,
    pub panel: Option<Rect>,
}

pub fn compute_layout(
    reference: Point,
    advance: f32,
    metrics: VMetrics,
    style: &LabelStyle,
    canvas_width: u32,
) -> LabelLayout {
    let advance = f64::from(advance);
    let baseline_y = style.placement.baseline_y(reference.y, metrics);
    let origin = Point::new(reference.x - advance / 2.0, baseline_y);
    let panel = style
        .panel
        .map(|p| p.rect(reference, baseline_y, metrics, canvas_width));
    LabelLayout {
        reference,
        origin,
        advance,
        metrics,
        panel,
    }
}

/// Center `text` on `reference`, paint the optional panel, then draw the glyphs on top.
///
/// Text wider than the canvas overflows its edges.
#[tracing::instrument(skip(canvas, face, style), fields(face = face.family()))]
pub fn render_label(
    canvas: &mut Canvas,
    face: &mut FontFace,
    text: &str,
    reference: Point,
    style: &LabelStyle,
) -> LabelResult<LabelLayout> {
    let shaped = face.shape(text, style.color)?;
    let layout = compute_layout(reference, shaped.advance, face.metrics(), style, canvas.width());
    tracing::debug!(advance = layout.advance, origin = ?layout.origin, panel = ?layout.panel, "label layout");

    if let (Some(rect), Some(panel)) = (layout.panel, style.panel) {
        fill_rect_over(canvas, rect, panel.color);
    }
    if !text.is_empty() {
        draw_glyphs(canvas, face, &shaped, layout.origin)?;
    }
    Ok(layout)
}

fn draw_glyphs(
    canvas: &mut Canvas,
    face: &FontFace,
    shaped: &ShapedText,
    origin: Point,
) -> LabelResult<()> {
    let w: u16 = canvas
        .width()
        .try_into()
        .map_err(|_| LabelError::validation("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height()
        .try_into()
        .map_err(|_| LabelError::validation("canvas height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        origin.x,
        origin.y - f64::from(shaped.baseline),
    )));

    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(face.font_data())
                .font_size(run.run().font_size())
                .hint(face.hinting() == Hinting::Full)
                .fill_glyphs(glyphs);
        }
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    premul_over_in_place(canvas.premul_bytes_mut(), pixmap.data_as_u8_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::face::FaceOptions;

    const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts/DejaVuSans.ttf");

    fn metrics() -> VMetrics {
        VMetrics {
            ascent: 60.0,
            descent: 15.0,
            leading: 0.0,
            line_height: 75.0,
        }
    }

    fn gray_canvas(w: u32, h: u32) -> Canvas {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([100, 100, 100, 255]));
        Canvas::from_rgba_image(&img).unwrap()
    }

    #[test]
    fn horizontal_centering_holds() {
        let style = LabelStyle::default();
        for advance in [0.0f32, 1.0, 37.5, 211.25, 900.0] {
            let l = compute_layout(Point::new(300.0, 600.0), advance, metrics(), &style, 600);
            assert!((l.origin.x + l.advance / 2.0 - 300.0).abs() <= 1.0 / 64.0);
        }
    }

    #[test]
    fn bottom_offset_places_baseline_above_reference() {
        let style = LabelStyle::default();
        let l = compute_layout(Point::new(300.0, 600.0), 100.0, metrics(), &style, 600);
        assert_eq!(l.origin, Point::new(250.0, 570.0));
        // 570 - 75/2 - 30 = 502.5 -> floor; 570 + 30 -> ceil
        assert_eq!(l.panel, Some(Rect::new(0.0, 502.0, 600.0, 600.0)));
    }

    #[test]
    fn centered_mode_drops_baseline_half_a_line() {
        let style = LabelStyle {
            placement: Placement::Centered,
            panel: None,
            ..LabelStyle::default()
        };
        let reference = Placement::Centered.default_reference(400, 200);
        assert_eq!(reference, Point::new(200.0, 100.0));
        let l = compute_layout(reference, 80.0, metrics(), &style, 400);
        assert_eq!(l.origin, Point::new(160.0, 137.5));
        assert_eq!(l.panel, None);
    }

    #[test]
    fn centered_panel_span_is_symmetric() {
        let panel = PanelSpec {
            span: PanelSpan::Centered { width_px: 100.0 },
            ..PanelSpec::default()
        };
        let r = panel.rect(Point::new(300.0, 0.0), 570.0, metrics(), 600);
        assert_eq!((r.x0, r.x1), (250.0, 350.0));
    }

    #[test]
    fn render_draws_white_text_over_dark_band() {
        let mut canvas = gray_canvas(300, 200);
        let mut face = FontFace::load(std::fs::read(FONT).unwrap(), FaceOptions::default()).unwrap();
        let reference = Placement::default().default_reference(300, 200);
        let layout = render_label(&mut canvas, &mut face, "Hi", reference, &LabelStyle::default())
            .unwrap();
        face.release();

        // Above the band the background is untouched.
        assert_eq!(canvas.pixel(5, 5), Some([100, 100, 100, 255]));
        // The band darkens where no glyph is drawn.
        assert_eq!(canvas.pixel(2, 195), Some([50, 50, 50, 255]));

        let baseline = layout.origin.y as u32;
        let mut white = Vec::new();
        for y in baseline.saturating_sub(45)..baseline {
            for x in 0..300 {
                if canvas.pixel(x, y) == Some([255, 255, 255, 255]) {
                    white.push(x);
                }
            }
        }
        assert!(!white.is_empty(), "no opaque white glyph pixels");
        let (min, max) = (white.iter().min().unwrap(), white.iter().max().unwrap());
        let mid = f64::from(min + max) / 2.0;
        assert!((mid - 150.0).abs() < 8.0, "ink centered at {mid}");
    }

    #[test]
    fn overflowing_text_is_not_an_error() {
        let mut canvas = gray_canvas(40, 40);
        let mut face = FontFace::load(std::fs::read(FONT).unwrap(), FaceOptions::default()).unwrap();
        let style = LabelStyle {
            placement: Placement::Centered,
            ..LabelStyle::default()
        };
        let layout = render_label(
            &mut canvas,
            &mut face,
            "far too wide for this canvas",
            Point::new(20.0, 20.0),
            &style,
        )
        .unwrap();
        assert!(layout.origin.x < 0.0);
    }
}
