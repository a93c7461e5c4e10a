use std::path::{Path, PathBuf};

use crate::assets::store::BackgroundPolicy;
use crate::foundation::core::{MAX_CANVAS_EDGE, Point};
use crate::foundation::error::{LabelError, LabelResult};
use crate::render::composite::FillPolicy;
use crate::text::face::FaceOptions;
use crate::text::label::{LabelStyle, PanelSpan, Placement};

/// Everything one run needs, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelJob {
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub font: PathBuf,
    pub face: FaceOptions,
    /// Directory the background policy's names are resolved against.
    pub images_dir: PathBuf,
    pub background: BackgroundPolicy,
    /// Seed for background selection; `None` draws from the thread RNG.
    pub seed: Option<u64>,
    pub fill: FillPolicy,
    pub style: LabelStyle,
    /// Overrides the placement's default reference point.
    pub reference: Option<Point>,
    pub output: PathBuf,
}

impl Default for LabelJob {
    fn default() -> Self {
        Self {
            text: String::new(),
            width: 600,
            height: 600,
            font: PathBuf::from("OpenSans-SemiBold.ttf"),
            face: FaceOptions::default(),
            images_dir: PathBuf::from("images"),
            background: BackgroundPolicy::default(),
            seed: None,
            fill: FillPolicy::default(),
            style: LabelStyle::default(),
            reference: None,
            output: PathBuf::from("output.png"),
        }
    }
}

impl LabelJob {
    pub fn from_path(path: &Path) -> LabelResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LabelError::not_found("config", path, e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> LabelResult<Self> {
        serde_json::from_str(raw).map_err(|e| LabelError::validation(format!("label job JSON: {e}")))
    }

    pub fn validate(&self) -> LabelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LabelError::validation(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_CANVAS_EDGE || self.height > MAX_CANVAS_EDGE {
            return Err(LabelError::validation(format!(
                "canvas {}x{} exceeds {MAX_CANVAS_EDGE} pixels per edge",
                self.width, self.height
            )));
        }

        self.background.validate()?;

        if let Placement::BottomOffset { offset_px } = self.style.placement
            && !offset_px.is_finite()
        {
            return Err(LabelError::validation("placement offset must be finite"));
        }
        if let Some(panel) = &self.style.panel {
            if !panel.padding_px.is_finite() || panel.padding_px < 0.0 {
                return Err(LabelError::validation("panel padding must be finite and >= 0"));
            }
            if let PanelSpan::Centered { width_px } = panel.span
                && (!width_px.is_finite() || width_px <= 0.0)
            {
                return Err(LabelError::validation("panel width must be finite and > 0"));
            }
        }
        if let Some(p) = self.reference
            && !(p.x.is_finite() && p.y.is_finite())
        {
            return Err(LabelError::validation("reference point must be finite"));
        }
        Ok(())
    }

    pub fn reference_point(&self) -> Point {
        self.reference.unwrap_or_else(|| {
            self.style
                .placement
                .default_reference(self.width, self.height)
        })
    }
}
