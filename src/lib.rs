#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod encode;
mod foundation;
pub mod pipeline;
pub mod render;
pub mod text;

pub use assets::decode::{decode_background, decode_background_bytes, sniff_format};
pub use assets::store::{
    BackgroundPolicy, BackgroundStore, DirStore, MemoryStore, ResolvedBackground,
    read_font_resource, resolve_background,
};
pub use config::LabelJob;
pub use encode::png::{FileSink, InMemorySink, OutputSink, encode_png, write_png};
pub use foundation::core::{BackgroundImage, Canvas, MAX_CANVAS_EDGE, Point, Rect, Rgba8};
pub use foundation::error::{LabelError, LabelResult};
pub use pipeline::{compose, create_image, render_to_sink};
pub use render::composite::{FillPolicy, composite_background};
pub use text::face::{Dpi, FaceOptions, FontFace, Hinting, VMetrics};
pub use text::label::{
    LabelLayout, LabelStyle, PanelSpan, PanelSpec, Placement, compute_layout, render_label,
};
