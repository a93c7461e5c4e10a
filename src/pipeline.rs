use rand::{Rng, SeedableRng};

use crate::assets::decode::decode_background;
use crate::assets::store::{BackgroundStore, DirStore, read_font_resource, resolve_background};
use crate::config::LabelJob;
use crate::encode::png::{FileSink, OutputSink, write_png};
use crate::foundation::core::Canvas;
use crate::foundation::error::LabelResult;
use crate::render::composite::composite_background;
use crate::text::face::FontFace;
use crate::text::label::render_label;

/// Build the labeled canvas without writing it anywhere.
///
/// Stages run in order: background resolution, decode, composite, face load, label. The font
/// file is read up front so a missing font fails before any canvas work.
#[tracing::instrument(skip_all, fields(text = %job.text, width = job.width, height = job.height))]
pub fn compose<S, R>(job: &LabelJob, store: &S, rng: &mut R) -> LabelResult<Canvas>
where
    S: BackgroundStore,
    R: Rng + ?Sized,
{
    job.validate()?;
    let font_bytes = read_font_resource(&job.font)?;

    let resolved = resolve_background(store, &job.background, rng)?;
    let background = decode_background(resolved.reader)?;
    let mut canvas = composite_background(&background, job.width, job.height, job.fill)?;
    drop(background);

    let mut face = FontFace::load(font_bytes, job.face)?;
    let layout = render_label(
        &mut canvas,
        &mut face,
        &job.text,
        job.reference_point(),
        &job.style,
    )?;
    face.release();

    tracing::debug!(origin = ?layout.origin, advance = layout.advance, "composed label card");
    Ok(canvas)
}

/// [`compose`], then encode into `sink`. Nothing reaches the sink unless every stage succeeded.
pub fn render_to_sink<S, R, O>(
    job: &LabelJob,
    store: &S,
    rng: &mut R,
    sink: O,
) -> LabelResult<Canvas>
where
    S: BackgroundStore,
    R: Rng + ?Sized,
    O: OutputSink,
{
    let canvas = compose(job, store, rng)?;
    write_png(&canvas, sink)?;
    Ok(canvas)
}

/// Run a job against the filesystem: backgrounds from `images_dir`, PNG to `output`.
pub fn create_image(job: &LabelJob) -> LabelResult<Canvas> {
    let store = DirStore::new(&job.images_dir);
    let canvas = match job.seed {
        Some(seed) => compose(job, &store, &mut rand::rngs::StdRng::seed_from_u64(seed))?,
        None => compose(job, &store, &mut rand::rng())?,
    };

    let bytes = write_png(&canvas, FileSink::create(&job.output)?)?;
    tracing::info!(output = %job.output.display(), bytes, "wrote label card");
    Ok(canvas)
}
