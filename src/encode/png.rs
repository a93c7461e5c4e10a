use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use crate::foundation::core::Canvas;
use crate::foundation::error::{LabelError, LabelResult};

/// Encode the canvas as an 8-bit RGBA PNG.
#[tracing::instrument(skip(canvas), fields(width = canvas.width(), height = canvas.height()))]
pub fn encode_png(canvas: &Canvas) -> LabelResult<Vec<u8>> {
    let img = canvas.to_rgba_image()?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| LabelError::encode(format!("png: {e}")))?;
    tracing::debug!(bytes = buf.len(), "encoded png");
    Ok(buf)
}

/// Destination for encoded bytes.
///
/// `finish` flushes and closes; it consumes the sink so it runs at most once. A sink dropped
/// without `finish` discards what was written where it can.
pub trait OutputSink {
    fn write(&mut self, bytes: &[u8]) -> LabelResult<()>;

    fn finish(self) -> LabelResult<()>
    where
        Self: Sized;
}

/// Writes to a sibling temporary file and renames it onto `dest` in `finish`.
#[derive(Debug)]
pub struct FileSink {
    // Declared before the guard so the handle closes before the temp file is removed.
    writer: BufWriter<File>,
    tmp: TempFileGuard,
    dest: PathBuf,
}

impl FileSink {
    pub fn create(dest: impl Into<PathBuf>) -> LabelResult<Self> {
        let dest = dest.into();
        let tmp_path = temp_sibling(&dest);
        let file = File::create(&tmp_path).map_err(|e| LabelError::write(&dest, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            tmp: TempFileGuard(Some(tmp_path)),
            dest,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> LabelResult<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| LabelError::write(&self.dest, e))
    }

    fn finish(self) -> LabelResult<()> {
        let Self {
            writer,
            mut tmp,
            dest,
        } = self;
        let file = writer
            .into_inner()
            .map_err(|e| LabelError::write(&dest, e.into_error()))?;
        file.sync_all().map_err(|e| LabelError::write(&dest, e))?;
        drop(file);

        if let Some(path) = tmp.0.as_ref() {
            std::fs::rename(path, &dest).map_err(|e| LabelError::write(&dest, e))?;
        }
        tmp.0 = None;
        tracing::debug!(dest = %dest.display(), "closed output");
        Ok(())
    }
}

impl OutputSink for &mut Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> LabelResult<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn finish(self) -> LabelResult<()> {
        Ok(())
    }
}

/// Buffer sink that records how often it was closed.
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    pub bytes: Vec<u8>,
    pub closes: u32,
}

impl OutputSink for &mut InMemorySink {
    fn write(&mut self, bytes: &[u8]) -> LabelResult<()> {
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn finish(self) -> LabelResult<()> {
        self.closes += 1;
        Ok(())
    }
}

/// Encode `canvas` and stream it into `sink`, closing the sink exactly once on success.
///
/// Returns the number of bytes written.
pub fn write_png<S: OutputSink>(canvas: &Canvas, mut sink: S) -> LabelResult<usize> {
    let bytes = encode_png(canvas)?;
    sink.write(&bytes)?;
    sink.finish()?;
    Ok(bytes.len())
}

#[derive(Debug)]
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    dest.with_file_name(format!(".{name}.{}.{nanos}.tmp", std::process::id()))
}
