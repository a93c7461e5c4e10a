use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "labelcard", version, about = "Write a word over a background photo as a PNG")]
struct Cli {
    /// Label job JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Label text. Prompted for on stdin when omitted.
    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// TrueType/OpenType font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font size in points.
    #[arg(long)]
    size: Option<f32>,

    /// Rasterization DPI (72 or 96).
    #[arg(long, value_parser = parse_dpi)]
    dpi: Option<labelcard::Dpi>,

    /// Use this background instead of a random numbered one.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Directory holding the numbered backgrounds.
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Seed for background selection.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    fill: Option<FillChoice>,

    #[arg(long, value_enum)]
    placement: Option<PlacementChoice>,

    /// Skip the translucent panel behind the text.
    #[arg(long)]
    no_panel: bool,

    /// Output PNG path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FillChoice {
    Resample,
    Direct,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlacementChoice {
    Bottom,
    Center,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut job = match &cli.config {
        Some(path) => labelcard::LabelJob::from_path(path)
            .with_context(|| format!("load label job '{}'", path.display()))?,
        None => labelcard::LabelJob::default(),
    };
    apply_overrides(&mut job, &cli)?;

    if let Some(text) = cli.text {
        job.text = text;
    } else if job.text.is_empty() {
        job.text = prompt_text()?;
    }
    job.validate()?;

    if let Some(parent) = job.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    labelcard::create_image(&job)
        .with_context(|| format!("create '{}'", job.output.display()))?;

    println!("Image created successfully as {}", job.output.display());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(job: &mut labelcard::LabelJob, cli: &Cli) -> anyhow::Result<()> {
    if let Some(w) = cli.width {
        job.width = w;
    }
    if let Some(h) = cli.height {
        job.height = h;
    }
    if let Some(font) = &cli.font {
        job.font = font.clone();
    }
    if let Some(size) = cli.size {
        job.face.size_pt = size;
    }
    if let Some(dpi) = cli.dpi {
        job.face.dpi = dpi;
    }
    if let Some(dir) = &cli.images_dir {
        job.images_dir = dir.clone();
    }
    if let Some(bg) = &cli.background {
        let name = bg
            .file_name()
            .with_context(|| format!("background '{}' has no file name", bg.display()))?;
        job.images_dir = bg
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        job.background = labelcard::BackgroundPolicy::Fixed {
            name: name.to_string_lossy().into_owned(),
        };
    }
    if cli.seed.is_some() {
        job.seed = cli.seed;
    }
    match cli.fill {
        Some(FillChoice::Resample) => job.fill = labelcard::FillPolicy::Resample,
        Some(FillChoice::Direct) => job.fill = labelcard::FillPolicy::DirectCopy,
        None => {}
    }
    match cli.placement {
        Some(PlacementChoice::Center) => job.style.placement = labelcard::Placement::Centered,
        Some(PlacementChoice::Bottom)
            if !matches!(job.style.placement, labelcard::Placement::BottomOffset { .. }) =>
        {
            job.style.placement = labelcard::Placement::default();
        }
        _ => {}
    }
    if cli.no_panel {
        job.style.panel = None;
    }
    if let Some(out) = &cli.out {
        job.output = out.clone();
    }
    Ok(())
}

fn prompt_text() -> anyhow::Result<String> {
    print!("Enter the word or phrase: ");
    std::io::stdout().flush().context("flush prompt")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("read label text from stdin")?;
    Ok(line.trim().to_string())
}

fn parse_dpi(s: &str) -> Result<labelcard::Dpi, String> {
    let v: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    labelcard::Dpi::try_from(v)
}
