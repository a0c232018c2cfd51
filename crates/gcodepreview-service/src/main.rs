//! CLI entry point: render previews of a local G-code file.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use gcodepreview_core::{view_image_filename, PrinterBed};
use gcodepreview_renderer::{interpret, render_views, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use gcodepreview_service::encode_png;

#[derive(Debug, Parser)]
#[command(name = "gcodepreview")]
#[command(about = "Render preview images of a G-code toolpath from eight compass views")]
struct Args {
    /// G-code file to render.
    input: PathBuf,

    /// Directory the preview images are written to.
    #[arg(long, default_value = "previews")]
    out_dir: PathBuf,

    /// Output image width in pixels.
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Output image height in pixels.
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Job id embedded in the output filenames; random when omitted.
    #[arg(long)]
    job_id: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let gcode = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let toolpath = interpret(&gcode);
    if toolpath.segments.is_empty() {
        bail!("{} contains no extrusion moves", args.input.display());
    }
    info!(segments = toolpath.segments.len(), "interpreted toolpath");

    let bed = PrinterBed::default();
    let frames = render_views(
        &toolpath.segments,
        toolpath.bounds.as_ref(),
        &bed,
        args.width,
        args.height,
    )?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let job_id = args
        .job_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    for (index, (view, frame)) in frames.iter().enumerate() {
        let path = args
            .out_dir
            .join(view_image_filename(&job_id, index, view.name()));
        let png = encode_png(frame)?;
        fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        info!(%view, path = %path.display(), "wrote preview");
    }
    Ok(())
}
