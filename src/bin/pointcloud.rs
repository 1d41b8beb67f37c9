use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pointcloud", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single scene frame as a PNG.
    Frame(FrameArgs),
    /// Render a whole scene as an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Sample an SVG and print per-shape statistics as JSON.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// SVG file to sample.
    #[arg(long)]
    svg: PathBuf,

    /// Points per 100 units of path length.
    #[arg(long, default_value_t = 100.0)]
    density: f64,

    /// Sample the fully resolved tree (CSS, transforms, text) instead of the raw markup.
    #[arg(long, default_value_t = false)]
    resolved: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn scene_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = pointcloud::Scene::from_path(&args.in_path)
        .with_context(|| format!("load scene '{}'", args.in_path.display()))?;
    let mut session = pointcloud::Session::open(scene, scene_dir(&args.in_path))?;
    let frame = session.seek(args.frame)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_alpha(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = pointcloud::Scene::from_path(&args.in_path)
        .with_context(|| format!("load scene '{}'", args.in_path.display()))?;
    let frames =
        pointcloud::render_scene_to_mp4(scene, scene_dir(&args.in_path), args.out.clone())?;

    eprintln!("wrote {} ({frames} frames)", args.out.display());
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(&args.svg).with_context(|| format!("read svg '{}'", args.svg.display()))?;

    let shapes = if args.resolved {
        let tree = pointcloud::sampler::resolved::parse_tree(&bytes)?;
        pointcloud::sample_tree(&tree, args.density, pointcloud::Rgba8::WHITE)?
    } else {
        let text = String::from_utf8(bytes).context("svg is not valid UTF-8")?;
        pointcloud::sample_markup(&text, args.density)?
    };

    let report: Vec<serde_json::Value> = shapes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            serde_json::json!({
                "index": i,
                "color": s.color.to_string(),
                "points": s.points.len(),
            })
        })
        .collect();
    let total: usize = shapes.iter().map(|s| s.points.len()).sum();

    let out = serde_json::json!({
        "shapes": report,
        "total_points": total,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
