use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brotpool", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the same view repeatedly and report the average frame time.
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Image width in pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// View state JSON; individual flags below override its fields.
    #[arg(long)]
    view: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true)]
    center_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    center_y: Option<f64>,

    /// View scale: the shorter image axis spans `4 * zoom` plane units.
    #[arg(long)]
    zoom: Option<f64>,

    /// Iteration cap.
    #[arg(long)]
    iterations: Option<u32>,

    /// Iterate in double precision.
    #[arg(long)]
    double: bool,

    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Square tile edge in pixels.
    #[arg(long, default_value_t = brotpool::tile::DEFAULT_TILE_SIZE)]
    tile_size: u32,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: ViewArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render with the single-threaded scalar reference instead of the worker pool.
    #[arg(long)]
    reference: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[command(flatten)]
    common: ViewArgs,

    /// Number of frames to render.
    #[arg(long, default_value_t = 30)]
    frames: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Bench(args) => cmd_bench(args),
    }
}

fn read_view_json(path: &Path) -> anyhow::Result<brotpool::ViewState> {
    let f = File::open(path).with_context(|| format!("open view '{}'", path.display()))?;
    let view: brotpool::ViewState =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse view JSON")?;
    Ok(view)
}

fn resolve_view(args: &ViewArgs) -> anyhow::Result<brotpool::ViewState> {
    let mut view = match &args.view {
        Some(path) => read_view_json(path)?,
        None => brotpool::ViewState::default(),
    };
    if let Some(x) = args.center_x {
        view.center_x = x;
    }
    if let Some(y) = args.center_y {
        view.center_y = y;
    }
    if let Some(z) = args.zoom {
        view.zoom = z;
    }
    if let Some(n) = args.iterations {
        view.iterations = n;
    }
    if args.double {
        view.precision = brotpool::Precision::Double;
    }
    Ok(view)
}

fn make_renderer(args: &ViewArgs) -> anyhow::Result<brotpool::FrameRenderer> {
    let opts = brotpool::RenderOpts {
        workers: args.workers,
        tile_width: args.tile_size,
        tile_height: args.tile_size,
    };
    brotpool::FrameRenderer::new(opts).context("start renderer")
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let view = resolve_view(&args.common)?;
    let params = view.frame_params(args.common.width, args.common.height);
    let mut buffer = brotpool::PixelBuffer::new(args.common.width, args.common.height)?;

    if args.reference {
        brotpool::render_reference(&mut buffer, &params)?;
    } else {
        let mut renderer = make_renderer(&args.common)?;
        let stats = renderer.compute_frame(&mut buffer, &params)?;
        tracing::info!(
            tiles = stats.tiles,
            workers = stats.dispatch.workers,
            ms = stats.dispatch.elapsed.as_secs_f64() * 1e3,
            "frame rendered"
        );
        renderer.shutdown();
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &buffer.data,
        buffer.width,
        buffer.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bench(args: BenchArgs) -> anyhow::Result<()> {
    if args.frames == 0 {
        anyhow::bail!("--frames must be >= 1");
    }
    let view = resolve_view(&args.common)?;
    let params = view.frame_params(args.common.width, args.common.height);
    let mut buffer = brotpool::PixelBuffer::new(args.common.width, args.common.height)?;
    let mut renderer = make_renderer(&args.common)?;

    let start = Instant::now();
    for _ in 0..args.frames {
        renderer.compute_frame(&mut buffer, &params)?;
    }
    let total = start.elapsed();
    let workers = renderer.worker_count();
    renderer.shutdown();

    eprintln!(
        "{} frames of {}x{} ({} iterations, {:?}) on {} workers: {:.2} ms/frame",
        args.frames,
        args.common.width,
        args.common.height,
        view.iterations,
        view.precision,
        workers,
        total.as_secs_f64() * 1e3 / f64::from(args.frames)
    );
    Ok(())
}
