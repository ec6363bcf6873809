use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use birthday_card::camera::{CaptureRequest, FilePhotoSource, NoCamera, PhotoSource, capture_or_skip};
use birthday_card::fireworks::{
    CancellationToken, FireworksEngine, FrameLoop, ManualScheduler, MountedFireworks,
    PngSequenceSink,
};
use birthday_card::{
    AppConfig, CardData, CardExporter, CardParams, DirectoryDownloads, ExportKind, FontBook,
    HtmlPrintSurface, MelodySession,
};

#[derive(Parser, Debug)]
#[command(name = "birthday-card", version)]
struct Cli {
    /// JSON config file with optional `export` and `fireworks` sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the card as a PNG or PDF.
    Export(ExportArgs),
    /// Run the fireworks and write frames as PNGs.
    Fireworks(FireworksArgs),
    /// Render the melody as raw f32le mono PCM.
    Melody(MelodyArgs),
    /// Print the name and date carried by a card URL.
    Params(ParamsArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Card URL; its `name`/`bd` parameters fill in missing --name/--birth-date.
    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    birth_date: Option<String>,

    #[arg(long, default_value = "")]
    wish: String,

    /// Encoded photo standing in for the camera.
    #[arg(long)]
    photo: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Download directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Disable the primary rasterizer (use the SVG fallback).
    #[arg(long)]
    no_raster: bool,

    /// Disable the PDF encoder (PDF requests go to the print page).
    #[arg(long)]
    no_pdf: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Pdf,
}

#[derive(Parser, Debug)]
struct FireworksArgs {
    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Keep every n-th frame.
    #[arg(long, default_value_t = 1)]
    every: u64,

    /// Frame directory.
    #[arg(long)]
    out: PathBuf,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Pace frames by the wall clock instead of running them back to back.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct MelodyArgs {
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    #[arg(long, default_value_t = 1)]
    loops: u32,
}

#[derive(Parser, Debug)]
struct ParamsArgs {
    url: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };
    let cfg = AppConfig {
        export: cfg.export.with_env_overrides(),
        fireworks: cfg.fireworks.with_env_overrides(),
    };

    match cli.cmd {
        Command::Export(args) => cmd_export(args, cfg),
        Command::Fireworks(args) => cmd_fireworks(args, cfg),
        Command::Melody(args) => cmd_melody(args),
        Command::Params(args) => cmd_params(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_export(args: ExportArgs, cfg: AppConfig) -> anyhow::Result<()> {
    let from_url = match &args.url {
        Some(url) => CardParams::from_url(url)?,
        None => CardParams::default(),
    };
    let name = args.name.unwrap_or(from_url.name);
    let birth_date = args.birth_date.unwrap_or(from_url.birth_date);

    let mut camera: Box<dyn PhotoSource> = match &args.photo {
        Some(path) => Box::new(FilePhotoSource::new(path)),
        None => Box::new(NoCamera),
    };
    let photo = capture_or_skip(camera.as_mut(), &CaptureRequest::default())?;

    let data = CardData::new(name, args.wish)
        .with_birth_date(birth_date)
        .with_photo(photo);

    let fonts = FontBook::from_config(&cfg.export)?;
    let print_path = args.out.join(format!("{}-print.html", data.file_stem()));
    let mut exporter = CardExporter::new(cfg.export, fonts)
        .with_downloads(Box::new(DirectoryDownloads::new(&args.out)))
        .with_print_surface(Some(Box::new(HtmlPrintSurface::new(&print_path))));
    if args.no_raster {
        exporter = exporter.with_rasterizer(None);
    }
    if args.no_pdf {
        exporter = exporter.with_encoder(None);
    }

    let kind = match args.format {
        FormatChoice::Png => ExportKind::Png,
        FormatChoice::Pdf => ExportKind::Pdf,
    };
    let report = exporter.export(&data, kind)?;
    eprintln!(
        "{:?}: {}x{} via {} ({} of {} images)",
        report.outcome,
        report.width,
        report.height,
        report.rasterizer,
        report.images.loaded,
        report.images.total
    );
    Ok(())
}

fn cmd_fireworks(args: FireworksArgs, cfg: AppConfig) -> anyhow::Result<()> {
    let sink = Box::new(PngSequenceSink::new(&args.out, args.every)?);

    if args.realtime {
        let run_for = cfg.fireworks.run_length(args.frames)?;
        let mounted = MountedFireworks::mount(cfg.fireworks, args.width, args.height, sink)?;
        std::thread::sleep(run_for);
        let frames = mounted.unmount()?;
        eprintln!("drew {frames} frames into {}", args.out.display());
        return Ok(());
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let engine = FireworksEngine::new(cfg.fireworks, args.width, args.height, rng)?;
    let mut frame_loop = FrameLoop::new(engine, sink)?;
    let frames = frame_loop.run(
        &mut ManualScheduler::frames(args.frames),
        &CancellationToken::new(),
    )?;
    eprintln!("drew {frames} frames into {}", args.out.display());
    Ok(())
}

fn cmd_melody(args: MelodyArgs) -> anyhow::Result<()> {
    let mut session = MelodySession::new(args.sample_rate)?;
    let one_loop = session.render_loop();

    ensure_parent(&args.out)?;
    let file = std::fs::File::create(&args.out)
        .with_context(|| format!("create '{}'", args.out.display()))?;
    let mut w = std::io::BufWriter::new(file);
    for _ in 0..args.loops.max(1) {
        birthday_card::audio::write_f32le(&one_loop, &mut w)?;
    }
    w.flush()
        .with_context(|| format!("write '{}'", args.out.display()))?;
    let seconds = Duration::from_secs_f64(one_loop.len() as f64 / f64::from(args.sample_rate))
        * args.loops.max(1);
    eprintln!("wrote {} ({seconds:?} of audio)", args.out.display());
    Ok(())
}

fn cmd_params(args: ParamsArgs) -> anyhow::Result<()> {
    let params = CardParams::from_url(&args.url)?;
    println!("name: {}", params.name);
    println!("birth_date: {}", params.birth_date);
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
