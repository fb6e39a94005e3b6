use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glitchcore::batch::run_batch;
use glitchcore::config::GlitchConfig;
use glitchcore::renderer::render;

#[derive(Debug, Parser)]
#[command(name = "glitchcore")]
#[command(about = "Seed-locked glitch-art renderer")]
struct Cli {
    /// Enable debug-level pipeline logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render one image.
    Render {
        image: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Render every image in a directory, one session per file.
    Batch {
        input_dir: PathBuf,
        #[arg(short = 'o', long = "output")]
        output_dir: PathBuf,
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated seed list; files beyond the list get random seeds.
        #[arg(long, default_value = "")]
        seeds: String,
    },
    /// Validate a configuration file and print a summary.
    Check { config: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            image,
            output,
            font,
            config,
            seed,
        } => run_render(&image, &output, font.as_deref(), config.as_deref(), seed),
        Commands::Batch {
            input_dir,
            output_dir,
            font,
            config,
            seeds,
        } => run_batch_command(
            &input_dir,
            &output_dir,
            font.as_deref(),
            config.as_deref(),
            &seeds,
        ),
        Commands::Check { config } => run_check(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<GlitchConfig> {
    match path {
        Some(path) => GlitchConfig::load(path),
        None => Ok(GlitchConfig::default()),
    }
}

fn run_render(
    image: &Path,
    output: &Path,
    font: Option<&Path>,
    config: Option<&Path>,
    seed: u64,
) -> Result<()> {
    let cfg = load_config(config)?;
    let stats = render(image, font, &cfg, seed, output)?;
    println!("Saved: {}", output.display());
    println!(
        "boxes={} (warp={}), connections={}, text_blocks={}, {:.2}s",
        stats.boxes_drawn,
        stats.warp_boxes,
        stats.box_connections,
        stats.text_blocks,
        stats.processing_time_seconds
    );
    Ok(())
}

fn run_batch_command(
    input_dir: &Path,
    output_dir: &Path,
    font: Option<&Path>,
    config: Option<&Path>,
    seeds: &str,
) -> Result<()> {
    let cfg = load_config(config)?;
    let summary = run_batch(input_dir, output_dir, font, &cfg, seeds);
    println!("{}", summary.text());
    Ok(())
}

fn run_check(config: &Path) -> Result<()> {
    let cfg = GlitchConfig::load(config)?;
    println!("OK: {}", config.display());
    println!(
        "boxes {}..{}, log blocks {}..{}, mesh complexity {}, depth of field {}",
        cfg.box_count.0,
        cfg.box_count.1,
        cfg.log_blocks_range.0,
        cfg.log_blocks_range.1,
        cfg.mesh_complexity,
        if cfg.enable_depth_of_field { "on" } else { "off" }
    );
    Ok(())
}
