//! Photomark CLI — metadata overlays and frames for photos.
//!
//! Usage:
//!   photomark render <IMAGE>         Render one photo and save it
//!   photomark preview <IMAGE>        Render through the preview cache
//!   photomark batch <PATHS>... -o D  Render many photos into a directory
//!   photomark info <IMAGE>           Show file and EXIF information
//!   photomark check                  Check fonts, logos and configuration
//!   photomark init <DIR>             Write default settings files

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use photomark_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "photomark",
    about = "Camera metadata overlays and decorative frames for photos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where overlay and frame settings come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Settings directory holding overlay.json and frame.json
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Overlay settings file (overrides the settings directory)
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Frame settings file (overrides the settings directory)
    #[arg(long)]
    frame: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one photo and save the result
    Render {
        /// Path to the photo
        image: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output file (defaults to <stem>_processed.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: jpeg|png
        #[arg(long)]
        format: Option<String>,

        /// Encoder quality [0.0, 1.0]
        #[arg(long)]
        quality: Option<f32>,
    },

    /// Render through the preview cache
    Preview {
        /// Path to the photo
        image: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Write the preview blob here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render through both the backend and local paths and compare bytes
        #[arg(long)]
        verify: bool,

        /// Bound the preview width
        #[arg(long)]
        max_width: Option<u32>,

        /// Bound the preview height
        #[arg(long)]
        max_height: Option<u32>,
    },

    /// Render many photos into a directory
    Batch {
        /// Photos to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Concurrent workers
        #[arg(long)]
        concurrency: Option<usize>,

        /// Extra attempts per failed file
        #[arg(long)]
        retries: Option<u32>,

        /// Output format: jpeg|png
        #[arg(long)]
        format: Option<String>,

        /// Encoder quality [0.0, 1.0]
        #[arg(long)]
        quality: Option<f32>,
    },

    /// Show file and EXIF information
    Info {
        /// Path to the photo
        image: PathBuf,
    },

    /// Check fonts, logos and configuration
    Check,

    /// Write default settings files
    Init {
        /// Settings directory to create
        dir: PathBuf,

        /// Also write a default config file if none exists
        #[arg(long)]
        with_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    photomark_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            image,
            settings,
            output,
            format,
            quality,
        } => commands::render::run(&config, image, settings, output, format, quality).await,
        Commands::Preview {
            image,
            settings,
            output,
            verify,
            max_width,
            max_height,
        } => {
            commands::preview::run(
                &config, image, settings, output, verify, max_width, max_height,
            )
            .await
        }
        Commands::Batch {
            paths,
            settings,
            output,
            concurrency,
            retries,
            format,
            quality,
        } => {
            if let Some(c) = concurrency {
                config.batch.concurrency = c;
            }
            if let Some(r) = retries {
                config.batch.retry_attempts = r;
            }
            if let Some(f) = format {
                config.batch.output_format = f;
            }
            if let Some(q) = quality {
                config.batch.quality = q;
            }
            commands::batch::run(&config, paths, settings, output).await
        }
        Commands::Info { image } => commands::info::run(image),
        Commands::Check => commands::check::run(&config),
        Commands::Init { dir, with_config } => commands::init::run(&config, dir, with_config),
    }
}
