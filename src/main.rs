use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use pdf_highlighter::geometry::{Rotation, Viewport};
use pdf_highlighter::panic_handler;
use pdf_highlighter::registry::group_by_page;
use pdf_highlighter::settings::{self, Settings};
use pdf_highlighter::store::{JsonFileStore, parse_highlights};

/// Inspect persisted highlight files
#[derive(Parser, Debug)]
#[command(name = "pdf-highlighter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, global = true, default_value = "pdf-highlighter.log")]
    log_file: PathBuf,

    /// Log at debug level regardless of settings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print where each highlight lands on screen for a given view
    Show {
        /// Highlight file (JSON array, newest first)
        file: PathBuf,

        /// Unscaled page width
        #[arg(long, default_value = "612")]
        width: f64,

        /// Unscaled page height
        #[arg(long, default_value = "792")]
        height: f64,

        #[arg(short, long, default_value = "1.0")]
        scale: f64,

        /// Rotation in degrees: 0, 90, -90 or 180
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,
    },

    /// Report how many highlights a file contains
    Check {
        file: PathBuf,
    },

    /// Print where highlights for a document are stored
    Where {
        /// Document key, usually its path or URL
        document: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        settings.level_filter()
    };

    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting pdf-highlighter");
    if cli.config.is_none() {
        info!("Config path: {:?}", settings::default_config_path());
    }

    match cli.command {
        Command::Show {
            file,
            width,
            height,
            scale,
            rotation,
        } => show(&file, width, height, scale, rotation),
        Command::Check { file } => check(&file),
        Command::Where { document } => where_stored(&settings, &document),
    }
}

fn show(file: &Path, width: f64, height: f64, scale: f64, degrees: i32) -> Result<()> {
    let highlights = JsonFileStore::read_file(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rotation = Rotation::from_degrees_lossy(degrees);
    let (w, h) = if rotation.swaps_axes() {
        (height * scale, width * scale)
    } else {
        (width * scale, height * scale)
    };
    let viewport = Viewport::new(w, h, scale, rotation);

    for (page, group) in group_by_page(&highlights, None) {
        println!("page {page}");
        for highlight in group {
            let position = highlight.position().to_viewport(&viewport);
            let r = position.bounding_rect;
            let id = highlight.id().map(ToString::to_string).unwrap_or_default();
            println!(
                "  {id}: left={:.1} top={:.1} width={:.1} height={:.1} ({} rects)",
                r.left,
                r.top,
                r.width,
                r.height,
                position.rects.len()
            );
        }
    }
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let highlights = parse_highlights(&content);
    if highlights.is_empty() && !content.trim().is_empty() && content.trim() != "[]" {
        println!("{}: malformed, treated as empty", file.display());
    } else {
        println!("{}: {} highlights", file.display(), highlights.len());
    }
    info!("Checked {file:?}: {} highlights", highlights.len());
    Ok(())
}

fn where_stored(settings: &Settings, document: &str) -> Result<()> {
    let dir = settings
        .resolved_store_dir()
        .context("Could not determine a data directory; set store_dir in the config")?;
    let path = JsonFileStore::new(dir).path_for(document);
    println!("{}", path.display());
    Ok(())
}
