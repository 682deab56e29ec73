use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegallery::{config, DetectedFace, ImageSource, Listing, Notice, Session};
use log::{info, warn};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "facegallery")]
#[command(version, about = "Photo gallery with placeholder face detection and similar-face search")]
struct Cli {
    /// Config file (defaults to the per-user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images and list the faces found in each
    Detect {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Upload images, then show those sharing a face with the reference image
    Search {
        reference: PathBuf,
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Override the configured similarity threshold
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect { images, json } => detect(cfg, &images, json),
        Commands::Search {
            reference,
            images,
            threshold,
            json,
        } => {
            if let Some(t) = threshold {
                cfg.threshold = t;
                cfg.validate()?;
            }
            search(cfg, &reference, &images, json)
        }
        Commands::Config => open_config(cli.config),
    }
}

/// Read every path; unreadable files are skipped with a warning.
fn read_sources(paths: &[PathBuf]) -> Vec<ImageSource> {
    paths
        .iter()
        .filter_map(|p| match ImageSource::from_path(p) {
            Ok(src) => Some(src),
            Err(e) => {
                warn!("skipping {}: {}", p.display(), e);
                None
            }
        })
        .collect()
}

fn report(notice: &Notice) {
    if notice.is_error() {
        warn!("{}", notice);
    } else {
        info!("{}", notice);
    }
}

#[derive(Serialize)]
struct ItemReport<'a> {
    id: &'a str,
    name: &'a str,
    format: &'static str,
    faces: &'a [DetectedFace],
}

fn detect(cfg: config::Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let session = Session::with_config(cfg);
    let notice = session.upload(read_sources(paths));
    report(&notice);

    let items = session.items();
    let reports: Vec<ItemReport> = items
        .iter()
        .map(|item| ItemReport {
            id: &item.id,
            name: &item.source.name,
            format: item.format.to_mime_type(),
            faces: item.faces(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for item in &reports {
        println!("{} ({} face(s))", item.name, item.faces.len());
        for face in item.faces {
            let b = &face.bbox;
            println!(
                "  [{:.0}, {:.0}, {:.0}x{:.0}] confidence {:.2}",
                b.x, b.y, b.width, b.height, face.confidence
            );
        }
    }
    Ok(())
}

fn search(cfg: config::Config, reference: &Path, paths: &[PathBuf], json: bool) -> Result<()> {
    let reference = ImageSource::from_path(reference)
        .with_context(|| format!("reading reference image {}", reference.display()))?;

    let session = Session::with_config(cfg);
    report(&session.upload(read_sources(paths)));
    report(&session.search(&reference));

    print_listing(&session.listing(), json)
}

fn print_listing(listing: &Listing, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(listing)?);
        return Ok(());
    }

    println!("{}", listing.header());
    if let Some(empty) = listing.empty_state() {
        println!("{}", empty);
    }
    for entry in &listing.entries {
        match entry.score {
            Some(score) => println!(
                "{:.3}  {}  {}  {} face(s)",
                score,
                entry.name,
                entry.size_label(),
                entry.faces
            ),
            None => println!("{}  {}  {} face(s)", entry.name, entry.size_label(), entry.faces),
        }
    }
    Ok(())
}

fn open_config(path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(|| config::CONFIG_PATH.clone());
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path.as_path()))
            .context("Failed to write default config")?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
