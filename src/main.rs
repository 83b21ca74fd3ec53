//! # qrlayout CLI
//!
//! Command-line interface for rendering sticker layouts.
//!
//! ## Usage
//!
//! ```bash
//! # List built-in entity schemas and their fields
//! qrlayout schemas
//!
//! # Render a layout against a record at 300 DPI
//! qrlayout render --layout badge.json --record alex.json --png badge.png
//!
//! # Render with the target entity's sample data at 10 px/mm
//! qrlayout render --layout badge.json --entity-sample --dpmm 10 --png badge.png
//!
//! # Render the built-in sample badge
//! qrlayout render --png badge.png
//!
//! # Start the HTTP server
//! qrlayout serve --listen 0.0.0.0:8080
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrlayout::{
    DataRecord, LayoutError, StickerLayout, StickerPrinter,
    layout::{builtin_schemas, schema::record_from_json},
    server::{ServerConfig, serve},
    units::Resolution,
};

/// qrlayout - Sticker layout rendering utility
#[derive(Parser, Debug)]
#[command(name = "qrlayout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a layout to a PNG file
    Render {
        /// Layout JSON file (omit to use the built-in sample badge)
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// Record JSON file: an object of field values
        #[arg(long, value_name = "FILE", conflicts_with = "entity_sample")]
        record: Option<PathBuf>,

        /// Use the target entity's sample data as the record
        #[arg(long)]
        entity_sample: bool,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        /// Resolution in pixels per millimetre
        #[arg(long, conflicts_with = "dpi")]
        dpmm: Option<f64>,

        /// Resolution in dots per inch (default 300)
        #[arg(long)]
        dpi: Option<f64>,
    },

    /// List built-in entity schemas
    Schemas,

    /// Start the HTTP rendering server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Default resolution in dots per inch
        #[arg(long, default_value = "300")]
        dpi: f64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LayoutError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            layout,
            record,
            entity_sample,
            png,
            dpmm,
            dpi,
        } => {
            let layout = match layout {
                Some(path) => StickerLayout::from_json(&std::fs::read_to_string(&path)?)?,
                None => StickerLayout::sample_badge(),
            };
            let record = match record {
                Some(path) => load_record(&path)?,
                None if entity_sample => sample_record(&layout.target_entity)?,
                None => DataRecord::new(),
            };
            let resolution = resolution_from_args(dpmm, dpi)?;

            let printer = StickerPrinter::new(resolution);
            let bytes = printer.render_png(&layout, &record).await?;
            std::fs::write(&png, &bytes)?;
            info!(
                layout = %layout.name,
                dpi = resolution.px_per_inch(),
                path = %png.display(),
                "Rendered layout"
            );
        }

        Commands::Schemas => {
            for (key, schema) in builtin_schemas() {
                println!("{} ({})", key, schema.label);
                for field in &schema.fields {
                    let sample = schema
                        .sample_data
                        .get(&field.name)
                        .map(String::as_str)
                        .unwrap_or("");
                    println!("  {{{{{}}}}}  {}  e.g. {}", field.name, field.label, sample);
                }
            }
        }

        Commands::Serve { listen, dpi } => {
            let resolution = resolution_from_args(None, Some(dpi))?;
            serve(ServerConfig {
                listen_addr: listen,
                resolution,
            })
            .await?;
        }
    }

    Ok(())
}

fn resolution_from_args(dpmm: Option<f64>, dpi: Option<f64>) -> Result<Resolution, LayoutError> {
    let resolution = match (dpmm, dpi) {
        (Some(dpmm), _) => Resolution::per_mm(dpmm),
        (None, Some(dpi)) => Resolution::dpi(dpi),
        (None, None) => Resolution::default(),
    };
    if !resolution.is_valid() {
        return Err(LayoutError::InvalidGeometry(format!(
            "resolution must be positive, got {} px/mm",
            resolution.px_per_mm()
        )));
    }
    Ok(resolution)
}

fn load_record(path: &Path) -> Result<DataRecord, LayoutError> {
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    record_from_json(&value).ok_or_else(|| {
        LayoutError::MalformedLayout(format!("{} is not a JSON object", path.display()))
    })
}

fn sample_record(entity: &str) -> Result<DataRecord, LayoutError> {
    builtin_schemas()
        .remove(entity)
        .map(|schema| schema.sample_data)
        .ok_or_else(|| LayoutError::UnknownEntity(entity.to_string()))
}
