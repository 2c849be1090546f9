//! roomfit binary
//!
//! Loads an asset catalog and a layout (raw generator output), places the
//! layout in a room and prints the resulting snapshot as JSON.
//!
//! ## Configuration (TOML via `--config`, then env, then flags)
//!
//! | Key                                | Default | Description                    |
//! |------------------------------------|---------|--------------------------------|
//! | `ROOMFIT__ROOM__WIDTH`             | `10.0`  | Room width (m)                 |
//! | `ROOMFIT__ROOM__DEPTH`             | `10.0`  | Room depth (m)                 |
//! | `ROOMFIT__SEED`                    | `42`    | Placement search seed          |
//! | `ROOMFIT__RETRY_PASSES`            | `0`     | Extra passes for failed items  |
//! | `ROOMFIT__PLACEMENT__MAX_ATTEMPTS` | `15`    | Collision queries per item     |
//! | `ROOMFIT__PLACEMENT__UNSUPPORTED`  | `floor` | `floor`, `hint` or `reject`    |

use anyhow::{Context, Result};
use clap::Parser;
use roomfit::{
    protocol::{parse_layout, FailureSummary, RoomSnapshot},
    provider::CatalogGeometry,
    AssetCatalog, PlacementService, ServiceConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "roomfit", about = "Place a furniture layout in a room", version)]
struct Args {
    /// Asset catalog (JSON with a `furniture_library` array)
    #[arg(long, env = "ROOMFIT_CATALOG")]
    catalog: PathBuf,

    /// Layout file (generator output containing a JSON array)
    #[arg(long)]
    layout: PathBuf,

    /// Optional TOML config file
    #[arg(long, env = "ROOMFIT_CONFIG")]
    config: Option<PathBuf>,

    /// Room width in meters (overrides config)
    #[arg(long)]
    width: Option<f64>,

    /// Room depth in meters (overrides config)
    #[arg(long)]
    depth: Option<f64>,

    /// Placement search seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct Output {
    snapshot: RoomSnapshot,
    failures: Vec<FailureSummary>,
}

fn load_config(args: &Args) -> Result<ServiceConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    let mut cfg: ServiceConfig = builder
        .add_source(config::Environment::with_prefix("ROOMFIT").separator("__"))
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    if let Some(w) = args.width {
        cfg.room.width = w;
    }
    if let Some(d) = args.depth {
        cfg.room.depth = d;
    }
    if let Some(s) = args.seed {
        cfg.seed = s;
    }
    Ok(cfg)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging (stderr, so stdout stays clean JSON)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomfit=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    log::info!(
        "Starting roomfit (room={}x{}, seed={}, max_attempts={})",
        config.room.width,
        config.room.depth,
        config.seed,
        config.placement.max_attempts,
    );

    let catalog = Arc::new(
        AssetCatalog::load(&args.catalog)
            .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?,
    );
    let raw_layout = tokio::fs::read_to_string(&args.layout)
        .await
        .with_context(|| format!("Failed to read layout {}", args.layout.display()))?;

    let geometry = Arc::new(CatalogGeometry::new(catalog.clone()));
    let service = PlacementService::new(config, catalog, geometry)
        .context("Invalid room configuration")?;

    let requests = parse_layout(&raw_layout).context("Layout could not be decoded")?;
    let report = service.place_layout(requests).await;

    let output = Output {
        snapshot: service.snapshot(),
        failures: report.failures,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
