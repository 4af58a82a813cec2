#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tool for the safety map.
//!
//! Marks and removes reports, prints the computed grid, cluster and heat
//! overlays, resolves place names, and starts the API server. Run without
//! a subcommand for an interactive menu.

mod commands;
mod interactive;

use clap::{Parser, Subcommand};
use safety_map_grid_models::BoundingBox;
use safety_map_safety_models::SafetyKind;

#[derive(Parser)]
#[command(name = "safety_map", about = "Safety map report and overlay tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every stored report
    List,
    /// Mark a location as dangerous or safe
    Mark {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// `dangerous` or `safe`
        #[arg(long)]
        kind: SafetyKind,
    },
    /// Remove a report by id
    Remove {
        /// Report id
        id: i64,
    },
    /// Print the fixed-lattice grid over a bounding box
    Grid {
        /// Region as `west,south,east,north`
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
        /// Cell edge length in degrees
        #[arg(long, default_value = "0.005")]
        cell_size: f64,
        /// Omit cells without any reports
        #[arg(long)]
        skip_empty: bool,
        /// Print a `GeoJSON` `FeatureCollection` instead of a table
        #[arg(long)]
        geojson: bool,
    },
    /// Print zoom-scaled report clusters
    Clusters {
        /// Map zoom level
        #[arg(long, default_value = "13")]
        zoom: u8,
        /// Print a `GeoJSON` `FeatureCollection` instead of a table
        #[arg(long)]
        geojson: bool,
    },
    /// Print the heat layer as JSON
    Heat,
    /// Look up the coordinates of a place
    Search {
        /// Free-form place name
        query: String,
    },
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run().await;
    };

    match command {
        Commands::List => {
            let store = safety_map_server::store_from_env()?;
            commands::list(store.as_ref()).await?;
        }
        Commands::Mark { lat, lng, kind } => {
            let store = safety_map_server::store_from_env()?;
            commands::mark(store.as_ref(), lat, lng, kind).await?;
        }
        Commands::Remove { id } => {
            let store = safety_map_server::store_from_env()?;
            commands::remove(store.as_ref(), id).await?;
        }
        Commands::Grid {
            bbox,
            cell_size,
            skip_empty,
            geojson,
        } => {
            let region = BoundingBox::parse(&bbox)
                .ok_or_else(|| format!("Invalid bbox '{bbox}', expected west,south,east,north"))?;
            let store = safety_map_server::store_from_env()?;
            commands::grid(store.as_ref(), &region, cell_size, !skip_empty, geojson).await?;
        }
        Commands::Clusters { zoom, geojson } => {
            let store = safety_map_server::store_from_env()?;
            commands::clusters(store.as_ref(), zoom, geojson).await?;
        }
        Commands::Heat => {
            let store = safety_map_server::store_from_env()?;
            commands::heat(store.as_ref()).await?;
        }
        Commands::Search { query } => {
            commands::search(&query).await?;
        }
        Commands::Serve => serve().await?,
    }

    Ok(())
}

/// Runs the server on its own actix system.
///
/// The server uses actix-web's runtime, so it runs in a blocking task to
/// avoid nesting runtimes.
async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let store = safety_map_server::store_from_env()?;

    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(safety_map_server::run_server(store))
    })
    .await??;

    Ok(())
}
