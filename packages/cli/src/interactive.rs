//! Menu-driven mode used when no subcommand is given.

use dialoguer::{Confirm, Input, Select};
use safety_map_grid_models::BoundingBox;
use safety_map_safety_models::SafetyKind;

use crate::commands;

/// Top-level actions offered by the menu.
enum Action {
    List,
    Mark,
    Grid,
    Heat,
    Search,
    Server,
}

impl Action {
    const ALL: &[Self] = &[
        Self::List,
        Self::Mark,
        Self::Grid,
        Self::Heat,
        Self::Search,
        Self::Server,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::List => "List reports",
            Self::Mark => "Mark a location",
            Self::Grid => "Show grid for a region",
            Self::Heat => "Show heat layer",
            Self::Search => "Search for a place",
            Self::Server => "Start server",
        }
    }
}

/// Prompts for an action and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Safety Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::List => {
            let store = safety_map_server::store_from_env()?;
            commands::list(store.as_ref()).await?;
        }
        Action::Mark => {
            let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
            let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;
            let kinds = SafetyKind::all();
            let labels: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            let kind = Select::new()
                .with_prompt("Type")
                .items(&labels)
                .default(0)
                .interact()?;

            let store = safety_map_server::store_from_env()?;
            commands::mark(store.as_ref(), latitude, longitude, kinds[kind]).await?;
        }
        Action::Grid => {
            let bbox: String = Input::new()
                .with_prompt("Region (west,south,east,north)")
                .interact_text()?;
            let region = BoundingBox::parse(&bbox)
                .ok_or_else(|| format!("Invalid bbox '{bbox}', expected west,south,east,north"))?;
            let cell_size: f64 = Input::new()
                .with_prompt("Cell size (degrees)")
                .default(0.005)
                .interact_text()?;
            let include_empty = Confirm::new()
                .with_prompt("Include empty cells?")
                .default(true)
                .interact()?;

            let store = safety_map_server::store_from_env()?;
            commands::grid(store.as_ref(), &region, cell_size, include_empty, false).await?;
        }
        Action::Heat => {
            let store = safety_map_server::store_from_env()?;
            commands::heat(store.as_ref()).await?;
        }
        Action::Search => {
            let query: String = Input::new().with_prompt("Place").interact_text()?;
            commands::search(&query).await?;
        }
        Action::Server => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(safety_map_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}
