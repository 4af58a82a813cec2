//! Compile-time registry of overlay presets.
//!
//! Each preset is defined in a TOML file under `overlays/`. The registry
//! embeds these at compile time and exposes them via [`all_presets`] and
//! [`find_preset`].

use serde::{Deserialize, Serialize};

use crate::heat::HeatLayerOptions;

/// A named overlay configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPreset {
    /// Unique identifier (e.g., `"police"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Short description for listings.
    #[serde(default)]
    pub description: Option<String>,
    /// How reports are aggregated into cells.
    pub grid: GridStrategy,
    /// Heat layer settings, if this overlay draws one.
    #[serde(default)]
    pub heat: Option<HeatLayerOptions>,
}

/// Grid aggregation strategy, tagged by `type` in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridStrategy {
    /// Fixed lattice over the visible region.
    Fixed {
        /// Cell edge length in degrees.
        cell_size: f64,
        /// Whether cells without reports are emitted.
        #[serde(default = "default_true")]
        include_empty: bool,
    },
    /// Zoom-scaled buckets around the reports, independent of the region.
    Zoom {
        /// Bucket edge length in degrees at `base_zoom`.
        base_cell_size: f64,
        /// Zoom level at which `base_cell_size` applies.
        base_zoom: u8,
    },
}

const fn default_true() -> bool {
    true
}

// ── Compile-time embedded TOML files ────────────────────────────────

const PRESET_TOMLS: &[(&str, &str)] = &[
    ("police", include_str!("../overlays/police.toml")),
    ("citizen", include_str!("../overlays/citizen.toml")),
];

#[cfg(test)]
const EXPECTED_PRESET_COUNT: usize = 2;

/// Returns all overlay presets.
///
/// # Panics
///
/// Panics if any TOML preset is malformed (the presets are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_presets() -> Vec<OverlayPreset> {
    PRESET_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse overlay preset '{name}': {e}"))
        })
        .collect()
}

/// Looks up a preset by id.
#[must_use]
pub fn find_preset(id: &str) -> Option<OverlayPreset> {
    all_presets().into_iter().find(|p| p.id == id)
}
