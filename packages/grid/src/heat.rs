//! Weighted points for the continuous heat layer.
//!
//! The density surface itself is drawn by the map library. This module
//! only fixes how much each report contributes to it.

use safety_map_grid_models::HeatPoint;
use safety_map_safety_models::{PointReport, SafetyKind};

pub use safety_map_grid_models::{GradientStop, HeatLayerOptions};

/// Intensity contributed by a dangerous report.
pub const DANGEROUS_WEIGHT: f64 = 1.0;
/// Intensity contributed by a safe report.
pub const SAFE_WEIGHT: f64 = 0.5;

/// Heat intensity for a report of the given kind.
#[must_use]
pub const fn weight(kind: SafetyKind) -> f64 {
    match kind {
        SafetyKind::Dangerous => DANGEROUS_WEIGHT,
        SafetyKind::Safe => SAFE_WEIGHT,
    }
}

/// Converts reports to weighted heat points, preserving order.
#[must_use]
pub fn heat_points(points: &[PointReport]) -> Vec<HeatPoint> {
    points
        .iter()
        .map(|p| HeatPoint {
            latitude: p.latitude,
            longitude: p.longitude,
            intensity: weight(p.kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_per_kind() {
        assert!((weight(SafetyKind::Dangerous) - 1.0).abs() < f64::EPSILON);
        assert!((weight(SafetyKind::Safe) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn heat_points_keep_order_and_position() {
        let points = vec![
            PointReport {
                id: 1,
                latitude: 10.0,
                longitude: 20.0,
                kind: SafetyKind::Safe,
                created_at: chrono::DateTime::default(),
            },
            PointReport {
                id: 2,
                latitude: 11.0,
                longitude: 21.0,
                kind: SafetyKind::Dangerous,
                created_at: chrono::DateTime::default(),
            },
        ];

        let heat = heat_points(&points);

        assert_eq!(heat.len(), 2);
        assert_eq!(heat[0].as_triple(), [10.0, 20.0, 0.5]);
        assert_eq!(heat[1].as_triple(), [11.0, 21.0, 1.0]);
    }

    #[test]
    fn default_gradient_is_ascending() {
        let options = HeatLayerOptions::default();
        assert_eq!(options.gradient.len(), 4);
        for window in options.gradient.windows(2) {
            assert!(window[0].stop < window[1].stop);
        }
        assert_eq!(options.gradient[3].color, "red");
    }
}
