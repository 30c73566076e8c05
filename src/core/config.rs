//! Configuration presets for overlay behavior tuning
//!
//! This module provides preset profiles that resolve to concrete option
//! sets, plus JSON loading for deployments that keep overlay defaults in
//! configuration files.

use crate::core::options::{ClusterOptions, DrawingOptions, MarkerOptions, PolygonOptions};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Clustering presets for common marker densities
#[derive(Debug, Clone)]
pub enum ClusterProfile {
    /// Reasonable defaults for mixed marker densities
    Balanced,
    /// Tight grids for very dense marker sets
    Dense,
    /// Wide grids that only collapse markers when they nearly overlap
    Sparse,
    Custom(ClusterOptions),
}

impl ClusterProfile {
    pub fn resolve(&self) -> ClusterOptions {
        match self {
            Self::Balanced => ClusterOptions {
                grid_size: Some(60),
                max_zoom: Some(15),
                minimum_cluster_size: Some(2),
                average_center: Some(true),
                zoom_on_click: Some(true),
                ..Default::default()
            },
            Self::Dense => ClusterOptions {
                grid_size: Some(40),
                max_zoom: Some(17),
                minimum_cluster_size: Some(3),
                average_center: Some(true),
                zoom_on_click: Some(true),
                ..Default::default()
            },
            Self::Sparse => ClusterOptions {
                grid_size: Some(90),
                max_zoom: Some(12),
                minimum_cluster_size: Some(2),
                average_center: Some(false),
                zoom_on_click: Some(true),
                ..Default::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

/// Overlay option defaults, loadable from configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayDefaults {
    pub marker: MarkerOptions,
    pub polygon: PolygonOptions,
    pub cluster: ClusterOptions,
    pub drawing: DrawingOptions,
}

impl OverlayDefaults {
    /// Loads defaults from a JSON document; missing sections keep their
    /// built-in defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_resolution() {
        let balanced = ClusterProfile::Balanced.resolve();
        assert_eq!(balanced.grid_size, Some(60));
        assert_eq!(balanced.minimum_cluster_size, Some(2));

        let dense = ClusterProfile::Dense.resolve();
        assert!(dense.grid_size < balanced.grid_size);
    }

    #[test]
    fn test_defaults_from_json() {
        let defaults = OverlayDefaults::from_json(
            r##"{
                "cluster": {"gridSize": 80, "zoomOnClick": false},
                "polygon": {"strokeColor": "#ff0000"}
            }"##,
        )
        .expect("valid config");
        assert_eq!(defaults.cluster.grid_size, Some(80));
        assert_eq!(defaults.cluster.zoom_on_click, Some(false));
        assert_eq!(defaults.polygon.stroke_color.as_deref(), Some("#ff0000"));
        assert!(defaults.marker.visible);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(OverlayDefaults::from_json("{not json").is_err());
    }
}
