use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicError};

/// Segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicParams {
    /// Side length of the initial grid cells, in pixels
    pub spacing: f32,

    /// Weight of the spatial term against the color term
    pub spatial_weight: f32,

    /// Scale of the color term
    pub color_weight: f32,

    /// Maximum number of refinement passes
    pub iterations: u32,

    /// Seed for the display color generator; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SlicParams {
    fn default() -> Self {
        Self {
            spacing: crate::DEFAULT_SPACING,
            spatial_weight: crate::DEFAULT_SPATIAL_WEIGHT,
            color_weight: crate::DEFAULT_COLOR_WEIGHT,
            iterations: crate::DEFAULT_ITERATIONS,
            seed: None,
        }
    }
}

impl SlicParams {
    /// Create parameters with the given grid spacing and defaults elsewhere
    pub fn new(spacing: f32) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub const fn with_spatial_weight(mut self, weight: f32) -> Self {
        self.spatial_weight = weight;
        self
    }

    #[must_use]
    pub const fn with_color_weight(mut self, weight: f32) -> Self {
        self.color_weight = weight;
        self
    }

    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that every divisor used by the distance metric and grid sizing is usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("spacing", self.spacing),
            ("spatial_weight", self.spatial_weight),
            ("color_weight", self.color_weight),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SlicError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Parse parameters from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SlicError::Config(e.to_string()))
    }

    /// Parse parameters from a YAML document
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| SlicError::Config(e.to_string()))
    }

    /// Parse parameters from a JSON document
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| SlicError::Config(e.to_string()))
    }

    /// Load parameters from a file, picking the format from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Err(SlicError::Config(format!(
                "Unsupported config file extension: {}",
                path.display()
            ))),
        }
    }
}
