use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DetectionError, Result};

/// Tallest caption band accepted by [`DetectionConfig::validate`]
pub const MAX_CAPTION_HEIGHT: u32 = 4096;

/// Tunable parameters of the coin detection pipeline.
///
/// Every field has a default matching the reference behaviour, so a JSON
/// file only needs to list the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Side length of the square structuring element
    pub kernel_size: u32,
    /// Erosion/dilation passes of the opening
    pub opening_iterations: u32,
    /// Dilation passes producing the confident background
    pub background_dilation_iterations: u32,
    /// Fraction of the maximum distance above which a pixel is a seed
    pub foreground_distance_fraction: f64,
    /// Regions with circularity strictly above this value are coins
    pub circularity_threshold: f64,
    /// Height of the caption band prepended to the annotated image
    pub caption_height: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            opening_iterations: 2,
            background_dilation_iterations: 3,
            foreground_distance_fraction: 0.1,
            circularity_threshold: 0.7,
            caption_height: 50,
        }
    }
}

impl DetectionConfig {
    /// Load a configuration from a JSON file, filling missing keys with defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_circularity_threshold(mut self, threshold: f64) -> Self {
        self.circularity_threshold = threshold;
        self
    }

    pub fn with_foreground_distance_fraction(mut self, fraction: f64) -> Self {
        self.foreground_distance_fraction = fraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(DetectionError::InvalidConfig(format!(
                "kernel_size must be odd and positive, got {}",
                self.kernel_size
            )));
        }
        // Norm::LInf radius is a u8
        if self.kernel_size / 2 > u8::MAX as u32 {
            return Err(DetectionError::InvalidConfig(format!(
                "kernel_size {} is too large",
                self.kernel_size
            )));
        }
        if !(0.0..1.0).contains(&self.foreground_distance_fraction) {
            return Err(DetectionError::InvalidConfig(format!(
                "foreground_distance_fraction must be in [0, 1), got {}",
                self.foreground_distance_fraction
            )));
        }
        if !self.circularity_threshold.is_finite() || self.circularity_threshold < 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "circularity_threshold must be finite and non-negative, got {}",
                self.circularity_threshold
            )));
        }
        if self.caption_height > MAX_CAPTION_HEIGHT {
            return Err(DetectionError::InvalidConfig(format!(
                "caption_height must be at most {}, got {}",
                MAX_CAPTION_HEIGHT, self.caption_height
            )));
        }
        Ok(())
    }

    /// Radius of the structuring element in the L-infinity norm
    pub(crate) fn kernel_radius(&self) -> u8 {
        (self.kernel_size / 2) as u8
    }
}
