use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::PathBuf;

use crate::config::DetectionConfig;
use crate::detection::render::{colorize_labels, normalize_distance};
use crate::detection::{CoinDetector, DetectionTrace};
use crate::models::DetectionResult;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Seed for the label visualization colors
    pub color_seed: u64,
}

/// Coin detection front-end: runs the detector and, in debug mode, dumps
/// every intermediate stage as a numbered PNG
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    detector: CoinDetector,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Create a pipeline with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the detection parameters
    pub fn with_config(mut self, config: DetectionConfig) -> Result<Self> {
        self.detector = CoinDetector::new(config)?;
        Ok(self)
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                anyhow::bail!("Debug directory is not empty: {}", output_dir.display());
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig {
            output_dir,
            color_seed: 0,
        });

        Ok(self)
    }

    /// Seed used to color labels in debug images
    pub fn with_color_seed(mut self, seed: u64) -> Self {
        if let Some(debug) = &mut self.debug {
            debug.color_seed = seed;
        }
        self
    }

    pub fn detector(&self) -> &CoinDetector {
        &self.detector
    }

    /// Run the detector on a decoded image
    pub fn run(&self, input: &DynamicImage) -> Result<DetectionResult> {
        let rgb = input.to_rgb8();
        let trace = self.detector.trace(&rgb)?;

        if let Some(debug) = &self.debug {
            save_trace(debug, &DynamicImage::ImageRgb8(rgb), &trace)?;
        }

        Ok(trace.into_result())
    }
}

fn save_trace(debug: &DebugConfig, input: &DynamicImage, trace: &DetectionTrace) -> Result<()> {
    let markers = &trace.markers;
    let stages: Vec<(&str, DynamicImage)> = vec![
        ("input", input.clone()),
        ("grayscale", DynamicImage::ImageLuma8(trace.gray.clone())),
        ("binary", DynamicImage::ImageLuma8(trace.binary.clone())),
        ("opening", DynamicImage::ImageLuma8(trace.opening.clone())),
        ("sure background", DynamicImage::ImageLuma8(markers.sure_background.clone())),
        ("distance", DynamicImage::ImageLuma8(normalize_distance(&markers.distance))),
        ("sure foreground", DynamicImage::ImageLuma8(markers.sure_foreground.clone())),
        ("unknown", DynamicImage::ImageLuma8(markers.unknown.clone())),
        ("markers", DynamicImage::ImageRgb8(colorize_labels(&markers.labels, debug.color_seed))),
        ("watershed", DynamicImage::ImageRgb8(colorize_labels(&trace.regions, debug.color_seed))),
        ("annotated", DynamicImage::ImageRgb8(trace.annotated.clone())),
    ];

    for (idx, (name, image)) in stages.iter().enumerate() {
        let filename = format!("{:02}_{}.png", idx, name.to_lowercase().replace(' ', "_"));
        let path = debug.output_dir.join(&filename);
        image
            .save(&path)
            .with_context(|| format!("Failed to save debug image {}", path.display()))?;
        log::debug!("Debug: saved {}", filename);
    }

    Ok(())
}
