pub mod preprocessing;
pub mod markers;
pub mod watershed;
pub mod contours;
pub mod circles;
pub mod render;

use image::{DynamicImage, GrayImage, RgbImage};

use crate::config::DetectionConfig;
use crate::error::{DetectionError, Result};
use crate::models::{Coin, DetectionResult, LabelMap};
use markers::Markers;

/// Every intermediate buffer of one detection run (for debugging)
#[derive(Debug, Clone)]
pub struct DetectionTrace {
    pub gray: GrayImage,
    pub threshold: u8,
    pub binary: GrayImage,
    pub opening: GrayImage,
    pub markers: Markers,
    pub regions: LabelMap,
    pub coins: Vec<Coin>,
    pub annotated: RgbImage,
}

impl DetectionTrace {
    pub fn into_result(self) -> DetectionResult {
        DetectionResult {
            annotated: self.annotated,
            count: self.coins.len(),
            coins: self.coins,
        }
    }
}

/// Coin counting pipeline.
///
/// Holds only its configuration; every call works on fresh buffers, so a
/// single detector can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct CoinDetector {
    config: DetectionConfig,
}

impl CoinDetector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Count the coins in an RGB image
    pub fn detect(&self, img: &RgbImage) -> Result<DetectionResult> {
        Ok(self.trace(img)?.into_result())
    }

    /// Count the coins in a tightly packed 8-bit RGB buffer
    pub fn detect_raw(&self, width: u32, height: u32, data: &[u8]) -> Result<DetectionResult> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(DetectionError::InvalidInput(format!(
                "expected {} bytes for a {}x{} RGB image, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        let img = RgbImage::from_raw(width, height, data.to_vec())
            .ok_or_else(|| DetectionError::InvalidInput("buffer does not match dimensions".into()))?;
        self.detect(&img)
    }

    /// Count the coins in any decoded image, converting it to RGB first
    pub fn detect_dynamic(&self, img: &DynamicImage) -> Result<DetectionResult> {
        self.detect(&img.to_rgb8())
    }

    /// Run the full pipeline and keep every intermediate buffer
    pub fn trace(&self, img: &RgbImage) -> Result<DetectionTrace> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidInput(format!(
                "image must not be empty, got {}x{}",
                width, height
            )));
        }
        let config = &self.config;
        let radius = config.kernel_radius();

        log::debug!("Converting {}x{} image to grayscale...", width, height);
        let gray = preprocessing::to_grayscale(img);

        let (binary, threshold) = preprocessing::binarize(&gray)?;
        log::debug!("Otsu threshold: {}", threshold);

        let opening = preprocessing::open_mask(&binary, radius, config.opening_iterations);

        let markers = markers::generate_markers(
            &opening,
            radius,
            config.background_dilation_iterations,
            config.foreground_distance_fraction,
        );
        log::debug!("Found {} seed regions", markers.seed_count);

        let regions = watershed::watershed(img, &markers.labels)?;
        log::debug!(
            "Watershed produced {} regions, {} boundary pixels",
            regions.region_labels().len(),
            regions.count(LabelMap::BOUNDARY)
        );

        let coins = circles::classify_regions(&regions, config.circularity_threshold);
        log::info!("Detected {} coins", coins.len());

        let annotated = render::annotate(img, &coins, config.caption_height)?;

        Ok(DetectionTrace {
            gray,
            threshold,
            binary,
            opening,
            markers,
            regions,
            coins,
            annotated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let config = DetectionConfig {
            kernel_size: 2,
            ..Default::default()
        };
        assert!(CoinDetector::new(config).is_err());
    }

    #[test]
    fn raw_buffer_length_is_checked() {
        let detector = CoinDetector::default();
        let err = detector.detect_raw(4, 4, &[0u8; 4 * 4 * 4]).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    #[test]
    fn blank_image_has_no_coins() -> anyhow::Result<()> {
        let img = RgbImage::from_pixel(40, 30, image::Rgb([200, 200, 200]));
        let result = CoinDetector::default().detect(&img)?;
        assert_eq!(result.count, 0);
        assert_eq!(result.annotated.dimensions(), (40, 80));
        Ok(())
    }

    #[test]
    fn trace_matches_result() -> anyhow::Result<()> {
        let img = RgbImage::from_fn(60, 60, |x, y| {
            let dx = x as i32 - 30;
            let dy = y as i32 - 30;
            if dx * dx + dy * dy <= 15 * 15 {
                image::Rgb([30, 30, 30])
            } else {
                image::Rgb([230, 230, 230])
            }
        });
        let detector = CoinDetector::default();
        let trace = detector.trace(&img)?;
        assert!(trace.regions.as_slice().iter().all(|&l| l != LabelMap::UNKNOWN));
        let count = trace.coins.len();
        let result = trace.into_result();
        assert_eq!(result.count, count);
        assert_eq!(result.count, 1);
        Ok(())
    }
}
