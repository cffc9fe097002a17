use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{Connectivity, connected_components};

use super::preprocessing::{BACKGROUND, FOREGROUND, dilate_mask};
use crate::models::LabelMap;

/// Euclidean distance of every pixel to the nearest background pixel
pub type DistanceMap = ImageBuffer<Luma<f64>, Vec<f64>>;

/// Seed state handed to the watershed
#[derive(Debug, Clone)]
pub struct Markers {
    pub sure_background: GrayImage,
    pub distance: DistanceMap,
    pub sure_foreground: GrayImage,
    pub unknown: GrayImage,
    /// 0 = unknown band, 1 = background, >= 2 = one seed per component
    pub labels: LabelMap,
    pub seed_count: usize,
}

/// Distance from each foreground pixel of `mask` to the nearest background
/// pixel. Background pixels get 0; a mask without background yields all 0.
pub fn distance_to_background(mask: &GrayImage) -> DistanceMap {
    if !mask.pixels().any(|p| p[0] == BACKGROUND) {
        return DistanceMap::new(mask.width(), mask.height());
    }

    let inverted = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y)[0] == BACKGROUND {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let squared = euclidean_squared_distance_transform(&inverted);
    DistanceMap::from_fn(mask.width(), mask.height(), |x, y| {
        let d = squared.get_pixel(x, y)[0];
        if d.is_finite() { Luma([d.sqrt()]) } else { Luma([0.0]) }
    })
}

/// Build confident background/foreground masks and the seed label map
pub fn generate_markers(
    cleaned: &GrayImage,
    kernel_radius: u8,
    background_iterations: u32,
    foreground_fraction: f64,
) -> Markers {
    let (width, height) = cleaned.dimensions();
    let sure_background = dilate_mask(cleaned, kernel_radius, background_iterations);

    let distance = distance_to_background(cleaned);
    let max_distance = distance.pixels().map(|p| p[0]).fold(0.0f64, f64::max);
    let cutoff = foreground_fraction * max_distance;

    let sure_foreground = GrayImage::from_fn(width, height, |x, y| {
        if distance.get_pixel(x, y)[0] > cutoff {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let unknown = GrayImage::from_fn(width, height, |x, y| {
        let bg = sure_background.get_pixel(x, y)[0] == FOREGROUND;
        let fg = sure_foreground.get_pixel(x, y)[0] == FOREGROUND;
        if bg && !fg { Luma([FOREGROUND]) } else { Luma([BACKGROUND]) }
    });

    let components = connected_components(&sure_foreground, Connectivity::Eight, Luma([BACKGROUND]));

    let mut labels = LabelMap::new(width, height, LabelMap::BACKGROUND);
    let mut seed_count = 0usize;
    for (x, y, component) in components.enumerate_pixels() {
        let label = if unknown.get_pixel(x, y)[0] == FOREGROUND {
            LabelMap::UNKNOWN
        } else {
            component[0] as i32 + 1
        };
        seed_count = seed_count.max(component[0] as usize);
        labels.set(x, y, label);
    }

    log::debug!(
        "markers: max distance {:.2}, cutoff {:.2}, {} seeds",
        max_distance,
        cutoff,
        seed_count
    );

    Markers {
        sure_background,
        distance,
        sure_foreground,
        unknown,
        labels,
        seed_count,
    }
}
