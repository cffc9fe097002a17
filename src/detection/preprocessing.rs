use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

use crate::error::{DetectionError, Result};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Inverted Otsu binarization: pixels at or below the automatic threshold
/// become foreground. Returns the mask together with the threshold.
pub fn binarize(gray: &GrayImage) -> Result<(GrayImage, u8)> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "cannot binarize a {}x{} image",
            width, height
        )));
    }

    let level = otsu_level(gray);
    let mask = GrayImage::from_fn(width, height, |x, y| {
        if gray.get_pixel(x, y)[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    Ok((mask, level))
}

/// Dilate `iterations` times with a square element of the given radius
pub fn dilate_mask(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, Norm::LInf, radius);
    }
    out
}

/// Erode `iterations` times with a square element of the given radius
pub fn erode_mask(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode(&out, Norm::LInf, radius);
    }
    out
}

/// Morphological opening: all erosions first, then as many dilations
pub fn open_mask(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let eroded = erode_mask(mask, radius, iterations);
    dilate_mask(&eroded, radius, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_tone(width: u32, height: u32, dark: (u32, u32, u32, u32)) -> GrayImage {
        let (x0, y0, x1, y1) = dark;
        GrayImage::from_fn(width, height, |x, y| {
            if x >= x0 && x < x1 && y >= y0 && y < y1 {
                Luma([40])
            } else {
                Luma([220])
            }
        })
    }

    #[test]
    fn grayscale_keeps_dimensions() {
        let rgb = RgbImage::from_pixel(7, 5, Rgb([10, 200, 30]));
        let gray = to_grayscale(&rgb);
        assert_eq!(gray.dimensions(), (7, 5));
    }

    #[test]
    fn dark_object_becomes_foreground() -> anyhow::Result<()> {
        let gray = two_tone(20, 20, (5, 5, 15, 15));
        let (mask, level) = binarize(&gray)?;
        assert!(level >= 40 && level < 220);
        assert_eq!(mask.get_pixel(10, 10)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(0, 0)[0], BACKGROUND);
        assert!(mask.pixels().all(|p| p[0] == FOREGROUND || p[0] == BACKGROUND));
        Ok(())
    }

    #[test]
    fn empty_image_is_rejected() {
        let gray = GrayImage::new(0, 0);
        assert!(matches!(binarize(&gray), Err(DetectionError::InvalidInput(_))));
    }

    #[test]
    fn opening_removes_specks_but_keeps_blobs() {
        let mut mask = GrayImage::new(30, 30);
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        for y in 10..25 {
            for x in 10..25 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }

        let opened = open_mask(&mask, 1, 2);
        assert_eq!(opened.get_pixel(2, 2)[0], BACKGROUND);
        assert_eq!(opened.get_pixel(17, 17)[0], FOREGROUND);
        assert_eq!(opened.get_pixel(10, 10)[0], FOREGROUND);
    }

    #[test]
    fn dilation_grows_by_radius_times_iterations() {
        let mut mask = GrayImage::new(21, 21);
        mask.put_pixel(10, 10, Luma([FOREGROUND]));
        let grown = dilate_mask(&mask, 1, 3);
        assert_eq!(grown.get_pixel(13, 13)[0], FOREGROUND);
        assert_eq!(grown.get_pixel(14, 10)[0], BACKGROUND);
    }
}
