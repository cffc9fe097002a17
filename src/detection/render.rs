use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::error::{DetectionError, Result};
use crate::models::{Coin, LabelMap};

pub const CIRCLE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const INDEX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CAPTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CAPTION_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const INDEX_SCALE: u32 = 2;
const MAX_CAPTION_SCALE: u32 = 3;

/// 5x7 bitmap, one byte per row, bit 4 is the leftmost column
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => [0; 7],
    }
}

/// Draw `text` with its bottom-left corner at `origin`, each font pixel
/// becoming a `scale`x`scale` square. Clipped to the canvas.
pub fn draw_text(canvas: &mut RgbImage, origin: (i32, i32), text: &str, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let top = origin.1 - (GLYPH_HEIGHT * scale) as i32;
    for (i, c) in text.chars().enumerate() {
        let left = origin.0 + (i as u32 * (GLYPH_WIDTH + 1) * scale) as i32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x = left + (col * scale) as i32;
                let y = top + (row as u32 * scale) as i32;
                draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(scale, scale), color);
            }
        }
    }
}

/// Outline every accepted coin and write its display index next to it
pub fn draw_coins(canvas: &mut RgbImage, coins: &[Coin]) {
    for coin in coins {
        let (center, radius) = coin.circle.to_pixels();
        draw_hollow_circle_mut(canvas, center, radius, CIRCLE_COLOR);
        if radius > 1 {
            draw_hollow_circle_mut(canvas, center, radius - 1, CIRCLE_COLOR);
        }
        draw_text(
            canvas,
            (center.0 + radius, center.1),
            &coin.index.to_string(),
            INDEX_SCALE,
            INDEX_COLOR,
        );
    }
}

/// Copy of `original` with the coins drawn and a caption band on top
pub fn annotate(original: &RgbImage, coins: &[Coin], caption_height: u32) -> Result<RgbImage> {
    let (width, height) = original.dimensions();
    let total_height = height.checked_add(caption_height).ok_or_else(|| {
        DetectionError::InvalidConfig(format!("caption_height {caption_height} overflows image height {height}"))
    })?;

    let mut drawn = original.clone();
    draw_coins(&mut drawn, coins);

    let mut out = RgbImage::from_pixel(width, total_height, CAPTION_BACKGROUND);
    image::imageops::overlay(&mut out, &drawn, 0, caption_height.into());

    if caption_height > 0 {
        let scale = (caption_height.saturating_sub(10) / GLYPH_HEIGHT).clamp(1, MAX_CAPTION_SCALE);
        let caption = format!("Total Coins Detected: {}", coins.len());
        draw_text(&mut out, (10, caption_height as i32 - 10), &caption, scale, CAPTION_COLOR);
    }

    Ok(out)
}

/// Visualize a label map: background black, unknown gray, watershed lines
/// white, every region a random color drawn from `seed`
pub fn colorize_labels(labels: &LabelMap, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let palette: BTreeMap<i32, Rgb<u8>> = labels
        .region_labels()
        .into_iter()
        .map(|label| (label, Rgb([rng.random(), rng.random(), rng.random()])))
        .collect();

    let (width, height) = labels.dimensions();
    RgbImage::from_fn(width, height, |x, y| match labels.get(x, y) {
        LabelMap::BOUNDARY => Rgb([255, 255, 255]),
        LabelMap::UNKNOWN => Rgb([128, 128, 128]),
        LabelMap::BACKGROUND => Rgb([0, 0, 0]),
        label => palette.get(&label).copied().unwrap_or(Rgb([0, 0, 0])),
    })
}

/// Scale a distance map to 0..=255 for viewing
pub fn normalize_distance(distance: &super::markers::DistanceMap) -> GrayImage {
    let max = distance.pixels().map(|p| p[0]).fold(0.0f64, f64::max);
    GrayImage::from_fn(distance.width(), distance.height(), |x, y| {
        let d = distance.get_pixel(x, y)[0];
        let v = if max > 0.0 { d / max * 255.0 } else { 0.0 };
        image::Luma([v.round() as u8])
    })
}
