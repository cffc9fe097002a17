use image::RgbImage;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{DetectionError, Result};
use crate::models::LabelMap;

/// Pixel already pushed to the flood queue
const QUEUED: i32 = -2;

/// Largest per-channel absolute difference between two pixels
fn elevation(img: &RgbImage, a: usize, b: usize) -> u8 {
    let raw = img.as_raw();
    (0..3)
        .map(|c| raw[a * 3 + c].abs_diff(raw[b * 3 + c]))
        .max()
        .unwrap_or(0)
}

/// 4-neighbourhood of a pixel index
fn neighbours(idx: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    let x = idx % width;
    let y = idx / width;
    [
        (x > 0).then(|| idx - 1),
        (x + 1 < width).then(|| idx + 1),
        (y > 0).then(|| idx - width),
        (y + 1 < height).then(|| idx + width),
    ]
    .into_iter()
    .flatten()
}

/// Flood queue ordered by elevation, FIFO among equal elevations
struct FloodQueue {
    heap: BinaryHeap<Reverse<(u8, u64, usize)>>,
    sequence: u64,
}

impl FloodQueue {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            sequence: 0,
        }
    }

    fn push(&mut self, elevation: u8, idx: usize) {
        self.heap.push(Reverse((elevation, self.sequence, idx)));
        self.sequence += 1;
    }

    fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|Reverse((_, _, idx))| idx)
    }
}

/// Marker-controlled watershed.
///
/// Floods every `UNKNOWN` pixel of `markers` from the resolved labels
/// around it, lowest colour difference first. Pixels reached by two
/// different basins become `LabelMap::BOUNDARY`; pixels no basin reaches
/// are marked the same way, so the returned map holds no `UNKNOWN` value.
pub fn watershed(img: &RgbImage, markers: &LabelMap) -> Result<LabelMap> {
    if img.dimensions() != markers.dimensions() {
        let (w, h) = img.dimensions();
        let (mw, mh) = markers.dimensions();
        return Err(DetectionError::InvalidInput(format!(
            "image is {}x{} but markers are {}x{}",
            w, h, mw, mh
        )));
    }

    let width = markers.width() as usize;
    let height = markers.height() as usize;
    let mut out = markers.clone();
    let labels = out.as_mut_slice();
    let mut queue = FloodQueue::new();

    // Seed the queue with the unknown pixels touching a resolved basin
    for idx in 0..labels.len() {
        if labels[idx] != LabelMap::UNKNOWN {
            continue;
        }
        let start = neighbours(idx, width, height)
            .filter(|&n| labels[n] > LabelMap::UNKNOWN)
            .map(|n| elevation(img, idx, n))
            .min();
        if let Some(level) = start {
            queue.push(level, idx);
            labels[idx] = QUEUED;
        }
    }

    while let Some(idx) = queue.pop() {
        let mut label = LabelMap::UNKNOWN;
        for n in neighbours(idx, width, height) {
            let l = labels[n];
            if l <= LabelMap::UNKNOWN {
                continue;
            }
            if label == LabelMap::UNKNOWN {
                label = l;
            } else if label != l {
                label = LabelMap::BOUNDARY;
                break;
            }
        }

        // Only pixels queued by a basin neighbour get here, so a label exists
        if label == LabelMap::UNKNOWN {
            label = LabelMap::BOUNDARY;
        }
        labels[idx] = label;
        if label == LabelMap::BOUNDARY {
            continue;
        }

        for n in neighbours(idx, width, height) {
            if labels[n] == LabelMap::UNKNOWN {
                queue.push(elevation(img, idx, n), n);
                labels[n] = QUEUED;
            }
        }
    }

    let mut stranded = 0usize;
    for label in labels.iter_mut() {
        if *label == LabelMap::UNKNOWN || *label == QUEUED {
            *label = LabelMap::BOUNDARY;
            stranded += 1;
        }
    }
    if stranded > 0 {
        log::debug!("watershed: {} pixels unreachable from any seed", stranded);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn resolves_every_unknown_pixel() -> anyhow::Result<()> {
        let img = RgbImage::from_pixel(12, 6, Rgb([100, 100, 100]));
        let mut markers = LabelMap::new(12, 6, LabelMap::UNKNOWN);
        markers.set(0, 3, 2);
        markers.set(11, 3, 3);

        let labels = watershed(&img, &markers)?;
        assert!(labels.as_slice().iter().all(|&l| l != LabelMap::UNKNOWN));
        assert_eq!(labels.get(1, 3), 2);
        assert_eq!(labels.get(10, 3), 3);
        assert!(labels.count(LabelMap::BOUNDARY) > 0);
        Ok(())
    }

    #[test]
    fn boundary_follows_colour_edge() -> anyhow::Result<()> {
        // left half dark, right half bright; seeds at the far ends
        let img = RgbImage::from_fn(20, 5, |x, _| {
            if x < 8 { Rgb([20, 20, 20]) } else { Rgb([230, 230, 230]) }
        });
        let mut markers = LabelMap::new(20, 5, LabelMap::UNKNOWN);
        for y in 0..5 {
            markers.set(0, y, 2);
            markers.set(19, y, 3);
        }

        let labels = watershed(&img, &markers)?;
        for y in 0..5 {
            assert_eq!(labels.get(6, y), 2);
            assert_eq!(labels.get(10, y), 3);
            let column: Vec<i32> = (0..20).map(|x| labels.get(x, y)).collect();
            let line = column.iter().position(|&l| l == LabelMap::BOUNDARY);
            assert!(matches!(line, Some(7) | Some(8)), "row {y}: {column:?}");
        }
        Ok(())
    }

    #[test]
    fn unreachable_pixels_become_boundary() -> anyhow::Result<()> {
        let img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let markers = LabelMap::new(4, 4, LabelMap::UNKNOWN);
        let labels = watershed(&img, &markers)?;
        assert_eq!(labels.count(LabelMap::BOUNDARY), 16);
        Ok(())
    }

    #[test]
    fn is_deterministic() -> anyhow::Result<()> {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 13 % 256) as u8, (y * 7) as u8, 50]));
        let mut markers = LabelMap::new(16, 16, LabelMap::UNKNOWN);
        markers.set(2, 2, 2);
        markers.set(13, 13, 3);
        markers.set(2, 13, LabelMap::BACKGROUND);

        let a = watershed(&img, &markers)?;
        let b = watershed(&img, &markers)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn rejects_mismatched_sizes() {
        let img = RgbImage::new(4, 4);
        let markers = LabelMap::new(5, 4, LabelMap::UNKNOWN);
        assert!(matches!(watershed(&img, &markers), Err(DetectionError::InvalidInput(_))));
    }
}
