use image::RgbImage;
use serde::Serialize;

/// Per-pixel region labels, stored row-major.
///
/// `UNKNOWN` (0) marks pixels still to be flooded, `BACKGROUND` (1) the
/// confident background, `BOUNDARY` (-1) the watershed lines between basins
/// and anything from `FIRST_REGION` (2) upwards a distinct region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<i32>,
}

impl LabelMap {
    pub const BOUNDARY: i32 = -1;
    pub const UNKNOWN: i32 = 0;
    pub const BACKGROUND: i32 = 1;
    pub const FIRST_REGION: i32 = 2;

    pub fn new(width: u32, height: u32, fill: i32) -> Self {
        Self {
            width,
            height,
            labels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.labels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, label: i32) {
        let idx = self.index(x, y);
        self.labels[idx] = label;
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.labels
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.labels
    }

    /// Iterate `(x, y, label)` in raster order
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, u32, i32)> + '_ {
        let width = self.width as usize;
        self.labels
            .iter()
            .enumerate()
            .map(move |(i, &label)| ((i % width) as u32, (i / width) as u32, label))
    }

    /// Distinct region labels (>= 2) in ascending order
    pub fn region_labels(&self) -> Vec<i32> {
        let mut labels: Vec<i32> = self
            .labels
            .iter()
            .copied()
            .filter(|&l| l >= Self::FIRST_REGION)
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    pub fn count(&self, label: i32) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Minimal circle enclosing a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    /// Integer center and radius, truncated the way the annotation expects
    pub fn to_pixels(&self) -> ((i32, i32), i32) {
        ((self.x as i32, self.y as i32), self.radius as i32)
    }
}

/// A region accepted as a coin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coin {
    /// 1-based display index in ascending label order
    pub index: usize,
    pub label: i32,
    pub circle: Circle,
    pub circularity: f64,
    pub area: f64,
    pub perimeter: f64,
}

/// Outcome of one detection run
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Original image with circles, indices and a caption band on top
    pub annotated: RgbImage,
    pub count: usize,
    pub coins: Vec<Coin>,
}
