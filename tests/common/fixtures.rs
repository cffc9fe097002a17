use image::{Rgb, RgbImage};
use tempfile::NamedTempFile;

/// Color constants for tests
pub const PAPER: Rgb<u8> = Rgb([235, 235, 230]);
pub const COPPER: Rgb<u8> = Rgb([60, 45, 30]);

/// A disk drawn onto a synthetic scene
#[derive(Debug, Clone, Copy)]
pub struct Disk {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

impl Disk {
    pub const fn new(x: i32, y: i32, radius: i32) -> Self {
        Self { x, y, radius }
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        let dx = x as i32 - self.x;
        let dy = y as i32 - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Dark filled disks on a uniform light background
pub fn coin_scene(width: u32, height: u32, disks: &[Disk]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if disks.iter().any(|d| d.contains(x, y)) {
            COPPER
        } else {
            PAPER
        }
    })
}

/// `n` disks of the same radius on a grid, spaced well apart
pub fn separated_coins(n: u32, radius: i32) -> RgbImage {
    let pitch = radius * 4;
    let cols = 4;
    let rows = n.div_ceil(cols).max(1);
    let disks: Vec<Disk> = (0..n as i32)
        .map(|i| {
            let col = i % cols as i32;
            let row = i / cols as i32;
            Disk::new(pitch / 2 + col * pitch, pitch / 2 + row * pitch, radius)
        })
        .collect();
    coin_scene(cols * pitch as u32, rows * pitch as u32, &disks)
}

/// Dark axis-aligned rectangle on a light background
pub fn rectangle_scene(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if x >= x0 && x < x1 && y >= y0 && y < y1 {
            COPPER
        } else {
            PAPER
        }
    })
}

/// Three coins, one bar and one overlapping pair in the same picture
pub fn mixed_scene() -> RgbImage {
    let mut img = coin_scene(
        360,
        200,
        &[
            Disk::new(40, 40, 22),
            Disk::new(120, 40, 18),
            Disk::new(200, 45, 25),
            Disk::new(60, 140, 25),
            Disk::new(100, 140, 25),
        ],
    );
    for y in 120..140 {
        for x in 180..350 {
            img.put_pixel(x, y, COPPER);
        }
    }
    img
}

/// Writes `img` to a temporary PNG file that lives as long as the handle
pub fn save_temp_png(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
