use image::{Rgb, RgbImage};
use std::env;

/// Renders a synthetic coin photo: a row of separated coins, a touching
/// pair and a bar that must not be counted
fn main() -> anyhow::Result<()> {
    let path = env::args().nth(1).unwrap_or_else(|| "test_coins.png".to_string());

    let coins = [
        (60, 60, 30),
        (150, 60, 24),
        (240, 60, 28),
        (330, 60, 20),
        (90, 190, 32),
        (150, 190, 32),
    ];

    let mut img = RgbImage::new(420, 280);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        // slight vertical gradient so the background is not perfectly flat
        let shade = 225 + (y * 20 / 280) as u8;
        *pixel = Rgb([shade, shade, shade - 5]);

        let inside = coins.iter().any(|&(cx, cy, r)| {
            let dx = x as i32 - cx;
            let dy = y as i32 - cy;
            dx * dx + dy * dy <= r * r
        });
        if inside {
            *pixel = Rgb([120, 85, 40]);
        }
        if (230..400).contains(&x) && (170..200).contains(&y) {
            *pixel = Rgb([70, 70, 75]);
        }
    }

    img.save(&path)?;
    println!("Created {} (420x280, 4 separate coins, 1 touching pair, 1 bar)", path);
    Ok(())
}
