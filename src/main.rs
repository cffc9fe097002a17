use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;

use coincount::{DetectionConfig, Pipeline};

#[derive(Parser)]
#[command(name = "coincount")]
#[command(about = "Count coins in a photograph")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Where to write the annotated image (default: <IMAGE>_detected.png)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON file with detection parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the circularity acceptance threshold
    #[arg(long)]
    circularity: Option<f64>,

    /// Override the distance fraction used for foreground seeds
    #[arg(long)]
    foreground_fraction: Option<f64>,

    /// Print the detected coins as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &args.config {
        Some(path) => DetectionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectionConfig::default(),
    };
    if let Some(threshold) = args.circularity {
        config = config.with_circularity_threshold(threshold);
    }
    if let Some(fraction) = args.foreground_fraction {
        config = config.with_foreground_distance_fraction(fraction);
    }

    log::debug!("Loading image: {:?}", args.image_path);
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    log::debug!("Image loaded: {}x{}", img.width(), img.height());

    let mut pipeline = Pipeline::new().with_config(config)?;
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let result = pipeline.run(&img)?;

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        args.image_path.with_file_name(format!("{}_detected.png", stem))
    });
    result
        .annotated
        .save(&output)
        .with_context(|| format!("Failed to save {}", output.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.coins)?);
    } else {
        println!("Number of coins detected: {}", result.count);
        for coin in &result.coins {
            log::debug!(
                "  Coin {} at ({:.1}, {:.1}) radius={:.1} circularity={:.3}",
                coin.index,
                coin.circle.x,
                coin.circle.y,
                coin.circle.radius,
                coin.circularity
            );
        }
    }
    log::info!("Annotated image written to {}", output.display());

    Ok(())
}
