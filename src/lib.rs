pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::DetectionConfig;
pub use detection::{CoinDetector, DetectionTrace};
pub use error::{DetectionError, Result};
pub use models::{Circle, Coin, DetectionResult, LabelMap};
pub use pipeline::{DebugConfig, Pipeline};
