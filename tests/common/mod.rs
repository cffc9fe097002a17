mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from coincount for tests
pub use coincount::{CoinDetector, DetectionConfig, DetectionError, DetectionResult, LabelMap, Pipeline};
