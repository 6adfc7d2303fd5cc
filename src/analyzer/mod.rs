// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod price_analysis;
pub mod market_indicators;
pub mod time_frames;
pub mod distribution;
pub mod prediction;

// Re-export the main entry points for ease of use.
pub use price_analysis::{Analyzer, AnalyzerImpl};
pub use prediction::PricePredictor;
