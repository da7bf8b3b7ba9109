// Acoustic Danger Core - Rust audio analysis engine
// Windowed feature extraction, cry detection and heuristic danger scoring

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod model;

// Re-exports for convenience
pub use analysis::cry::{CryEvent, CryType};
pub use analysis::summary::{FileAnalysis, FileSummary, WindowResult};
pub use analysis::{AudioAnalyzer, DirectoryEntry};
pub use audio::AudioSignal;
pub use config::AppConfig;

use log::info;

/// Install a `tracing` subscriber writing to stderr
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
    {
        info!("Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_module_structure() {
        let analyzer = AudioAnalyzer::new(AppConfig::default());
        assert_eq!(analyzer.config().analysis.samples_per_window(), 220_500);
    }
}
