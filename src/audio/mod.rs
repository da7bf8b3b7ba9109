// Audio module - decoded signals, resampling and fixed-length windowing

pub mod signal;
pub mod windowing;

// Re-export commonly used types for convenience
pub use signal::{resample_linear, AudioSignal};
pub use windowing::Windows;
