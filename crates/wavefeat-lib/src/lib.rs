pub mod detectors;
pub mod error;
pub mod io;
pub mod signal;
pub mod synthetic;
pub mod waveforms;

pub use detectors::*;
pub use error::{Result, WaveformError};
pub use signal::*;
pub use waveforms::{TabularSource, Waveforms};
