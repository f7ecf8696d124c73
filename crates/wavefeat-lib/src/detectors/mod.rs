pub mod cycle;
pub mod extrema;
pub mod waveform;
