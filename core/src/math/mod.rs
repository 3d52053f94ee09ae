pub mod convolution;
pub mod fft;
pub mod stats;

pub use convolution::{convolve, ConvolutionMode};
pub use fft::FftHelper;
pub use stats::StatsHelper;
