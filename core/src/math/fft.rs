use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps a forward/inverse `rustfft` plan pair of a fixed size.
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            forward,
            inverse,
            size,
        }
    }

    /// Forward transform of a real signal, zero-padded or truncated to the plan size.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::zero());
        self.forward.process(&mut buffer);
        buffer
    }

    /// Inverse transform returning the normalized real part.
    pub fn inverse(&self, mut spectrum: Vec<Complex64>) -> Vec<f64> {
        spectrum.resize(self.size, Complex64::zero());
        self.inverse.process(&mut spectrum);
        let scale = 1.0 / self.size as f64;
        spectrum.iter().map(|c| c.re * scale).collect()
    }

    /// Unnormalized autocorrelation of `signal`, laid out like the full
    /// convolution of the signal with its own reverse (`2N - 1` samples,
    /// zero lag at index `N - 1`).
    pub fn autocorrelate(signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }

        let helper = FftHelper::new(2 * signal.len() - 1);
        let reversed: Vec<f64> = signal.iter().rev().copied().collect();
        let lhs = helper.forward(signal);
        let rhs = helper.forward(&reversed);
        let product = lhs.iter().zip(rhs.iter()).map(|(a, b)| a * b).collect();
        helper.inverse(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::convolution::{convolve, ConvolutionMode};

    #[test]
    fn fft_helper_returns_plan_length() {
        let helper = FftHelper::new(4);
        let output = helper.forward(&[1.0, 0.0, -1.0, 0.0]);
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn inverse_restores_forward_input() {
        let helper = FftHelper::new(5);
        let input = [0.5, -1.0, 2.0, 0.25, 3.0];
        let restored = helper.inverse(helper.forward(&input));
        for (a, b) in input.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn autocorrelation_matches_direct_convolution() {
        let signal: Vec<f64> = (0..37).map(|i| ((i as f64) * 0.7).sin() + 0.1 * i as f64).collect();
        let reversed: Vec<f64> = signal.iter().rev().copied().collect();
        let direct = convolve(&signal, &reversed, ConvolutionMode::Full);
        let fast = FftHelper::autocorrelate(&signal);
        assert_eq!(direct.len(), fast.len());
        for (a, b) in direct.iter().zip(fast.iter()) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn autocorrelation_peaks_at_zero_lag() {
        let signal = [1.0, -2.0, 0.5, 3.0];
        let acf = FftHelper::autocorrelate(&signal);
        let zero_lag = acf[signal.len() - 1];
        assert!((zero_lag - 14.25).abs() < 1e-12);
        assert!(acf.iter().all(|&v| v <= zero_lag + 1e-12));
    }
}
