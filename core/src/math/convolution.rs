/// Output shape of [`convolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionMode {
    /// Every overlap position, `m + n - 1` samples.
    Full,
    /// Central part of the full result with the length of the first operand.
    Same,
}

/// Direct discrete convolution of `u` with `v`.
pub fn convolve(u: &[f64], v: &[f64], mode: ConvolutionMode) -> Vec<f64> {
    if u.is_empty() || v.is_empty() {
        return Vec::new();
    }

    let mut full = vec![0.0; u.len() + v.len() - 1];
    for (i, &a) in u.iter().enumerate() {
        for (j, &b) in v.iter().enumerate() {
            full[i + j] += a * b;
        }
    }

    match mode {
        ConvolutionMode::Full => full,
        ConvolutionMode::Same => {
            let start = full.len() / 2 - u.len() / 2;
            full[start..start + u.len()].to_vec()
        }
    }
}
