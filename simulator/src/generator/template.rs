use std::f64::consts::PI;

/// Unit-amplitude pulse waveform at `bpm`, evaluated at frame `index`.
pub fn pulse_at(index: usize, bpm: f64, sample_rate: f64) -> f64 {
    (2.0 * PI * bpm / 60.0 * index as f64 / sample_rate).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_beat_spans_sixty_over_bpm_seconds() {
        // 60 bpm at 60 Hz repeats every 60 samples.
        let wave: Vec<f64> = (0..121).map(|i| pulse_at(i, 60.0, 60.0)).collect();
        assert!((wave[0] - wave[60]).abs() < 1e-9);
        assert!((wave[15] - 1.0).abs() < 1e-9);
        assert!((wave[45] + 1.0).abs() < 1e-9);
    }
}
