pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn rms(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Position and value of the first maximum. NaN entries never win.
    pub fn argmax(samples: &[f64]) -> Option<(usize, f64)> {
        samples
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, value)| !value.is_nan())
            .fold(None, |best, (idx, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((idx, value)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_zero_sequence_yields_zero() {
        assert_eq!(StatsHelper::rms(&[]), 0.0);
        assert_eq!(StatsHelper::rms(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn rms_handles_single_value() {
        assert_eq!(StatsHelper::rms(&[4.0]), 4.0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(StatsHelper::mean(&[]), 0.0);
        assert_eq!(StatsHelper::mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn argmax_returns_first_of_equal_maxima() {
        assert_eq!(StatsHelper::argmax(&[1.0, 5.0, 2.0, 5.0]), Some((1, 5.0)));
        assert_eq!(StatsHelper::argmax(&[f64::NAN, -1.0]), Some((1, -1.0)));
        assert_eq!(StatsHelper::argmax(&[]), None);
    }
}
