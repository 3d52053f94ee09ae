use crate::generator::template::pulse_at;
use anyhow::Context;
use ppgcore::records::ColorSample;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Pixels per synthetic frame; enough to dither 8-bit quantization away.
const FRAME_PIXELS: usize = 64;

/// Configuration for fabricating a fingertip recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub bpm: f64,
    pub frame_rate: u32,
    /// Covered seconds following the settle period.
    pub duration_seconds: f64,
    /// Seconds of uncovered frames emitted before the finger lands.
    pub settle_seconds: f64,
    pub amplitude: f64,
    pub noise: f64,
    pub seed: u64,
    /// `false` makes the synthetic camera report that no device exists.
    pub device_present: bool,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bpm: 65.0,
            frame_rate: 60,
            duration_seconds: 15.0,
            settle_seconds: 3.0,
            amplitude: 0.05,
            noise: 0.002,
            seed: 0,
            device_present: true,
            description: None,
        }
    }
}

impl GeneratorConfig {
    pub fn sample_rate(&self) -> f64 {
        f64::from(self.frame_rate.max(1))
    }

    pub fn settle_frames(&self) -> usize {
        seconds_to_frames(self.settle_seconds, self.sample_rate())
    }

    pub fn covered_frames(&self) -> usize {
        seconds_to_frames(self.duration_seconds, self.sample_rate())
    }
}

fn seconds_to_frames(seconds: f64, sample_rate: f64) -> usize {
    let frames = (seconds * sample_rate).round();
    if frames.is_finite() && frames > 0.0 {
        frames as usize
    } else {
        0
    }
}

fn channel_byte(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Frame `index` of a synthetic session. Covered frames are a red fingertip
/// whose green channel follows the pulse; uncovered frames are a grey room.
pub fn synthetic_sample(
    config: &GeneratorConfig,
    index: usize,
    covered: bool,
    rng: &mut StdRng,
) -> Option<ColorSample> {
    let sample_rate = config.sample_rate();
    let uptime = index as f64 / sample_rate;
    let pixels: Vec<[u8; 3]> = if covered {
        let green = 0.2 + config.amplitude * pulse_at(index, config.bpm, sample_rate);
        (0..FRAME_PIXELS)
            .map(|_| {
                let jitter = if config.noise > 0.0 {
                    rng.gen_range(-config.noise..config.noise)
                } else {
                    0.0
                };
                [channel_byte(0.9), channel_byte(green + jitter), channel_byte(0.05)]
            })
            .collect()
    } else {
        vec![[120, 130, 140]; FRAME_PIXELS]
    };
    ColorSample::from_rgb_frame(uptime, &pixels)
}

/// A complete recording: settle frames followed by covered frames.
pub fn build_recording(config: &GeneratorConfig) -> anyhow::Result<Vec<ColorSample>> {
    let settle = config.settle_frames();
    let total = settle
        .checked_add(config.covered_frames())
        .context("overflow computing recording length")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..total)
        .map(|index| {
            synthetic_sample(config, index, index >= settle, &mut rng)
                .context("synthetic frame has no pixels")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppgcore::coverage::is_covered;

    #[test]
    fn recording_has_settle_then_covered_frames() {
        let config = GeneratorConfig {
            duration_seconds: 2.0,
            settle_seconds: 1.0,
            ..Default::default()
        };
        let samples = build_recording(&config).unwrap();
        assert_eq!(samples.len(), 180);
        assert!(samples[..60].iter().all(|s| !is_covered(s)));
        assert!(samples[60..].iter().all(is_covered));
        assert_eq!(samples[120].uptime, 2.0);
    }

    #[test]
    fn covered_green_channel_tracks_the_pulse() {
        let config = GeneratorConfig {
            noise: 0.0,
            settle_seconds: 0.0,
            duration_seconds: 1.0,
            bpm: 60.0,
            ..Default::default()
        };
        let samples = build_recording(&config).unwrap();
        // Quarter beat is the crest, three quarters the trough.
        assert!(samples[15].green > samples[0].green);
        assert!(samples[45].green < samples[0].green);
    }

    #[test]
    fn same_seed_reproduces_the_recording() {
        let config = GeneratorConfig {
            seed: 42,
            duration_seconds: 1.0,
            ..Default::default()
        };
        assert_eq!(build_recording(&config).unwrap(), build_recording(&config).unwrap());
    }
}
