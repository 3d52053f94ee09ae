use serde::{Deserialize, Serialize};

/// Per-frame color summary delivered by the capture collaborator.
///
/// Field order is the persisted row order: `uptime, red, blue, green, red_level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    /// Monotonic clock reading in seconds.
    pub uptime: f64,
    pub red: f64,
    pub blue: f64,
    pub green: f64,
    /// Fraction of frame pixels classified red-dominant.
    pub red_level: f64,
}

impl ColorSample {
    pub fn new(uptime: f64, red: f64, green: f64, blue: f64, red_level: f64) -> Self {
        Self {
            uptime,
            red,
            blue,
            green,
            red_level,
        }
    }

    /// Reduces an RGB frame to normalized channel means and its red-dominant
    /// pixel fraction. Returns `None` for an empty frame.
    pub fn from_rgb_frame(uptime: f64, pixels: &[[u8; 3]]) -> Option<Self> {
        if pixels.is_empty() {
            return None;
        }

        let mut sums = [0u64; 3];
        let mut red_dominant = 0usize;
        for &[r, g, b] in pixels {
            sums[0] += u64::from(r);
            sums[1] += u64::from(g);
            sums[2] += u64::from(b);
            if r > g && r > b {
                red_dominant += 1;
            }
        }

        let scale = 255.0 * pixels.len() as f64;
        Some(Self::new(
            uptime,
            sums[0] as f64 / scale,
            sums[1] as f64 / scale,
            sums[2] as f64 / scale,
            red_dominant as f64 / pixels.len() as f64,
        ))
    }
}
