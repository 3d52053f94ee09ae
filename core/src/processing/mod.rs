pub mod bandpass;
pub mod emphasis;
pub mod estimator;
pub mod kernel;
pub mod period;

pub use bandpass::BandpassStage;
pub use emphasis::PeakEmphasisStage;
pub use estimator::{calculate_heart_rate, find_heart_rate_values, HeartRateEstimator};
pub use period::PeriodStage;
