//! Fixed FIR bandpass kernel tuned for a 60 Hz pulse signal.
//!
//! 129 taps, passband 1 Hz to 25 Hz (`fir1(128, [1/30, 25/30], 'bandpass')`).

/// Number of taps in [`BANDPASS_KERNEL`].
pub const KERNEL_TAPS: usize = 129;

/// Samples dropped from the front of the same-length filter output.
pub const KERNEL_TRIM_FRONT: usize = 64;

/// Samples dropped from the back of the same-length filter output.
pub const KERNEL_TRIM_BACK: usize = 65;

#[rustfmt::skip]
pub const BANDPASS_KERNEL: [f64; KERNEL_TAPS] = [
    -0.000506610984132016, 0.000281340196104213, -0.000453477478785663, 0.00017543384847996,
    5.78571000126717e-19, -0.00020017823807041, 0.000588479261901569, -0.000412615808534457,
    0.000832401037231464, -4.848182393961e-19, 0.000465554741153073, 0.00102165166976478,
    -0.000118534274769341, 0.00192609062899124, -2.40024436102973e-18, 0.00182952606970045,
    0.00135480554590726, 0.000748599044261129, 0.00319643179850945, -2.30788276369201e-19,
    0.00382994518525259, 0.00107470141262219, 0.00233017559097417, 0.00376919225339987,
    -8.21109764793137e-18, 0.00568709829032464, -0.000418547259970266, 0.00430878547299781,
    0.00234096774958672, -1.06597329751523e-17, 0.00589948032626289, -0.00345001874823703,
    0.00577085280898743, -0.0022853270043235, -3.81044085438483e-18, 0.00263801974428747,
    -0.0076913138242269, 0.00531148463293734, -0.0104990208677403, 1.62815935886881e-17,
    -0.00558417076326117, -0.0119241848598587, 0.00134611898423683, -0.021299777179679,
    -2.07091826506435e-17, -0.01928455059142, -0.0139952617851127, -0.0076031879007069,
    -0.0320397640632609, -3.05719612807051e-18, -0.0378997870775431, -0.0106518977344771,
    -0.0232807805994706, -0.0382418951609459, 1.64113172833343e-17, -0.0611787321852445,
    0.00471988055056295, -0.0517540592057603, -0.030577093872801, 3.42293636763843e-17,
    -0.100426633129967, 0.07297864835449, -0.170609488045242, 0.125861208906484,
    0.800308136102957, 0.125861208906484, -0.170609488045242, 0.07297864835449,
    -0.100426633129967, 3.42293636763843e-17, -0.030577093872801, -0.0517540592057603,
    0.00471988055056295, -0.0611787321852445, 1.64113172833343e-17, -0.0382418951609459,
    -0.0232807805994706, -0.0106518977344771, -0.0378997870775431, -3.05719612807051e-18,
    -0.0320397640632609, -0.0076031879007069, -0.0139952617851127, -0.01928455059142,
    -2.07091826506435e-17, -0.021299777179679, 0.00134611898423683, -0.0119241848598587,
    -0.00558417076326117, 1.62815935886881e-17, -0.0104990208677403, 0.00531148463293734,
    -0.0076913138242269, 0.00263801974428747, -3.81044085438483e-18, -0.0022853270043235,
    0.00577085280898743, -0.00345001874823703, 0.00589948032626289, -1.06597329751523e-17,
    0.00234096774958672, 0.00430878547299781, -0.000418547259970266, 0.00568709829032464,
    -8.21109764793137e-18, 0.00376919225339987, 0.00233017559097417, 0.00107470141262219,
    0.00382994518525259, -2.30788276369201e-19, 0.00319643179850945, 0.000748599044261129,
    0.00135480554590726, 0.00182952606970045, -2.40024436102973e-18, 0.00192609062899124,
    -0.000118534274769341, 0.00102165166976478, 0.000465554741153073, -4.848182393961e-19,
    0.000832401037231464, -0.000412615808534457, 0.000588479261901569, -0.00020017823807041,
    5.78571000126717e-19, 0.00017543384847996, -0.000453477478785663, 0.000281340196104213,
    -0.000506610984132016,
];
