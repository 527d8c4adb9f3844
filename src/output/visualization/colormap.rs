//! Scalar-to-color mapping for surface panels

use plotters::style::RGBColor;

/// Piecewise-linear colormap over `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Diverging blue → grey → red
    #[default]
    CoolToWarm,
    /// Blue → cyan → green → yellow → red
    Rainbow,
}

const COOL_TO_WARM: [(f64, [u8; 3]); 3] = [
    (0.0, [59, 76, 192]),
    (0.5, [221, 221, 221]),
    (1.0, [180, 4, 38]),
];

const RAINBOW: [(f64, [u8; 3]); 5] = [
    (0.0, [0, 0, 255]),
    (0.25, [0, 255, 255]),
    (0.5, [0, 255, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 0, 0]),
];

impl Colormap {
    fn stops(&self) -> &'static [(f64, [u8; 3])] {
        match self {
            Colormap::CoolToWarm => &COOL_TO_WARM,
            Colormap::Rainbow => &RAINBOW,
        }
    }

    /// Color of a normalized value; out-of-range values are clamped and NaN
    /// maps to the low end
    pub fn color(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();

        let upper = stops
            .iter()
            .position(|(s, _)| *s >= t)
            .unwrap_or(stops.len() - 1)
            .max(1);
        let (s0, c0) = stops[upper - 1];
        let (s1, c1) = stops[upper];
        let w = if s1 > s0 { (t - s0) / (s1 - s0) } else { 0.0 };

        let mix = |a: u8, b: u8| (a as f64 + w * (b as f64 - a as f64)).round() as u8;
        RGBColor(mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2]))
    }
}
