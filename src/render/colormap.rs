use plotters::style::RGBColor;

/// Anchor colours of the sequential yellow-orange-red scale, light to dark.
const YL_OR_RD: [RGBColor; 9] = [
    RGBColor(255, 255, 204),
    RGBColor(255, 237, 160),
    RGBColor(254, 217, 118),
    RGBColor(254, 178, 76),
    RGBColor(253, 141, 60),
    RGBColor(252, 78, 42),
    RGBColor(227, 26, 28),
    RGBColor(189, 0, 38),
    RGBColor(128, 0, 38),
];

/// Maps a value range linearly onto the yellow-orange-red colour scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Spans the finite values of `values`; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some(Self { min: v, max: v }),
                Some(Self { min, max }) => Some(Self {
                    min: min.min(v),
                    max: max.max(v),
                }),
            })
    }

    /// Position of `value` in the range, clamped to `[0, 1]`. A flat range maps to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> RGBColor {
        ylorrd(self.normalize(value))
    }
}

/// Colour at position `t` in `[0, 1]` of the scale.
pub fn ylorrd(t: f64) -> RGBColor {
    let scaled = t.clamp(0.0, 1.0) * (YL_OR_RD.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(YL_OR_RD.len() - 1);
    let frac = scaled - lower as f64;

    let RGBColor(r0, g0, b0) = YL_OR_RD[lower];
    let RGBColor(r1, g1, b1) = YL_OR_RD[upper];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}
