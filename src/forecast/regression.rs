//! Ordinary least-squares trend over an equally spaced series.
//!
//! The sample index is the independent variable, so no timestamps are needed.

/// Slope and intercept of a fitted line `y = intercept + slope * i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub const FLAT: Self = Self {
        slope: 0.0,
        intercept: 0.0,
    };
}

/// Fit a straight line to `values` indexed `0..n`.
///
/// An empty series is flat at zero and a single point is flat at its own
/// value. Non-finite results fall back to zero.
pub fn linear_fit(values: &[f64]) -> LinearFit {
    match values {
        [] => return LinearFit::FLAT,
        [only] => {
            return LinearFit {
                slope: 0.0,
                intercept: *only,
            };
        }
        _ => {}
    }

    let n = values.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    LinearFit {
        slope: finite_or_zero(slope),
        intercept: finite_or_zero(intercept),
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
