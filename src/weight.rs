//! Conversion between scalar tag weights and bracket nesting depth.
//!
//! Each amplify bracket multiplies a weight by the factor (1.05 by default)
//! and each attenuate bracket divides by it. The attenuate factor is always
//! the reciprocal of the amplify factor, so `{[tag]}` is exactly neutral.

/// Default multiplicative factor of one amplify bracket.
pub const DEFAULT_FACTOR: f64 = 1.05;

/// Number of decimal digits kept on resolved weights.
pub const DEFAULT_PRECISION: u32 = 3;

/// Weights closer than this to 1.0 carry no weight marker.
pub const NEUTRAL_TOLERANCE: f64 = 1e-3;

/// Direction of a bracket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Amplify,
    Attenuate,
    None,
}

/// Rounds `value` to `decimals` digits, ties away from zero.
///
/// A tie is detected with a small tolerance on the scaled value so that
/// inputs such as `1.0005`, whose nearest double sits just below the
/// midpoint, still round up.
///
/// # Examples
///
/// ```
/// use sdprompt::weight::round_half_up;
///
/// assert_eq!(round_half_up(1.0005, 3), 1.001);
/// assert_eq!(round_half_up(1.157625, 3), 1.158);
/// assert_eq!(round_half_up(0.9070294, 3), 0.907);
/// ```
#[must_use]
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(decimals as i32);
    let scaled = value.abs() * scale;
    let rounded = (scaled + 0.5 + 1e-9).floor();
    rounded.copysign(value) / scale
}

/// Bracket arithmetic for one weight factor and precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightGrammar {
    factor: f64,
    precision: u32,
}

impl Default for WeightGrammar {
    fn default() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl WeightGrammar {
    /// Creates a grammar with a custom amplify factor.
    ///
    /// Factors at or below 1.0 cannot express amplification and fall back
    /// to [`DEFAULT_FACTOR`].
    pub fn new(factor: f64, precision: u32) -> Self {
        let factor = if factor.is_finite() && factor > 1.0 {
            factor
        } else {
            DEFAULT_FACTOR
        };
        Self { factor, precision }
    }

    pub fn amplify_factor(&self) -> f64 {
        self.factor
    }

    pub fn attenuate_factor(&self) -> f64 {
        1.0 / self.factor
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Multiplier applied by one bracket layer of `kind`.
    pub fn factor_for(&self, kind: LayerKind) -> f64 {
        match kind {
            LayerKind::Amplify => self.amplify_factor(),
            LayerKind::Attenuate => self.attenuate_factor(),
            LayerKind::None => 1.0,
        }
    }

    /// Rounds a weight to this grammar's precision.
    pub fn round(&self, weight: f64) -> f64 {
        round_half_up(weight, self.precision)
    }

    /// Whether a weight needs no marker at all.
    pub fn is_neutral(&self, weight: f64) -> bool {
        (weight - 1.0).abs() < NEUTRAL_TOLERANCE
    }

    /// Finds the bracket direction and depth closest to `weight`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdprompt::weight::{LayerKind, WeightGrammar};
    ///
    /// let grammar = WeightGrammar::default();
    /// assert_eq!(grammar.weight_to_layers(1.103), (LayerKind::Amplify, 2));
    /// assert_eq!(grammar.weight_to_layers(0.952), (LayerKind::Attenuate, 1));
    /// assert_eq!(grammar.weight_to_layers(1.0004), (LayerKind::None, 0));
    /// ```
    pub fn weight_to_layers(&self, weight: f64) -> (LayerKind, u32) {
        if !weight.is_finite() || weight <= 0.0 || self.is_neutral(weight) {
            return (LayerKind::None, 0);
        }
        let layers = (weight.ln() / self.factor.ln()).round();
        if layers == 0.0 {
            return (LayerKind::None, 0);
        }
        let count = layers.abs().min(f64::from(u32::MAX)) as u32;
        if layers > 0.0 {
            (LayerKind::Amplify, count)
        } else {
            (LayerKind::Attenuate, count)
        }
    }

    /// Weight produced by `count` layers of `kind`, rounded.
    pub fn layers_to_weight(&self, kind: LayerKind, count: u32) -> f64 {
        let exponent = i32::try_from(count).unwrap_or(i32::MAX);
        self.round(self.factor_for(kind).powi(exponent))
    }
}
