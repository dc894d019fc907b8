//! Chi-squared goodness-of-fit support for the test suite.
//!
//! The distribution tests compare empirical selection counts against the
//! rate vector that produced them. This module provides the chi-squared
//! statistic over observed counts and the survival function of the
//! chi-squared distribution, computed through the regularized incomplete
//! gamma function (series expansion below the `a + 1` knee, continued
//! fraction above it).

/// Result of a chi-squared goodness-of-fit test.
#[derive(Debug, Clone, Copy)]
pub struct ChiSquaredResult {
    /// The chi-squared statistic.
    pub chi_squared: f64,
    /// Degrees of freedom (positive-weight categories minus one).
    pub degrees_of_freedom: usize,
    /// Probability of a statistic at least this extreme under the null.
    pub p_value: f64,
    /// Number of samples the counts were taken from.
    pub num_samples: u64,
}

impl ChiSquaredResult {
    /// Whether the test fails to reject the null at significance `alpha`.
    #[must_use]
    pub fn passes(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Chi-squared test of observed counts against expected proportions.
///
/// `weights` need not be normalized; expected counts are
/// `num_samples * weight / total_weight`. Zero-weight categories are
/// excluded from the statistic and the degrees of freedom, except that a
/// zero-weight category with a non-zero count forces an infinite
/// statistic (an impossible observation).
///
/// # Panics
///
/// Panics if `observed` and `weights` differ in length or if no weight
/// is positive.
#[must_use]
pub fn chi_squared_from_counts(
    observed: &[u64],
    weights: &[f64],
    num_samples: u64,
) -> ChiSquaredResult {
    assert_eq!(
        observed.len(),
        weights.len(),
        "one weight per observed count required"
    );
    let total_weight: f64 = weights.iter().sum();
    assert!(total_weight > 0.0, "weights must have a positive sum");

    let mut chi_squared = 0.0;
    let mut categories = 0usize;
    for (&count, &weight) in observed.iter().zip(weights) {
        if weight > 0.0 {
            let expected = num_samples as f64 * weight / total_weight;
            let delta = count as f64 - expected;
            chi_squared += delta * delta / expected;
            categories += 1;
        } else if count > 0 {
            chi_squared = f64::INFINITY;
        }
    }

    let degrees_of_freedom = categories.saturating_sub(1);
    ChiSquaredResult {
        chi_squared,
        degrees_of_freedom,
        p_value: chi_squared_sf(chi_squared, degrees_of_freedom),
        num_samples,
    }
}

/// Survival function of the chi-squared distribution with
/// `degrees_of_freedom` degrees of freedom: `P(X >= x)`.
#[must_use]
pub fn chi_squared_sf(x: f64, degrees_of_freedom: usize) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() || degrees_of_freedom == 0 {
        return 0.0;
    }
    let a = degrees_of_freedom as f64 / 2.0;
    let half_x = x / 2.0;
    if half_x < a + 1.0 {
        1.0 - lower_incomplete_gamma_series(a, half_x)
    } else {
        upper_incomplete_gamma_cf(a, half_x)
    }
}

/// Regularized lower incomplete gamma `P(a, x)` by series expansion.
/// Converges quickly for `x < a + 1`.
fn lower_incomplete_gamma_series(a: f64, x: f64) -> f64 {
    let mut denominator = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..500 {
        denominator += 1.0;
        term *= x / denominator;
        sum += term;
        if term.abs() < sum.abs() * 1e-15 {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Regularized upper incomplete gamma `Q(a, x)` by Lentz's continued
/// fraction. Converges quickly for `x >= a + 1`.
fn upper_incomplete_gamma_cf(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..500 {
        let numerator = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = numerator * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-15 {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Natural log of the gamma function for positive arguments, by the
/// Lanczos approximation (g = 7, nine terms). Accurate to ~1e-13 over
/// the `a >= 0.5` range the survival function uses.
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 8] = [
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    let z = x - 1.0;
    let mut accumulator = 0.999_999_999_999_809_9;
    for (i, &coefficient) in COEFFICIENTS.iter().enumerate() {
        accumulator += coefficient / (z + (i + 1) as f64);
    }
    let t = z + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + accumulator.ln()
}
