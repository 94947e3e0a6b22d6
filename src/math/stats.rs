//! Small statistics helpers: quantiles and the normal CDF.

/// Linearly interpolated quantile of a sorted, non-empty slice.
///
/// Matches the default (linear) interpolation of common numeric libraries:
/// the quantile sits at fractional rank `q * (n - 1)`.
///
/// # Panics
/// Panics if `xs` is empty. Callers guard group emptiness before reaching here.
pub fn quantile(xs: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (xs.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return xs[lo];
    }
    let frac = pos - lo as f64;
    xs[lo] * (1.0 - frac) + xs[hi] * frac
}

/// Standard normal CDF via the Abramowitz–Stegun 7.1.26 erf approximation
/// (absolute error below 1.5e-7, plenty for d-prime conversion).
pub fn norm_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Loose conversion from d-prime to proportion correct: `Φ(d')²`.
pub fn dprime_to_pcorr(dprime: f64) -> f64 {
    norm_cdf(dprime).powi(2)
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((quantile(&xs, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&xs, 0.5) - 3.0).abs() < 1e-12);
        assert!((quantile(&xs, 0.25) - 2.0).abs() < 1e-12);
        assert!((quantile(&xs, 1.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn norm_cdf_matches_known_values() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn dprime_conversion_is_monotone() {
        assert!(dprime_to_pcorr(0.0) < dprime_to_pcorr(1.0));
        assert!(dprime_to_pcorr(1.0) < dprime_to_pcorr(3.0));
        assert!((dprime_to_pcorr(0.0) - 0.25).abs() < 1e-7);
    }
}
