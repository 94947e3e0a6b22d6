//! Linear vs. logarithmic spacing classification.
//!
//! The distinct stimulus levels are correlated against an evenly spaced linear
//! sequence and against an evenly spaced geometric sequence over the same range
//! and count. Whichever reference correlates better wins; log spacing must be
//! strictly better to be chosen. With exactly two distinct levels the two
//! references coincide and the check is ambiguous, so linear wins by default.

use crate::domain::Spacing;
use crate::error::{AppError, ErrorKind};
use crate::math::{lin_space, log_space};

/// Pearson correlation coefficient of two equal-length slices.
///
/// Returns 0 when either side has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let ma = a[..n].iter().sum::<f64>() / n as f64;
    let mb = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    if va <= 0.0 || vb <= 0.0 {
        return 0.0;
    }
    cov / (va * vb).sqrt()
}

/// Decide whether an ascending set of distinct stimulus levels is linearly or
/// logarithmically spaced.
///
/// Levels must be strictly positive (zero is replaced upstream with the
/// model-registry epsilon) and there must be at least two of them.
pub fn classify_spacing(xvals: &[f64]) -> Result<Spacing, AppError> {
    if xvals.len() < 2 {
        return Err(AppError::new(
            ErrorKind::MalformedInput,
            format!(
                "Spacing classification needs at least 2 distinct x values, got {}.",
                xvals.len()
            ),
        ));
    }
    if let Some(bad) = xvals.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(AppError::new(
            ErrorKind::MalformedInput,
            format!("Non-positive or non-finite x value {bad} in spacing check."),
        ));
    }

    let first = xvals[0];
    let last = xvals[xvals.len() - 1];
    let r_lin = pearson(xvals, &lin_space(first, last, xvals.len())?);
    let r_log = pearson(xvals, &log_space(first, last, xvals.len())?);

    if r_log > r_lin {
        Ok(Spacing::Logarithmic)
    } else {
        Ok(Spacing::Linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_levels_classify_linear() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(classify_spacing(&xs).unwrap(), Spacing::Linear);
    }

    #[test]
    fn geometric_levels_classify_logarithmic() {
        let xs = [1.0, 2.0, 4.0, 8.0, 16.0];
        assert_eq!(classify_spacing(&xs).unwrap(), Spacing::Logarithmic);
    }

    #[test]
    fn contrast_like_levels_classify_logarithmic() {
        let xs = [2.0, 7.0, 13.0, 24.0, 46.0, 85.0];
        assert_eq!(classify_spacing(&xs).unwrap(), Spacing::Logarithmic);
    }

    #[test]
    fn two_levels_default_to_linear() {
        // Both references collapse to the same two points.
        let xs = [1.0, 10.0];
        assert_eq!(classify_spacing(&xs).unwrap(), Spacing::Linear);
    }

    #[test]
    fn single_level_is_rejected() {
        let err = classify_spacing(&[3.0]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
    }

    #[test]
    fn pearson_of_identical_sequences_is_one() {
        let xs = [1.0, 2.0, 3.0];
        assert!((pearson(&xs, &xs) - 1.0).abs() < 1e-12);
    }
}
