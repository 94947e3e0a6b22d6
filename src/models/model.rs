//! Model evaluation for Weibull / Gumbel / Naka-Rushton.
//!
//! The fitter relies on two primitive operations:
//! - predict y(x) for a single stimulus level given a parameter vector
//! - predict a whole response curve over an x-array (for objectives/plots)
//!
//! Parameter slot semantics (always 4 slots):
//! - Weibull / Gumbel: `[γ guess, λ lapse, α threshold, β slope]`
//! - Naka-Rushton:     `[dmax, c50, n exponent, b baseline]`

use crate::domain::{ModelKind, PARAM_LEN};
use crate::error::{AppError, ErrorKind};

/// Replacement for stimulus levels of exactly zero.
///
/// Power-law terms and the geometric spacing check are undefined at x = 0.
pub const X_EPS: f64 = 1e-3;

/// Guard a stimulus level against the zero singularity.
pub fn clamp_x(x: f64) -> f64 {
    if x == 0.0 { X_EPS } else { x }
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Weibull => "Weibull",
            ModelKind::Gumbel => "Gumbel (log-Weibull)",
            ModelKind::NakaRushton => "Naka-Rushton",
        }
    }

    /// Slot names aligned to the parameter vector.
    pub fn param_names(self) -> [&'static str; PARAM_LEN] {
        match self {
            ModelKind::Weibull | ModelKind::Gumbel => ["guess", "lapse", "threshold", "slope"],
            ModelKind::NakaRushton => ["dmax", "c50", "exponent", "baseline"],
        }
    }
}

/// Resolve a model tag (e.g. from a config file) to a `ModelKind`.
pub fn parse_model(tag: &str) -> Result<ModelKind, AppError> {
    match tag.to_ascii_lowercase().as_str() {
        "weibull" => Ok(ModelKind::Weibull),
        "gumbel" | "log-weibull" => Ok(ModelKind::Gumbel),
        "nakarushton" | "naka-rushton" => Ok(ModelKind::NakaRushton),
        other => Err(AppError::new(
            ErrorKind::InvalidModel,
            format!("Unknown model identifier '{other}' (expected weibull, gumbel, or nakarushton)."),
        )),
    }
}

/// Validate a parameter vector's arity and finiteness.
pub fn check_params(model: ModelKind, par: &[f64]) -> Result<(), AppError> {
    if par.len() != PARAM_LEN {
        return Err(AppError::new(
            ErrorKind::InvalidParameters,
            format!(
                "Model {} takes {PARAM_LEN} parameters, got {}.",
                model.display_name(),
                par.len()
            ),
        ));
    }
    if let Some(bad) = par.iter().find(|v| !v.is_finite()) {
        return Err(AppError::new(
            ErrorKind::InvalidParameters,
            format!("Non-finite parameter {bad} for model {}.", model.display_name()),
        ));
    }
    Ok(())
}

/// Predict the response at a single stimulus level.
///
/// `par` must have length 4; callers that take parameter vectors from outside
/// the fitter should validate with [`check_params`] first.
pub fn predict_one(model: ModelKind, x: f64, par: &[f64]) -> f64 {
    let x = clamp_x(x);
    match model {
        ModelKind::Weibull => {
            let (gamma, lam, alpha, beta) = (par[0], par[1], par[2], par[3]);
            gamma + (1.0 - gamma - lam) * (1.0 - (-(x / alpha).powf(beta)).exp())
        }
        ModelKind::Gumbel => {
            let (gamma, lam, alpha, beta) = (par[0], par[1], par[2], par[3]);
            gamma + (1.0 - gamma - lam) * (1.0 - (-(10.0_f64.powf(beta * (x - alpha)))).exp())
        }
        ModelKind::NakaRushton => {
            let (dmax, c50, n, b) = (par[0], par[1], par[2], par[3]);
            let xn = x.powf(n);
            dmax * (xn / (xn + c50.powf(n))) + b
        }
    }
}

/// Predict the response curve over an x-array, validating the parameter vector.
pub fn predict(model: ModelKind, xs: &[f64], par: &[f64]) -> Result<Vec<f64>, AppError> {
    check_params(model, par)?;
    Ok(xs.iter().map(|&x| predict_one(model, x, par)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weibull_stays_within_natural_range_without_lapse() {
        // With λ=0 the Weibull runs from γ at x→0 up to 1 at x→∞.
        let par = [0.5, 0.0, 0.2, 2.0];
        for &x in &[0.0, 0.01, 0.1, 0.2, 0.5, 1.0, 10.0] {
            let y = predict_one(ModelKind::Weibull, x, &par);
            assert!(y >= 0.5 - 1e-12 && y <= 1.0 + 1e-12, "y({x}) = {y}");
        }
    }

    #[test]
    fn gumbel_stays_within_natural_range_without_lapse() {
        let par = [0.25, 0.0, -0.5, 1.5];
        for &x in &[-2.0, -1.0, -0.5, 0.0, 1.0, 2.0] {
            let y = predict_one(ModelKind::Gumbel, x, &par);
            assert!(y >= 0.25 - 1e-12 && y <= 1.0 + 1e-12, "y({x}) = {y}");
        }
    }

    #[test]
    fn naka_rushton_is_monotone_for_positive_exponent() {
        let par = [3.0, 0.1, 2.0, 0.02];
        let xs: Vec<f64> = (1..=50).map(|i| i as f64 * 0.02).collect();
        let ys = predict(ModelKind::NakaRushton, &xs, &par).unwrap();
        for w in ys.windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
    }

    #[test]
    fn zero_x_is_guarded() {
        let par = [3.0, 0.1, 2.0, 0.0];
        let y = predict_one(ModelKind::NakaRushton, 0.0, &par);
        assert!(y.is_finite());
        assert!((predict_one(ModelKind::NakaRushton, X_EPS, &par) - y).abs() < 1e-15);
    }

    #[test]
    fn unknown_tag_is_invalid_model() {
        let err = parse_model("logistic").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidModel);
    }

    #[test]
    fn wrong_arity_is_invalid_parameters() {
        let err = predict(ModelKind::Weibull, &[1.0], &[0.5, 0.01, 0.2]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameters);
    }
}
