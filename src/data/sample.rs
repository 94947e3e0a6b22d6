//! Synthetic psychometric data generation.
//!
//! Draws from known generating parameters so demo runs and tests can compare
//! fits against ground truth. Deterministic for a given seed.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Normal};

use crate::domain::{ModelKind, Observation, Trial, Units};
use crate::error::{AppError, ErrorKind};
use crate::math::quantile;
use crate::models::predict_one;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub units: Units,
    pub chance: f64,
    pub conditions: usize,
    pub subjects: usize,
    /// Stimulus levels, ascending.
    pub levels: Vec<f64>,
    /// Trials per (level, condition) cell in trial-level output.
    pub trials_per_level: u64,
    /// Standard deviation of additive response noise (aggregate output).
    pub noise_sd: f64,
    pub seed: u64,
}

impl SampleConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.conditions == 0 || self.subjects == 0 {
            return Err(AppError::new(ErrorKind::Config, "Sample needs at least 1 condition and 1 subject."));
        }
        if self.levels.len() < 2 {
            return Err(AppError::new(ErrorKind::Config, "Sample needs at least 2 stimulus levels."));
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(AppError::new(ErrorKind::Config, "Sample noise SD must be non-negative."));
        }
        Ok(())
    }

    /// Generating parameters for one condition: thresholds shift rightward
    /// with the condition index so conditions are visually separable.
    fn truth(&self, condition: usize) -> [f64; 4] {
        let mid = quantile(&self.levels, 0.5);
        let shift = 1.0 + 0.25 * condition as f64;
        match self.units {
            Units::Accuracy => [self.chance, 0.01, mid * shift, 2.0],
            Units::Dprime => [2.5 + 0.3 * condition as f64, mid * shift, 2.0, 0.05],
        }
    }

    fn model(&self) -> ModelKind {
        match self.units {
            Units::Accuracy => ModelKind::Weibull,
            Units::Dprime => ModelKind::NakaRushton,
        }
    }
}

/// Generate subject-level aggregate observations with additive Gaussian noise.
pub fn generate_observations(config: &SampleConfig) -> Result<Vec<Observation>, AppError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd.max(1e-12))
        .map_err(|e| AppError::new(ErrorKind::Config, format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.subjects * config.conditions * config.levels.len());
    for s in 1..=config.subjects {
        for c in 1..=config.conditions {
            let truth = config.truth(c - 1);
            for &x in &config.levels {
                let mut y = predict_one(config.model(), x, &truth) + noise.sample(&mut rng);
                if config.units == Units::Accuracy {
                    y = y.clamp(0.0, 1.0);
                }
                out.push(Observation {
                    x,
                    y,
                    condition: c.to_string(),
                    factor: "1".to_string(),
                    subject: s.to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Generate trial-level data: Bernoulli draws from the generating curve.
pub fn generate_trials(config: &SampleConfig) -> Result<Vec<Trial>, AppError> {
    config.validate()?;
    if config.units != Units::Accuracy {
        return Err(AppError::new(ErrorKind::Config, "Trial-level samples are accuracy-only."));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut out = Vec::new();
    for c in 1..=config.conditions {
        let truth = config.truth(c - 1);
        for &x in &config.levels {
            let p = predict_one(ModelKind::Weibull, x, &truth).clamp(0.0, 1.0);
            let coin = Bernoulli::new(p)
                .map_err(|e| AppError::new(ErrorKind::Config, format!("Trial distribution error: {e}")))?;
            for _ in 0..config.trials_per_level {
                out.push(Trial {
                    x,
                    condition: c.to_string(),
                    correct: coin.sample(&mut rng),
                });
            }
        }
    }
    Ok(out)
}

/// Write subject-level observations in the 5-column input schema.
pub fn write_observations_csv(path: &Path, observations: &[Observation]) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "xvals,response,conditions,factors,subjects").map_err(|e| write_err(path, e))?;
    for o in observations {
        writeln!(file, "{},{:.6},{},{},{}", o.x, o.y, o.condition, o.factor, o.subject)
            .map_err(|e| write_err(path, e))?;
    }
    Ok(())
}

/// Write trial-level data in the 4-column input schema (1-based trial index).
pub fn write_trials_csv(path: &Path, trials: &[Trial]) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "xvals,conditions,accuracy,trialsIdx").map_err(|e| write_err(path, e))?;
    for (i, t) in trials.iter().enumerate() {
        writeln!(file, "{},{},{},{}", t.x, t.condition, u8::from(t.correct), i + 1)
            .map_err(|e| write_err(path, e))?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create '{}': {e}", path.display())))
}

fn write_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(ErrorKind::Io, format!("Failed to write '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SampleConfig {
        SampleConfig {
            units: Units::Accuracy,
            chance: 0.5,
            conditions: 2,
            subjects: 3,
            levels: vec![0.02, 0.04, 0.08, 0.16, 0.32, 0.64],
            trials_per_level: 20,
            noise_sd: 0.02,
            seed: 7,
        }
    }

    #[test]
    fn observations_cover_the_full_cross_product() {
        let obs = generate_observations(&base_config()).unwrap();
        assert_eq!(obs.len(), 3 * 2 * 6);
        assert!(obs.iter().all(|o| (0.0..=1.0).contains(&o.y)));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_observations(&base_config()).unwrap();
        let b = generate_observations(&base_config()).unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x.y == y.y));
    }

    #[test]
    fn trials_are_accuracy_only() {
        let config = SampleConfig {
            units: Units::Dprime,
            ..base_config()
        };
        let err = generate_trials(&config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn trial_counts_match_config() {
        let trials = generate_trials(&base_config()).unwrap();
        assert_eq!(trials.len(), 2 * 6 * 20);
    }
}
