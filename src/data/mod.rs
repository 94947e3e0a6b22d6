//! Synthetic dataset generation for demos and tests.

mod sample;

pub use sample::{SampleConfig, generate_observations, generate_trials, write_observations_csv, write_trials_csv};
