//! Model registry: closed set of psychometric response functions.

mod model;

pub use model::{X_EPS, check_params, clamp_x, parse_model, predict, predict_one};
