//! Fitting engine: objectives, bounded minimizer, per-model policy, and the
//! grouped-fit driver.

pub mod driver;
pub mod fitter;
pub mod minimize;
pub mod objective;
