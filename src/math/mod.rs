//! Numeric helpers: grids, quantiles, spacing classification, normal CDF.

mod grid;
mod spacing;
mod stats;

pub use grid::{lin_space, log_space};
pub use spacing::{classify_spacing, pearson};
pub use stats::{dprime_to_pcorr, norm_cdf, quantile};
