//! Reporting utilities: formatted terminal output and the condition palette.
//!
//! Formatting lives in one place so the math/fitting code stays clean and
//! output changes are localized.

mod format;
mod palette;

pub use format::format_run_summary;
pub use palette::{condition_color, condition_colors};
