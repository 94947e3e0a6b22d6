//! Formatted terminal output for a fit run.

use crate::domain::{FitConfig, FitResult, Spacing, Units};

/// Format the full run summary: configuration, spacing decision, and one line
/// per group fit.
pub fn format_run_summary(config: &FitConfig, spacing: Spacing, fits: &[FitResult]) -> String {
    let mut out = String::new();

    out.push_str("=== psyfit - psychometric function fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Units: {}\n",
        match config.units {
            Units::Accuracy => "accuracy",
            Units::Dprime => "d-prime",
        }
    ));
    if let Some(chance) = config.chance {
        out.push_str(&format!("Chance: {chance}\n"));
    }
    out.push_str(&format!(
        "Spacing: {}\n",
        match spacing {
            Spacing::Linear => "linear",
            Spacing::Logarithmic => "logarithmic",
        }
    ));

    let n_empty = fits.iter().filter(|f| f.empty).count();
    let n_converged = fits.iter().filter(|f| f.converged).count();
    out.push_str(&format!(
        "Groups: {} total | {} converged | {} empty\n",
        fits.len(),
        n_converged,
        n_empty
    ));

    out.push_str("\nGroup fits:\n");
    for fit in fits {
        if fit.empty {
            out.push_str(&format!("  [{}] (no observations)\n", fit.key));
            continue;
        }
        let mark = if fit.converged { " " } else { "!" };
        out.push_str(&format!(
            "{mark} [{}] {}: {}\n",
            fit.key,
            fit.model.display_name(),
            fmt_params(fit)
        ));
    }
    if fits.iter().any(|f| !f.converged && !f.empty) {
        out.push_str("\n'!' marks groups where the optimizer did not converge.\n");
    }

    out
}

fn fmt_params(fit: &FitResult) -> String {
    fit.model
        .param_names()
        .iter()
        .zip(fit.params.iter())
        .map(|(name, v)| format!("{name}={v:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}
