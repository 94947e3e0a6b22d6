//! Bounded local minimization via Nelder-Mead with bound projection.
//!
//! This is the one standardized local method used everywhere in the crate.
//! Every candidate vertex is projected back into the box before evaluation, so
//! the objective is never called outside its bounds. Parameters whose bounds
//! collapse to a single point (lo == hi) are pinned: every vertex shares that
//! coordinate and the simplex only spans the free dimensions.
//!
//! Deterministic: no restarts, no randomness. On failure to converge within
//! the iteration budget the best iterate is returned with `converged = false`;
//! callers treat that as a soft per-group failure.

use nalgebra::DVector;

use crate::error::{AppError, ErrorKind};

/// Standard Nelder-Mead coefficients.
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Step (as a fraction of each bound span) used to seed the initial simplex.
const INIT_STEP: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Options {
    pub max_iter: usize,
    /// Relative spread of simplex costs below which we stop.
    pub f_tol: f64,
    /// Maximum vertex distance from the best vertex below which we stop.
    pub x_tol: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            f_tol: 1e-12,
            x_tol: 1e-9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub cost: f64,
    pub iters: usize,
    pub converged: bool,
}

/// Minimize `f` over the box `bounds`, starting from `x0`.
///
/// `bounds` must be finite with `lo <= hi` per slot; `lo == hi` pins a slot.
pub fn minimize<F>(f: F, x0: &[f64], bounds: &[(f64, f64)], opts: &Options) -> Result<Minimum, AppError>
where
    F: Fn(&[f64]) -> f64,
{
    if x0.len() != bounds.len() {
        return Err(AppError::new(
            ErrorKind::InvalidParameters,
            format!(
                "Initial guess has {} entries but bounds have {}.",
                x0.len(),
                bounds.len()
            ),
        ));
    }
    for &(lo, hi) in bounds {
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(AppError::new(
                ErrorKind::InvalidParameters,
                format!("Invalid bound ({lo}, {hi}): bounds must be finite with lo <= hi."),
            ));
        }
    }

    let n = x0.len();
    let clamp = |v: &mut DVector<f64>| {
        for i in 0..n {
            v[i] = v[i].clamp(bounds[i].0, bounds[i].1);
        }
    };
    // Non-finite costs are treated as +inf so bad vertices lose comparisons
    // instead of poisoning them with NaN.
    let eval = |v: &DVector<f64>| {
        let c = f(v.as_slice());
        if c.is_finite() { c } else { f64::INFINITY }
    };

    let mut start = DVector::from_column_slice(x0);
    clamp(&mut start);

    let free: Vec<usize> = (0..n).filter(|&i| bounds[i].1 > bounds[i].0).collect();
    if free.is_empty() {
        // Everything pinned: nothing to optimize.
        let cost = eval(&start);
        return Ok(Minimum {
            x: start.as_slice().to_vec(),
            cost,
            iters: 0,
            converged: true,
        });
    }

    // Initial simplex: the start plus one perturbed vertex per free dimension,
    // stepping away from whichever bound the start sits on.
    let mut verts: Vec<DVector<f64>> = Vec::with_capacity(free.len() + 1);
    verts.push(start.clone());
    for &i in &free {
        let step = INIT_STEP * (bounds[i].1 - bounds[i].0);
        let mut v = start.clone();
        v[i] = if v[i] + step <= bounds[i].1 { v[i] + step } else { v[i] - step };
        verts.push(v);
    }
    let mut costs: Vec<f64> = verts.iter().map(&eval).collect();

    let mut iters = 0;
    let converged = loop {
        // Order vertices best-to-worst.
        let mut order: Vec<usize> = (0..verts.len()).collect();
        order.sort_by(|&a, &b| costs[a].partial_cmp(&costs[b]).unwrap_or(std::cmp::Ordering::Equal));
        let verts_sorted: Vec<DVector<f64>> = order.iter().map(|&i| verts[i].clone()).collect();
        let costs_sorted: Vec<f64> = order.iter().map(|&i| costs[i]).collect();
        verts = verts_sorted;
        costs = costs_sorted;

        let best = 0;
        let worst = verts.len() - 1;

        let f_spread = (costs[worst] - costs[best]).abs();
        let x_spread = verts[1..]
            .iter()
            .map(|v| (v - &verts[best]).amax())
            .fold(0.0_f64, f64::max);
        if f_spread <= opts.f_tol * (1.0 + costs[best].abs()) && x_spread <= opts.x_tol {
            break true;
        }
        if iters >= opts.max_iter {
            break false;
        }
        iters += 1;

        // Centroid of all but the worst vertex.
        let mut centroid = DVector::zeros(n);
        for v in &verts[..worst] {
            centroid += v;
        }
        centroid /= worst as f64;

        let mut reflected = &centroid + (&centroid - &verts[worst]) * REFLECT;
        clamp(&mut reflected);
        let f_reflected = eval(&reflected);

        if f_reflected < costs[best] {
            let mut expanded = &centroid + (&centroid - &verts[worst]) * EXPAND;
            clamp(&mut expanded);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                verts[worst] = expanded;
                costs[worst] = f_expanded;
            } else {
                verts[worst] = reflected;
                costs[worst] = f_reflected;
            }
            continue;
        }

        if f_reflected < costs[worst - 1] {
            verts[worst] = reflected;
            costs[worst] = f_reflected;
            continue;
        }

        // Contraction: outside if the reflected point improved on the worst,
        // inside otherwise.
        let mut contracted = if f_reflected < costs[worst] {
            &centroid + (&reflected - &centroid) * CONTRACT
        } else {
            &centroid + (&verts[worst] - &centroid) * CONTRACT
        };
        clamp(&mut contracted);
        let f_contracted = eval(&contracted);

        if f_contracted < f_reflected.min(costs[worst]) {
            verts[worst] = contracted;
            costs[worst] = f_contracted;
            continue;
        }

        // Shrink everything toward the best vertex.
        let anchor = verts[best].clone();
        for k in 1..verts.len() {
            let mut v = &anchor + (&verts[k] - &anchor) * SHRINK;
            clamp(&mut v);
            costs[k] = eval(&v);
            verts[k] = v;
        }
    };

    Ok(Minimum {
        x: verts[0].as_slice().to_vec(),
        cost: costs[0],
        iters,
        converged,
    })
}
