//! Deterministic per-condition colors.
//!
//! Components are drawn from the golden-ratio low-discrepancy sequence over a
//! fixed palette of 100 slots, so any number of conditions gets well-separated
//! colors without configuration and without randomness.

const PALETTE_SIZE: usize = 100;
const PHI: f64 = 1.618_033_988_749_895; // (1 + √5) / 2

/// RGB color (components in [0, 1)) for the condition at `index`.
pub fn condition_color(index: usize) -> [f64; 3] {
    let mut rgb = [0.0; 3];
    for (c, slot) in rgb.iter_mut().enumerate() {
        let id = ((index * 3 + c) % PALETTE_SIZE) as f64;
        let v = id * PHI;
        *slot = v - v.floor();
    }
    rgb
}

/// Colors for the first `n` conditions.
pub fn condition_colors(n: usize) -> Vec<[f64; 3]> {
    (0..n).map(condition_color).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_deterministic() {
        assert_eq!(condition_color(3), condition_color(3));
        assert_eq!(condition_colors(5), condition_colors(5));
    }

    #[test]
    fn components_stay_in_unit_interval() {
        for rgb in condition_colors(PALETTE_SIZE) {
            for c in rgb {
                assert!((0.0..1.0).contains(&c));
            }
        }
    }

    #[test]
    fn nearby_conditions_get_distinct_colors() {
        let colors = condition_colors(10);
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                let d: f64 = colors[i]
                    .iter()
                    .zip(colors[j].iter())
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                assert!(d > 0.05, "conditions {i} and {j} too close: {d}");
            }
        }
    }
}
