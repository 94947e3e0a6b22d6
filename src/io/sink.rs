//! Output persistence and the plot-sink abstraction.
//!
//! Rendering is out of scope for this crate: external renderers receive fit
//! curves through the `CurveSink` trait, which deliberately knows nothing
//! about any plotting backend. The JSON bundle is the portable on-disk
//! representation of a run, holding — in fixed order — the raw summary table,
//! the dense fit curves, and the fitted parameter vectors.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{GroupKey, OutputBundle};
use crate::error::{AppError, ErrorKind};
use crate::report::condition_color;

/// Consumer of one fit curve plus the raw points it was fitted to.
pub trait CurveSink {
    fn accept(
        &mut self,
        key: &GroupKey,
        grid: &[f64],
        curve: &[f64],
        raw: &[(f64, f64)],
    ) -> Result<(), AppError>;
}

/// Sink that writes one descriptive line per curve, with its assigned palette
/// color, to any writer. This is the hand-off point for external renderers.
pub struct TextSink<W: Write> {
    out: W,
    /// Explicit colors for the first curves; the palette covers the rest.
    colors: Vec<[f64; 3]>,
    next_index: usize,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self::with_colors(out, Vec::new())
    }

    pub fn with_colors(out: W, colors: Vec<[f64; 3]>) -> Self {
        Self {
            out,
            colors,
            next_index: 0,
        }
    }
}

impl<W: Write> CurveSink for TextSink<W> {
    fn accept(
        &mut self,
        key: &GroupKey,
        grid: &[f64],
        curve: &[f64],
        raw: &[(f64, f64)],
    ) -> Result<(), AppError> {
        let [r, g, b] = self
            .colors
            .get(self.next_index)
            .copied()
            .unwrap_or_else(|| condition_color(self.next_index));
        self.next_index += 1;

        let (lo, hi) = curve
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)));
        writeln!(
            self.out,
            "curve [{key}] rgb=({r:.3},{g:.3},{b:.3}) grid={} raw={} y=[{lo:.3}, {hi:.3}]",
            grid.len(),
            raw.len(),
        )
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write curve summary: {e}")))?;
        Ok(())
    }
}

/// Sink that keeps everything in memory (tests, library consumers).
#[derive(Default)]
pub struct CollectSink {
    pub curves: Vec<(GroupKey, Vec<f64>, Vec<f64>, Vec<(f64, f64)>)>,
}

impl CurveSink for CollectSink {
    fn accept(
        &mut self,
        key: &GroupKey,
        grid: &[f64],
        curve: &[f64],
        raw: &[(f64, f64)],
    ) -> Result<(), AppError> {
        self.curves
            .push((key.clone(), grid.to_vec(), curve.to_vec(), raw.to_vec()));
        Ok(())
    }
}

/// Write the output bundle as pretty-printed JSON.
pub fn write_bundle(path: &Path, bundle: &OutputBundle) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create bundle '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, bundle)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write bundle JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveRecord, ParamRecord, SummaryRow};

    fn tiny_bundle() -> OutputBundle {
        let key = GroupKey::condition_level(None, "1");
        OutputBundle {
            summaries: vec![SummaryRow {
                x: 0.1,
                factor: None,
                condition: "1".to_string(),
                total: 10.0,
                correct: Some(8.0),
                value: 0.8,
            }],
            curves: vec![CurveRecord {
                key: key.clone(),
                x: vec![0.1, 0.2],
                y: vec![0.6, 0.8],
            }],
            params: vec![ParamRecord {
                key,
                model: crate::domain::ModelKind::Weibull,
                params: [0.5, 0.02, 0.15, 2.0],
                converged: true,
            }],
        }
    }

    #[test]
    fn bundle_serializes_sections_in_fixed_order() {
        let json = serde_json::to_string(&tiny_bundle()).unwrap();
        let summaries = json.find("\"summaries\"").unwrap();
        let curves = json.find("\"curves\"").unwrap();
        let params = json.find("\"params\"").unwrap();
        assert!(summaries < curves && curves < params);
    }

    #[test]
    fn text_sink_writes_one_line_per_curve() {
        let mut buf = Vec::new();
        {
            let mut sink = TextSink::new(&mut buf);
            let key = GroupKey::condition_level(None, "1");
            sink.accept(&key, &[0.1, 0.2], &[0.6, 0.8], &[(0.1, 0.55)]).unwrap();
            sink.accept(&key, &[0.1, 0.2], &[0.5, 0.7], &[]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("condition=1"));
    }

    #[test]
    fn explicit_colors_override_the_palette() {
        let mut buf = Vec::new();
        {
            let mut sink = TextSink::with_colors(&mut buf, vec![[1.0, 0.0, 0.0]]);
            let key = GroupKey::condition_level(None, "1");
            sink.accept(&key, &[0.1], &[0.6], &[]).unwrap();
            // Second curve falls back to the palette.
            sink.accept(&key, &[0.1], &[0.5], &[]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("rgb=(1.000,0.000,0.000)"));
    }
}
