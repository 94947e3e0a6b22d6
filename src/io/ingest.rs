//! CSV ingest for the two supported schemas.
//!
//! Columns are positional; the header row is read for arity checking but the
//! labels themselves are not interpreted:
//!
//! - subject-level: `x, y, condition, factor, subject`
//! - trial-level:   `x, condition, outcome (0/1), trial index`
//!
//! Trial rows whose trial-index column is zero are placeholders and dropped.
//! Schema violations (missing columns, non-numeric x) abort immediately with
//! the offending line number; there is no row-skipping here because a silently
//! thinned dataset would bias the fits.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Observation, Trial};
use crate::error::{AppError, ErrorKind};

const SUBJECT_COLS: usize = 5;
const TRIAL_COLS: usize = 4;

/// Load subject-level observations from a CSV file.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>, AppError> {
    let file = open(path)?;
    read_observations(file).map_err(|e| with_path(e, path))
}

/// Load trial-level data from a CSV file, dropping placeholder rows.
pub fn load_trials(path: &Path) -> Result<Vec<Trial>, AppError> {
    let file = open(path)?;
    read_trials(file).map_err(|e| with_path(e, path))
}

/// Parse subject-level observations from any reader (used directly by tests).
pub fn read_observations(input: impl Read) -> Result<Vec<Observation>, AppError> {
    let mut reader = reader_for(input);
    check_header(&mut reader, SUBJECT_COLS)?;

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2; // 1-based, after the header
        let record = record.map_err(|e| malformed(line, format!("unreadable row: {e}")))?;
        ensure_width(&record, SUBJECT_COLS, line)?;
        out.push(Observation {
            x: parse_number(&record, 0, "x", line)?,
            y: parse_number(&record, 1, "response", line)?,
            condition: record[2].to_string(),
            factor: record[3].to_string(),
            subject: record[4].to_string(),
        });
    }
    Ok(out)
}

/// Parse trial-level data from any reader, dropping placeholder rows.
pub fn read_trials(input: impl Read) -> Result<Vec<Trial>, AppError> {
    let mut reader = reader_for(input);
    check_header(&mut reader, TRIAL_COLS)?;

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = record.map_err(|e| malformed(line, format!("unreadable row: {e}")))?;
        ensure_width(&record, TRIAL_COLS, line)?;

        let trial_idx = parse_number(&record, 3, "trial index", line)?;
        if trial_idx == 0.0 {
            continue;
        }

        let outcome = parse_number(&record, 2, "outcome", line)?;
        if outcome != 0.0 && outcome != 1.0 {
            return Err(malformed(line, format!("trial outcome must be 0 or 1, got {outcome}")));
        }
        out.push(Trial {
            x: parse_number(&record, 0, "x", line)?,
            condition: record[1].to_string(),
            correct: outcome == 1.0,
        });
    }
    Ok(out)
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn reader_for(input: impl Read) -> csv::Reader<impl Read> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn check_header(reader: &mut csv::Reader<impl Read>, want: usize) -> Result<(), AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(ErrorKind::MalformedInput, format!("Failed to read CSV header: {e}")))?;
    if headers.len() < want {
        return Err(AppError::new(
            ErrorKind::MalformedInput,
            format!("Expected {want} columns, header has {}.", headers.len()),
        ));
    }
    Ok(())
}

fn ensure_width(record: &StringRecord, want: usize, line: usize) -> Result<(), AppError> {
    if record.len() < want {
        return Err(malformed(line, format!("expected {want} columns, got {}", record.len())));
    }
    Ok(())
}

fn parse_number(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, AppError> {
    let raw = &record[idx];
    let value: f64 = raw
        .parse()
        .map_err(|_| malformed(line, format!("non-numeric {name} value '{raw}'")))?;
    if !value.is_finite() {
        return Err(malformed(line, format!("non-finite {name} value '{raw}'")));
    }
    Ok(value)
}

fn malformed(line: usize, detail: impl std::fmt::Display) -> AppError {
    AppError::new(ErrorKind::MalformedInput, format!("CSV line {line}: {detail}."))
}

fn with_path(err: AppError, path: &Path) -> AppError {
    AppError::new(err.kind(), format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_subject_level_rows() {
        let csv = "\
contrast,dprime,conditions,factors,subjects
2,0.02,1,1,1
7,1.1,1,1,1
13,1.6,2,1,1
";
        let obs = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].x, 2.0);
        assert_eq!(obs[2].condition, "2");
        assert_eq!(obs[2].subject, "1");
    }

    #[test]
    fn non_numeric_x_aborts_with_line_context() {
        let csv = "\
x,y,c,f,s
1.0,0.5,1,1,1
oops,0.6,1,1,1
";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn missing_column_aborts() {
        let csv = "x,y,c\n1.0,0.5,1\n";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
    }

    #[test]
    fn placeholder_trial_rows_are_dropped() {
        let csv = "\
xvals,conditions,accuracy,trialsIdx
0.1,1,1,1
0.1,1,0,2
0.2,1,1,0
0.2,2,1,3
";
        let trials = read_trials(csv.as_bytes()).unwrap();
        assert_eq!(trials.len(), 3);
        assert!(trials.iter().all(|t| t.x != 0.2 || t.condition == "2"));
    }

    #[test]
    fn out_of_range_outcome_is_rejected() {
        let csv = "x,c,acc,idx\n0.1,1,2,1\n";
        let err = read_trials(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
    }
}
