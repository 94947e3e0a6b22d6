//! Input ingest and output persistence.
//!
//! Everything here is thin glue around the fitting core: CSV in, JSON bundle
//! and plot-sink handoff out. No fitting logic lives in this module.

pub mod ingest;
pub mod sink;
