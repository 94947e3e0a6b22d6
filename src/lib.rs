//! `psyfit` library crate.
//!
//! Fits parametric psychometric functions (Weibull, Gumbel, Naka-Rushton) to
//! behavioral performance data across subjects, conditions, and experimental
//! factors. The binary (`psyfit`) is a thin wrapper around this library so that:
//!
//! - core fitting logic is testable without spawning processes
//! - modules are reusable (e.g., notebooks, downstream analysis tools)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
