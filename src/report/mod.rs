//! Renderers for an aggregated [`Report`](crate::models::Report).
//!
//! - [`terminal`] — colored tables and a summary box; respects `--verbose` / `--quiet`.
//! - [`workbook`] — the four-sheet `.xlsx` export.
//! - [`chart`] — PNG bar charts of license distribution and paid users per organization.

pub mod chart;
pub mod terminal;
pub mod workbook;
