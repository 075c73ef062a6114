//! License field parsing and paid-license classification.
//!
//! - [`tokenizer`] — splits a raw `Licenses` cell into trimmed `+`-separated tokens.
//! - [`matcher`] — keyword rules that decide whether a token is a paid license
//!   and which [`LicenseCategory`](crate::models::LicenseCategory) it belongs to.

pub mod matcher;
pub mod tokenizer;
