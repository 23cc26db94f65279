//! Output of the compiled network.
//!
//! This module handles everything written out:
//! - [`bicep`] - Bicep literal rendering
//! - [`params`] - parameter and metadata files per resource family
//! - [`terminal`] - terminal summary with colors

mod bicep;
pub mod params;
mod terminal;

pub use bicep::{key_literal, param_line, quote, to_bicep};
pub use params::{write_all, write_document, ParamsDocument, WrittenFiles};
pub use terminal::{format_field, print_summary, summary_rows};
