//! Core types and traits for tracktidy.
//!
//! This crate provides the fundamental data structures used throughout
//! the tracktidy ecosystem, including track metadata fields, rename jobs,
//! and filename templating.

mod error;
mod fields;
mod job;
mod template;

pub use error::RenameError;
pub use fields::{FieldKind, TrackFields};
pub use job::{DEFAULT_TEMPLATE, RenameJob, RenameJobBuilder};
pub use template::{render_template, sanitize_filename};
