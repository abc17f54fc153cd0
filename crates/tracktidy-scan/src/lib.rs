//! Media file enumeration for tracktidy.
//!
//! This crate walks a library root with jwalk and produces the flat,
//! deterministic list of audio files a rename job will process.
//!
//! # Example
//!
//! ```rust,no_run
//! use tracktidy_scan::enumerate_media;
//!
//! let files = enumerate_media("/music", true).unwrap();
//! println!("{} audio files", files.len());
//! ```

mod enumerate;

pub use enumerate::{AUDIO_EXTENSIONS, enumerate_media, is_audio_file};

// Re-export core types for convenience
pub use tracktidy_core::RenameError;
