//! Rename job configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default naming template applied when a job specifies none.
pub const DEFAULT_TEMPLATE: &str = "{artist} - {title}";

/// Configuration for one batch rename job.
///
/// Immutable once submitted to the operation manager.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RenameJob {
    /// Root directory holding the files to rename.
    pub root: PathBuf,

    /// Recurse into subdirectories.
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Compute destinations without touching the filesystem.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,

    /// Naming template, e.g. `"{artist} - {title}"`.
    #[builder(default = "DEFAULT_TEMPLATE.to_string()")]
    #[serde(default = "default_template")]
    pub template: String,

    /// Explicit files to process instead of enumerating under `root`.
    #[builder(default)]
    #[serde(default)]
    pub files: Option<Vec<PathBuf>>,

    /// Run local audio analysis as an additional metadata source.
    #[builder(default = "false")]
    #[serde(default)]
    pub analyze: bool,

    /// Let analysis override tagged BPM when they diverge by more than 5%.
    #[builder(default = "false")]
    #[serde(default)]
    pub verify_bpm: bool,

    /// Number of files processed in parallel.
    #[builder(default = "4")]
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_workers() -> usize {
    4
}

impl RenameJobBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref template) = self.template {
            if template.trim().is_empty() {
                return Err("Naming template cannot be empty".to_string());
            }
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

impl RenameJob {
    /// Create a new job builder.
    pub fn builder() -> RenameJobBuilder {
        RenameJobBuilder::default()
    }

    /// Create a simple job for renaming files directly under a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            dry_run: false,
            template: DEFAULT_TEMPLATE.to_string(),
            files: None,
            analyze: false,
            verify_bpm: false,
            workers: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = RenameJob::builder()
            .root("/music")
            .recursive(true)
            .template("{artist} - {title} ({bpm})")
            .workers(8usize)
            .build()
            .unwrap();

        assert_eq!(job.root, PathBuf::from("/music"));
        assert!(job.recursive);
        assert!(!job.dry_run);
        assert_eq!(job.workers, 8);
    }

    #[test]
    fn test_job_simple() {
        let job = RenameJob::new("/music");
        assert_eq!(job.template, DEFAULT_TEMPLATE);
        assert_eq!(job.workers, 4);
        assert!(job.files.is_none());
    }

    #[test]
    fn test_builder_rejects_empty_template() {
        let result = RenameJob::builder().root("/music").template("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let result = RenameJob::builder().root("/music").workers(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_root() {
        let result = RenameJob::builder().template("{title}").build();
        assert!(result.is_err());
    }
}
