//! The per-file processing pipeline.
//!
//! Each file flows through read → arbitrate → render → sanitize →
//! reserve → rename. The whole chain is synchronous; the orchestrator
//! runs it on blocking tasks. Any failure becomes an `Errored` outcome
//! and leaves the file untouched at its original path.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracktidy_core::{RenameJob, render_template, sanitize_filename};
use tracktidy_meta::{
    AudioAnalyzer, ConflictResolver, DisabledAnalyzer, DisabledRemote, LoftyTagReader,
    RemoteLookup, TagReader,
};

use crate::reservation::ReservationBook;
use crate::result::FileOutcome;

/// The three metadata capabilities the pipeline consumes, bundled for
/// cheap cloning into worker tasks.
#[derive(Clone)]
pub struct MetadataProviders {
    pub tags: Arc<dyn TagReader>,
    pub remote: Arc<dyn RemoteLookup>,
    pub analyzer: Arc<dyn AudioAnalyzer>,
}

impl Default for MetadataProviders {
    fn default() -> Self {
        Self {
            tags: Arc::new(LoftyTagReader::new()),
            remote: Arc::new(DisabledRemote),
            analyzer: Arc::new(DisabledAnalyzer),
        }
    }
}

impl std::fmt::Debug for MetadataProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataProviders").finish_non_exhaustive()
    }
}

/// Everything one worker needs to process one file.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub path: PathBuf,
    pub template: String,
    pub dry_run: bool,
    pub analyze: bool,
    pub verify_bpm: bool,
    pub providers: MetadataProviders,
    pub book: Arc<ReservationBook>,
}

impl PipelineContext {
    /// Build a context for one file of a job.
    pub fn for_file(
        job: &RenameJob,
        path: PathBuf,
        providers: MetadataProviders,
        book: Arc<ReservationBook>,
    ) -> Self {
        Self {
            path,
            template: job.template.clone(),
            dry_run: job.dry_run,
            analyze: job.analyze,
            verify_bpm: job.verify_bpm,
            providers,
            book,
        }
    }
}

/// Process one file end to end.
///
/// Never panics on bad input; failures are reported as `Errored`
/// outcomes. A file whose desired name matches its current name is
/// `Skipped` without consuming a reservation, so it cannot collide with
/// itself or waste a suffix for other workers.
pub fn process_file(ctx: &PipelineContext) -> FileOutcome {
    let path = &ctx.path;

    let tags = match ctx.providers.tags.read_tags(path) {
        Ok(tags) => tags,
        Err(reason) => {
            tracing::debug!(path = %path.display(), reason, "tag read failed");
            return FileOutcome::errored(path.clone(), reason);
        }
    };

    let remote = ctx.providers.remote.lookup(path);
    let analysis = ctx
        .analyze
        .then(|| ctx.providers.analyzer.analyze(path).to_fields());

    let resolver = if ctx.verify_bpm {
        ConflictResolver::with_bpm_verification()
    } else {
        ConflictResolver::new()
    };
    let resolved = resolver.resolve_all(
        &tags,
        remote.fields.as_ref(),
        analysis.as_ref(),
        remote.confidence,
    );

    let rendered = render_template(&resolved.fields(), &ctx.template);
    let stem = sanitize_filename(&rendered);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string);
    let desired_name = match extension.as_deref() {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.clone(),
    };

    let current_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if desired_name == current_name {
        return FileOutcome::skipped(path.clone(), "already has desired name", resolved);
    }

    let parent = path.parent().unwrap_or_else(|| std::path::Path::new(""));
    let destination = ctx
        .book
        .reserve_unique(parent, &stem, extension.as_deref());

    if ctx.dry_run {
        tracing::debug!(
            from = %path.display(),
            to = %destination.display(),
            "dry run, rename skipped"
        );
        return FileOutcome::renamed(path.clone(), destination, resolved);
    }

    perform_move(path, &destination)
        .map(|()| FileOutcome::renamed(path.clone(), destination.clone(), resolved))
        .unwrap_or_else(|reason| FileOutcome::errored(path.clone(), reason))
}

/// One atomic rename. Fails loudly when the source vanished or the
/// destination is occupied; never degrades to copy+delete.
fn perform_move(source: &PathBuf, destination: &PathBuf) -> Result<(), String> {
    if !source.exists() {
        return Err(format!("source vanished: {}", source.display()));
    }
    if destination.exists() {
        return Err(format!(
            "destination already exists: {}",
            destination.display()
        ));
    }
    fs::rename(source, destination).map_err(|e| format!("rename failed: {e}"))?;
    tracing::debug!(
        from = %source.display(),
        to = %destination.display(),
        "renamed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tracktidy_core::{FieldKind, TrackFields};
    use tracktidy_meta::{AnalysisReport, RemoteMatch};
    use crate::result::OutcomeKind;

    /// Derives tags from the file stem: "artist__title.ext".
    struct StemReader;

    impl TagReader for StemReader {
        fn read_tags(&self, path: &Path) -> Result<TrackFields, String> {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or("no stem")?;
            let (artist, title) = stem.split_once("__").ok_or("unreadable tags")?;
            let mut fields = TrackFields::new();
            fields.set(FieldKind::Artist, artist);
            fields.set(FieldKind::Title, title);
            Ok(fields)
        }
    }

    struct NoRemote;
    impl RemoteLookup for NoRemote {
        fn lookup(&self, _path: &Path) -> RemoteMatch {
            RemoteMatch::none(tracktidy_meta::LookupStatus::Disabled)
        }
    }

    struct NoAnalysis;
    impl AudioAnalyzer for NoAnalysis {
        fn analyze(&self, _path: &Path) -> AnalysisReport {
            AnalysisReport::default()
        }
    }

    fn providers() -> MetadataProviders {
        MetadataProviders {
            tags: Arc::new(StemReader),
            remote: Arc::new(NoRemote),
            analyzer: Arc::new(NoAnalysis),
        }
    }

    fn context(path: PathBuf, dry_run: bool) -> PipelineContext {
        let mut job = RenameJob::new(path.parent().unwrap());
        job.dry_run = dry_run;
        PipelineContext::for_file(&job, path, providers(), Arc::new(ReservationBook::new()))
    }

    #[test]
    fn test_renames_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("orbital__halcyon.mp3");
        fs::write(&source, "x").unwrap();

        let outcome = process_file(&context(source.clone(), false));

        assert_eq!(outcome.kind, OutcomeKind::Renamed);
        let dest = outcome.destination.unwrap();
        assert_eq!(dest.file_name().unwrap(), "orbital - halcyon.mp3");
        assert!(!source.exists());
        assert!(dest.exists());
    }

    #[test]
    fn test_dry_run_leaves_disk_untouched() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("orbital__halcyon.mp3");
        fs::write(&source, "x").unwrap();

        let outcome = process_file(&context(source.clone(), true));

        assert_eq!(outcome.kind, OutcomeKind::Renamed);
        assert!(source.exists());
        assert!(!outcome.destination.unwrap().exists());
    }

    #[test]
    fn test_skip_when_already_named() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("orbital - halcyon.mp3");
        fs::write(&source, "x").unwrap();

        let mut job = RenameJob::new(temp.path());
        job.dry_run = false;
        let reader: Arc<dyn TagReader> = Arc::new(FixedReader);
        let providers = MetadataProviders {
            tags: reader,
            remote: Arc::new(NoRemote),
            analyzer: Arc::new(NoAnalysis),
        };
        let book = Arc::new(ReservationBook::new());
        let ctx = PipelineContext::for_file(&job, source.clone(), providers, Arc::clone(&book));

        let outcome = process_file(&ctx);

        assert_eq!(outcome.kind, OutcomeKind::Skipped);
        assert_eq!(outcome.reason.as_deref(), Some("already has desired name"));
        assert!(source.exists());
        // No reservation was consumed for the skip.
        assert_eq!(book.claimed_count(temp.path()), 0);
    }

    /// Always reports "orbital" / "halcyon".
    struct FixedReader;
    impl TagReader for FixedReader {
        fn read_tags(&self, _path: &Path) -> Result<TrackFields, String> {
            let mut fields = TrackFields::new();
            fields.set(FieldKind::Artist, "orbital");
            fields.set(FieldKind::Title, "halcyon");
            Ok(fields)
        }
    }

    #[test]
    fn test_unreadable_tags_is_errored_and_untouched() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("nodelimiter.mp3");
        fs::write(&source, "x").unwrap();

        let outcome = process_file(&context(source.clone(), false));

        assert_eq!(outcome.kind, OutcomeKind::Errored);
        assert_eq!(outcome.reason.as_deref(), Some("unreadable tags"));
        assert!(source.exists());
    }

    #[test]
    fn test_colliding_names_get_suffixes() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("orbital__halcyon.mp3");
        let b = temp.path().join("orbital__halcyon  .mp3");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let job = RenameJob::new(temp.path());
        let book = Arc::new(ReservationBook::new());
        let providers = providers();
        let ctx_a =
            PipelineContext::for_file(&job, a, providers.clone(), Arc::clone(&book));
        let ctx_b = PipelineContext::for_file(&job, b, providers, Arc::clone(&book));

        let first = process_file(&ctx_a);
        let second = process_file(&ctx_b);

        assert_eq!(first.kind, OutcomeKind::Renamed);
        assert_eq!(second.kind, OutcomeKind::Renamed);
        let names: Vec<_> = [first, second]
            .iter()
            .map(|o| {
                o.destination
                    .as_ref()
                    .unwrap()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        assert!(names.contains(&"orbital - halcyon.mp3".to_string()));
        assert!(names.contains(&"orbital - halcyon (2).mp3".to_string()));
    }
}
