//! Metadata source providers.
//!
//! The pipeline consumes three capabilities: on-disk tag reading, remote
//! fingerprint lookup, and local audio analysis. Each is a small
//! `Send + Sync` trait so tests (and alternate backends) can substitute
//! their own implementations. Provider calls are synchronous; workers
//! run them on blocking tasks.

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey};
use serde::{Deserialize, Serialize};
use strum::Display;

use tracktidy_core::{FieldKind, TrackFields};

/// Reads metadata from a file's embedded tags.
pub trait TagReader: Send + Sync {
    /// Read the file's tags. The error string becomes the per-file
    /// failure reason; it never aborts the batch.
    fn read_tags(&self, path: &Path) -> Result<TrackFields, String>;
}

/// Outcome classification for a remote lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum LookupStatus {
    /// The database returned a match.
    Found,
    /// The database had no match for this file.
    NoMatch,
    /// No remote backend is configured.
    Disabled,
    /// The lookup failed (network, rate limit, ...).
    Failed,
}

/// Result of a remote fingerprint lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMatch {
    /// Proposed fields, when a match was found.
    pub fields: Option<TrackFields>,
    /// Match confidence in `[0, 1]`; gates overrides during arbitration.
    pub confidence: f64,
    pub status: LookupStatus,
}

impl RemoteMatch {
    /// A lookup that produced nothing usable.
    pub fn none(status: LookupStatus) -> Self {
        Self {
            fields: None,
            confidence: 0.0,
            status,
        }
    }
}

/// Queries a remote fingerprint database for a file.
pub trait RemoteLookup: Send + Sync {
    fn lookup(&self, path: &Path) -> RemoteMatch;
}

/// Result of local audio analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub bpm: Option<f64>,
    pub key: Option<String>,
}

impl AnalysisReport {
    /// Convert the report into a candidate field set for arbitration.
    pub fn to_fields(&self) -> TrackFields {
        let mut fields = TrackFields::new();
        if let Some(bpm) = self.bpm {
            fields.set(FieldKind::Bpm, format!("{}", bpm.round() as i64));
        }
        if let Some(ref key) = self.key {
            fields.set(FieldKind::Key, key.clone());
        }
        fields
    }
}

/// Detects BPM and musical key from audio content.
pub trait AudioAnalyzer: Send + Sync {
    fn analyze(&self, path: &Path) -> AnalysisReport;
}

/// Tag reader backed by lofty.
#[derive(Debug, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }
}

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TrackFields, String> {
        let tagged = lofty::read_from_path(path)
            .map_err(|e| format!("failed to read tags: {e}"))?;

        let mut fields = TrackFields::new();
        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(fields);
        };

        if let Some(artist) = tag.artist() {
            fields.set(FieldKind::Artist, artist.as_ref());
        }
        if let Some(title) = tag.title() {
            fields.set(FieldKind::Title, title.as_ref());
        }
        if let Some(album) = tag.album() {
            fields.set(FieldKind::Album, album.as_ref());
        }
        if let Some(genre) = tag.genre() {
            fields.set(FieldKind::Genre, genre.as_ref());
        }
        if let Some(year) = tag.year() {
            fields.set(FieldKind::Year, year.to_string());
        }
        if let Some(track) = tag.track() {
            fields.set(FieldKind::TrackNumber, format!("{track:02}"));
        }
        if let Some(bpm) = tag.get_string(&ItemKey::Bpm) {
            fields.set(FieldKind::Bpm, bpm);
        }
        if let Some(key) = tag.get_string(&ItemKey::InitialKey) {
            fields.set(FieldKind::Key, key);
        }

        Ok(fields)
    }
}

/// Remote lookup stub used when no backend is configured.
#[derive(Debug, Default)]
pub struct DisabledRemote;

impl RemoteLookup for DisabledRemote {
    fn lookup(&self, _path: &Path) -> RemoteMatch {
        RemoteMatch::none(LookupStatus::Disabled)
    }
}

/// Analyzer stub used when analysis is not enabled.
#[derive(Debug, Default)]
pub struct DisabledAnalyzer;

impl AudioAnalyzer for DisabledAnalyzer {
    fn analyze(&self, _path: &Path) -> AnalysisReport {
        AnalysisReport::default()
    }
}
