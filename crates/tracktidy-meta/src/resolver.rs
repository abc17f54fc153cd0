//! Per-field arbitration between metadata sources.
//!
//! Three independent sources can propose a value for the same field:
//! on-disk tags, a remote fingerprint database, and local audio analysis.
//! The resolver picks one winner per field, records every disagreement,
//! and never fails — malformed input degrades to an absent candidate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoEnumIterator};

use tracktidy_core::{FieldKind, TrackFields};

use crate::key::{keys_match, normalize_key};

/// Remote confidence at or above which a confident match may replace a
/// placeholder or missing tag value.
const REMOTE_OVERRIDE_CONFIDENCE: f64 = 0.85;

/// Remote confidence above which the remote value is trusted as a
/// fallback when tags are silent.
const REMOTE_FALLBACK_CONFIDENCE: f64 = 0.8;

/// Relative BPM difference beyond which verify mode trusts analysis
/// over the tag.
const BPM_VERIFY_TOLERANCE: f64 = 0.05;

/// Absolute BPM window for tempo-harmonic detection.
const TEMPO_HARMONIC_WINDOW: f64 = 2.0;

/// BPM values closer than this count as agreement.
const BPM_EQUALITY_WINDOW: f64 = 0.5;

/// Tag values that claim a field without actually identifying anything.
const PLACEHOLDER_VALUES: [&str; 6] = [
    "Unknown Artist",
    "Various Artists",
    "Unknown Album",
    "Unknown Title",
    "Unknown",
    "Untitled",
];

/// Where a field value came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Source {
    /// On-disk tags (highest priority).
    Tags,
    /// Remote fingerprint database.
    RemoteDatabase,
    /// Local audio analysis (lowest priority).
    LocalAnalysis,
    /// No source produced a value.
    None,
}

/// A recorded disagreement between two sources over one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: FieldKind,
    pub source_a: Source,
    pub value_a: String,
    pub source_b: Source,
    pub value_b: String,
    /// Analysis may have locked onto double the true tempo.
    pub possible_double_tempo: bool,
    /// Analysis may have locked onto half the true tempo.
    pub possible_half_tempo: bool,
}

impl FieldConflict {
    fn new(field: FieldKind, a: (Source, &str), b: (Source, &str)) -> Self {
        Self {
            field,
            source_a: a.0,
            value_a: a.1.to_string(),
            source_b: b.0,
            value_b: b.1.to_string(),
            possible_double_tempo: false,
            possible_half_tempo: false,
        }
    }
}

impl std::fmt::Display for FieldConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} \"{}\" vs {} \"{}\"",
            self.field, self.source_a, self.value_a, self.source_b, self.value_b
        )?;
        if self.possible_half_tempo {
            write!(f, " (possible half tempo)")?;
        }
        if self.possible_double_tempo {
            write!(f, " (possible double tempo)")?;
        }
        Ok(())
    }
}

/// The settled value for one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecision {
    pub field: FieldKind,
    /// Winning value; empty when no source had one.
    pub value: String,
    /// Source of the winning value.
    pub source: Source,
    /// Disagreements observed while deciding.
    pub conflicts: Vec<FieldConflict>,
    /// Lower-priority sources that independently agreed with the winner.
    pub validated_by: Vec<Source>,
    /// Explanation when a lower-priority source overrode a higher one.
    pub note: Option<String>,
}

impl FieldDecision {
    fn empty(field: FieldKind) -> Self {
        Self {
            field,
            value: String::new(),
            source: Source::None,
            conflicts: Vec::new(),
            validated_by: Vec::new(),
            note: None,
        }
    }

    /// Whether any source supplied a value at all.
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

/// All field decisions for one file, in stable field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub decisions: IndexMap<FieldKind, FieldDecision>,
}

impl ResolvedTrack {
    /// Project the decisions back into a plain field set for rendering.
    pub fn fields(&self) -> TrackFields {
        let mut fields = TrackFields::new();
        for (kind, decision) in &self.decisions {
            if decision.has_value() {
                fields.set(*kind, decision.value.clone());
            }
        }
        fields
    }

    /// Iterate every recorded conflict across all fields.
    pub fn conflicts(&self) -> impl Iterator<Item = &FieldConflict> {
        self.decisions.values().flat_map(|d| d.conflicts.iter())
    }

    /// Whether any field saw a disagreement.
    pub fn has_conflicts(&self) -> bool {
        self.conflicts().next().is_some()
    }
}

/// One source's proposal for a field.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    source: Source,
    value: &'a str,
}

/// Per-field arbitration engine. Pure: no I/O, no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    /// Let analysis override tagged BPM on large disagreement.
    pub verify_bpm: bool,
}

impl ConflictResolver {
    /// Create a resolver with verify mode off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver that lets analysis correct implausible BPM tags.
    pub fn with_bpm_verification() -> Self {
        Self { verify_bpm: true }
    }

    /// Settle one field from up to three candidate values.
    ///
    /// `remote_confidence` gates how far the remote candidate is trusted;
    /// it is ignored for the other sources.
    pub fn resolve(
        &self,
        field: FieldKind,
        tag_value: Option<&str>,
        remote_value: Option<&str>,
        analysis_value: Option<&str>,
        remote_confidence: f64,
    ) -> FieldDecision {
        let candidates = collect_candidates(field, tag_value, remote_value, analysis_value);

        match candidates.len() {
            0 => FieldDecision::empty(field),
            1 => {
                let only = candidates[0];
                FieldDecision {
                    field,
                    value: only.value.to_string(),
                    source: only.source,
                    conflicts: Vec::new(),
                    validated_by: Vec::new(),
                    note: None,
                }
            }
            _ => {
                if all_agree(field, &candidates) {
                    unanimous_decision(field, &candidates)
                } else if field.is_numeric() {
                    self.resolve_bpm(field, &candidates)
                } else {
                    resolve_text(field, &candidates, remote_confidence)
                }
            }
        }
    }

    /// Settle a contested BPM.
    ///
    /// Conflicts are always recorded. Harmonic flags mark values where
    /// analysis plausibly locked onto half or double the true tempo.
    /// Outside verify mode the tag wins; in verify mode analysis
    /// overrides a tag it disagrees with by more than 5%.
    fn resolve_bpm(&self, field: FieldKind, candidates: &[Candidate<'_>]) -> FieldDecision {
        let tag = find(candidates, Source::Tags);
        let analysis = find(candidates, Source::LocalAnalysis);

        let mut conflicts = conflicting_pairs(field, candidates);

        if let (Some(tag), Some(analysis)) = (tag, analysis) {
            // Values were validated numeric during candidate collection.
            let tag_bpm: f64 = tag.value.parse().unwrap_or(0.0);
            let analysis_bpm: f64 = analysis.value.parse().unwrap_or(0.0);

            for conflict in &mut conflicts {
                if involves(conflict, Source::Tags) && involves(conflict, Source::LocalAnalysis) {
                    conflict.possible_half_tempo =
                        (tag_bpm - 2.0 * analysis_bpm).abs() <= TEMPO_HARMONIC_WINDOW;
                    conflict.possible_double_tempo =
                        (analysis_bpm - 2.0 * tag_bpm).abs() <= TEMPO_HARMONIC_WINDOW;
                }
            }

            let relative_diff = if tag_bpm > 0.0 {
                (tag_bpm - analysis_bpm).abs() / tag_bpm
            } else {
                1.0
            };

            if self.verify_bpm && relative_diff > BPM_VERIFY_TOLERANCE {
                tracing::debug!(
                    tag = tag_bpm,
                    analysis = analysis_bpm,
                    "analysis overriding tagged BPM"
                );
                return FieldDecision {
                    field,
                    value: analysis.value.to_string(),
                    source: Source::LocalAnalysis,
                    conflicts,
                    validated_by: Vec::new(),
                    note: Some(format!(
                        "analysis BPM {} overrode tagged {} ({:.0}% apart)",
                        analysis.value,
                        tag.value,
                        relative_diff * 100.0
                    )),
                };
            }
        }

        let winner = best_by_priority(candidates);
        FieldDecision {
            field,
            value: winner.value.to_string(),
            source: winner.source,
            conflicts,
            validated_by: Vec::new(),
            note: None,
        }
    }

    /// Settle every field of a track from its per-source field sets.
    pub fn resolve_all(
        &self,
        tags: &TrackFields,
        remote: Option<&TrackFields>,
        analysis: Option<&TrackFields>,
        remote_confidence: f64,
    ) -> ResolvedTrack {
        let mut decisions = IndexMap::new();
        for field in FieldKind::iter() {
            let decision = self.resolve(
                field,
                tags.get(field),
                remote.and_then(|r| r.get(field)),
                analysis.and_then(|a| a.get(field)),
                remote_confidence,
            );
            decisions.insert(field, decision);
        }
        ResolvedTrack { decisions }
    }
}

/// Check whether a tag value is a stand-in rather than real metadata.
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_VALUES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(value.trim()))
}

/// Gather the non-empty, well-formed candidates in priority order.
fn collect_candidates<'a>(
    field: FieldKind,
    tag: Option<&'a str>,
    remote: Option<&'a str>,
    analysis: Option<&'a str>,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::with_capacity(3);
    for (source, value) in [
        (Source::Tags, tag),
        (Source::RemoteDatabase, remote),
        (Source::LocalAnalysis, analysis),
    ] {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        // A numeric field with a malformed candidate is treated as absent.
        // Note "NaN" and "inf" parse successfully and must be rejected too.
        if field.is_numeric()
            && value
                .parse::<f64>()
                .map_or(true, |n| !n.is_finite() || n <= 0.0)
        {
            continue;
        }
        candidates.push(Candidate { source, value });
    }
    candidates
}

/// Field-aware equality between two candidate values.
fn values_agree(field: FieldKind, a: &str, b: &str) -> bool {
    if field.is_numeric() {
        match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(a), Ok(b)) => (a - b).abs() < BPM_EQUALITY_WINDOW,
            _ => a == b,
        }
    } else if field.is_key() {
        keys_match(a, b)
    } else {
        a == b
    }
}

fn all_agree(field: FieldKind, candidates: &[Candidate<'_>]) -> bool {
    candidates
        .windows(2)
        .all(|w| values_agree(field, w[0].value, w[1].value))
}

/// Every disagreeing pair among the candidates, in priority order.
fn conflicting_pairs(field: FieldKind, candidates: &[Candidate<'_>]) -> Vec<FieldConflict> {
    let mut conflicts = Vec::new();
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if !values_agree(field, a.value, b.value) {
                conflicts.push(FieldConflict::new(
                    field,
                    (a.source, a.value),
                    (b.source, b.value),
                ));
            }
        }
    }
    conflicts
}

fn find<'a, 'b>(candidates: &'b [Candidate<'a>], source: Source) -> Option<&'b Candidate<'a>> {
    candidates.iter().find(|c| c.source == source)
}

fn involves(conflict: &FieldConflict, source: Source) -> bool {
    conflict.source_a == source || conflict.source_b == source
}

/// Candidates are collected in priority order, so the first one wins.
fn best_by_priority<'a, 'b>(candidates: &'b [Candidate<'a>]) -> &'b Candidate<'a> {
    &candidates[0]
}

/// All candidates agree: highest-priority source wins, the rest validate.
fn unanimous_decision(field: FieldKind, candidates: &[Candidate<'_>]) -> FieldDecision {
    let winner = best_by_priority(candidates);
    FieldDecision {
        field,
        value: winner.value.to_string(),
        source: winner.source,
        conflicts: Vec::new(),
        validated_by: candidates
            .iter()
            .skip(1)
            .map(|c| c.source)
            .collect(),
        note: None,
    }
}

/// Settle a contested text field (artist, title, album, year, ...).
fn resolve_text(
    field: FieldKind,
    candidates: &[Candidate<'_>],
    remote_confidence: f64,
) -> FieldDecision {
    let conflicts = conflicting_pairs(field, candidates);
    let tag = find(candidates, Source::Tags);
    let remote = find(candidates, Source::RemoteDatabase);
    let analysis = find(candidates, Source::LocalAnalysis);

    // A confident remote match may replace a placeholder tag.
    if let Some(remote) = remote {
        let tag_is_weak = tag.map_or(true, |t| is_placeholder(t.value));
        if remote_confidence >= REMOTE_OVERRIDE_CONFIDENCE && tag_is_weak {
            let note = tag.map(|t| {
                format!(
                    "remote match (confidence {remote_confidence:.2}) replaced placeholder \"{}\"",
                    t.value
                )
            });
            if let Some(tag) = tag {
                tracing::debug!(
                    field = %field,
                    placeholder = tag.value,
                    replacement = remote.value,
                    "remote match replacing placeholder tag"
                );
            }
            return FieldDecision {
                field,
                value: remote.value.to_string(),
                source: Source::RemoteDatabase,
                conflicts,
                validated_by: Vec::new(),
                note,
            };
        }
    }

    // Tags win whenever present; otherwise fall back by trustworthiness.
    let winner = tag
        .or_else(|| remote.filter(|_| remote_confidence > REMOTE_FALLBACK_CONFIDENCE))
        .or(analysis)
        .or_else(|| remote);

    match winner {
        Some(winner) => FieldDecision {
            field,
            value: winner.value.to_string(),
            source: winner.source,
            conflicts,
            validated_by: Vec::new(),
            note: None,
        },
        None => FieldDecision {
            field,
            conflicts,
            ..FieldDecision::empty(field)
        },
    }
}
