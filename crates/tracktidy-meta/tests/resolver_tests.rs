use tracktidy_core::{FieldKind, TrackFields};
use tracktidy_meta::{ConflictResolver, Source};

fn tagged(artist: &str, title: &str, bpm: &str, key: &str) -> TrackFields {
    let mut fields = TrackFields::new();
    fields.set(FieldKind::Artist, artist);
    fields.set(FieldKind::Title, title);
    fields.set(FieldKind::Bpm, bpm);
    fields.set(FieldKind::Key, key);
    fields
}

#[test]
fn test_fully_tagged_track_with_agreeing_analysis() {
    let tags = tagged("Underworld", "Born Slippy", "140", "F#m");

    let mut analysis = TrackFields::new();
    analysis.set(FieldKind::Bpm, "140");
    analysis.set(FieldKind::Key, "Gbm"); // enharmonic spelling

    let resolved = ConflictResolver::new().resolve_all(&tags, None, Some(&analysis), 0.0);

    assert!(!resolved.has_conflicts());
    let bpm = &resolved.decisions[&FieldKind::Bpm];
    assert_eq!(bpm.source, Source::Tags);
    assert_eq!(bpm.validated_by, vec![Source::LocalAnalysis]);
    let key = &resolved.decisions[&FieldKind::Key];
    assert_eq!(key.value, "F#m");
    assert_eq!(key.validated_by, vec![Source::LocalAnalysis]);
}

#[test]
fn test_placeholder_tags_filled_from_confident_remote() {
    let tags = tagged("Unknown Artist", "Track 01", "", "");

    let mut remote = TrackFields::new();
    remote.set(FieldKind::Artist, "Plaid");
    remote.set(FieldKind::Title, "Eyen");
    remote.set(FieldKind::Album, "Double Figure");

    let resolved = ConflictResolver::new().resolve_all(&tags, Some(&remote), None, 0.95);
    let fields = resolved.fields();

    assert_eq!(fields.get(FieldKind::Artist), Some("Plaid"));
    // "Track 01" is not a placeholder; the tag wins despite confidence.
    assert_eq!(fields.get(FieldKind::Title), Some("Track 01"));
    // Album had no tag at all; the confident remote supplies it.
    assert_eq!(fields.get(FieldKind::Album), Some("Double Figure"));
}

#[test]
fn test_half_tempo_analysis_flagged_but_not_trusted() {
    let tags = tagged("LFO", "LFO", "124", "");
    let mut analysis = TrackFields::new();
    analysis.set(FieldKind::Bpm, "62");

    let resolved = ConflictResolver::new().resolve_all(&tags, None, Some(&analysis), 0.0);

    let conflicts: Vec<_> = resolved.conflicts().collect();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].possible_half_tempo);
    assert_eq!(resolved.fields().get(FieldKind::Bpm), Some("124"));
}

#[test]
fn test_verify_mode_corrects_stale_bpm_tag() {
    let tags = tagged("Autechre", "Gantz Graf", "90", "");
    let mut analysis = TrackFields::new();
    analysis.set(FieldKind::Bpm, "129");

    let resolved =
        ConflictResolver::with_bpm_verification().resolve_all(&tags, None, Some(&analysis), 0.0);

    let bpm = &resolved.decisions[&FieldKind::Bpm];
    assert_eq!(bpm.value, "129");
    assert_eq!(bpm.source, Source::LocalAnalysis);
    assert!(bpm.note.as_deref().unwrap().contains("overrode"));
}

#[test]
fn test_untagged_file_falls_back_across_sources() {
    let tags = TrackFields::new();

    let mut remote = TrackFields::new();
    remote.set(FieldKind::Artist, "Squarepusher");
    remote.set(FieldKind::Title, "Iambic 9 Poetry");

    let mut analysis = TrackFields::new();
    analysis.set(FieldKind::Bpm, "86");
    analysis.set(FieldKind::Key, "C");

    let resolved =
        ConflictResolver::new().resolve_all(&tags, Some(&remote), Some(&analysis), 0.9);
    let fields = resolved.fields();

    assert_eq!(fields.get(FieldKind::Artist), Some("Squarepusher"));
    assert_eq!(fields.get(FieldKind::Bpm), Some("86"));
    assert_eq!(fields.get(FieldKind::Key), Some("C"));
    assert_eq!(
        resolved.decisions[&FieldKind::Artist].source,
        Source::RemoteDatabase
    );
    assert_eq!(
        resolved.decisions[&FieldKind::Bpm].source,
        Source::LocalAnalysis
    );
}

#[test]
fn test_resolver_never_panics_on_garbage() {
    let tags = tagged("\u{0}weird", "", "NaN", "not-a-key");
    let mut analysis = TrackFields::new();
    analysis.set(FieldKind::Bpm, "∞");
    analysis.set(FieldKind::Key, "H!");

    let resolved = ConflictResolver::new().resolve_all(&tags, None, Some(&analysis), f64::NAN);

    // Malformed numerics vanish; unparseable keys compare textually.
    assert_eq!(resolved.fields().get(FieldKind::Bpm), None);
    assert!(resolved.decisions[&FieldKind::Key].has_value());
}
