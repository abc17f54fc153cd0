//! Track metadata field types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The metadata fields a rename template can draw from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    Artist,
    Title,
    Album,
    Year,
    TrackNumber,
    Genre,
    Bpm,
    Key,
}

impl FieldKind {
    /// Whether this field compares numerically rather than textually.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Bpm)
    }

    /// Whether this field holds a musical key.
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key)
    }
}

/// One file's metadata as reported by a single source.
///
/// Every field is optional; an absent field simply contributes nothing
/// to arbitration or template rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFields {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub track_number: Option<String>,
    pub genre: Option<String>,
    pub bpm: Option<String>,
    pub key: Option<String>,
}

impl TrackFields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field by kind.
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        let value = match kind {
            FieldKind::Artist => &self.artist,
            FieldKind::Title => &self.title,
            FieldKind::Album => &self.album,
            FieldKind::Year => &self.year,
            FieldKind::TrackNumber => &self.track_number,
            FieldKind::Genre => &self.genre,
            FieldKind::Bpm => &self.bpm,
            FieldKind::Key => &self.key,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set a field by kind. Empty or whitespace-only values clear it.
    pub fn set(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = value.into();
        let value = match value.trim() {
            "" => None,
            trimmed => Some(trimmed.to_string()),
        };
        let slot = match kind {
            FieldKind::Artist => &mut self.artist,
            FieldKind::Title => &mut self.title,
            FieldKind::Album => &mut self.album,
            FieldKind::Year => &mut self.year,
            FieldKind::TrackNumber => &mut self.track_number,
            FieldKind::Genre => &mut self.genre,
            FieldKind::Bpm => &mut self.bpm,
            FieldKind::Key => &mut self.key,
        };
        *slot = value;
    }

    /// Check whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        use strum::IntoEnumIterator;
        FieldKind::iter().all(|kind| self.get(kind).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_trims_and_filters_empty() {
        let mut fields = TrackFields::new();
        fields.artist = Some("  Daft Punk  ".to_string());
        fields.title = Some("   ".to_string());

        assert_eq!(fields.get(FieldKind::Artist), Some("Daft Punk"));
        assert_eq!(fields.get(FieldKind::Title), None);
    }

    #[test]
    fn test_set_clears_on_blank() {
        let mut fields = TrackFields::new();
        fields.set(FieldKind::Bpm, "128");
        assert_eq!(fields.get(FieldKind::Bpm), Some("128"));

        fields.set(FieldKind::Bpm, "  ");
        assert_eq!(fields.get(FieldKind::Bpm), None);
    }

    #[test]
    fn test_is_empty() {
        let mut fields = TrackFields::new();
        assert!(fields.is_empty());

        fields.set(FieldKind::Key, "Am");
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_field_kind_display() {
        assert_eq!(FieldKind::TrackNumber.to_string(), "track_number");
        assert_eq!(FieldKind::Bpm.to_string(), "bpm");
    }
}
