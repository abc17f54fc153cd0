//! Musical key normalization.
//!
//! Tag writers spell the same key many ways ("C#m", "Db minor", "c# min").
//! Arbitration compares keys by pitch class and mode so enharmonic
//! spellings never count as a disagreement.

use std::fmt;

/// A key reduced to pitch class and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    /// Semitones above C (0..=11).
    pub pitch_class: u8,
    /// Minor mode when true, major otherwise.
    pub minor: bool,
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sharp spellings as the canonical form.
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        let name = NAMES[self.pitch_class as usize % 12];
        if self.minor {
            write!(f, "{name}m")
        } else {
            write!(f, "{name}")
        }
    }
}

/// Parse a key string into its canonical form.
///
/// Accepts a note letter with optional sharps/flats (`#`, `♯`, `b`, `♭`)
/// followed by an optional mode (`m`, `min`, `minor`, `maj`, `major`,
/// any case, optionally space-separated). Returns `None` for anything
/// that does not look like a key.
pub fn normalize_key(raw: &str) -> Option<CanonicalKey> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();

    let letter = chars.next()?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut pitch = base;
    let rest: String = chars.collect();
    let mut idx = 0;
    for c in rest.chars() {
        match c {
            '#' | '♯' => pitch += 1,
            'b' | '♭' => pitch -= 1,
            _ => break,
        }
        idx += c.len_utf8();
    }

    let mode = rest[idx..].trim().to_ascii_lowercase();
    let minor = match mode.as_str() {
        "" | "maj" | "major" => false,
        "m" | "min" | "minor" => true,
        _ => return None,
    };

    Some(CanonicalKey {
        pitch_class: pitch.rem_euclid(12) as u8,
        minor,
    })
}

/// Compare two raw key strings by canonical form.
///
/// Unparseable keys only match themselves textually.
pub fn keys_match(a: &str, b: &str) -> bool {
    match (normalize_key(a), normalize_key(b)) {
        (Some(ka), Some(kb)) => ka == kb,
        _ => a.trim() == b.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enharmonic_sharps_and_flats() {
        assert_eq!(normalize_key("C#"), normalize_key("Db"));
        assert_eq!(normalize_key("F#m"), normalize_key("Gbm"));
        assert_eq!(normalize_key("A♯ minor"), normalize_key("Bb min"));
    }

    #[test]
    fn test_mode_spellings() {
        let m = normalize_key("Am").unwrap();
        assert!(m.minor);
        assert_eq!(normalize_key("A min"), Some(m));
        assert_eq!(normalize_key("a minor"), Some(m));
        assert!(!normalize_key("A major").unwrap().minor);
        assert!(!normalize_key("A").unwrap().minor);
    }

    #[test]
    fn test_mode_mismatch_not_equal() {
        assert_ne!(normalize_key("C#"), normalize_key("C#m"));
    }

    #[test]
    fn test_wraparound() {
        // Cb is B, B# is C.
        assert_eq!(normalize_key("Cb"), normalize_key("B"));
        assert_eq!(normalize_key("B#"), normalize_key("C"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_key("128"), None);
        assert_eq!(normalize_key(""), None);
        assert_eq!(normalize_key("H major"), None);
        assert_eq!(normalize_key("C dorian"), None);
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("C#m", "Dbm"));
        assert!(!keys_match("C#m", "C#"));
        assert!(keys_match(" weird ", "weird"));
        assert!(!keys_match("weird", "other"));
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(normalize_key("Db").unwrap().to_string(), "C#");
        assert_eq!(normalize_key("Bb minor").unwrap().to_string(), "A#m");
    }
}
