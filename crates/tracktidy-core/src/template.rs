//! Filename template rendering and sanitization.

use crate::fields::{FieldKind, TrackFields};

/// Maximum filename length (without extension) after sanitization.
const MAX_STEM_LEN: usize = 200;

/// Fallback stem used when a template renders to nothing printable.
const FALLBACK_STEM: &str = "untitled";

/// Render a naming template against a set of resolved fields.
///
/// Placeholders use `{field}` syntax, one per [`FieldKind`]
/// (`{artist}`, `{title}`, `{album}`, `{year}`, `{track_number}`,
/// `{genre}`, `{bpm}`, `{key}`). Unknown placeholders and absent fields
/// render as empty; literal text passes through unchanged. An unclosed
/// brace is kept literally.
pub fn render_template(fields: &TrackFields, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        match template[i + 1..].find('}') {
            Some(end) => {
                let name = &template[i + 1..i + 1 + end];
                if let Some(value) = lookup_placeholder(fields, name) {
                    out.push_str(value);
                }
                // Skip past the placeholder body and closing brace.
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
            }
            None => {
                out.push(c);
            }
        }
    }

    out
}

/// Resolve a placeholder name to its field value, if any.
fn lookup_placeholder<'a>(fields: &'a TrackFields, name: &str) -> Option<&'a str> {
    let kind = match name {
        "artist" => FieldKind::Artist,
        "title" => FieldKind::Title,
        "album" => FieldKind::Album,
        "year" => FieldKind::Year,
        "track_number" => FieldKind::TrackNumber,
        "genre" => FieldKind::Genre,
        "bpm" => FieldKind::Bpm,
        "key" => FieldKind::Key,
        _ => return None,
    };
    fields.get(kind)
}

/// Sanitize a rendered name into a legal cross-platform filename stem.
///
/// Unlike a validator, this always produces a usable name: illegal
/// characters are replaced, problematic edges trimmed, whitespace
/// collapsed, and an empty result falls back to `"untitled"`.
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());

    for c in name.chars() {
        match c {
            // Path separators and NUL are never legal in a file name.
            '/' | '\\' | '\0' => cleaned.push('_'),
            // Reserved on Windows; replaced everywhere for portability.
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => cleaned.push('_'),
            c if c.is_control() => cleaned.push(' '),
            c => cleaned.push(c),
        }
    }

    // Collapse runs of whitespace left behind by empty placeholders.
    let collapsed: String = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // Leading/trailing dots and spaces are problematic on Windows.
    let trimmed = collapsed.trim_matches(|c| c == ' ' || c == '.');

    let mut stem: String = trimmed.chars().take(MAX_STEM_LEN).collect();
    let stem_trimmed = stem.trim_end().to_string();
    stem = stem_trimmed;

    if stem.is_empty() || is_reserved_name(&stem) {
        return FALLBACK_STEM.to_string();
    }

    stem
}

/// Check for Windows-reserved device names.
fn is_reserved_name(stem: &str) -> bool {
    const RESERVED: [&str; 22] = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let upper = stem.to_uppercase();
    let base = upper.split('.').next().unwrap_or("");
    RESERVED.contains(&base)
}
