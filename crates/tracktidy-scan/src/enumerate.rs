//! JWalk-based media file enumeration.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use tracktidy_core::RenameError;

/// File extensions treated as audio, compared case-insensitively.
pub const AUDIO_EXTENSIONS: [&str; 11] = [
    "mp3", "flac", "ogg", "opus", "m4a", "aac", "wav", "aiff", "wma", "wv", "ape",
];

/// Check whether a path carries a recognized audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Enumerate the audio files a job will process.
///
/// Walks `root` in parallel (one level deep unless `recursive`), skipping
/// hidden entries. Unreadable entries are logged and skipped rather than
/// aborting the walk. The result is sorted so dispatch order is stable
/// across runs.
pub fn enumerate_media(
    root: impl AsRef<Path>,
    recursive: bool,
) -> Result<Vec<PathBuf>, RenameError> {
    let root = root.as_ref();
    let root = root.canonicalize().map_err(|e| RenameError::io(root, e))?;

    if !root.is_dir() {
        return Err(RenameError::NotADirectory { path: root });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(&root)
        .skip_hidden(true)
        .follow_links(false)
        .min_depth(1)
        .max_depth(max_depth);

    let mut files = Vec::new();
    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_audio_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
