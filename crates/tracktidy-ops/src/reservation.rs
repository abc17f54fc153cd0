//! Collision-safe destination name allocation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

/// Suffix attempts before falling back to a timestamp name. Unbounded
/// real-world collisions are not realistic; the cap only guards against
/// pathological inputs and does not change normal behavior.
const MAX_ATTEMPTS: usize = 10_000;

/// Allocates destination filenames that are unique per directory, even
/// under many concurrent callers.
///
/// One ledger exists per directory, created lazily and keyed by the
/// canonicalized directory path; callers for different directories never
/// contend on the same lock. A name counts as taken when it exists on
/// disk *or* has been claimed by an earlier reservation in this book —
/// an in-flight worker's target may not exist on disk yet.
///
/// Created per job and discarded with it; nothing is shared across jobs.
#[derive(Debug, Default)]
pub struct ReservationBook {
    directories: DashMap<PathBuf, Arc<Mutex<HashSet<String>>>>,
}

impl ReservationBook {
    /// Create an empty reservation book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a free filename for `stem` (plus `extension`) in `dir`.
    ///
    /// Tries `stem.ext`, then `stem (2).ext`, `stem (3).ext`, … and
    /// returns the first name neither present on disk nor already
    /// claimed. Concurrent calls for the same directory always receive
    /// distinct paths.
    pub fn reserve_unique(&self, dir: &Path, stem: &str, extension: Option<&str>) -> PathBuf {
        let ledger = self.ledger(dir);
        let mut claimed = ledger.lock().unwrap_or_else(|e| e.into_inner());

        for attempt in 1..=MAX_ATTEMPTS {
            let name = candidate_name(stem, extension, attempt);
            let path = dir.join(&name);
            if !claimed.contains(&name) && !path.exists() {
                claimed.insert(name);
                return path;
            }
        }

        // Pathological collision space; a timestamp name is effectively
        // unique and keeps the allocator total.
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let name = match extension {
            Some(ext) => format!("{stem}_{timestamp}.{ext}"),
            None => format!("{stem}_{timestamp}"),
        };
        claimed.insert(name.clone());
        dir.join(name)
    }

    /// Whether a full path has been claimed in this book.
    pub fn is_claimed(&self, path: &Path) -> bool {
        let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
        else {
            return false;
        };
        self.directories
            .get(&canonical_dir(dir))
            .map(|ledger| {
                ledger
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .contains(name)
            })
            .unwrap_or(false)
    }

    /// Number of names claimed so far in a directory.
    pub fn claimed_count(&self, dir: &Path) -> usize {
        let key = canonical_dir(dir);
        self.directories
            .get(&key)
            .map(|ledger| {
                ledger
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .len()
            })
            .unwrap_or(0)
    }

    /// Get or lazily create the claim ledger for a directory.
    fn ledger(&self, dir: &Path) -> Arc<Mutex<HashSet<String>>> {
        let key = canonical_dir(dir);
        self.directories.entry(key).or_default().clone()
    }
}

/// Canonicalize where possible so spellings of the same directory share
/// one lock.
fn canonical_dir(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

/// Build the nth candidate name: attempt 1 is plain, later attempts get
/// a ` (n)` suffix.
fn candidate_name(stem: &str, extension: Option<&str>, attempt: usize) -> String {
    match (attempt, extension) {
        (1, Some(ext)) => format!("{stem}.{ext}"),
        (1, None) => stem.to_string(),
        (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
        (n, None) => format!("{stem} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_first_reservation_is_plain() {
        let temp = TempDir::new().unwrap();
        let book = ReservationBook::new();

        let path = book.reserve_unique(temp.path(), "song", Some("mp3"));
        assert_eq!(path.file_name().unwrap(), "song.mp3");
        assert!(book.is_claimed(&path));
        assert!(!book.is_claimed(&temp.path().join("other.mp3")));
    }

    #[test]
    fn test_sequential_reservations_distinct() {
        let temp = TempDir::new().unwrap();
        let book = ReservationBook::new();

        let first = book.reserve_unique(temp.path(), "song", Some("mp3"));
        let second = book.reserve_unique(temp.path(), "song", Some("mp3"));
        let third = book.reserve_unique(temp.path(), "song", Some("mp3"));

        assert_eq!(first.file_name().unwrap(), "song.mp3");
        assert_eq!(second.file_name().unwrap(), "song (2).mp3");
        assert_eq!(third.file_name().unwrap(), "song (3).mp3");
    }

    #[test]
    fn test_existing_file_on_disk_blocks_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("song.mp3"), "x").unwrap();

        let book = ReservationBook::new();
        let path = book.reserve_unique(temp.path(), "song", Some("mp3"));
        assert_eq!(path.file_name().unwrap(), "song (2).mp3");
    }

    #[test]
    fn test_no_extension() {
        let temp = TempDir::new().unwrap();
        let book = ReservationBook::new();

        let first = book.reserve_unique(temp.path(), "notes", None);
        let second = book.reserve_unique(temp.path(), "notes", None);
        assert_eq!(first.file_name().unwrap(), "notes");
        assert_eq!(second.file_name().unwrap(), "notes (2)");
    }

    #[test]
    fn test_directories_are_independent() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let book = ReservationBook::new();

        let a = book.reserve_unique(temp_a.path(), "song", Some("mp3"));
        let b = book.reserve_unique(temp_b.path(), "song", Some("mp3"));

        assert_eq!(a.file_name().unwrap(), "song.mp3");
        assert_eq!(b.file_name().unwrap(), "song.mp3");
        assert_eq!(book.claimed_count(temp_a.path()), 1);
        assert_eq!(book.claimed_count(temp_b.path()), 1);
    }

    #[test]
    fn test_concurrent_reservations_pairwise_distinct() {
        let temp = TempDir::new().unwrap();
        let book = Arc::new(ReservationBook::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let book = Arc::clone(&book);
                let dir = temp.path().to_path_buf();
                std::thread::spawn(move || book.reserve_unique(&dir, "x", Some("mp3")))
            })
            .collect();

        let mut paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let before = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), before);
        assert_eq!(book.claimed_count(temp.path()), 16);
    }
}
