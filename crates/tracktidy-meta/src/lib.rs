//! Multi-source metadata arbitration for tracktidy.
//!
//! A file's metadata can come from three independent sources: its own
//! tags, a remote fingerprint database, and local audio analysis. This
//! crate decides, per field, which proposal becomes the final value and
//! keeps a record of every disagreement along the way.
//!
//! # Example
//!
//! ```rust
//! use tracktidy_core::FieldKind;
//! use tracktidy_meta::{ConflictResolver, Source};
//!
//! let resolver = ConflictResolver::new();
//! let decision = resolver.resolve(
//!     FieldKind::Artist,
//!     Some("Unknown Artist"),
//!     Some("Boards of Canada"),
//!     None,
//!     0.93,
//! );
//!
//! assert_eq!(decision.value, "Boards of Canada");
//! assert_eq!(decision.source, Source::RemoteDatabase);
//! ```

mod key;
mod providers;
mod resolver;

pub use key::{CanonicalKey, keys_match, normalize_key};
pub use providers::{
    AnalysisReport, AudioAnalyzer, DisabledAnalyzer, DisabledRemote, LoftyTagReader,
    LookupStatus, RemoteLookup, RemoteMatch, TagReader,
};
pub use resolver::{
    ConflictResolver, FieldConflict, FieldDecision, ResolvedTrack, Source, is_placeholder,
};
