//! Photo Entries
//!
//! Photos are owned by the host. The core only reads them by reference and
//! identifies them by [`PhotoId`], never by their source reference: two
//! entries may point at the same file and still be distinct participants.

use serde::{Deserialize, Serialize};

/// Photo identifier, assigned once at ingestion
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhotoId(pub String);

impl PhotoId {
    /// Create a photo ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique photo ID
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        Self(format!("photo_{timestamp}_{count}"))
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant photo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// Stable identity
    pub id: PhotoId,
    /// URI, path, or blob handle understood by the host renderer
    pub source_ref: String,
    /// Name shown under the photo (usually the original file name)
    pub display_name: String,
}

impl PhotoEntry {
    /// Create an entry with an explicit id
    pub fn new(
        id: PhotoId,
        source_ref: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_ref: source_ref.into(),
            display_name: display_name.into(),
        }
    }

    /// Create an entry with a freshly generated id
    pub fn ingest(source_ref: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(PhotoId::generate(), source_ref, display_name)
    }

    /// Display name without its file extension ("anna.jpg" -> "anna")
    #[must_use]
    pub fn label(&self) -> &str {
        strip_extension(&self.display_name)
    }
}

/// Drop a trailing `.ext`. Unlike a bare `\.[^/.]+$` match, a dotfile keeps
/// its whole name instead of becoming empty, and a dot before a `/` or `\`
/// separator is never treated as an extension.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) if dot + 1 == name.len() => name,
        Some(dot) if name[dot + 1..].contains(['/', '\\']) => name,
        Some(dot) => &name[..dot],
    }
}
