//! Path guard.
//!
//! # Algorithm
//! ```text
//! raw filename
//!     → reject empty / over-long / NUL
//!     → reject percent-encoded dot or separator sequences
//!     → reject absolute overrides (root, prefix components)
//!     → lexical walk: `..` may never climb above the root
//!     → root.join(raw).canonicalize()   (resolves symlinks)
//!     → canonical must equal root or descend from it (component-wise)
//!     → SafePath(canonical)
//! ```
//!
//! Containment uses `Path::starts_with`, which compares whole components,
//! so `/data/docsx` never passes for root `/data/docs`.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::guard::rejection::{GuardResult, Rejection, RejectionReason};

/// Canonical, absolute directory that file access is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot(PathBuf);

impl StorageRoot {
    /// Create the directory if needed and canonicalize it.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let canonical = path.canonicalize()?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("storage root {:?} is not a directory", canonical),
            ));
        }
        Ok(Self(canonical))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// A canonical path proven to live inside the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath(PathBuf);

impl SafePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Final component, suitable for a Content-Disposition filename.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|n| n.to_str())
    }
}

const ENCODED_SEQUENCES: [&str; 3] = ["%2e", "%2f", "%5c"];

/// Validate a client-supplied relative path against `root`.
pub fn check(raw: &str, root: &StorageRoot, max_len: usize) -> GuardResult<SafePath> {
    if raw.is_empty() {
        return Err(Rejection::malformed("empty path"));
    }
    if raw.len() > max_len {
        return Err(Rejection::malformed(format!(
            "path length {} exceeds {}",
            raw.len(),
            max_len
        )));
    }
    if raw.contains('\0') {
        return Err(Rejection::malformed("path contains NUL"));
    }

    let lowered = raw.to_ascii_lowercase();
    if ENCODED_SEQUENCES.iter().any(|seq| lowered.contains(seq)) {
        return Err(traversal(raw, "percent-encoded traversal sequence"));
    }

    let relative = Path::new(raw);
    let mut depth: usize = 0;
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(traversal(raw, "absolute path override"));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| traversal(raw, "parent reference above root"))?;
            }
            Component::Normal(_) => depth += 1,
        }
    }

    let joined = root.as_path().join(relative);
    let canonical = joined.canonicalize().map_err(|e| {
        Rejection::new(
            RejectionReason::NotFound,
            format!("canonicalize failed: {}", e.kind()),
        )
    })?;

    // Symlinks inside the root may still point outside it.
    if !canonical.starts_with(root.as_path()) {
        return Err(traversal(raw, "canonical path escapes root"));
    }

    Ok(SafePath(canonical))
}

fn traversal(raw: &str, why: &str) -> Rejection {
    Rejection::new(
        RejectionReason::TraversalDetected,
        format!("{} ({} bytes)", why, raw.len()),
    )
}
