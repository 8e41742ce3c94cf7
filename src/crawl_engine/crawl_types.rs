//! Core types for the mirror pipeline.
//!
//! This module contains the fundamental types shared across the crawl,
//! rewrite, and resolve phases: page records, the pipeline error type, the
//! final outcome handed to deployment, and the cancellation handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::asset_map::Manifest;

/// A successfully fetched page, immutable once created.
///
/// One record exists per distinct page URL; the frontier guarantees no
/// duplicates.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub url: Url,
    pub html: String,
}

/// A page after reference extraction, form rewriting, and cleanup, tagged
/// with the output filename it should be written to.
#[derive(Debug, Clone)]
pub struct RewrittenPage {
    pub url: Url,
    pub file_name: String,
    pub html: String,
}

/// Everything a deployment collaborator needs: the rewritten pages and the
/// manifest of locally-mapped assets (with fetched bytes attached where the
/// fetch succeeded).
#[derive(Debug)]
pub struct MirrorOutcome {
    pub pages: Vec<RewrittenPage>,
    pub manifest: Manifest,
}

/// Errors that abort a mirror run.
///
/// Per-URL fetch failures are deliberately absent: they degrade to skipped
/// pages or unfetched manifest entries and never abort the pipeline. The
/// only fetch that is fatal is the seed page itself.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("seed URL {url} could not be fetched: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for results in this crate.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Cheap cloneable cancellation handle.
///
/// Both drain loops (frontier and discovery queue) check this flag before
/// starting the next fetch; a cancelled run stops enqueuing work and returns
/// whatever it has produced so far as a valid partial outcome.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
