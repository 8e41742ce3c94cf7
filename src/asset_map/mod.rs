//! Asset manifest: the canonical record of every discovered asset.
//!
//! The manifest maps each discovered absolute URL (query and fragment
//! stripped) to the local path it was assigned and, once fetched, the bytes
//! that will be written there. It is owned by a single pipeline run and
//! passed by reference into the components that populate it: the reference
//! extractor registers entries, the recursive resolver attaches content, and
//! the output writer reads a serializable snapshot.

pub mod path_mapper;

pub use path_mapper::{map_asset_url, ASSETS_ROOT};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Broad classification of a discovered asset, used for reporting and for
/// deciding which fetched bodies get re-scanned for nested references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Js,
    Image,
    Font,
    Other,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Css => write!(f, "css"),
            AssetKind::Js => write!(f, "js"),
            AssetKind::Image => write!(f, "image"),
            AssetKind::Font => write!(f, "font"),
            AssetKind::Other => write!(f, "other"),
        }
    }
}

impl AssetKind {
    /// Classify a URL by its path extension. Returns `None` when the
    /// extension is missing or unrecognized.
    pub fn from_url_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('/').next()?.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(AssetKind::Css),
            "js" | "mjs" => Some(AssetKind::Js),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif" | "bmp" => {
                Some(AssetKind::Image)
            }
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Some(AssetKind::Font),
            _ => None,
        }
    }
}

/// One discovered asset: where it came from, where it will live locally, and
/// (after the resolver has run) what bytes go there.
///
/// `local_path` is computed exactly once, when the record is created; the
/// record is mutated only to attach fetched content.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub source_url: String,
    pub local_path: String,
    pub kind: AssetKind,
    pub content: Option<Vec<u8>>,
}

/// Mapping from discovered absolute URL to its [`AssetRecord`].
///
/// Keys are unique; registering a URL twice returns the already-assigned
/// local path without recomputing it.
#[derive(Debug, Default)]
pub struct Manifest {
    records: HashMap<String, AssetRecord>,
}

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, source_url: &str) -> bool {
        self.records.contains_key(source_url)
    }

    #[must_use]
    pub fn get(&self, source_url: &str) -> Option<&AssetRecord> {
        self.records.get(source_url)
    }

    /// Register a discovered URL, assigning its local path on first sight.
    ///
    /// Returns the local path for the URL. The first registration wins: the
    /// stored kind and path never change afterwards, which is what makes the
    /// URL → path mapping stable for the whole run.
    pub fn register(&mut self, source_url: &str, kind: AssetKind) -> String {
        if let Some(existing) = self.records.get(source_url) {
            return existing.local_path.clone();
        }

        let local_path = map_asset_url(source_url);
        self.records.insert(
            source_url.to_string(),
            AssetRecord {
                source_url: source_url.to_string(),
                local_path: local_path.clone(),
                kind,
                content: None,
            },
        );
        local_path
    }

    /// Attach fetched bytes to an existing record.
    ///
    /// Registering happens at discovery time, so a miss here means the caller
    /// is holding a URL that never went through `register`. Log and drop
    /// rather than invent a record with no assigned path.
    pub fn attach_content(&mut self, source_url: &str, content: Vec<u8>) {
        match self.records.get_mut(source_url) {
            Some(record) => record.content = Some(content),
            None => log::warn!("attach_content for unregistered URL: {source_url}"),
        }
    }

    /// URLs that have been discovered but not yet fetched. This seeds the
    /// resolver's discovery queue.
    #[must_use]
    pub fn unfetched_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .records
            .values()
            .filter(|r| r.content.is_none())
            .map(|r| r.source_url.clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Content-free snapshot for persistence as `manifest.json`.
    #[must_use]
    pub fn snapshot(&self) -> ManifestSnapshot {
        let mut entries: Vec<ManifestEntry> = self
            .records
            .values()
            .map(|r| ManifestEntry {
                source_url: r.source_url.clone(),
                local_path: r.local_path.clone(),
                kind: r.kind,
                fetched: r.content.is_some(),
                size_bytes: r.content.as_ref().map_or(0, |c| c.len() as u64),
            })
            .collect();
        entries.sort_by(|a, b| a.source_url.cmp(&b.source_url));
        ManifestSnapshot {
            generated_at: Utc::now(),
            entries,
        }
    }
}

/// Serializable view of the manifest, minus asset bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source_url: String,
    pub local_path: String,
    pub kind: AssetKind,
    pub fetched: bool,
    pub size_bytes: u64,
}
