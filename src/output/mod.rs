//! Materializing a mirror outcome onto a filesystem.
//!
//! This is the boundary the deployment collaborator consumes: rewritten
//! pages at the output root, asset bytes at their manifest-assigned local
//! paths, and a `manifest.json` snapshot describing what was (and wasn't)
//! fetched. The snapshot write is atomic (temp file, sync, rename) so a
//! crash mid-write never leaves a torn manifest behind.

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::asset_map::ManifestSnapshot;
use crate::crawl_engine::{MirrorError, MirrorOutcome, MirrorResult};

const MANIFEST_FILENAME: &str = "manifest.json";

/// Derive the output filename for a page URL.
///
/// The site root becomes `index.html`; any other page takes its last
/// non-empty path segment with an `.html` suffix (not doubled when the
/// segment already ends in `.html`/`.htm`).
#[must_use]
pub fn page_file_name(url: &Url) -> String {
    let last_segment = url
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back();

    match last_segment {
        None => "index.html".to_string(),
        Some(segment) => {
            let cleaned = sanitize_filename::sanitize(segment);
            let stem = cleaned
                .strip_suffix(".html")
                .or_else(|| cleaned.strip_suffix(".htm"))
                .unwrap_or(&cleaned);
            if stem.is_empty() {
                "index.html".to_string()
            } else {
                format!("{stem}.html")
            }
        }
    }
}

/// Write pages, fetched assets, and the manifest snapshot under
/// `output_dir`.
///
/// Manifest entries without content (failed fetches) are skipped; their
/// references in the pages will 404 in the mirror, which is the accepted
/// degraded behavior rather than an abort condition.
pub async fn write_mirror(outcome: &MirrorOutcome, output_dir: &Path) -> MirrorResult<()> {
    fs::create_dir_all(output_dir).await?;

    for page in &outcome.pages {
        let path = output_dir.join(&page.file_name);
        fs::write(&path, page.html.as_bytes()).await?;
        log::info!("wrote page {} -> {}", page.url, path.display());
    }

    let mut skipped = 0usize;
    for record in outcome.manifest.records() {
        let Some(content) = &record.content else {
            skipped += 1;
            continue;
        };
        let path = output_dir.join(&record.local_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
    }
    if skipped > 0 {
        log::warn!("{skipped} asset(s) had no fetched content and were not written");
    }

    write_manifest_snapshot(&outcome.manifest.snapshot(), output_dir).await?;
    Ok(())
}

/// Persist the manifest snapshot atomically: write to a temp file, sync,
/// then rename over the final name.
pub async fn write_manifest_snapshot(
    snapshot: &ManifestSnapshot,
    output_dir: &Path,
) -> MirrorResult<()> {
    let manifest_path = output_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| MirrorError::Io(std::io::Error::other(e)))?;

    let temp_path = manifest_path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(json.as_bytes()).await?;
    file.sync_all().await?;
    fs::rename(&temp_path, &manifest_path).await?;

    log::debug!("wrote manifest snapshot to {}", manifest_path.display());
    Ok(())
}
