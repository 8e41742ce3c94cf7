//! Deterministic mapping from absolute asset URLs to local mirror paths.
//!
//! Every discovered asset is stored under `assets/<host>/<path>` so the
//! mirrored tree keeps the origin's layout readable. The mapping is a pure
//! function of the URL string: the same URL always yields the same path, and
//! no input, however hostile, can produce a path that escapes the
//! `assets/` root. URLs that cannot be mapped structurally (no hostname,
//! dot-segments that climb out of the root) degrade to a hashed fallback
//! path instead of an error.

use url::Url;
use xxhash_rust::xxh3::xxh3_64;

/// Root directory for all mapped assets, relative to the mirror root.
pub const ASSETS_ROOT: &str = "assets";

/// Map an absolute URL to a safe relative path under `assets/`.
///
/// Query string and fragment are ignored: they belong to the rendered
/// reference, never to the stored file path. Callers that need to reattach
/// them must do so on the attribute value they emit.
///
/// This function never fails. Unparseable or hostless URLs map into
/// `assets/no-hostname/`, and any path whose normalization would escape the
/// assets root maps into `assets/fallback/`.
pub fn map_asset_url(raw_url: &str) -> String {
    let parsed = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(_) => return hashed_fallback("no-hostname", raw_url),
    };

    let Some(host) = parsed.host_str() else {
        return hashed_fallback("no-hostname", raw_url);
    };

    // parsed.path() already excludes query and fragment.
    let (segments, escaped) = normalize_segments(parsed.path());
    if escaped {
        return hashed_fallback("fallback", raw_url);
    }

    let mut path = format!("{ASSETS_ROOT}/{}", sanitize_segment(host));
    for segment in &segments {
        path.push('/');
        path.push_str(segment);
    }
    if segments.is_empty() || parsed.path().ends_with('/') {
        path.push_str("/index.html");
    }

    // Belt-and-braces: normalization above already rejects traversal, but the
    // output contract is that nothing outside assets/ is ever returned.
    if !path.starts_with(&format!("{ASSETS_ROOT}/")) || path.split('/').any(|s| s == "..") {
        return hashed_fallback("fallback", raw_url);
    }

    path
}

/// Resolve `.` and `..` segments without touching the filesystem.
///
/// Returns the cleaned segments plus a flag set when a `..` tries to climb
/// above the path root; the caller must divert those URLs to the fallback
/// scheme rather than let them address anything outside the assets tree.
fn normalize_segments(path: &str) -> (Vec<String>, bool) {
    let mut stack: Vec<String> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return (stack, true);
                }
            }
            other => stack.push(sanitize_segment(other)),
        }
    }

    (stack, false)
}

/// Make a single path segment safe for the local filesystem.
fn sanitize_segment(segment: &str) -> String {
    let cleaned = sanitize_filename::sanitize(segment);
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Deterministic fallback path: `assets/<bucket>/<xxh3-of-url><ext>`.
///
/// The hash keys on the full original URL so distinct unmappable URLs still
/// get distinct files; the original extension is kept when it looks like one
/// so content types survive the detour.
fn hashed_fallback(bucket: &str, raw_url: &str) -> String {
    let hash = xxh3_64(raw_url.as_bytes());
    let ext = original_extension(raw_url);
    format!("{ASSETS_ROOT}/{bucket}/{hash:016x}{ext}")
}

/// Extract a plausible file extension (with leading dot) from a raw URL.
fn original_extension(raw_url: &str) -> String {
    let path_part = raw_url
        .split(['?', '#'])
        .next()
        .unwrap_or(raw_url);
    let last_segment = path_part.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}
