//! Recursive asset resolution to a fixed point.
//!
//! The resolver drains a discovery queue seeded with every manifest entry
//! that has no content yet. Fetched stylesheets are re-scanned for embedded
//! references (`url(...)`, `@import`), which can register further manifest
//! entries; those are pushed onto the same queue. An explicit worklist with
//! a `processed` guard set, rather than recursive calls, keeps the
//! termination condition visible: `processed` only grows, the reachable URL
//! set of a finite document graph is finite, so the queue empties.
//!
//! Fetch failures are logged and leave the record without content; the
//! mirror still ships, with that one reference dangling. Only the queue
//! discipline here is about correctness; everything else is degradation
//! policy.

use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use url::Url;

use crate::asset_map::{AssetKind, Manifest};
use crate::config::MirrorConfig;
use crate::crawl_engine::{fetch_with_retry, CancelFlag};
use crate::page_rewriter::{cleanup, css};

/// Counters reported after a resolver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Assets fetched and attached to the manifest.
    pub fetched: usize,
    /// Assets whose fetch failed after retries.
    pub failed: usize,
    /// URLs first discovered inside fetched stylesheets.
    pub discovered: usize,
}

/// Drain the discovery queue until no new references appear.
pub async fn resolve_assets(
    client: &Client,
    config: &MirrorConfig,
    manifest: &mut Manifest,
    cancel: &CancelFlag,
) -> ResolveStats {
    let mut queue: VecDeque<String> = manifest.unfetched_urls().into();
    let mut processed: HashSet<String> = HashSet::new();
    let mut stats = ResolveStats::default();

    while let Some(source_url) = queue.pop_front() {
        if cancel.is_cancelled() {
            log::info!("asset resolution cancelled with {} URL(s) pending", queue.len() + 1);
            break;
        }
        if !processed.insert(source_url.clone()) {
            continue;
        }

        let fetched = fetch_with_retry(
            client,
            &source_url,
            config.retry_policy(),
            config.max_asset_bytes(),
        )
        .await;

        let body = match fetched {
            Ok(body) => body,
            Err(err) => {
                log::warn!("skipping asset {source_url}: {err}");
                stats.failed += 1;
                continue;
            }
        };

        let bytes = process_fetched_asset(
            &source_url,
            body.bytes,
            body.content_type.as_deref(),
            config,
            manifest,
            &mut queue,
            &mut stats,
        );

        manifest.attach_content(&source_url, bytes);
        stats.fetched += 1;
        log::debug!("resolved asset {source_url}");

        if !queue.is_empty() {
            tokio::time::sleep(config.fetch_delay()).await;
        }
    }

    log::info!(
        "asset resolution finished: {} fetched, {} failed, {} discovered in stylesheets",
        stats.fetched,
        stats.failed,
        stats.discovered
    );
    stats
}

/// Post-fetch processing for one asset: stylesheet re-scanning (which feeds
/// the queue) and optional minification. Returns the bytes to store.
fn process_fetched_asset(
    source_url: &str,
    bytes: Vec<u8>,
    content_type: Option<&str>,
    config: &MirrorConfig,
    manifest: &mut Manifest,
    queue: &mut VecDeque<String>,
    stats: &mut ResolveStats,
) -> Vec<u8> {
    let kind = manifest.get(source_url).map(|r| r.kind);

    if is_stylesheet(kind, content_type) {
        // Stylesheet text gets the CSS-mode extractor pass with its own URL
        // as the resolution base; anything it registers joins the queue.
        let (text, parsed_url) = match (String::from_utf8(bytes), Url::parse(source_url)) {
            (Ok(text), Ok(url)) => (text, url),
            (Err(e), _) => {
                log::warn!("stylesheet {source_url} is not valid UTF-8, storing verbatim: {e}");
                return e.into_bytes();
            }
            (Ok(text), Err(e)) => {
                log::warn!("stored stylesheet URL {source_url} failed to re-parse: {e}");
                return text.into_bytes();
            }
        };

        let rewrite = css::rewrite_stylesheet(&text, &parsed_url, manifest);
        stats.discovered += rewrite.discovered.len();
        queue.extend(rewrite.discovered);

        let text = if config.minify_css() {
            cleanup::minify_css(&rewrite.text)
        } else {
            rewrite.text
        };
        return text.into_bytes();
    }

    if kind == Some(AssetKind::Js) && config.minify_js() {
        if let Ok(text) = String::from_utf8(bytes.clone()) {
            return cleanup::minify_js(&text).into_bytes();
        }
    }

    bytes
}

/// A record registered as CSS, or a response declaring `text/css`, gets the
/// stylesheet treatment.
fn is_stylesheet(kind: Option<AssetKind>, content_type: Option<&str>) -> bool {
    kind == Some(AssetKind::Css)
        || content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/css"))
}
