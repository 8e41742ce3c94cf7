//! Same-origin breadth-first page crawler.
//!
//! Drains the frontier one URL at a time: fetch the page, record it, scan it
//! for in-page links, enqueue the same-origin ones. Fetch failures after the
//! seed are logged and skipped; the affected page is simply absent from the
//! output set. A politeness delay separates consecutive fetches.

use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::crawl_types::{CancelFlag, MirrorError, MirrorResult, PageRecord};
use super::fetcher::fetch_with_retry;
use super::frontier::Frontier;
use crate::config::MirrorConfig;

lazy_static! {
    static ref ANCHOR_SELECTOR: Selector =
        Selector::parse("a[href]").expect("BUG: hardcoded selector 'a[href]' is invalid");
}

/// Crawl all reachable same-origin pages starting from the configured base
/// URL, returning one immutable [`PageRecord`] per fetched page.
///
/// The only fatal failure is the seed page itself; everything after that
/// degrades per-URL. Cancellation stops the drain and returns the pages
/// collected so far.
pub async fn crawl_pages(
    client: &Client,
    config: &MirrorConfig,
    cancel: &CancelFlag,
) -> MirrorResult<Vec<PageRecord>> {
    let mut frontier = Frontier::new(config.start_url());
    let mut pages: Vec<PageRecord> = Vec::new();
    let mut seed_pending = true;

    while let Some(url) = frontier.pop() {
        if cancel.is_cancelled() {
            log::info!("crawl cancelled after {} page(s)", pages.len());
            break;
        }
        if frontier.is_visited(&url) {
            continue;
        }

        let fetched = fetch_with_retry(
            client,
            url.as_str(),
            config.retry_policy(),
            config.max_page_bytes(),
        )
        .await;

        let body = match fetched {
            Ok(body) => body,
            Err(err) => {
                if seed_pending {
                    return Err(MirrorError::SeedUnreachable {
                        url: url.to_string(),
                        reason: err.to_string(),
                    });
                }
                log::warn!("skipping page {url}: {err}");
                continue;
            }
        };
        seed_pending = false;

        let html = String::from_utf8_lossy(&body.bytes).into_owned();
        frontier.mark_visited(&url);
        log::info!("fetched page {url} ({} bytes)", html.len());

        for link in extract_page_links(&html, &url) {
            if frontier.enqueue(link.clone()) {
                log::debug!("queued page {link}");
            }
        }

        pages.push(PageRecord { url, html });

        if let Some(limit) = config.page_limit() {
            if pages.len() >= limit {
                log::info!("page limit of {limit} reached; stopping crawl");
                break;
            }
        }

        if !frontier.is_drained() {
            tokio::time::sleep(config.fetch_delay()).await;
        }
    }

    log::info!(
        "crawl finished: {} page(s), {} visited",
        pages.len(),
        frontier.visited_count()
    );
    Ok(pages)
}

/// Extract absolute in-page link targets from `a[href]` elements.
///
/// Read-only scan; relative references are resolved against the page's own
/// URL, and non-HTTP schemes, fragments, and empty hrefs are dropped here so
/// the frontier only ever sees candidate page URLs.
pub fn extract_page_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        match page_url.join(href) {
            Ok(resolved) if matches!(resolved.scheme(), "http" | "https") => links.push(resolved),
            Ok(_) => {}
            Err(e) => log::debug!("unresolvable href '{href}' on {page_url}: {e}"),
        }
    }

    links
}
