//! In-place rewriting of page documents.
//!
//! A page is parsed once, every asset-bearing reference is resolved,
//! registered in the manifest, and rewritten to its local path, then the
//! form and cleanup passes run over the same tree before a single
//! serialization. Tag dispatch is a static `(selector, attribute, kind)`
//! table; stylesheet text goes through the separate CSS-token scanner in
//! [`css`].
//!
//! No network I/O happens here: the extractor operates on already-fetched
//! text and mutates only the document tree and the manifest.

pub mod cleanup;
pub mod css;
pub mod forms;

use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use regex::Regex;
use url::Url;

use crate::asset_map::{AssetKind, Manifest};
use crate::crawl_engine::{PageRecord, RewrittenPage};
use crate::output::page_file_name;

/// Which attribute carries the asset reference for each tag of interest,
/// and the kind hint recorded on first discovery. `link[rel=stylesheet]`
/// needs the attribute-value filter, so selectors are full CSS selectors.
const ASSET_SELECTORS: &[(&str, &str, AssetKind)] = &[
    ("img[src]", "src", AssetKind::Image),
    ("source[src]", "src", AssetKind::Image),
    ("script[src]", "src", AssetKind::Js),
    ("link[rel=\"stylesheet\"][href]", "href", AssetKind::Css),
];

/// Per-page rewrite options, borrowed from the run configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRewriteOptions<'a> {
    pub form_handler_url: Option<&'a str>,
    pub vendor_strip_patterns: &'a [Regex],
}

/// Run the full per-page pass: reference extraction, vendor cleanup, form
/// rewriting. One parse, one serialize.
pub fn rewrite_page(
    page: &PageRecord,
    manifest: &mut Manifest,
    options: &PageRewriteOptions<'_>,
) -> RewrittenPage {
    let document = kuchiki::parse_html().one(page.html.as_str());

    // Cleanup first: an element that gets stripped must never register its
    // reference as an asset to mirror.
    cleanup::strip_vendor_elements(&document, options.vendor_strip_patterns);
    rewrite_asset_references(&document, &page.url, manifest);
    forms::rewrite_forms(&document, &page.url, options.form_handler_url);

    let html = serialize_document(&document).unwrap_or_else(|e| {
        // Serialization failing is close to unheard of; fall back to the
        // original text so the page is at least present in the mirror.
        log::error!("failed to serialize rewritten {}: {e}", page.url);
        page.html.clone()
    });

    RewrittenPage {
        url: page.url.clone(),
        file_name: page_file_name(&page.url),
        html,
    }
}

/// Rewrite every asset-bearing attribute in the document to its mapped
/// local path, registering newly seen URLs in the manifest.
///
/// Returns the number of attributes rewritten.
pub fn rewrite_asset_references(document: &NodeRef, page_url: &Url, manifest: &mut Manifest) -> usize {
    let mut rewritten = 0;

    for (selector, attribute, kind_hint) in ASSET_SELECTORS {
        let Ok(matches) = document.select(selector) else {
            log::error!("invalid asset selector '{selector}'");
            continue;
        };

        // Attribute mutation does not invalidate the iterator, so no
        // collect-before-edit is needed here (contrast with element removal).
        for element in matches {
            let original = {
                let attrs = element.attributes.borrow();
                attrs.get(*attribute).map(ToString::to_string)
            };
            let Some(original) = original else { continue };

            if let Some(rendered) = map_reference(&original, page_url, *kind_hint, manifest) {
                element
                    .attributes
                    .borrow_mut()
                    .insert(*attribute, rendered);
                rewritten += 1;
            }
        }
    }

    rewritten
}

/// Resolve one attribute value, register it, and produce the rendered
/// replacement (local path with the original query/fragment reattached).
///
/// `None` leaves the attribute untouched: `data:` URIs, non-HTTP schemes,
/// and unresolvable references are deliberately not rewritten.
fn map_reference(
    value: &str,
    base_url: &Url,
    kind_hint: AssetKind,
    manifest: &mut Manifest,
) -> Option<String> {
    let value = value.trim();
    if value.is_empty()
        || value.starts_with('#')
        || value.starts_with("data:")
        || value.starts_with("javascript:")
        || value.starts_with("mailto:")
    {
        return None;
    }

    let resolved = match base_url.join(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(_) => return None,
        Err(e) => {
            log::debug!("unresolvable reference '{value}' on {base_url}: {e}");
            return None;
        }
    };

    // The stored path keys on the query-free URL; the rendered attribute
    // keeps the query so cache-busting parameters survive in the page text.
    let mut stripped = resolved.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    let kind = refine_kind(kind_hint, stripped.path());
    let stripped_str = String::from(stripped);

    let mut rendered = manifest.register(&stripped_str, kind);
    if let Some(query) = resolved.query() {
        rendered.push('?');
        rendered.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        rendered.push('#');
        rendered.push_str(fragment);
    }
    Some(rendered)
}

/// The table hint wins for tags with a fixed meaning; extension
/// classification fills in for generic containers like `source[src]`.
fn refine_kind(hint: AssetKind, path: &str) -> AssetKind {
    match hint {
        AssetKind::Css | AssetKind::Js => hint,
        _ => AssetKind::from_url_path(path).unwrap_or(hint),
    }
}

fn serialize_document(document: &NodeRef) -> anyhow::Result<String> {
    let mut out = Vec::new();
    document.serialize(&mut out)?;
    Ok(String::from_utf8(out)?)
}
