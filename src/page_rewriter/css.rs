//! Reference extraction and rewriting for stylesheet text.
//!
//! Stylesheets carry their own references (`url(...)` tokens and string
//! `@import` forms) which must go through the same resolve/map/register
//! path as HTML attributes, with the stylesheet's own URL as the resolution
//! base. The scanner reports every URL it registered for the first time so
//! the resolver can keep draining toward the discovery fixed point.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use url::Url;

use crate::asset_map::{AssetKind, Manifest};

lazy_static! {
    // url( token ) with optional single/double quoting. The backreference-free
    // form: the quote group is reused verbatim when rebuilding the token.
    static ref CSS_URL_RE: Regex =
        Regex::new(r#"url\(\s*(?<q>['"]?)(?<target>[^'")]+)(['"]?)\s*\)"#)
            .expect("BUG: hardcoded url() pattern is invalid");

    // @import "x.css" / @import 'x.css' (the url() form is caught above).
    static ref CSS_IMPORT_RE: Regex =
        Regex::new(r#"@import\s+(?<q>['"])(?<target>[^'"]+)['"]"#)
            .expect("BUG: hardcoded @import pattern is invalid");
}

/// Result of a CSS-mode rewrite pass.
#[derive(Debug)]
pub struct CssRewrite {
    /// Stylesheet text with every mappable reference rewritten to its local
    /// path (query/fragment reattached to the rendered token).
    pub text: String,
    /// URLs registered in the manifest for the first time by this pass, in
    /// stripped (query/fragment-free) form; this is the resolver's enqueue list.
    pub discovered: Vec<String>,
}

/// Rewrite every `url(...)` and string `@import` reference in a stylesheet.
///
/// References that cannot be resolved, or that use non-HTTP schemes
/// (`data:` embeds in particular), are left untouched.
pub fn rewrite_stylesheet(css: &str, css_url: &Url, manifest: &mut Manifest) -> CssRewrite {
    let mut discovered = Vec::new();

    let pass_one = CSS_URL_RE.replace_all(css, |caps: &Captures<'_>| {
        let quote = &caps["q"];
        let target = caps["target"].trim();
        match map_css_reference(target, css_url, manifest, &mut discovered) {
            Some(rendered) => format!("url({quote}{rendered}{quote})"),
            None => caps[0].to_string(),
        }
    });

    let pass_two = CSS_IMPORT_RE.replace_all(&pass_one, |caps: &Captures<'_>| {
        let quote = &caps["q"];
        let target = caps["target"].trim();
        match map_css_reference(target, css_url, manifest, &mut discovered) {
            Some(rendered) => format!("@import {quote}{rendered}{quote}"),
            None => caps[0].to_string(),
        }
    });

    CssRewrite {
        text: pass_two.into_owned(),
        discovered,
    }
}

/// Resolve one CSS reference, register it, and return the rendered token
/// value. `None` means "leave the original reference alone".
fn map_css_reference(
    target: &str,
    css_url: &Url,
    manifest: &mut Manifest,
    discovered: &mut Vec<String>,
) -> Option<String> {
    if target.is_empty()
        || target.starts_with('#')
        || target.starts_with("data:")
        || target.starts_with("javascript:")
    {
        return None;
    }

    let resolved = match css_url.join(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(_) => return None,
        Err(e) => {
            log::debug!("unresolvable CSS reference '{target}' in {css_url}: {e}");
            return None;
        }
    };

    let mut stripped = resolved.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    let kind = AssetKind::from_url_path(stripped.path()).unwrap_or(AssetKind::Other);
    let stripped_str = String::from(stripped);

    let is_new = !manifest.contains(&stripped_str);
    let local_path = manifest.register(&stripped_str, kind);
    if is_new {
        discovered.push(stripped_str);
    }

    let mut rendered = local_path;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn css_url() -> Url {
        Url::parse("https://site.example/css/site.css").unwrap()
    }

    #[test]
    fn rewrites_relative_url_tokens() {
        let mut manifest = Manifest::new();
        let css = r#"body { background: url("../img/bg.png"); }"#;
        let result = rewrite_stylesheet(css, &css_url(), &mut manifest);

        assert!(result.text.contains(r#"url("assets/site.example/img/bg.png")"#));
        assert_eq!(result.discovered, vec!["https://site.example/img/bg.png"]);
        assert_eq!(
            manifest.get("https://site.example/img/bg.png").unwrap().kind,
            AssetKind::Image
        );
    }

    #[test]
    fn classifies_fonts_and_keeps_queries_in_the_token() {
        let mut manifest = Manifest::new();
        let css = "@font-face { src: url(fonts/brand.woff2?v=3) format('woff2'); }";
        let result = rewrite_stylesheet(css, &css_url(), &mut manifest);

        assert!(result
            .text
            .contains("url(assets/site.example/css/fonts/brand.woff2?v=3)"));
        // Stored key and file path carry no query.
        assert_eq!(
            result.discovered,
            vec!["https://site.example/css/fonts/brand.woff2"]
        );
        assert_eq!(
            manifest
                .get("https://site.example/css/fonts/brand.woff2")
                .unwrap()
                .kind,
            AssetKind::Font
        );
    }

    #[test]
    fn leaves_data_uris_untouched() {
        let mut manifest = Manifest::new();
        let css = "a { background: url(data:image/png;base64,AAAA); }";
        let result = rewrite_stylesheet(css, &css_url(), &mut manifest);
        assert_eq!(result.text, css);
        assert!(result.discovered.is_empty());
        assert!(manifest.is_empty());
    }

    #[test]
    fn rewrites_string_imports() {
        let mut manifest = Manifest::new();
        let css = r#"@import "reset.css";"#;
        let result = rewrite_stylesheet(css, &css_url(), &mut manifest);
        assert!(result.text.contains(r#"@import "assets/site.example/css/reset.css""#));
        assert_eq!(result.discovered, vec!["https://site.example/css/reset.css"]);
    }

    #[test]
    fn already_registered_urls_are_not_rediscovered() {
        let mut manifest = Manifest::new();
        manifest.register("https://site.example/img/bg.png", AssetKind::Image);
        let css = "body { background: url(/img/bg.png); }";
        let result = rewrite_stylesheet(css, &css_url(), &mut manifest);
        assert!(result.text.contains("url(assets/site.example/img/bg.png)"));
        assert!(result.discovered.is_empty());
    }
}
