//! Optional page and asset cleanup.
//!
//! Site builders leave runtime scripts and stylesheets behind that are dead
//! weight in a static mirror (analytics beacons, editor runtimes, form
//! widgets that now point nowhere). When the caller supplies strip
//! patterns, matching `script` and `link[rel=stylesheet]` elements are
//! removed from the page. Separately, fetched CSS/JS text can be run
//! through conservative regex minification. Both transforms are off by
//! default and degrade to the untouched input on any failure.

use kuchiki::NodeRef;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BLOCK_COMMENT_RE: Regex =
        Regex::new(r"(?s)/\*.*?\*/").expect("BUG: hardcoded block-comment pattern is invalid");
    static ref WHITESPACE_RUN_RE: Regex =
        Regex::new(r"\s+").expect("BUG: hardcoded whitespace pattern is invalid");
    static ref CSS_BEFORE_BRACE_RE: Regex =
        Regex::new(r";?\s*\}").expect("BUG: hardcoded brace pattern is invalid");
    static ref CSS_AFTER_BRACE_RE: Regex =
        Regex::new(r"\{\s*").expect("BUG: hardcoded brace pattern is invalid");
}

/// Remove `script` and `link[rel=stylesheet]` elements whose `src`/`href`
/// or inline text matches any of the given patterns.
///
/// Returns the number of elements removed.
pub fn strip_vendor_elements(document: &NodeRef, patterns: &[Regex]) -> usize {
    if patterns.is_empty() {
        return 0;
    }

    let mut doomed: Vec<NodeRef> = Vec::new();

    // Collect before detaching: removal invalidates live select iterators.
    if let Ok(scripts) = document.select("script") {
        for script in scripts {
            let src = script
                .attributes
                .borrow()
                .get("src")
                .map(ToString::to_string);
            let matches_src = src
                .as_deref()
                .is_some_and(|s| patterns.iter().any(|p| p.is_match(s)));
            let matches_text = src.is_none()
                && patterns
                    .iter()
                    .any(|p| p.is_match(&script.as_node().text_contents()));
            if matches_src || matches_text {
                doomed.push(script.as_node().clone());
            }
        }
    }

    if let Ok(links) = document.select("link[rel=\"stylesheet\"]") {
        for link in links {
            let matches_href = link
                .attributes
                .borrow()
                .get("href")
                .is_some_and(|h| patterns.iter().any(|p| p.is_match(h)));
            if matches_href {
                doomed.push(link.as_node().clone());
            }
        }
    }

    let removed = doomed.len();
    for node in doomed {
        node.detach();
    }
    if removed > 0 {
        log::debug!("stripped {removed} vendor element(s)");
    }
    removed
}

/// Strip comments and collapse whitespace in CSS text.
pub fn minify_css(css: &str) -> String {
    let text = BLOCK_COMMENT_RE.replace_all(css, "");
    let text = WHITESPACE_RUN_RE.replace_all(&text, " ");
    let text = CSS_BEFORE_BRACE_RE.replace_all(&text, "}");
    let text = CSS_AFTER_BRACE_RE.replace_all(&text, "{");
    text.trim().to_string()
}

/// Strip comments and collapse whitespace in JavaScript text.
///
/// Line comments are only removed when the whole line is a comment; a
/// trailing `// ...` cannot be distinguished from `//` inside a string
/// literal without a real parser, so those are left alone.
pub fn minify_js(js: &str) -> String {
    let without_line_comments: String = js
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n");
    let text = BLOCK_COMMENT_RE.replace_all(&without_line_comments, "");
    let text = WHITESPACE_RUN_RE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchiki::traits::TendrilSink;

    fn parse(html: &str) -> NodeRef {
        kuchiki::parse_html().one(html)
    }

    fn serialize(document: &NodeRef) -> String {
        let mut out = Vec::new();
        document.serialize(&mut out).expect("serialize");
        String::from_utf8(out).expect("utf8")
    }

    fn patterns(raw: &[&str]) -> Vec<Regex> {
        raw.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[test]
    fn strips_matching_scripts_and_stylesheets() {
        let document = parse(
            r#"<head>
                <script src="https://stat.builder.example/runtime.js"></script>
                <script src="/js/app.js"></script>
                <link rel="stylesheet" href="https://stat.builder.example/editor.css">
                <link rel="stylesheet" href="/css/site.css">
            </head>
            <body><script>window.builderWidget = true;</script></body>"#,
        );
        let removed = strip_vendor_elements(&document, &patterns(&["builder"]));
        assert_eq!(removed, 3);

        let html = serialize(&document);
        assert!(!html.contains("stat.builder.example"));
        assert!(!html.contains("builderWidget"));
        assert!(html.contains("/js/app.js"));
        assert!(html.contains("/css/site.css"));
    }

    #[test]
    fn no_patterns_means_no_changes() {
        let document = parse(r#"<script src="/js/app.js"></script>"#);
        assert_eq!(strip_vendor_elements(&document, &[]), 0);
    }

    #[test]
    fn css_minification_preserves_rules() {
        let css = "/* banner */\nbody {\n  color: red;\n}\n\na { color : blue ; }";
        let minified = minify_css(css);
        assert!(!minified.contains("banner"));
        assert!(minified.contains("body{color: red}"));
        assert!(minified.len() < css.len());
    }

    #[test]
    fn js_minification_leaves_url_strings_alone() {
        let js = "// header comment\nvar endpoint = \"https://api.example/v1\";\n/* block */\nrun();";
        let minified = minify_js(js);
        assert!(!minified.contains("header comment"));
        assert!(!minified.contains("block"));
        assert!(minified.contains("https://api.example/v1"));
        assert!(minified.contains("run();"));
    }
}
