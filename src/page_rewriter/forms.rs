//! Form submission rewriting.
//!
//! A mirrored site has no server behind it, so form submissions must be
//! pointed at an externally provisioned handler endpoint. Every `form`
//! element gets its `action` replaced with the configured handler and its
//! method forced to POST, plus a hidden `form_type` field the handler uses
//! to route the submission. When no handler is configured the pass is
//! skipped with a single warning and the forms are left exactly as found.

use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use url::Url;

/// Rewrite every form in the document to submit to `handler_url`.
///
/// Returns the number of forms rewritten.
pub fn rewrite_forms(document: &NodeRef, page_url: &Url, handler_url: Option<&str>) -> usize {
    let forms: Vec<_> = match document.select("form") {
        Ok(matches) => matches.collect(),
        Err(()) => return 0,
    };
    if forms.is_empty() {
        return 0;
    }

    let Some(handler) = handler_url else {
        log::warn!(
            "no form handler configured; leaving {} form(s) untouched on {page_url}",
            forms.len()
        );
        return 0;
    };

    let mut rewritten = 0;
    for form in forms {
        {
            let mut attrs = form.attributes.borrow_mut();
            attrs.insert("action", handler.to_string());
            attrs.insert("method", "post".to_string());
        }
        prepend_form_type_field(form.as_node());
        rewritten += 1;
    }

    log::debug!("rewrote {rewritten} form(s) on {page_url} to {handler}");
    rewritten
}

/// Prepend a hidden `form_type` input so the external handler can tell which
/// form a submission came from. Skipped if the form already carries one.
fn prepend_form_type_field(form: &NodeRef) {
    if let Ok(existing) = form.select("input[name=\"form_type\"]") {
        if existing.count() > 0 {
            return;
        }
    }

    let fragment =
        kuchiki::parse_html().one(r#"<input type="hidden" name="form_type" value="contact">"#);
    if let Ok(input) = fragment.select_first("input") {
        let node = input.as_node().clone();
        node.detach();
        form.prepend(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> NodeRef {
        kuchiki::parse_html().one(html)
    }

    fn serialize(document: &NodeRef) -> String {
        let mut out = Vec::new();
        document.serialize(&mut out).expect("serialize");
        String::from_utf8(out).expect("utf8")
    }

    fn page_url() -> Url {
        Url::parse("https://site.example/contact").unwrap()
    }

    #[test]
    fn rewrites_action_method_and_adds_routing_field() {
        let document = parse(
            r#"<form action="https://tilda.example/formshandler" method="get">
                <input type="text" name="email">
            </form>"#,
        );
        let count = rewrite_forms(&document, &page_url(), Some("https://h.example/submit"));
        assert_eq!(count, 1);

        let html = serialize(&document);
        assert!(html.contains(r#"action="https://h.example/submit""#));
        assert!(html.contains(r#"method="post""#));
        assert!(html.contains(r#"name="form_type""#));
        assert!(!html.contains("tilda.example"));
    }

    #[test]
    fn without_a_handler_forms_are_untouched() {
        let original = r#"<form action="https://tilda.example/formshandler"><input name="q"></form>"#;
        let document = parse(original);
        let count = rewrite_forms(&document, &page_url(), None);
        assert_eq!(count, 0);

        let html = serialize(&document);
        assert!(html.contains(r#"action="https://tilda.example/formshandler""#));
        assert!(!html.contains("form_type"));
    }

    #[test]
    fn does_not_duplicate_the_routing_field() {
        let document = parse(
            r#"<form><input type="hidden" name="form_type" value="order"></form>"#,
        );
        rewrite_forms(&document, &page_url(), Some("https://h.example/submit"));
        let html = serialize(&document);
        assert_eq!(html.matches("form_type").count(), 1);
    }
}
