//! Type-safe builder for [`MirrorConfig`] using the typestate pattern.
//!
//! The start URL is the one field without a sensible default, so `build()`
//! only exists once `start_url(...)` has been called; forgetting it is a
//! compile error, not a runtime one. Everything else is validated at
//! `build()`: the URL must parse and carry a host, and vendor strip
//! patterns must compile.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

use super::types::{
    MirrorConfig, DEFAULT_FETCH_DELAY_MS, DEFAULT_MAX_ASSET_BYTES, DEFAULT_MAX_PAGE_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::crawl_engine::RetryPolicy;

/// Typestate marker: the start URL has been provided.
pub struct WithStartUrl;

pub struct MirrorConfigBuilder<State = ()> {
    start_url: Option<String>,
    form_handler_url: Option<String>,
    fetch_delay: Duration,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    max_page_bytes: usize,
    max_asset_bytes: usize,
    page_limit: Option<usize>,
    user_agent: String,
    minify_css: bool,
    minify_js: bool,
    vendor_strip_patterns: Vec<String>,
    _phantom: PhantomData<State>,
}

impl Default for MirrorConfigBuilder<()> {
    fn default() -> Self {
        Self {
            start_url: None,
            form_handler_url: None,
            fetch_delay: Duration::from_millis(DEFAULT_FETCH_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
            page_limit: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            minify_css: false,
            minify_js: false,
            vendor_strip_patterns: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl MirrorConfig {
    /// Start building a config with a fluent, compile-time-checked builder.
    #[must_use]
    pub fn builder() -> MirrorConfigBuilder<()> {
        MirrorConfigBuilder::default()
    }
}

impl MirrorConfigBuilder<()> {
    /// Set the site to mirror. Required before `build()` becomes available.
    pub fn start_url(self, url: impl Into<String>) -> MirrorConfigBuilder<WithStartUrl> {
        MirrorConfigBuilder {
            start_url: Some(url.into()),
            form_handler_url: self.form_handler_url,
            fetch_delay: self.fetch_delay,
            request_timeout: self.request_timeout,
            retry_policy: self.retry_policy,
            max_page_bytes: self.max_page_bytes,
            max_asset_bytes: self.max_asset_bytes,
            page_limit: self.page_limit,
            user_agent: self.user_agent,
            minify_css: self.minify_css,
            minify_js: self.minify_js,
            vendor_strip_patterns: self.vendor_strip_patterns,
            _phantom: PhantomData,
        }
    }
}

impl<State> MirrorConfigBuilder<State> {
    /// External endpoint form submissions should be rewritten to. Without
    /// it the form pass is skipped entirely.
    pub fn form_handler_url(mut self, url: impl Into<String>) -> Self {
        self.form_handler_url = Some(url.into());
        self
    }

    /// Politeness delay between consecutive fetches.
    pub fn fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn max_page_bytes(mut self, cap: usize) -> Self {
        self.max_page_bytes = cap;
        self
    }

    pub fn max_asset_bytes(mut self, cap: usize) -> Self {
        self.max_asset_bytes = cap;
        self
    }

    /// Stop crawling after this many pages (assets are unaffected).
    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn minify_css(mut self, enabled: bool) -> Self {
        self.minify_css = enabled;
        self
    }

    pub fn minify_js(mut self, enabled: bool) -> Self {
        self.minify_js = enabled;
        self
    }

    /// Regex patterns matched against script `src`/inline text and
    /// stylesheet `href`; matching elements are stripped from every page.
    pub fn vendor_strip_patterns(mut self, patterns: Vec<String>) -> Self {
        self.vendor_strip_patterns = patterns;
        self
    }
}

impl MirrorConfigBuilder<WithStartUrl> {
    /// Validate and produce the final [`MirrorConfig`].
    pub fn build(self) -> Result<MirrorConfig> {
        let raw = self
            .start_url
            .expect("typestate guarantees start_url is set");
        let start_url =
            Url::parse(&raw).map_err(|e| anyhow!("invalid start URL '{raw}': {e}"))?;
        if start_url.host_str().is_none() {
            return Err(anyhow!("start URL '{raw}' has no host"));
        }
        if !matches!(start_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "start URL '{raw}' must use http or https, got '{}'",
                start_url.scheme()
            ));
        }

        let vendor_strip_compiled = self
            .vendor_strip_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| anyhow!("invalid strip pattern '{p}': {e}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(MirrorConfig {
            start_url,
            form_handler_url: self.form_handler_url,
            fetch_delay: self.fetch_delay,
            request_timeout: self.request_timeout,
            retry_policy: self.retry_policy,
            max_page_bytes: self.max_page_bytes,
            max_asset_bytes: self.max_asset_bytes,
            page_limit: self.page_limit,
            user_agent: self.user_agent,
            minify_css: self.minify_css,
            minify_js: self.minify_js,
            vendor_strip_compiled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let config = MirrorConfig::builder()
            .start_url("https://site.example")
            .build()
            .expect("valid config");
        assert_eq!(config.start_url().as_str(), "https://site.example/");
        assert!(config.form_handler_url().is_none());
        assert_eq!(config.fetch_delay(), Duration::from_millis(DEFAULT_FETCH_DELAY_MS));
        assert!(config.vendor_strip_patterns().is_empty());
    }

    #[test]
    fn rejects_bad_start_urls() {
        assert!(MirrorConfig::builder().start_url("not a url").build().is_err());
        assert!(MirrorConfig::builder()
            .start_url("ftp://site.example")
            .build()
            .is_err());
    }

    #[test]
    fn rejects_invalid_strip_patterns() {
        let result = MirrorConfig::builder()
            .start_url("https://site.example")
            .vendor_strip_patterns(vec!["(unclosed".to_string()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn optional_settings_flow_through() {
        let config = MirrorConfig::builder()
            .start_url("https://site.example")
            .form_handler_url("https://h.example/submit")
            .page_limit(10)
            .minify_css(true)
            .vendor_strip_patterns(vec!["builder".to_string()])
            .build()
            .expect("valid config");
        assert_eq!(config.form_handler_url(), Some("https://h.example/submit"));
        assert_eq!(config.page_limit(), Some(10));
        assert!(config.minify_css());
        assert_eq!(config.vendor_strip_patterns().len(), 1);
    }
}
