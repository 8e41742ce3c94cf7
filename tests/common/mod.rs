//! Shared helpers for the sitemirror integration tests.

use std::time::Duration;

use sitemirror::{MirrorConfig, RetryPolicy};

/// Config tuned for tests: no politeness delay, millisecond retries.
#[allow(dead_code)]
pub fn test_config(start_url: &str) -> MirrorConfig {
    test_config_builder(start_url)
        .build()
        .expect("test config must be valid")
}

/// Same as [`test_config`] but leaves the builder open for per-test knobs.
#[allow(dead_code)]
pub fn test_config_builder(
    start_url: &str,
) -> sitemirror::MirrorConfigBuilder<sitemirror::config::WithStartUrl> {
    MirrorConfig::builder()
        .start_url(start_url)
        .fetch_delay(Duration::ZERO)
        .retry_policy(RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            max_delay: Duration::from_millis(5),
        })
}

/// Minimal page with the given body fragment.
#[allow(dead_code)]
pub fn page_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
{body}
</body>
</html>"#
    )
}
