//! sitemirror CLI: crawl a published site into a static mirror directory.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use sitemirror::{output, MirrorConfig, MirrorPipeline, RetryPolicy};

#[derive(Parser)]
#[command(name = "sitemirror")]
#[command(about = "Mirror a published website into a redeployable static bundle", long_about = None)]
struct Cli {
    /// Base URL of the site to mirror (scheme + host)
    url: String,

    /// Directory the mirror is written to
    #[arg(long, default_value = "mirror-output")]
    output: PathBuf,

    /// External endpoint form submissions are rewritten to; without it,
    /// forms are left untouched
    #[arg(long)]
    form_handler: Option<String>,

    /// Politeness delay between fetches, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Stop after this many pages
    #[arg(long)]
    limit: Option<usize>,

    /// Attempts per URL before giving up on transient failures
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Override the User-Agent header
    #[arg(long)]
    user_agent: Option<String>,

    /// Strip script/stylesheet elements matching these regex patterns
    /// (repeatable)
    #[arg(long = "strip-vendor")]
    strip_vendor: Vec<String>,

    /// Minify fetched CSS assets
    #[arg(long)]
    minify_css: bool,

    /// Minify fetched JS assets
    #[arg(long)]
    minify_js: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut builder = MirrorConfig::builder()
        .start_url(cli.url.as_str())
        .fetch_delay(Duration::from_millis(cli.delay_ms))
        .retry_policy(RetryPolicy {
            max_attempts: cli.retries.max(1),
            ..RetryPolicy::default()
        })
        .vendor_strip_patterns(cli.strip_vendor)
        .minify_css(cli.minify_css)
        .minify_js(cli.minify_js);
    if let Some(handler) = cli.form_handler {
        builder = builder.form_handler_url(handler);
    }
    if let Some(limit) = cli.limit {
        builder = builder.page_limit(limit);
    }
    if let Some(agent) = cli.user_agent {
        builder = builder.user_agent(agent);
    }
    let config = builder.build()?;

    let pipeline = MirrorPipeline::new(config);

    // Ctrl-C flips the cancel flag; the pipeline winds down and returns the
    // partial outcome instead of dying mid-write.
    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing in-flight work and stopping");
            cancel.cancel();
        }
    });

    let outcome = pipeline.run().await?;
    output::write_mirror(&outcome, &cli.output).await?;

    let fetched = outcome
        .manifest
        .records()
        .filter(|r| r.content.is_some())
        .count();
    println!(
        "mirrored {} page(s) and {}/{} asset(s) into {}",
        outcome.pages.len(),
        fetched,
        outcome.manifest.len(),
        cli.output.display()
    );
    Ok(())
}
