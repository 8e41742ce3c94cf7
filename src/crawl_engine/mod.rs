//! Crawl engine: frontier traversal, fetching, and pipeline orchestration.

pub mod crawl_types;
pub mod crawler;
pub mod fetcher;
pub mod frontier;

pub use crawl_types::{
    CancelFlag, MirrorError, MirrorOutcome, MirrorResult, PageRecord, RewrittenPage,
};
pub use crawler::{crawl_pages, extract_page_links};
pub use fetcher::{fetch_with_retry, FetchError, FetchedBody, RetryPolicy};
pub use frontier::Frontier;

use reqwest::Client;

use crate::asset_map::Manifest;
use crate::asset_resolver::resolve_assets;
use crate::config::MirrorConfig;
use crate::page_rewriter::{rewrite_page, PageRewriteOptions};

/// One mirror run: crawl → rewrite → resolve.
///
/// Each pipeline owns a fresh frontier, manifest, and discovery queue, so
/// several runs can coexist in one process without sharing state. The
/// cancel handle can be cloned out before `run()` and flipped from anywhere
/// (a signal handler, a deadline task); the run then winds down and returns
/// the partial outcome it has.
pub struct MirrorPipeline {
    config: MirrorConfig,
    cancel: CancelFlag,
}

impl MirrorPipeline {
    #[must_use]
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Cloneable handle for aborting this run.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Execute the full pipeline and return the rewritten pages plus the
    /// populated manifest.
    pub async fn run(&self) -> MirrorResult<MirrorOutcome> {
        let client = self.build_client()?;

        log::info!("mirroring {}", self.config.start_url());
        let pages = crawl_pages(&client, &self.config, &self.cancel).await?;

        let mut manifest = Manifest::new();
        let options = PageRewriteOptions {
            form_handler_url: self.config.form_handler_url(),
            vendor_strip_patterns: self.config.vendor_strip_patterns(),
        };
        let rewritten: Vec<RewrittenPage> = pages
            .iter()
            .map(|page| rewrite_page(page, &mut manifest, &options))
            .collect();
        log::info!(
            "rewrote {} page(s), discovered {} asset(s)",
            rewritten.len(),
            manifest.len()
        );

        resolve_assets(&client, &self.config, &mut manifest, &self.cancel).await;

        Ok(MirrorOutcome {
            pages: rewritten,
            manifest,
        })
    }

    fn build_client(&self) -> MirrorResult<Client> {
        Client::builder()
            .user_agent(self.config.user_agent())
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|e| MirrorError::Other(format!("HTTP client construction failed: {e}")))
    }
}
