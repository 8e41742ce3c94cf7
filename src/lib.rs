//! Turn a live published website into a self-contained static mirror.
//!
//! The pipeline crawls every reachable same-origin page, discovers the
//! assets those pages and their stylesheets reference (recursively: fonts
//! inside stylesheets inside pages), rewrites all references to a
//! deterministic local path scheme under `assets/`, and hands back the
//! rewritten pages plus a manifest ready for deployment to any static
//! origin.
//!
//! ```no_run
//! use sitemirror::MirrorConfig;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = MirrorConfig::builder()
//!     .start_url("https://site.example")
//!     .form_handler_url("https://handler.example/submit")
//!     .build()?;
//! let outcome = sitemirror::mirror(config).await?;
//! sitemirror::output::write_mirror(&outcome, "dist".as_ref()).await?;
//! # Ok(())
//! # }
//! ```

pub mod asset_map;
pub mod asset_resolver;
pub mod config;
pub mod crawl_engine;
pub mod output;
pub mod page_rewriter;

pub use asset_map::{map_asset_url, AssetKind, AssetRecord, Manifest, ManifestEntry, ManifestSnapshot};
pub use asset_resolver::{resolve_assets, ResolveStats};
pub use config::{MirrorConfig, MirrorConfigBuilder};
pub use crawl_engine::{
    CancelFlag, FetchError, MirrorError, MirrorOutcome, MirrorPipeline, MirrorResult, PageRecord,
    RetryPolicy, RewrittenPage,
};
pub use output::{page_file_name, write_mirror};
pub use page_rewriter::{rewrite_page, PageRewriteOptions};

/// Run the full mirror pipeline with the given configuration.
pub async fn mirror(config: MirrorConfig) -> MirrorResult<MirrorOutcome> {
    MirrorPipeline::new(config).run().await
}
