//! Mirror run configuration.

mod builder;
mod types;

pub use builder::{MirrorConfigBuilder, WithStartUrl};
pub use types::{
    MirrorConfig, DEFAULT_FETCH_DELAY_MS, DEFAULT_MAX_ASSET_BYTES, DEFAULT_MAX_PAGE_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
