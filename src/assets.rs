//! `GET /api/assets`: per-platform native library listings.
//!
//! A listing is the JSON array of every downloadable file under
//! `libs/common/` followed by every file under `libs/<platform>-<arch>/`.
//! The first request for a variant builds it from two prefix listings and
//! writes it to `libs/<platform>-<arch>.json`; later requests stream that
//! object back untouched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{Config, DEFAULT_PUBLIC_BASE_URL};
use crate::error::AssetError;
use crate::request::{QueryParams, Request};
use crate::response::{ContentType, Response};
use crate::store::{ListOptions, Listing, ObjectStore, PutOptions};

/// Body message for a 400.
pub const INVALID_PARAMS_MESSAGE: &str = "Missing or invalid platform or arch query parameters";

/// Body message for a 500. Deliberately carries no detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Prefix holding assets shared by every variant.
pub const COMMON_PREFIX: &str = "libs/common/";

const JSON_CONTENT_TYPE: &str = "application/json";

// ── Variant ───────────────────────────────────────────────────────────────────

/// A supported `<platform>-<arch>` combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    WindowsX64,
    WindowsX86,
    LinuxX64,
    MacosArm64,
}

impl Variant {
    /// Every combination the service accepts.
    pub const ALL: [Variant; 4] = [Self::WindowsX64, Self::WindowsX86, Self::LinuxX64, Self::MacosArm64];

    /// The variant key, e.g. `"linux-x64"`.
    pub fn key(self) -> &'static str {
        match self {
            Self::WindowsX64 => "windows-x64",
            Self::WindowsX86 => "windows-x86",
            Self::LinuxX64   => "linux-x64",
            Self::MacosArm64 => "macos-arm64",
        }
    }

    /// Looks up the variant for a `platform` / `arch` pair. Individually
    /// plausible values still fail if the pair is not supported.
    pub fn from_parts(platform: &str, arch: &str) -> Option<Self> {
        if platform.is_empty() || arch.is_empty() {
            return None;
        }
        format!("{platform}-{arch}").parse().ok()
    }

    /// Object key of the cached listing: `libs/<key>.json`.
    pub fn cache_path(self) -> String {
        format!("libs/{}.json", self.key())
    }

    /// Prefix holding this variant's own assets: `libs/<key>/`.
    pub fn prefix(self) -> String {
        format!("libs/{}/", self.key())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.key() == s).ok_or(())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Asset ─────────────────────────────────────────────────────────────────────

/// One downloadable file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Final path segment of the object key.
    pub name: String,
    /// Public base URL joined with the full object key.
    pub url: String,
}

impl Asset {
    pub fn from_key(base_url: &str, key: &str) -> Self {
        let name = key.rsplit('/').next().unwrap_or(key);
        Self { name: name.to_owned(), url: format!("{base_url}{key}") }
    }
}

/// Merges the common and variant listings into asset records.
///
/// Order is common first, then variant, each in backend order. Entries
/// without a key, and pseudo-directory entries ending in `/`, are skipped.
/// Nothing is sorted or deduplicated.
pub fn build_asset_list(base_url: &str, common: Listing, variant: Listing) -> Vec<Asset> {
    common
        .into_objects()
        .into_iter()
        .chain(variant.into_objects())
        .filter_map(|obj| obj.key)
        .filter(|key| !key.is_empty() && !key.ends_with('/'))
        .map(|key| Asset::from_key(base_url, &key))
        .collect()
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Cache-or-generate logic over an [`ObjectStore`].
pub struct AssetService {
    store: Arc<dyn ObjectStore>,
    base_url: String,
    cache_control: HeaderValue,
}

impl AssetService {
    /// Uses the default public base URL and a one-hour `max-age`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            cache_control: cache_control(3600),
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self::new(store)
            .with_base_url(config.public_base_url.clone())
            .with_cache_max_age(config.cache_max_age_secs)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_max_age(mut self, secs: u64) -> Self {
        self.cache_control = cache_control(secs);
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Produces the full HTTP response for one asset request.
    ///
    /// Invalid input is rejected before the store is touched. Any store or
    /// serialization failure is logged and collapsed into a generic 500.
    pub async fn respond(&self, query: &QueryParams) -> Response {
        let variant = match (query.get("platform"), query.get("arch")) {
            (Some(platform), Some(arch)) => Variant::from_parts(platform, arch),
            _ => None,
        };
        let Some(variant) = variant else {
            return Response::error(StatusCode::BAD_REQUEST, INVALID_PARAMS_MESSAGE);
        };

        match self.serve(variant).await {
            Ok(response) => response,
            Err(e) => {
                error!(%variant, error = %e, "failed to build asset list");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    async fn serve(&self, variant: Variant) -> Result<Response, AssetError> {
        let path = variant.cache_path();

        if let Some(cached) = self.store.get(&path).await? {
            info!(%variant, "serving cached asset list");
            return Ok(Response::builder()
                .header(header::CACHE_CONTROL, self.cache_control.clone())
                .payload(ContentType::Json, cached));
        }

        info!(%variant, "generating new asset list");
        let body = self.generate(variant).await?;

        // No Cache-Control here: only listings read back from the store are
        // marked cacheable.
        Ok(Response::json(body))
    }

    /// Builds the listing for `variant` from the store and persists it.
    ///
    /// The two prefix listings run concurrently; either failing fails the
    /// whole call. The body is returned only once the write has succeeded.
    #[instrument(skip_all, fields(%variant))]
    pub async fn generate(&self, variant: Variant) -> Result<Bytes, AssetError> {
        let (common, native) = tokio::try_join!(
            self.store.list(ListOptions::prefix(COMMON_PREFIX)),
            self.store.list(ListOptions::prefix(variant.prefix())),
        )?;

        let assets = build_asset_list(&self.base_url, common, native);
        let body = Bytes::from(serde_json::to_vec(&assets)?);

        self.store
            .put(&variant.cache_path(), body.clone(), PutOptions::content_type(JSON_CONTENT_TYPE))
            .await?;

        info!(assets = assets.len(), "asset list persisted");
        Ok(body)
    }
}

fn cache_control(max_age_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600"))
}

/// Route handler for `GET /api/assets?platform=<p>&arch=<a>`.
pub async fn list_assets(service: Arc<AssetService>, req: Request) -> Response {
    service.respond(&req.query()).await
}
