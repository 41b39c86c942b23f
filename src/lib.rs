//! # blockgame-assets
//!
//! Serves the list of native libraries a BlockGame client must download for
//! its platform.
//!
//! ## The contract
//!
//! ```text
//! GET /api/assets?platform=linux&arch=x64
//!
//! 200  [{"name":"lwjgl.jar","url":"https://assets.blockgame.james090500.com/libs/common/lwjgl.jar"}, …]
//! 400  {"error":"Missing or invalid platform or arch query parameters"}
//! 500  {"error":"Internal Server Error"}
//! ```
//!
//! The first request for a `<platform>-<arch>` variant lists `libs/common/`
//! and `libs/<variant>/` in the object store, writes the merged listing to
//! `libs/<variant>.json`, and returns it. Every later request streams that
//! object back with `Cache-Control: public, max-age=3600`. The service never
//! refreshes or deletes a listing; remove the object to force a rebuild.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use blockgame_assets::{AssetService, Server, app, store::FsStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), blockgame_assets::Error> {
//!     let service = AssetService::new(Arc::new(FsStore::new("./assets")));
//!     Server::bind("0.0.0.0:8787")?.serve(app(service)).await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod assets;
pub mod config;
pub mod health;
pub mod store;

pub use assets::{Asset, AssetService, Variant};
pub use config::Config;
pub use error::{AssetError, Error, StoreError};
pub use handler::Handler;
pub use request::{QueryParams, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBody};
pub use router::Router;
pub use server::Server;

/// The service's routes, bound to `service`.
///
/// | Method | Path | Handler |
/// |---|---|---|
/// | `GET` | `/api/assets` | [`assets::list_assets`] |
/// | `GET` | `/healthz` | [`health::liveness`] |
/// | `GET` | `/readyz` | [`health::readiness`] |
pub fn app(service: AssetService) -> Router<AssetService> {
    Router::new(service)
        .get("/api/assets", assets::list_assets)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
}
