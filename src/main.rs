//! `blockgame-assets` binary.
//!
//! ```text
//! RUST_LOG=info BLOCKGAME_ASSETS_STORE_ROOT=/srv/assets blockgame-assets
//! curl 'http://localhost:8787/api/assets?platform=linux&arch=x64'
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use blockgame_assets::store::FsStore;
use blockgame_assets::{AssetService, Config, Server, app};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), blockgame_assets::Error> {
    let config = Config::load()?;
    info!(
        store_root = %config.store_root.display(),
        public_base_url = %config.public_base_url,
        "configuration loaded"
    );

    let store = Arc::new(FsStore::new(config.store_root.clone()));
    let service = AssetService::from_config(store, &config);

    Server::bind(&config.listen)?.serve(app(service)).await
}
