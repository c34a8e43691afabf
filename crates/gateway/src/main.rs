//! Gateway binary: wires the routing core over in-memory storage and
//! serves the HTTP surface.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::SocketAddr;
use std::time::Duration;

use agora_aggregator::{CommentAggregator, CommentAggregatorOptions};
use agora_directory::{DirectoryManagement, DirectoryManager, DirectoryManagerOptions};
use agora_gateway::{GatewayContext, router};
use agora_locations::{LocationIndexManagement, LocationIndexManager, LocationIndexManagerOptions};
use agora_regions::{RegionManagement, RegionManager, RegionManagerOptions};
use agora_store_memory::MemoryStore;
use clap::Parser;
use tracing::info;
use url::Url;

/// Gateway-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address binding error
    #[error("bind error: {0}")]
    Bind(std::io::Error),

    /// Region registry error
    #[error(transparent)]
    Regions(#[from] agora_regions::Error),

    /// HTTP server error
    #[error("serve error: {0}")]
    Serve(std::io::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the default region's PII endpoint
    #[arg(
        long,
        default_value = "http://localhost:4000",
        env = "AGORA_DEFAULT_REGION_BASE_URL"
    )]
    default_region_base_url: Url,

    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "AGORA_PORT")]
    port: u16,

    /// Per-region timeout for comment aggregation, in milliseconds
    #[arg(long, default_value_t = 2000, env = "AGORA_REGION_TIMEOUT_MS")]
    region_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();

    let regions = RegionManager::new(RegionManagerOptions {
        default_region_base_url: args.default_region_base_url,
        store: MemoryStore::new(),
    });
    let directory = DirectoryManager::new(DirectoryManagerOptions {
        regions: regions.clone(),
        store: MemoryStore::new(),
    });
    let locations = LocationIndexManager::new(LocationIndexManagerOptions {
        store: MemoryStore::new(),
    });
    let aggregator = CommentAggregator::new(CommentAggregatorOptions {
        locations: locations.clone(),
        per_region_timeout: Duration::from_millis(args.region_timeout_ms),
        regions: regions.clone(),
    });

    let default_region = regions.seed_default_region().await?;
    info!(region_id = %default_region.id, base_url = %default_region.base_url, "default region ready");

    let app = router(GatewayContext {
        aggregator,
        directory,
        locations,
        regions,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Bind)?;
    info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .map_err(Error::Serve)
}
