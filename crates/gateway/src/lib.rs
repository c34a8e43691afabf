//! Thin HTTP surface over the data-residency routing core: region
//! assignment, region catalog, comment location recording, and
//! cross-region comment aggregation.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod handlers;

use handlers::{
    aggregate_comments_handler, get_route_handler, list_regions_handler,
    record_comment_location_handler, upsert_route_handler,
};

use agora_aggregator::CommentAggregator;
use agora_directory::DirectoryManagement;
use agora_locations::LocationIndexManagement;
use agora_regions::RegionManagement;
use axum::routing::{get, post};
use axum::Router;

/// Shared state for the gateway's handlers.
#[derive(Clone)]
pub struct GatewayContext<DM, RM, LM>
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    /// Cross-region comment aggregator.
    pub aggregator: CommentAggregator<RM, LM>,

    /// Routing directory.
    pub directory: DM,

    /// Comment location index.
    pub locations: LM,

    /// Region registry.
    pub regions: RM,
}

/// Builds the gateway router.
pub fn router<DM, RM, LM>(ctx: GatewayContext<DM, RM, LM>) -> Router
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    Router::new()
        .route(
            "/api/router/user",
            post(upsert_route_handler).get(get_route_handler),
        )
        .route("/api/router/regions", get(list_regions_handler))
        .route(
            "/api/router/comments",
            post(record_comment_location_handler),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(aggregate_comments_handler),
        )
        .with_state(ctx)
}
