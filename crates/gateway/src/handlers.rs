//! HTTP handlers mapping the routing core's error taxonomy onto status
//! codes: validation and unknown-region failures are 400, a missing route
//! is 404, a duplicate comment id is 409, storage failures are 500.
//! Aggregation is always 200: partial results are invisible to callers.

use crate::GatewayContext;

use agora_aggregator::CommentBody;
use agora_directory::{DirectoryManagement, Error as DirectoryError, RoutedUser};
use agora_locations::{CommentLocation, Error as LocationError, LocationIndexManagement};
use agora_regions::{RegionManagement, RegionRecord};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertRouteRequest {
    pub email: String,
    pub region_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteQuery {
    pub email: String,
}

fn error_body(message: String) -> Json<serde_json::Value> {
    Json(json!({ "error": message }))
}

pub(crate) async fn upsert_route_handler<DM, RM, LM>(
    State(ctx): State<GatewayContext<DM, RM, LM>>,
    Json(request): Json<UpsertRouteRequest>,
) -> Response
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    match ctx.directory.upsert_route(&request.email, request.region_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(
            error @ (DirectoryError::EmailRequired
            | DirectoryError::RegionRequired
            | DirectoryError::RegionNotFound(_)),
        ) => (StatusCode::BAD_REQUEST, error_body(error.to_string())).into_response(),
        Err(error) => {
            tracing::error!(%error, "route upsert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(error.to_string()),
            )
                .into_response()
        }
    }
}

pub(crate) async fn get_route_handler<DM, RM, LM>(
    State(ctx): State<GatewayContext<DM, RM, LM>>,
    Query(query): Query<RouteQuery>,
) -> Response
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    match ctx.directory.get_route(&query.email).await {
        Ok(Some(user)) => (StatusCode::OK, Json::<RoutedUser>(user)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_body("route not found".to_string()),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%error, "route lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(error.to_string()),
            )
                .into_response()
        }
    }
}

pub(crate) async fn list_regions_handler<DM, RM, LM>(
    State(ctx): State<GatewayContext<DM, RM, LM>>,
) -> Response
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    match ctx.regions.list_regions().await {
        Ok(regions) => (StatusCode::OK, Json::<Vec<RegionRecord>>(regions)).into_response(),
        Err(error) => {
            tracing::error!(%error, "region listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(error.to_string()),
            )
                .into_response()
        }
    }
}

pub(crate) async fn record_comment_location_handler<DM, RM, LM>(
    State(ctx): State<GatewayContext<DM, RM, LM>>,
    Json(location): Json<CommentLocation>,
) -> Response
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    match ctx.locations.record_comment_location(location).await {
        Ok(recorded) => (StatusCode::CREATED, Json(recorded)).into_response(),
        Err(error @ LocationError::AlreadyExists(_)) => {
            (StatusCode::CONFLICT, error_body(error.to_string())).into_response()
        }
        Err(error) => {
            tracing::error!(%error, "comment location insert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(error.to_string()),
            )
                .into_response()
        }
    }
}

pub(crate) async fn aggregate_comments_handler<DM, RM, LM>(
    State(ctx): State<GatewayContext<DM, RM, LM>>,
    Path(post_id): Path<String>,
) -> Response
where
    DM: DirectoryManagement,
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    match ctx.aggregator.aggregate_comments_for_post(&post_id).await {
        Ok(comments) => (StatusCode::OK, Json::<Vec<CommentBody>>(comments)).into_response(),
        Err(error) => {
            tracing::error!(%error, %post_id, "comment aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(error.to_string()),
            )
                .into_response()
        }
    }
}
