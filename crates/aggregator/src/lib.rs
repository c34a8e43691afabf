//! Cross-Region Aggregator: answers "give me every comment on post P"
//! without the caller knowing region topology. Consults the comment
//! location index, resolves the referenced regions, fans out one request
//! per region concurrently, and merges whatever comes back.
//!
//! Aggregation is best-effort by design: a region that is missing, slow,
//! or failing contributes zero comments and never aborts the others. The
//! caller sees a smaller list, not an error.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::time::Duration;

use agora_locations::LocationIndexManagement;
use agora_regions::{RegionManagement, RegionRecord};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment body as returned by a regional PII store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    /// Comment id.
    pub id: String,

    /// The post the comment belongs to.
    pub post_id: String,

    /// Comment text.
    pub content: String,

    /// Derived key of the comment's author.
    pub created_by: String,

    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// Options for creating a new [`CommentAggregator`].
pub struct CommentAggregatorOptions<RM, LM>
where
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    /// The comment location index.
    pub locations: LM,

    /// Upper bound on each regional call. The whole fan-out completes
    /// within roughly this bound, not the sum over regions.
    pub per_region_timeout: Duration,

    /// The region registry used to resolve base URLs.
    pub regions: RM,
}

/// Aggregates post comments across regional PII stores.
#[derive(Clone)]
pub struct CommentAggregator<RM, LM>
where
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    client: reqwest::Client,
    locations: LM,
    per_region_timeout: Duration,
    regions: RM,
}

impl<RM, LM> CommentAggregator<RM, LM>
where
    RM: RegionManagement,
    LM: LocationIndexManagement,
{
    /// Creates a new aggregator with a shared HTTP client.
    #[must_use]
    pub fn new(
        CommentAggregatorOptions {
            locations,
            per_region_timeout,
            regions,
        }: CommentAggregatorOptions<RM, LM>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            locations,
            per_region_timeout,
            regions,
        }
    }

    /// Returns every reachable comment body for `post_id`, merged across
    /// regions.
    ///
    /// Within one region's contribution the region's own order is kept;
    /// across regions no total order is guaranteed; callers needing one
    /// must sort by `created_at` themselves. A post with no location
    /// records, or with no reachable regions, yields an empty list rather
    /// than an error; only a location-index failure is fatal.
    pub async fn aggregate_comments_for_post(
        &self,
        post_id: &str,
    ) -> Result<Vec<CommentBody>, Error> {
        let locations = self.locations.find_by_post(post_id).await?;

        // Distinct regions in first-seen order; many comments usually
        // share a region and each region is queried once.
        let mut region_ids: Vec<Uuid> = Vec::new();
        for location in &locations {
            if !region_ids.contains(&location.region_id) {
                region_ids.push(location.region_id);
            }
        }

        let mut resolved = Vec::with_capacity(region_ids.len());
        for region_id in region_ids {
            match self.regions.get_region(region_id).await {
                Ok(Some(region)) => resolved.push(region),
                Ok(None) => {
                    tracing::warn!(%region_id, %post_id, "region no longer resolves, skipping");
                }
                Err(error) => {
                    tracing::warn!(%region_id, %post_id, %error, "region lookup failed, skipping");
                }
            }
        }

        let fetches = resolved
            .iter()
            .map(|region| self.fetch_region_comments(region, post_id));

        let merged = join_all(fetches).await.into_iter().flatten().collect();

        Ok(merged)
    }

    /// Fetches one region's comments for a post, bounded by the per-region
    /// timeout. Failure of any kind degrades to an empty contribution.
    async fn fetch_region_comments(&self, region: &RegionRecord, post_id: &str) -> Vec<CommentBody> {
        let url = format!(
            "{}/comments",
            region.base_url.as_str().trim_end_matches('/')
        );

        let fetch = async {
            self.client
                .get(url)
                .query(&[("postId", post_id)])
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<CommentBody>>()
                .await
        };

        match tokio::time::timeout(self.per_region_timeout, fetch).await {
            Ok(Ok(comments)) => comments,
            Ok(Err(error)) => {
                tracing::warn!(region_name = %region.name, %post_id, %error, "regional comment fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(region_name = %region.name, %post_id, "regional comment fetch timed out");
                Vec::new()
            }
        }
    }
}
