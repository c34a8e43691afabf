use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A PII region: an independently deployed regional store, identified by a
/// stable id and reachable via a public base URL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRecord {
    /// Stable identifier of the region.
    pub id: Uuid,

    /// Human-readable name of the region. Unique within the registry.
    pub name: String,

    /// Base URL of the region's PII endpoint.
    pub base_url: Url,
}
