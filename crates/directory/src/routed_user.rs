use agora_identity::UserKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's current region assignment. One record per user key; mutated in
/// place on reassignment, so the directory is always a function from user
/// key to exactly one region.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedUser {
    /// Derived user key (primary key; never the raw email).
    pub key: UserKey,

    /// The region currently holding this user's PII.
    pub region_id: Uuid,

    /// When the user first picked a region.
    pub created_at: DateTime<Utc>,

    /// When the assignment was last overwritten, if ever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
