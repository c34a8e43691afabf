//! Integration tests for cross-region comment aggregation, with stub
//! regional PII stores served by axum on ephemeral ports.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agora_aggregator::{CommentAggregator, CommentAggregatorOptions, CommentBody};
use agora_locations::{
    CommentLocation, LocationIndexManagement, LocationIndexManager, LocationIndexManagerOptions,
};
use agora_regions::{RegionManagement, RegionManager, RegionManagerOptions, RegionRecord};
use agora_store_memory::MemoryStore;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use url::Url;

#[derive(Clone)]
struct StubRegion {
    comments: Vec<CommentBody>,
    delay: Duration,
    requests: Arc<AtomicUsize>,
}

async fn stub_comments_handler(
    State(stub): State<StubRegion>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<CommentBody>> {
    stub.requests.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(stub.delay).await;

    let post_id = params.get("postId").cloned().unwrap_or_default();
    let matching = stub
        .comments
        .into_iter()
        .filter(|c| c.post_id == post_id)
        .collect();

    Json(matching)
}

/// Serves a stub regional PII store and returns its base URL and request
/// counter.
async fn spawn_region(comments: Vec<CommentBody>, delay: Duration) -> (Url, Arc<AtomicUsize>) {
    let requests = Arc::new(AtomicUsize::new(0));
    let stub = StubRegion {
        comments,
        delay,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/comments", get(stub_comments_handler))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub region");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub region failed");
    });

    let url = Url::parse(&format!("http://{addr}")).expect("Invalid stub url");
    (url, requests)
}

/// A base URL nothing is listening on.
async fn unreachable_base_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);

    Url::parse(&format!("http://{addr}")).expect("Invalid probe url")
}

fn comment(id: &str, post_id: &str) -> CommentBody {
    CommentBody {
        id: id.to_string(),
        post_id: post_id.to_string(),
        content: format!("comment {id}"),
        created_by: "ABC123".to_string(),
        created_at: Utc::now(),
    }
}

struct Fixture {
    aggregator: CommentAggregator<RegionManager<MemoryStore>, LocationIndexManager<MemoryStore>>,
    locations: LocationIndexManager<MemoryStore>,
    regions: RegionManager<MemoryStore>,
}

fn fixture(per_region_timeout: Duration) -> Fixture {
    let regions = RegionManager::new(RegionManagerOptions {
        default_region_base_url: Url::parse("https://eu.pii.example.com").unwrap(),
        store: MemoryStore::new(),
    });
    let locations = LocationIndexManager::new(LocationIndexManagerOptions {
        store: MemoryStore::new(),
    });
    let aggregator = CommentAggregator::new(CommentAggregatorOptions {
        locations: locations.clone(),
        per_region_timeout,
        regions: regions.clone(),
    });

    Fixture {
        aggregator,
        locations,
        regions,
    }
}

async fn record_location(fixture: &Fixture, comment_id: &str, post_id: &str, region: &RegionRecord) {
    fixture
        .locations
        .record_comment_location(CommentLocation {
            comment_id: comment_id.to_string(),
            user_key: "ABC123".to_string(),
            post_id: post_id.to_string(),
            region_id: region.id,
            created_at: Utc::now(),
        })
        .await
        .expect("Failed to record location");
}

#[tokio::test]
async fn test_aggregates_across_regions() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let fixture = fixture(Duration::from_secs(2));

    let (url_a, requests_a) = spawn_region(
        vec![comment("c1", "p1"), comment("c2", "p1")],
        Duration::ZERO,
    )
    .await;
    let (url_b, _) = spawn_region(vec![comment("c3", "p1")], Duration::ZERO).await;

    let region_a = fixture.regions.add_region("region-a", url_a).await.unwrap();
    let region_b = fixture.regions.add_region("region-b", url_b).await.unwrap();

    record_location(&fixture, "c1", "p1", &region_a).await;
    record_location(&fixture, "c2", "p1", &region_a).await;
    record_location(&fixture, "c3", "p1", &region_b).await;

    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("p1")
        .await
        .unwrap();

    let mut ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["c1".to_string(), "c2".to_string(), "c3".to_string()]);

    // Two comments in region A still mean one request to region A.
    assert_eq!(requests_a.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_degrades_when_region_unreachable() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let fixture = fixture(Duration::from_secs(2));

    let (url_a, _) = spawn_region(
        vec![comment("c1", "p1"), comment("c2", "p1")],
        Duration::ZERO,
    )
    .await;
    let url_b = unreachable_base_url().await;

    let region_a = fixture.regions.add_region("region-a", url_a).await.unwrap();
    let region_b = fixture.regions.add_region("region-b", url_b).await.unwrap();

    record_location(&fixture, "c1", "p1", &region_a).await;
    record_location(&fixture, "c2", "p1", &region_a).await;
    record_location(&fixture, "c3", "p1", &region_b).await;

    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("p1")
        .await
        .unwrap();

    let mut ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["c1".to_string(), "c2".to_string()]);
}

#[tokio::test]
async fn test_slow_region_bounded_by_timeout() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let fixture = fixture(Duration::from_millis(200));

    let (fast_url, _) = spawn_region(vec![comment("c1", "p1")], Duration::ZERO).await;
    let (slow_url, _) = spawn_region(vec![comment("c2", "p1")], Duration::from_secs(5)).await;

    let fast = fixture.regions.add_region("fast", fast_url).await.unwrap();
    let slow = fixture.regions.add_region("slow", slow_url).await.unwrap();

    record_location(&fixture, "c1", "p1", &fast).await;
    record_location(&fixture, "c2", "p1", &slow).await;

    let started = tokio::time::Instant::now();
    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("p1")
        .await
        .unwrap();

    let ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["c1".to_string()]);

    // The join is bounded by the per-region timeout, not the slow region.
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_empty_post_returns_empty_list() {
    let fixture = fixture(Duration::from_secs(2));

    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("no-such-post")
        .await
        .unwrap();

    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_unresolvable_region_skipped() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let fixture = fixture(Duration::from_secs(2));

    let (url_a, _) = spawn_region(vec![comment("c1", "p1")], Duration::ZERO).await;
    let region_a = fixture.regions.add_region("region-a", url_a).await.unwrap();

    record_location(&fixture, "c1", "p1", &region_a).await;

    // A location record pointing at a region the registry has never heard
    // of: aggregation warns and carries on with the rest.
    let phantom = RegionRecord {
        id: uuid::Uuid::new_v4(),
        name: "phantom".to_string(),
        base_url: Url::parse("https://phantom.pii.example.com").unwrap(),
    };
    record_location(&fixture, "c2", "p1", &phantom).await;

    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("p1")
        .await
        .unwrap();

    let ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["c1".to_string()]);
}

#[tokio::test]
async fn test_ghost_location_dropped_silently() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let fixture = fixture(Duration::from_secs(2));

    // The region only serves c1; c2's body was deleted regionally but its
    // location record was never retracted.
    let (url_a, _) = spawn_region(vec![comment("c1", "p1")], Duration::ZERO).await;
    let region_a = fixture.regions.add_region("region-a", url_a).await.unwrap();

    record_location(&fixture, "c1", "p1", &region_a).await;
    record_location(&fixture, "c2", "p1", &region_a).await;

    let comments = fixture
        .aggregator
        .aggregate_comments_for_post("p1")
        .await
        .unwrap();

    let ids: Vec<String> = comments.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["c1".to_string()]);
}
