use s3_cleanup_core::eraser::BulkObjectEraser;
use s3_cleanup_core::error::{DeletionPhase, EraseError};
use s3_cleanup_core::test_helpers::InMemoryBucket;

fn seeded_bucket(prefix: &str, count: usize) -> InMemoryBucket {
    let bucket = InMemoryBucket::new("my-bucket");
    for index in 0..count {
        let key = format!("{prefix}object-{index:03}");
        bucket.put(&key, "v1");
        bucket.put(&key, "v2");
    }
    bucket
}

#[test]
fn k_pages_need_k_listings_and_k_batches() {
    let bucket = seeded_bucket("logs/", 25);
    let summary = BulkObjectEraser::new(&bucket)
        .with_page_size(10)
        .erase("my-bucket", "logs/")
        .expect("erase should succeed");

    // 50 versions at 10 per page.
    assert_eq!(summary.pages, 5);
    assert_eq!(summary.deleted, 50);
    assert_eq!(bucket.list_call_count(), 5);
    assert_eq!(bucket.delete_call_count(), 5);
    assert!(bucket.keys().is_empty());
}

#[test]
fn erase_only_touches_the_prefix() {
    let bucket = seeded_bucket("logs/", 3);
    bucket.put("data/keep.parquet", "v1");

    BulkObjectEraser::new(&bucket)
        .erase("my-bucket", "logs/")
        .expect("erase should succeed");

    assert_eq!(bucket.keys(), vec!["data/keep.parquet".to_string()]);
}

#[test]
fn empty_prefix_erases_the_whole_bucket() {
    let bucket = seeded_bucket("logs/", 3);
    bucket.put("data/other", "v1");

    BulkObjectEraser::new(&bucket)
        .erase("my-bucket", "")
        .expect("erase should succeed");

    assert!(bucket.keys().is_empty());
}

#[test]
fn second_erase_of_an_empty_prefix_is_a_no_op() {
    let bucket = seeded_bucket("logs/", 4);
    let eraser = BulkObjectEraser::new(&bucket);

    eraser
        .erase("my-bucket", "logs/")
        .expect("first erase should succeed");
    let deletes_after_first = bucket.delete_call_count();

    let summary = eraser
        .erase("my-bucket", "logs/")
        .expect("second erase should succeed");

    assert_eq!(summary.deleted, 0);
    assert_eq!(bucket.delete_call_count(), deletes_after_first);
}

#[test]
fn missing_bucket_fails_in_the_listing_phase() {
    let bucket = InMemoryBucket::new("my-bucket");
    let error = BulkObjectEraser::new(&bucket)
        .erase("other-bucket", "")
        .expect_err("unknown bucket should fail");

    assert_eq!(error.phase(), DeletionPhase::ListVersions);
    match error {
        EraseError::Provider { source, .. } => {
            assert_eq!(source.code.as_deref(), Some("NoSuchBucket"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
