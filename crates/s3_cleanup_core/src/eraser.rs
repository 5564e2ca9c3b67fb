use tracing::debug;

use crate::error::{DeleteFailure, DeletionPhase, EraseError, ProviderError};
use crate::pagination::{
    ListVersionsRequest, ObjectIdentifier, VersionPage, VersionPages, MAX_KEYS_PER_REQUEST,
};

/// Listing and batch deletion of object versions.
pub trait ObjectVersionStore {
    fn list_object_versions(
        &self,
        request: &ListVersionsRequest,
    ) -> Result<VersionPage, ProviderError>;

    /// Delete up to [`MAX_KEYS_PER_REQUEST`] versions in one request.
    fn delete_objects(
        &self,
        bucket: &str,
        objects: &[ObjectIdentifier],
        quiet: bool,
    ) -> Result<DeleteReport, ProviderError>;
}

/// Per-object failures of a batch delete. Quiet mode reports nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub failures: Vec<DeleteFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraseSummary {
    pub pages: usize,
    pub deleted: usize,
}

pub struct BulkObjectEraser<'a, S: ?Sized> {
    store: &'a S,
    page_size: Option<usize>,
}

impl<'a, S> BulkObjectEraser<'a, S>
where
    S: ObjectVersionStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            page_size: None,
        }
    }

    /// Cap the listing page size; clamped to `1..=MAX_KEYS_PER_REQUEST`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.clamp(1, MAX_KEYS_PER_REQUEST));
        self
    }

    /// Delete every version and delete marker under `prefix`.
    ///
    /// An empty prefix covers the whole bucket. Pages already deleted when a
    /// later page fails stay deleted.
    pub fn erase(&self, bucket: &str, prefix: &str) -> Result<EraseSummary, EraseError> {
        let mut request = ListVersionsRequest::new(bucket, prefix);
        request.max_keys = self.page_size;

        let mut summary = EraseSummary::default();
        for page in VersionPages::new(self.store, request) {
            let page = page?;
            summary.pages += 1;

            for batch in page.entries.chunks(MAX_KEYS_PER_REQUEST) {
                debug!(
                    bucket = %bucket,
                    prefix = %prefix,
                    objects = batch.len(),
                    "Deleting object versions"
                );
                let report = self
                    .store
                    .delete_objects(bucket, batch, true)
                    .map_err(|source| EraseError::Provider {
                        bucket: bucket.to_string(),
                        phase: DeletionPhase::DeleteBatch,
                        source,
                    })?;
                if !report.failures.is_empty() {
                    return Err(EraseError::ObjectFailures {
                        bucket: bucket.to_string(),
                        failures: report.failures,
                    });
                }
                summary.deleted += batch.len();
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::{page, ScriptedVersionStore};

    use super::*;

    #[test]
    fn empty_listing_issues_no_deletes() {
        let store = ScriptedVersionStore::new(vec![page(&[], false)]);
        let summary = BulkObjectEraser::new(&store)
            .erase("b", "")
            .expect("erase should succeed");

        assert_eq!(summary, EraseSummary { pages: 1, deleted: 0 });
        assert!(store.delete_calls().is_empty());
    }

    #[test]
    fn one_delete_per_non_empty_page() {
        let store = ScriptedVersionStore::new(vec![
            page(&["a", "b"], true),
            page(&["c", "d"], true),
            page(&["e"], false),
        ]);
        let summary = BulkObjectEraser::new(&store)
            .erase("b", "logs/")
            .expect("erase should succeed");

        assert_eq!(summary, EraseSummary { pages: 3, deleted: 5 });
        assert_eq!(store.list_calls().len(), 3);

        let deletes = store.delete_calls();
        assert_eq!(deletes.len(), 3);
        assert!(deletes.iter().all(|call| call.quiet && call.bucket == "b"));
        assert_eq!(
            deletes[0].objects,
            vec![
                ObjectIdentifier::new("a", Some("a-v1")),
                ObjectIdentifier::new("b", Some("b-v1")),
            ]
        );
    }

    #[test]
    fn oversized_page_is_split_into_provider_sized_batches() {
        let keys: Vec<String> = (0..1500).map(|index| format!("k{index:04}")).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let store = ScriptedVersionStore::new(vec![page(&key_refs, false)]);

        let summary = BulkObjectEraser::new(&store)
            .erase("b", "")
            .expect("erase should succeed");

        let deletes = store.delete_calls();
        assert_eq!(deletes.len(), 2);
        assert_eq!(deletes[0].objects.len(), MAX_KEYS_PER_REQUEST);
        assert_eq!(deletes[1].objects.len(), 500);
        assert_eq!(summary.deleted, 1500);
    }

    #[test]
    fn page_size_is_forwarded_and_clamped() {
        let store = ScriptedVersionStore::new(vec![page(&["a"], false)]);
        BulkObjectEraser::new(&store)
            .with_page_size(5000)
            .erase("b", "")
            .expect("erase should succeed");

        assert_eq!(store.list_calls()[0].max_keys, Some(MAX_KEYS_PER_REQUEST));
    }

    #[test]
    fn delete_failure_stops_the_loop() {
        let store = ScriptedVersionStore::new(vec![page(&["a"], true), page(&["b"], false)])
            .fail_delete_at(0);
        let error = BulkObjectEraser::new(&store)
            .erase("b", "")
            .expect_err("delete should fail");

        assert_eq!(error.phase(), DeletionPhase::DeleteBatch);
        assert_eq!(store.list_calls().len(), 1);
    }

    #[test]
    fn quiet_mode_object_errors_fail_the_erase() {
        let store = ScriptedVersionStore::new(vec![page(&["a", "b"], false)])
            .reject_key("b", "AccessDenied");
        let error = BulkObjectEraser::new(&store)
            .erase("b", "")
            .expect_err("object failure should surface");

        match error {
            EraseError::ObjectFailures { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].key, "b");
                assert_eq!(failures[0].code.as_deref(), Some("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
