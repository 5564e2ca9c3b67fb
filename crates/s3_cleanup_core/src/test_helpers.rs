//! Recording fakes for the collaborator traits.
//!
//! Shared by the unit tests in this crate, the integration tests under
//! `tests/`, and the Lambda crate's handler tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use crate::eraser::{DeleteReport, ObjectVersionStore};
use crate::error::{DeleteFailure, ProviderError};
use crate::pagination::{
    ListVersionsRequest, ObjectIdentifier, VersionPage, MAX_KEYS_PER_REQUEST,
};
use crate::stack_status::{StackDescription, StackStatus, StackStatusQuery};

/// Build a page whose entries carry version id `<key>-v1`.
///
/// A truncated page points its continuation markers at its last entry.
pub fn page(keys: &[&str], truncated: bool) -> VersionPage {
    let entries: Vec<ObjectIdentifier> = keys
        .iter()
        .map(|key| ObjectIdentifier::new(*key, Some(format!("{key}-v1").as_str())))
        .collect();
    let last = entries.last().cloned();

    VersionPage {
        entries,
        is_truncated: truncated,
        next_key_marker: truncated
            .then(|| last.as_ref().map(|entry| entry.key.clone()))
            .flatten(),
        next_version_id_marker: truncated
            .then(|| last.and_then(|entry| entry.version_id))
            .flatten(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub bucket: String,
    pub objects: Vec<ObjectIdentifier>,
    pub quiet: bool,
}

/// Serves a fixed sequence of pages, then empty untruncated pages.
pub struct ScriptedVersionStore {
    pages: Mutex<VecDeque<VersionPage>>,
    list_calls: Mutex<Vec<ListVersionsRequest>>,
    delete_calls: Mutex<Vec<DeleteCall>>,
    fail_list_at: Option<usize>,
    fail_delete_at: Option<usize>,
    rejected_keys: BTreeMap<String, String>,
}

impl ScriptedVersionStore {
    pub fn new(pages: Vec<VersionPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            list_calls: Mutex::new(Vec::new()),
            delete_calls: Mutex::new(Vec::new()),
            fail_list_at: None,
            fail_delete_at: None,
            rejected_keys: BTreeMap::new(),
        }
    }

    /// Fail the listing call with this zero-based index.
    pub fn fail_list_at(mut self, call_index: usize) -> Self {
        self.fail_list_at = Some(call_index);
        self
    }

    /// Fail the delete call with this zero-based index.
    pub fn fail_delete_at(mut self, call_index: usize) -> Self {
        self.fail_delete_at = Some(call_index);
        self
    }

    /// Report `key` as a per-object failure with `code` in quiet mode.
    pub fn reject_key(mut self, key: &str, code: &str) -> Self {
        self.rejected_keys.insert(key.to_string(), code.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<ListVersionsRequest> {
        self.list_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        self.delete_calls.lock().expect("poisoned mutex").clone()
    }
}

impl ObjectVersionStore for ScriptedVersionStore {
    fn list_object_versions(
        &self,
        request: &ListVersionsRequest,
    ) -> Result<VersionPage, ProviderError> {
        let call_index = {
            let mut calls = self.list_calls.lock().expect("poisoned mutex");
            calls.push(request.clone());
            calls.len() - 1
        };
        if self.fail_list_at == Some(call_index) {
            return Err(
                ProviderError::new("ListObjectVersions", "scripted listing failure")
                    .with_code("InternalError"),
            );
        }

        Ok(self
            .pages
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .unwrap_or_default())
    }

    fn delete_objects(
        &self,
        bucket: &str,
        objects: &[ObjectIdentifier],
        quiet: bool,
    ) -> Result<DeleteReport, ProviderError> {
        let call_index = {
            let mut calls = self.delete_calls.lock().expect("poisoned mutex");
            calls.push(DeleteCall {
                bucket: bucket.to_string(),
                objects: objects.to_vec(),
                quiet,
            });
            calls.len() - 1
        };
        if self.fail_delete_at == Some(call_index) {
            return Err(
                ProviderError::new("DeleteObjects", "scripted delete failure")
                    .with_code("AccessDenied"),
            );
        }

        let failures = objects
            .iter()
            .filter_map(|object| {
                self.rejected_keys
                    .get(&object.key)
                    .map(|code| DeleteFailure {
                        key: object.key.clone(),
                        version_id: object.version_id.clone(),
                        code: Some(code.clone()),
                        message: None,
                    })
            })
            .collect();
        Ok(DeleteReport { failures })
    }
}

/// A single versioned bucket held in memory, listed in `(key, version)` order.
pub struct InMemoryBucket {
    name: String,
    versions: Mutex<BTreeSet<(String, String)>>,
    list_calls: Mutex<usize>,
    delete_calls: Mutex<usize>,
}

impl InMemoryBucket {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: Mutex::new(BTreeSet::new()),
            list_calls: Mutex::new(0),
            delete_calls: Mutex::new(0),
        }
    }

    pub fn put(&self, key: &str, version_id: &str) {
        self.versions
            .lock()
            .expect("poisoned mutex")
            .insert((key.to_string(), version_id.to_string()));
    }

    pub fn keys(&self) -> Vec<String> {
        self.versions
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().expect("poisoned mutex")
    }

    pub fn delete_call_count(&self) -> usize {
        *self.delete_calls.lock().expect("poisoned mutex")
    }

    fn check_bucket(&self, operation: &'static str, bucket: &str) -> Result<(), ProviderError> {
        if bucket == self.name {
            Ok(())
        } else {
            Err(
                ProviderError::new(operation, "The specified bucket does not exist")
                    .with_code("NoSuchBucket"),
            )
        }
    }
}

impl ObjectVersionStore for InMemoryBucket {
    fn list_object_versions(
        &self,
        request: &ListVersionsRequest,
    ) -> Result<VersionPage, ProviderError> {
        *self.list_calls.lock().expect("poisoned mutex") += 1;
        self.check_bucket("ListObjectVersions", &request.bucket)?;

        let max_keys = request
            .max_keys
            .unwrap_or(MAX_KEYS_PER_REQUEST)
            .clamp(1, MAX_KEYS_PER_REQUEST);
        let versions = self.versions.lock().expect("poisoned mutex");
        let mut remaining = versions.iter().filter(|(key, version_id)| {
            key.starts_with(&request.prefix)
                && match (&request.key_marker, &request.version_id_marker) {
                    (Some(key_marker), Some(version_marker)) => {
                        (key, version_id) > (key_marker, version_marker)
                    }
                    (Some(key_marker), None) => key > key_marker,
                    _ => true,
                }
        });

        let entries: Vec<ObjectIdentifier> = remaining
            .by_ref()
            .take(max_keys)
            .map(|(key, version_id)| ObjectIdentifier::new(key.clone(), Some(version_id.as_str())))
            .collect();
        let is_truncated = remaining.next().is_some();
        let last = entries.last().cloned().filter(|_| is_truncated);

        Ok(VersionPage {
            entries,
            is_truncated,
            next_key_marker: last.as_ref().map(|entry| entry.key.clone()),
            next_version_id_marker: last.and_then(|entry| entry.version_id),
        })
    }

    fn delete_objects(
        &self,
        bucket: &str,
        objects: &[ObjectIdentifier],
        _quiet: bool,
    ) -> Result<DeleteReport, ProviderError> {
        *self.delete_calls.lock().expect("poisoned mutex") += 1;
        self.check_bucket("DeleteObjects", bucket)?;

        let mut versions = self.versions.lock().expect("poisoned mutex");
        for object in objects {
            let version_id = object.version_id.clone().unwrap_or_else(|| "null".to_string());
            versions.remove(&(object.key.clone(), version_id));
        }
        Ok(DeleteReport::default())
    }
}

/// Answers every describe call with the same outcome.
pub struct FixedStackStatus {
    outcome: Result<Vec<StackDescription>, ProviderError>,
    calls: Mutex<Vec<String>>,
}

impl FixedStackStatus {
    pub fn with_status(stack_id: &str, status: StackStatus) -> Self {
        Self::from_outcome(Ok(vec![StackDescription {
            stack_id: stack_id.to_string(),
            stack_name: stack_id.to_string(),
            status,
        }]))
    }

    pub fn empty() -> Self {
        Self::from_outcome(Ok(Vec::new()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::from_outcome(Err(error))
    }

    fn from_outcome(outcome: Result<Vec<StackDescription>, ProviderError>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl StackStatusQuery for FixedStackStatus {
    fn describe_stack(&self, stack_id: &str) -> Result<Vec<StackDescription>, ProviderError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(stack_id.to_string());
        self.outcome.clone()
    }
}
