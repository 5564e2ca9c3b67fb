//! Lazy paging over `ListObjectVersions`.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::eraser::ObjectVersionStore;
use crate::error::{DeletionPhase, EraseError};

/// Upper bound S3 accepts for `max-keys` and for one `DeleteObjects` batch.
pub const MAX_KEYS_PER_REQUEST: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    pub key: String,
    pub version_id: Option<String>,
}

impl ObjectIdentifier {
    pub fn new(key: impl Into<String>, version_id: Option<&str>) -> Self {
        Self {
            key: key.into(),
            version_id: version_id.map(str::to_string),
        }
    }
}

/// One listing page. Entries cover both object versions and delete markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub entries: Vec<ObjectIdentifier>,
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVersionsRequest {
    pub bucket: String,
    pub prefix: String,
    pub key_marker: Option<String>,
    pub version_id_marker: Option<String>,
    pub max_keys: Option<usize>,
}

impl ListVersionsRequest {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            key_marker: None,
            version_id_marker: None,
            max_keys: None,
        }
    }
}

enum Cursor {
    Start,
    Resume {
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    },
    Exhausted,
}

/// Pages of a version listing, fetched one at a time.
///
/// The sequence ends after the first page with `is_truncated == false` or
/// after the first error; it cannot be restarted.
pub struct VersionPages<'a, S: ?Sized> {
    store: &'a S,
    request: ListVersionsRequest,
    cursor: Cursor,
}

impl<'a, S> VersionPages<'a, S>
where
    S: ObjectVersionStore + ?Sized,
{
    pub fn new(store: &'a S, request: ListVersionsRequest) -> Self {
        Self {
            store,
            request,
            cursor: Cursor::Start,
        }
    }

    fn inconsistent(&self) -> EraseError {
        EraseError::InconsistentPage {
            bucket: self.request.bucket.clone(),
            prefix: self.request.prefix.clone(),
        }
    }
}

impl<S> Iterator for VersionPages<'_, S>
where
    S: ObjectVersionStore + ?Sized,
{
    type Item = Result<VersionPage, EraseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Exhausted => return None,
            Cursor::Start => {}
            Cursor::Resume {
                key_marker,
                version_id_marker,
            } => {
                self.request.key_marker = key_marker;
                self.request.version_id_marker = version_id_marker;
            }
        }

        let page = match self.store.list_object_versions(&self.request) {
            Ok(page) => page,
            Err(source) => {
                return Some(Err(EraseError::Provider {
                    bucket: self.request.bucket.clone(),
                    phase: DeletionPhase::ListVersions,
                    source,
                }));
            }
        };

        if page.is_truncated {
            let no_markers = page.next_key_marker.is_none() && page.next_version_id_marker.is_none();
            let no_progress = page.next_key_marker == self.request.key_marker
                && page.next_version_id_marker == self.request.version_id_marker;
            if page.entries.is_empty() || no_markers || no_progress {
                return Some(Err(self.inconsistent()));
            }
            self.cursor = Cursor::Resume {
                key_marker: page.next_key_marker.clone(),
                version_id_marker: page.next_version_id_marker.clone(),
            };
        }

        Some(Ok(page))
    }
}

impl<S> FusedIterator for VersionPages<'_, S> where S: ObjectVersionStore + ?Sized {}
