use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::operation::list_object_versions::ListObjectVersionsOutput;
use aws_sdk_s3::types::{Delete, ObjectIdentifier as S3ObjectIdentifier};
use s3_cleanup_core::eraser::{DeleteReport, ObjectVersionStore};
use s3_cleanup_core::error::{DeleteFailure, ProviderError};
use s3_cleanup_core::pagination::{ListVersionsRequest, ObjectIdentifier, VersionPage};

use crate::adapters::sdk_error::provider_error;

/// [`ObjectVersionStore`] backed by the S3 API.
pub struct S3VersionStore {
    client: aws_sdk_s3::Client,
}

impl S3VersionStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectVersionStore for S3VersionStore {
    fn list_object_versions(
        &self,
        request: &ListVersionsRequest,
    ) -> Result<VersionPage, ProviderError> {
        let client = self.client.clone();
        let request = request.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let max_keys = request
                    .max_keys
                    .map(|value| i32::try_from(value).unwrap_or(i32::MAX));
                let prefix = Some(request.prefix).filter(|prefix| !prefix.is_empty());

                client
                    .list_object_versions()
                    .bucket(request.bucket)
                    .set_prefix(prefix)
                    .set_key_marker(request.key_marker)
                    .set_version_id_marker(request.version_id_marker)
                    .set_max_keys(max_keys)
                    .send()
                    .await
                    .map(|output| version_page(&output))
                    .map_err(|error| provider_error("ListObjectVersions", &error))
            })
        })
    }

    fn delete_objects(
        &self,
        bucket: &str,
        objects: &[ObjectIdentifier],
        quiet: bool,
    ) -> Result<DeleteReport, ProviderError> {
        let identifiers = objects
            .iter()
            .map(|object| {
                S3ObjectIdentifier::builder()
                    .key(&object.key)
                    .set_version_id(object.version_id.clone())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| ProviderError::new("DeleteObjects", error.to_string()))?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(quiet)
            .build()
            .map_err(|error| ProviderError::new("DeleteObjects", error.to_string()))?;

        let bucket = bucket.to_string();
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map(|output| delete_report(&output))
                    .map_err(|error| provider_error("DeleteObjects", &error))
            })
        })
    }
}

/// Flatten versions and delete markers into one page. Entries without a key
/// cannot be deleted and are dropped.
pub fn version_page(output: &ListObjectVersionsOutput) -> VersionPage {
    let versions = output
        .versions()
        .iter()
        .filter_map(|version| Some(ObjectIdentifier::new(version.key()?, version.version_id())));
    let delete_markers = output
        .delete_markers()
        .iter()
        .filter_map(|marker| Some(ObjectIdentifier::new(marker.key()?, marker.version_id())));

    VersionPage {
        entries: versions.chain(delete_markers).collect(),
        is_truncated: output.is_truncated().unwrap_or(false),
        next_key_marker: output.next_key_marker().map(str::to_string),
        next_version_id_marker: output.next_version_id_marker().map(str::to_string),
    }
}

pub fn delete_report(output: &DeleteObjectsOutput) -> DeleteReport {
    DeleteReport {
        failures: output
            .errors()
            .iter()
            .map(|error| DeleteFailure {
                key: error.key().unwrap_or_default().to_string(),
                version_id: error.version_id().map(str::to_string),
                code: error.code().map(str::to_string),
                message: error.message().map(str::to_string),
            })
            .collect(),
    }
}
