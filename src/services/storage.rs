//! Object storage service traits.

use crate::error::CloudResult;
use crate::pagination::ResultList;
use crate::resources::{Bucket, BucketObject};
use crate::services::ResourceService;

/// Buckets are identified by name.
pub trait BucketService: ResourceService<Bucket> {
    /// # Errors
    ///
    /// `InvalidName` for a bad bucket name, `DuplicateResource` if it exists.
    fn create(&self, name: &str) -> CloudResult<Bucket>;

    /// # Errors
    ///
    /// Returns any provider failure, such as deleting a non-empty bucket.
    fn delete(&self, name: &str) -> CloudResult<bool>;

    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> CloudResult<BucketObject>;

    /// Object contents; `Ok(None)` if the bucket or object is missing.
    ///
    /// # Errors
    ///
    /// Returns any provider failure.
    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Option<Vec<u8>>>;

    /// One page of objects whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bucket does not exist.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> CloudResult<ResultList<BucketObject>>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete_object(&self, bucket: &str, key: &str) -> CloudResult<bool>;
}

pub trait StorageService: Send + Sync {
    fn buckets(&self) -> &dyn BucketService;
}
