use super::{Paging, Shared, StoredBucket, now_secs, paginate};
use crate::config::BridgeConfig;
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::naming;
use crate::pagination::{ResultList, resolve_limit};
use crate::resources::{Bucket, BucketObject};
use crate::services::{BucketService, ResourceService, StorageService};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct MockStorageService {
    buckets: MockBucketService,
}

impl MockStorageService {
    pub(crate) const fn new(shared: Arc<Shared>) -> Self {
        Self {
            buckets: MockBucketService { shared },
        }
    }
}

impl StorageService for MockStorageService {
    fn buckets(&self) -> &dyn BucketService {
        &self.buckets
    }
}

/// A stored object: contents plus last-modified time.
pub(crate) struct StoredObject {
    pub(crate) data: Vec<u8>,
    pub(crate) checksum: String,
    pub(crate) last_modified: u64,
}

impl StoredObject {
    fn describe(&self, bucket: &str, key: &str) -> BucketObject {
        BucketObject {
            id: key.to_string(),
            name: key.to_string(),
            bucket: bucket.to_string(),
            size: self.data.len() as u64,
            checksum: self.checksum.clone(),
            last_modified: self.last_modified,
        }
    }
}

pub struct MockBucketService {
    shared: Arc<Shared>,
}

impl ResourceService<Bucket> for MockBucketService {
    fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    fn get(&self, id: &str) -> CloudResult<Option<Bucket>> {
        self.shared.check_fault("buckets.get")?;
        Ok(self
            .shared
            .cloud()
            .buckets
            .get(id)
            .map(|stored| stored.bucket.clone()))
    }

    fn list(&self, limit: Option<usize>, marker: Option<&str>) -> CloudResult<ResultList<Bucket>> {
        self.shared.check_fault("buckets.list")?;
        let limit = resolve_limit(limit, &self.shared.config);
        let buckets = self
            .shared
            .cloud()
            .buckets
            .values()
            .map(|stored| stored.bucket.clone())
            .collect();
        Ok(paginate(Paging::Client, buckets, limit, marker))
    }
}

impl BucketService for MockBucketService {
    fn create(&self, name: &str) -> CloudResult<Bucket> {
        self.shared.check_fault("buckets.create")?;
        naming::assert_valid_bucket_name(name)?;

        let mut cloud = self.shared.cloud();
        if cloud.buckets.contains_key(name) {
            return Err(CloudError::duplicate("Bucket", name));
        }
        let bucket = Bucket {
            id: name.to_string(),
            name: name.to_string(),
            created_at: now_secs(),
        };
        cloud.buckets.insert(
            name.to_string(),
            StoredBucket {
                bucket: bucket.clone(),
                objects: BTreeMap::new(),
            },
        );
        tracing::debug!(name, "created bucket");
        Ok(bucket)
    }

    fn delete(&self, name: &str) -> CloudResult<bool> {
        self.shared.check_fault("buckets.delete")?;
        let mut cloud = self.shared.cloud();
        let Some(stored) = cloud.buckets.get(name) else {
            return Ok(false);
        };
        if !stored.objects.is_empty() {
            return Err(CloudError::new(
                ErrorKind::Provider,
                format!(
                    "Bucket {name} is not empty ({} objects)",
                    stored.objects.len()
                ),
            ));
        }
        cloud.buckets.remove(name);
        tracing::debug!(name, "deleted bucket");
        Ok(true)
    }

    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> CloudResult<BucketObject> {
        self.shared.check_fault("buckets.put_object")?;
        if key.is_empty() {
            return Err(CloudError::invalid_value("Object key must not be empty"));
        }

        let mut cloud = self.shared.cloud();
        let stored = cloud
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| CloudError::not_found("Bucket", bucket))?;

        let object = StoredObject {
            data: data.to_vec(),
            checksum: hex::encode(Sha256::digest(data)),
            last_modified: now_secs(),
        };
        let described = object.describe(bucket, key);
        stored.objects.insert(key.to_string(), object);
        tracing::debug!(bucket, key, size = described.size, "stored object");
        Ok(described)
    }

    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Option<Vec<u8>>> {
        self.shared.check_fault("buckets.get_object")?;
        Ok(self
            .shared
            .cloud()
            .buckets
            .get(bucket)
            .and_then(|stored| stored.objects.get(key))
            .map(|object| object.data.clone()))
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> CloudResult<ResultList<BucketObject>> {
        self.shared.check_fault("buckets.list_objects")?;
        let limit = resolve_limit(limit, &self.shared.config);
        let cloud = self.shared.cloud();
        let stored = cloud
            .buckets
            .get(bucket)
            .ok_or_else(|| CloudError::not_found("Bucket", bucket))?;

        let objects = stored
            .objects
            .iter()
            .filter(|(key, _)| prefix.is_none_or(|prefix| key.starts_with(prefix)))
            .map(|(key, object)| object.describe(bucket, key))
            .collect();
        Ok(paginate(Paging::ServerByKey, objects, limit, marker))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> CloudResult<bool> {
        self.shared.check_fault("buckets.delete_object")?;
        let removed = self
            .shared
            .cloud()
            .buckets
            .get_mut(bucket)
            .is_some_and(|stored| stored.objects.remove(key).is_some());
        if removed {
            tracing::debug!(bucket, key, "deleted object");
        }
        Ok(removed)
    }
}
