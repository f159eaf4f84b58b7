//! Object storage resources.

use crate::resources::resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

resource!(Bucket, named);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketObject {
    /// Object key; unique within its bucket.
    pub id: String,
    pub name: String,
    pub bucket: String,
    pub size: u64,
    /// Hex SHA-256 of the object contents.
    pub checksum: String,
    /// Seconds since the Unix epoch.
    pub last_modified: u64,
}

resource!(BucketObject, named);
