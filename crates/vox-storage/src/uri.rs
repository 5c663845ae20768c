//! `s3://bucket/key` URI parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::{StorageError, StorageResult};

/// A validated S3 object location.
///
/// Malformed URIs (wrong scheme, missing bucket or key) are rejected at
/// parse time, before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub key: String,
}

impl S3Uri {
    /// Parse and validate an `s3://bucket/key` URI.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| StorageError::invalid_uri(uri))?;

        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| StorageError::invalid_uri(uri))?;

        if bucket.is_empty() || key.is_empty() {
            return Err(StorageError::invalid_uri(uri));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl FromStr for S3Uri {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
