//! Cache read-through layer (spec §4.5): fingerprint a composed query,
//! probe a pluggable [`CacheProvider`] before hitting the driver, store the
//! result under the same fingerprint on miss.
//!
//! The teacher has no cache layer to generalize from; this module is
//! grounded in the wider pack's fingerprint/cache-key conventions (a SHA-256
//! digest over composed SQL + canonical arg strings + scope tag) rather than
//! any one teacher file. DML does not invalidate entries — staleness is
//! bounded by TTL only, per spec; callers needing stronger consistency call
//! `delete`/`clear` explicitly.

mod fingerprint;
pub mod local;

pub use fingerprint::fingerprint;

use crate::error::DbResult;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// A cached payload: tag byte + bytes, so a provider that only deals in raw
/// bytes (a remote KV store) round-trips without loss, per spec.md §4.5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    bytes: Vec<u8>,
}

/// Tag byte identifying the payload encoding. Only one exists today
/// (JSON), but the tag keeps the wire format extensible without a version
/// bump to every provider.
const TAG_JSON: u8 = 1;

impl CachedValue {
    pub fn encode<T: Serialize>(value: &T) -> DbResult<Self> {
        let mut bytes = vec![TAG_JSON];
        bytes.extend(serde_json::to_vec(value).map_err(|e| crate::error::DbError::Serialization(e.to_string()))?);
        Ok(Self { bytes })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> DbResult<T> {
        match self.bytes.split_first() {
            Some((&TAG_JSON, payload)) => {
                serde_json::from_slice(payload).map_err(|e| crate::error::DbError::Serialization(e.to_string()))
            }
            Some((tag, _)) => Err(crate::error::DbError::Serialization(format!("unknown cache payload tag {tag}"))),
            None => Err(crate::error::DbError::Serialization("empty cache payload".into())),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Abstract cache provider (spec §4.5). Implementations store opaque
/// [`CachedValue`] blobs keyed by fingerprint; TTL expiry is the provider's
/// responsibility, not the caller's.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    async fn get(&self, key: &str) -> DbResult<Option<CachedValue>>;
    async fn set(&self, key: &str, value: CachedValue, ttl: Duration) -> DbResult<()>;
    async fn delete(&self, key: &str) -> DbResult<()>;
    async fn clear(&self) -> DbResult<()>;
}

/// Run `query` through `provider` under `key`, falling through to the
/// database on a miss or on any cache error (spec: "cache failures are
/// swallowed and logged at warn, the query falls through").
///
/// `query` is only invoked on a miss, so callers should defer the actual
/// driver round-trip into the closure.
pub async fn read_through<T, F, Fut>(
    provider: &dyn CacheProvider,
    key: &str,
    ttl: Duration,
    query: F,
) -> DbResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = DbResult<T>>,
{
    match provider.get(key).await {
        Ok(Some(cached)) => match cached.decode::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => tracing::warn!(error = %e, key, "cache payload decode failed, falling through"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, key, "cache read failed, falling through"),
    }

    let value = query().await?;
    if let Ok(encoded) = CachedValue::encode(&value) {
        if let Err(e) = provider.set(key, encoded, ttl).await {
            tracing::warn!(error = %e, key, "cache write failed");
        }
    }
    Ok(value)
}
