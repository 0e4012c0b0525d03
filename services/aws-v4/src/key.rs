//! Signing key derivation and caching.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;
use std::sync::RwLock;

use awsign_core::hash::hmac_sha256;
use awsign_core::time::Clock;
use awsign_core::time::SigningTime;
use awsign_core::time::SystemClock;
use chrono::NaiveDate;
use log::debug;

use crate::constants::AWS4_REQUEST;

/// Derive the signing key scoped to `(secret, short_date, region, service)`.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, short_date)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
pub fn derive_signing_key(secret: &str, service: &str, region: &str, short_date: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), short_date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}

/// DeriveKey computes signing keys on cache misses.
///
/// Implementations must be pure: the same inputs always yield the same key.
pub trait DeriveKey: Debug + Send + Sync + 'static {
    /// Derive the signing key.
    fn derive_key(&self, secret: &str, service: &str, region: &str, short_date: &str) -> Vec<u8>;
}

/// HmacKeyDeriver derives keys via [`derive_signing_key`].
#[derive(Debug, Copy, Clone, Default)]
pub struct HmacKeyDeriver;

impl DeriveKey for HmacKeyDeriver {
    fn derive_key(&self, secret: &str, service: &str, region: &str, short_date: &str) -> Vec<u8> {
        derive_signing_key(secret, service, region, short_date)
    }
}

#[derive(Clone)]
struct CacheEntry {
    key: Arc<[u8]>,
    created: NaiveDate,
}

/// DerivedKeyCache memoizes signing keys per
/// `access_key_id/short_date/region/service`.
///
/// An entry is only valid on the UTC day its clock created it. Stale entries
/// are treated as missing, and every miss prunes them from the map.
///
/// Concurrent misses for the same key may derive twice; the last insert wins,
/// which is fine because derivation is deterministic.
pub struct DerivedKeyCache {
    values: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    deriver: Arc<dyn DeriveKey>,
}

impl Debug for DerivedKeyCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyCache")
            .field("len", &self.len())
            .field("clock", &self.clock)
            .field("deriver", &self.deriver)
            .finish()
    }
}

impl Default for DerivedKeyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivedKeyCache {
    /// Create a new cache reading the system clock.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            deriver: Arc::new(HmacKeyDeriver),
        }
    }

    /// Use given clock to decide which entries are stale.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Use given deriver on cache misses.
    pub fn with_deriver(mut self, deriver: impl DeriveKey) -> Self {
        self.deriver = Arc::new(deriver);
        self
    }

    /// Get the signing key for given scope, deriving it on miss.
    pub fn get(
        &self,
        access_key_id: &str,
        secret: &str,
        service: &str,
        region: &str,
        time: &SigningTime,
    ) -> Arc<[u8]> {
        let cache_key = format!(
            "{access_key_id}/{}/{region}/{service}",
            time.short_date()
        );
        let today = self.clock.now().date_naive();

        if let Some(key) = self.lookup(&cache_key, today) {
            return key;
        }

        debug!(
            "derived key cache miss for scope {}/{region}/{service}",
            time.short_date()
        );
        let key: Arc<[u8]> = self
            .deriver
            .derive_key(secret, service, region, time.short_date())
            .into();
        self.store(cache_key, key.clone(), today);
        key
    }

    /// Number of cached entries, stale ones included.
    pub fn len(&self) -> usize {
        self.values.read().expect("lock poisoned").len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, cache_key: &str, today: NaiveDate) -> Option<Arc<[u8]>> {
        let values = self.values.read().expect("lock poisoned");
        values
            .get(cache_key)
            .filter(|entry| entry.created == today)
            .map(|entry| entry.key.clone())
    }

    fn store(&self, cache_key: String, key: Arc<[u8]>, today: NaiveDate) {
        let mut values = self.values.write().expect("lock poisoned");

        let before = values.len();
        values.retain(|_, entry| entry.created == today);
        if values.len() != before {
            debug!(
                "derived key cache pruned {} stale entries",
                before - values.len()
            );
        }

        values.insert(
            cache_key,
            CacheEntry {
                key,
                created: today,
            },
        );
    }
}
