use log::debug;
use serde::Serialize;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::{City, FetchMode, FetchReport};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Cache key: the fetch inputs, serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey(String);

#[derive(Serialize)]
struct KeyParts<'a> {
    cities: &'a [City],
    mode: FetchMode,
}

impl FetchKey {
    pub fn new(cities: &[City], mode: FetchMode) -> Self {
        // Serializing plain data with derived impls cannot fail.
        let raw = serde_json::to_string(&KeyParts { cities, mode }).unwrap_or_default();
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    report: FetchReport,
    expires_at: Instant,
}

/// Time-boxed memo of fetch reports, owned by whoever drives the fetches.
#[derive(Debug, Clone)]
pub struct FetchCache {
    ttl: Duration,
    entries: HashMap<FetchKey, CacheEntry>,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: HashMap::new() }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &FetchKey) -> Option<&FetchReport> {
        self.get_at(key, Instant::now())
    }

    /// Look up `key` as of `now`; expired entries are treated as absent.
    pub fn get_at(&self, key: &FetchKey, now: Instant) -> Option<&FetchReport> {
        match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(&entry.report),
            Some(_) => {
                debug!("cache entry expired");
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: FetchKey, report: FetchReport) {
        self.insert_at(key, report, Instant::now());
    }

    pub fn insert_at(&mut self, key: FetchKey, report: FetchReport, now: Instant) {
        self.entries.retain(|_, e| now < e.expires_at);
        self.entries.insert(key, CacheEntry { report, expires_at: now + self.ttl });
    }

    pub fn invalidate(&mut self, key: &FetchKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop everything; the next fetch goes to the network.
    pub fn invalidate_all(&mut self) {
        debug!("invalidating {} cached fetch(es)", self.entries.len());
        self.entries.clear();
    }
}
