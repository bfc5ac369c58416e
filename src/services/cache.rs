// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process cache with a fixed time-to-live per entry.
//!
//! Shared across requests within one instance. Expired entries are dropped
//! lazily on access and by [`TtlCache::purge_expired`].

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Mutate the value in place (starting from `init` when absent or stale)
    /// and restart its lifetime.
    pub fn update<F>(&self, key: K, init: V, f: F)
    where
        F: FnOnce(&mut V),
    {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert_with(|| Entry {
            value: init.clone(),
            expires_at: now + self.ttl,
        });
        if entry.expires_at <= now {
            entry.value = init;
        }
        f(&mut entry.value);
        entry.expires_at = now + self.ttl;
    }

    pub fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Remove every entry whose key matches.
    pub fn remove_where<F>(&self, mut pred: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.entries.retain(|k, _| !pred(k));
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
