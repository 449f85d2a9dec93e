//! Cache Tier
//!
//! Bounded, TTL-based key/value caches sitting in front of store reads, with
//! explicit invalidation hooks. Two named tiers are built on one generic
//! primitive:
//!
//! - [`NodeCache`] - node-by-id, node-by-path, children-of, root-list
//! - [`AccessCache`] - access-check decisions per `(user, path)` plus the
//!   per-user accessible-node lists
//!
//! # Consistency Model
//!
//! Each cache is an `RwLock`-guarded map: all reads and writes pass through
//! the lock, so no caller ever observes a half-updated map. Population is
//! read-check / compute-outside-the-lock / insert, which means a burst of
//! concurrent misses on one key may compute the value more than once (no
//! single-flight deduplication) but can never corrupt cache state.
//!
//! # Eviction
//!
//! - **TTL**: entries older than the configured TTL are invisible to `get`
//!   and swept by a background task running on an interval of
//!   `max(ttl / 2, 10s)`. The sweeper holds only a `Weak` reference and
//!   exits once the cache is dropped.
//! - **Capacity**: on insert at capacity, entries are sorted by insertion
//!   time and only the newest `max_size - 1` survive. O(n log n), acceptable
//!   for a bounded `max_size`.

use crate::models::{AccessCheckResult, AccessibleNode, Node};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Separator between the user and path halves of an access-cache key.
/// A unit-separator control byte cannot appear in user ids or paths.
const KEY_SEPARATOR: char = '\u{1f}';

/// Cache sizing and expiry configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held at once.
    pub max_size: usize,
    /// Entry time-to-live.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1024,
            ttl: Duration::from_secs(60),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

type EntryMap<V> = HashMap<String, CacheEntry<V>>;

/// Generic bounded TTL cache keyed by `String`.
pub struct TtlCache<V> {
    entries: Arc<RwLock<EntryMap<V>>>,
    config: CacheConfig,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Create a cache and spawn its background sweep task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: CacheConfig) -> Self {
        let entries: Arc<RwLock<EntryMap<V>>> = Arc::new(RwLock::new(HashMap::new()));
        spawn_sweeper(Arc::downgrade(&entries), config.ttl);
        Self { entries, config }
    }

    /// Get a value if present and younger than the TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.inserted_at.elapsed() <= self.config.ttl)
            .map(|e| e.value.clone())
    }

    /// Insert a value, evicting the oldest entries when at capacity.
    pub async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.config.max_size && !entries.contains_key(&key) {
            let mut by_age: Vec<(String, Instant)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.inserted_at))
                .collect();
            // Newest first; everything past max_size - 1 is evicted
            by_age.sort_by(|a, b| b.1.cmp(&a.1));
            for (old_key, _) in by_age.into_iter().skip(self.config.max_size - 1) {
                entries.remove(&old_key);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove one key.
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove every key matching the predicate.
    pub async fn remove_where<F: Fn(&str) -> bool>(&self, predicate: F) {
        self.entries.write().await.retain(|k, _| !predicate(k));
    }

    /// Drop all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries currently held (including not-yet-swept expired ones).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Periodically sweep expired entries until the owning cache is dropped.
fn spawn_sweeper<V: Send + Sync + 'static>(entries: Weak<RwLock<EntryMap<V>>>, ttl: Duration) {
    let sweep_interval = std::cmp::max(ttl / 2, Duration::from_secs(10));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        // First tick fires immediately; skip it so a fresh cache isn't swept
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(entries) = entries.upgrade() else {
                break;
            };
            let mut map = entries.write().await;
            let before = map.len();
            map.retain(|_, e| e.inserted_at.elapsed() <= ttl);
            let swept = before - map.len();
            if swept > 0 {
                tracing::debug!(swept, remaining = map.len(), "cache sweep removed entries");
            }
        }
    });
}

/// Cached value shape for the node cache: single node or ordered list.
#[derive(Clone)]
pub enum CachedNodes {
    One(Node),
    Many(Vec<Node>),
}

/// Cache for node lookups: by id, by path, children lists, and the root list.
pub struct NodeCache {
    inner: TtlCache<CachedNodes>,
}

impl NodeCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: TtlCache::new(config),
        }
    }

    fn id_key(id: &str) -> String {
        format!("id:{}", id)
    }

    fn path_key(path: &str) -> String {
        format!("path:{}", path)
    }

    fn children_key(parent_id: &str) -> String {
        format!("children:{}", parent_id)
    }

    const ROOTS_KEY: &'static str = "roots";

    pub async fn get_by_id(&self, id: &str) -> Option<Node> {
        match self.inner.get(&Self::id_key(id)).await {
            Some(CachedNodes::One(node)) => Some(node),
            _ => None,
        }
    }

    pub async fn get_by_path(&self, path: &str) -> Option<Node> {
        match self.inner.get(&Self::path_key(path)).await {
            Some(CachedNodes::One(node)) => Some(node),
            _ => None,
        }
    }

    /// Cache a node under both its id and path keys.
    pub async fn put_node(&self, node: &Node) {
        self.inner
            .insert(Self::id_key(&node.id), CachedNodes::One(node.clone()))
            .await;
        self.inner
            .insert(Self::path_key(&node.path), CachedNodes::One(node.clone()))
            .await;
    }

    pub async fn get_children(&self, parent_id: &str) -> Option<Vec<Node>> {
        match self.inner.get(&Self::children_key(parent_id)).await {
            Some(CachedNodes::Many(nodes)) => Some(nodes),
            _ => None,
        }
    }

    pub async fn put_children(&self, parent_id: &str, children: Vec<Node>) {
        self.inner
            .insert(Self::children_key(parent_id), CachedNodes::Many(children))
            .await;
    }

    pub async fn get_roots(&self) -> Option<Vec<Node>> {
        match self.inner.get(Self::ROOTS_KEY).await {
            Some(CachedNodes::Many(nodes)) => Some(nodes),
            _ => None,
        }
    }

    pub async fn put_roots(&self, roots: Vec<Node>) {
        self.inner
            .insert(Self::ROOTS_KEY.to_string(), CachedNodes::Many(roots))
            .await;
    }

    /// Drop the id- and path-keyed entries for one node.
    ///
    /// `path` must be the path under which the node may have been cached;
    /// movers call this once with the old path and once with the new one.
    pub async fn invalidate_node(&self, id: &str, path: &str) {
        self.inner.remove(&Self::id_key(id)).await;
        self.inner.remove(&Self::path_key(path)).await;
    }

    /// Drop a parent's children list (or the root list for `None`).
    pub async fn invalidate_children(&self, parent_id: Option<&str>) {
        match parent_id {
            Some(id) => self.inner.remove(&Self::children_key(id)).await,
            None => self.inner.remove(Self::ROOTS_KEY).await,
        }
    }

    pub async fn clear(&self) {
        self.inner.clear().await;
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }
}

/// Cache for access resolution: full check results per `(user, path)` and
/// accessible-node lists per user.
pub struct AccessCache {
    decisions: TtlCache<AccessCheckResult>,
    accessible: TtlCache<Vec<AccessibleNode>>,
}

impl AccessCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            decisions: TtlCache::new(config.clone()),
            accessible: TtlCache::new(config),
        }
    }

    fn decision_key(user_id: &str, path: &str) -> String {
        format!("{}{}{}", user_id, KEY_SEPARATOR, path)
    }

    /// Cached check result (positive or negative) for a user on a path.
    pub async fn get_decision(&self, user_id: &str, path: &str) -> Option<AccessCheckResult> {
        self.decisions.get(&Self::decision_key(user_id, path)).await
    }

    pub async fn put_decision(&self, user_id: &str, path: &str, result: AccessCheckResult) {
        self.decisions
            .insert(Self::decision_key(user_id, path), result)
            .await;
    }

    pub async fn get_accessible(&self, user_id: &str) -> Option<Vec<AccessibleNode>> {
        self.accessible.get(user_id).await
    }

    pub async fn put_accessible(&self, user_id: &str, nodes: Vec<AccessibleNode>) {
        self.accessible.insert(user_id.to_string(), nodes).await;
    }

    /// Drop every cached decision and the accessible-node list for a user.
    pub async fn invalidate_user(&self, user_id: &str) {
        let prefix = format!("{}{}", user_id, KEY_SEPARATOR);
        self.decisions.remove_where(|k| k.starts_with(&prefix)).await;
        self.accessible.remove(user_id).await;
    }

    /// Drop every user's cached decision for one path. Cannot touch the
    /// per-user accessible lists (the affected users are unknown here); those
    /// age out within the TTL.
    pub async fn invalidate_path(&self, path: &str) {
        let suffix = format!("{}{}", KEY_SEPARATOR, path);
        self.decisions.remove_where(|k| k.ends_with(&suffix)).await;
    }

    pub async fn clear(&self) {
        self.decisions.clear().await;
        self.accessible.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessCheckResult;
    use serde_json::json;

    fn test_config(max_size: usize, ttl_ms: u64) -> CacheConfig {
        CacheConfig {
            max_size,
            ttl: Duration::from_millis(ttl_ms),
        }
    }

    fn make_node(name: &str) -> Node {
        Node::new(name.to_string(), "team".to_string(), None, "", json!({}))
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let cache: TtlCache<i32> = TtlCache::new(test_config(8, 60_000));
        cache.insert("k".to_string(), 7).await;
        assert_eq!(cache.get("k").await, Some(7));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let cache: TtlCache<i32> = TtlCache::new(test_config(8, 20));
        cache.insert("k".to_string(), 7).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_capacity_eviction_keeps_newest() {
        let cache: TtlCache<i32> = TtlCache::new(test_config(3, 60_000));
        cache.insert("a".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("b".to_string(), 2).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("c".to_string(), 3).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("d".to_string(), 4).await;

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.get("a").await, None, "oldest entry must be evicted");
        assert_eq!(cache.get("d").await, Some(4));
    }

    #[tokio::test]
    async fn test_remove_where_prefix() {
        let cache: TtlCache<i32> = TtlCache::new(test_config(8, 60_000));
        cache.insert("u1:a".to_string(), 1).await;
        cache.insert("u1:b".to_string(), 2).await;
        cache.insert("u2:a".to_string(), 3).await;

        cache.remove_where(|k| k.starts_with("u1:")).await;

        assert_eq!(cache.get("u1:a").await, None);
        assert_eq!(cache.get("u1:b").await, None);
        assert_eq!(cache.get("u2:a").await, Some(3));
    }

    #[tokio::test]
    async fn test_node_cache_id_and_path_keys() {
        let cache = NodeCache::new(test_config(16, 60_000));
        let node = make_node("Acme");
        cache.put_node(&node).await;

        assert_eq!(cache.get_by_id(&node.id).await.unwrap().id, node.id);
        assert_eq!(cache.get_by_path("acme").await.unwrap().id, node.id);

        cache.invalidate_node(&node.id, &node.path).await;
        assert!(cache.get_by_id(&node.id).await.is_none());
        assert!(cache.get_by_path("acme").await.is_none());
    }

    #[tokio::test]
    async fn test_access_cache_user_invalidation() {
        let cache = AccessCache::new(test_config(16, 60_000));
        cache
            .put_decision("u1", "acme", AccessCheckResult::denied(None))
            .await;
        cache
            .put_decision("u2", "acme", AccessCheckResult::denied(None))
            .await;

        cache.invalidate_user("u1").await;

        assert!(cache.get_decision("u1", "acme").await.is_none());
        assert!(cache.get_decision("u2", "acme").await.is_some());
    }

    #[tokio::test]
    async fn test_access_cache_path_invalidation_spans_users() {
        let cache = AccessCache::new(test_config(16, 60_000));
        cache
            .put_decision("u1", "acme.eng", AccessCheckResult::denied(None))
            .await;
        cache
            .put_decision("u2", "acme.eng", AccessCheckResult::denied(None))
            .await;
        cache
            .put_decision("u1", "acme", AccessCheckResult::denied(None))
            .await;

        cache.invalidate_path("acme.eng").await;

        assert!(cache.get_decision("u1", "acme.eng").await.is_none());
        assert!(cache.get_decision("u2", "acme.eng").await.is_none());
        assert!(cache.get_decision("u1", "acme").await.is_some());
    }
}
