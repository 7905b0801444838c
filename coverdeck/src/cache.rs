//! Bounded cover store with recency-based eviction.
//!
//! Rendered covers are expensive to produce and hold pixel buffers worth
//! reusing, so the store never frees anything itself: every displaced value
//! is handed back to the caller for release or reuse.

use std::num::NonZeroUsize;

use lru::LruCache;
use smallvec::SmallVec;

/// Identity under which a rendered cover is cached.
pub type CoverKey = i64;

/// Default number of rendered covers kept alive.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Fixed-capacity cover store keyed by [`CoverKey`].
///
/// Lookups via [`CoverCache::get`] deliberately leave recency untouched; only
/// [`CoverCache::touch`] promotes an entry. Nothing is ever freed in place:
/// [`CoverCache::put`], [`CoverCache::discard_oldest`] and
/// [`CoverCache::clear`] all return the covers they displace so the caller
/// can release them or reuse their buffers.
///
/// ## Examples
///
/// ```
/// use coverdeck::cache::CoverCache;
///
/// let mut cache: CoverCache<String> = CoverCache::new(2);
/// assert!(cache.put(1, "a".into()).is_none());
/// assert!(cache.put(2, "b".into()).is_none());
///
/// // Touching 1 makes 2 the eviction victim.
/// cache.touch(1);
/// let displaced = cache.put(3, "c".into());
/// assert_eq!(displaced.as_deref(), Some("b"));
/// ```
pub struct CoverCache<T> {
    entries: LruCache<CoverKey, T>,
}

impl<T> CoverCache<T> {
    /// Creates a cache bounded to `capacity` covers.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(
                NonZeroUsize::new(capacity)
                    .expect("cover cache capacity must be greater than zero"),
            ),
        }
    }

    /// Looks up the cover for `key` without promoting it.
    pub fn get(&self, key: CoverKey) -> Option<&T> {
        self.entries.peek(&key)
    }

    /// Marks `key` as most recently used. Absent keys are ignored.
    pub fn touch(&mut self, key: CoverKey) {
        self.entries.promote(&key);
    }

    /// Inserts or replaces the cover for `key`.
    ///
    /// Returns the displaced cover — the previous one under the same key, or
    /// the least-recently-used entry when the cache was full — which the
    /// caller must release.
    #[must_use]
    pub fn put(&mut self, key: CoverKey, cover: T) -> Option<T> {
        self.entries.push(key, cover).map(|(_, displaced)| displaced)
    }

    /// Removes and returns the least-recently-used cover for buffer reuse.
    ///
    /// Only reclaims once the cache is full; below capacity the next insert
    /// cannot evict, so there is nothing worth sacrificing and `None` is
    /// returned without mutating anything.
    pub fn discard_oldest(&mut self) -> Option<T> {
        if self.entries.len() < self.entries.cap().get() {
            return None;
        }
        self.entries.pop_lru().map(|(_, cover)| cover)
    }

    /// Empties the cache, returning every held cover for disposal.
    #[must_use]
    pub fn clear(&mut self) -> SmallVec<[T; DEFAULT_CACHE_CAPACITY]> {
        let mut drained = SmallVec::new();
        while let Some((_, cover)) = self.entries.pop_lru() {
            drained.push(cover);
        }
        drained
    }

    /// Number of cached covers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a cover for `key` is resident. Does not promote.
    pub fn contains(&self, key: CoverKey) -> bool {
        self.entries.contains(&key)
    }
}
