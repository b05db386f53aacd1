//! 属性目录查找缓存
//!
//! 缓存 `ObjectKey -> 属性目录 ID` 的映射，省去每次访问时在
//! xattr 根目录下的按名查找。只缓存存在的目录；目录被删除时必须失效。

use crate::store::{ObjectId, ObjectKey};
use core::num::NonZeroUsize;
use lru::LruCache;
use spin::Mutex;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirCacheStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
}

struct CacheInner {
    cache: LruCache<ObjectKey, ObjectId>,
    stats: DirCacheStats,
}

/// 属性目录缓存
///
/// 容量为 0 时不缓存，所有查询都视为未命中
pub struct XattrDirCache {
    inner: Option<Mutex<CacheInner>>,
}

impl XattrDirCache {
    /// 创建指定容量的缓存
    pub fn new(capacity: usize) -> Self {
        let inner = NonZeroUsize::new(capacity).map(|cap| {
            Mutex::new(CacheInner {
                cache: LruCache::new(cap),
                stats: DirCacheStats::default(),
            })
        });
        Self { inner }
    }

    /// 查询
    pub fn get(&self, key: &ObjectKey) -> Option<ObjectId> {
        let inner = self.inner.as_ref()?;
        let mut inner = inner.lock();
        match inner.cache.get(key).copied() {
            Some(dir) => {
                inner.stats.hits += 1;
                log::trace!("[XATTR] dir cache HIT {}", key);
                Some(dir)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// 插入
    pub fn insert(&self, key: ObjectKey, dir: ObjectId) {
        if let Some(inner) = &self.inner {
            inner.lock().cache.put(key, dir);
        }
    }

    /// 失效
    pub fn invalidate(&self, key: &ObjectKey) {
        if let Some(inner) = &self.inner {
            inner.lock().cache.pop(key);
        }
    }

    /// 清空
    pub fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().cache.clear();
        }
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().cache.len())
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 统计信息
    pub fn stats(&self) -> DirCacheStats {
        self.inner
            .as_ref()
            .map_or(DirCacheStats::default(), |inner| inner.lock().stats)
    }
}
