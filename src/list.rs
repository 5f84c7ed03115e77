use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::core::{Record, Schema};
use crate::index::Hierarchy;
use crate::source::RecordSource;
use crate::storage::{CacheBridge, CacheKey};

/// 带缓存的层级列表：记录来源 + 缓存桥接 + 当前已发布的层级。
///
/// 加载顺序：先读缓存（命中则只重建索引），未命中则从来源物化并回写缓存。
/// 读者通过 `current()` 拿到不可变快照，重建期间不阻塞读（ArcSwap 原子切换）。
pub struct HierarchyList<R> {
    schema: Schema,
    key: CacheKey,
    source: Box<dyn RecordSource<R>>,
    cache: Box<dyn CacheBridge<R>>,
    current: ArcSwapOption<Hierarchy<R>>,
    // 串行化重建；并发 load 只会有一个真正执行
    reload: Mutex<()>,
}

impl<R: Record> HierarchyList<R> {
    pub fn new(
        schema: Schema,
        key: CacheKey,
        source: Box<dyn RecordSource<R>>,
        cache: Box<dyn CacheBridge<R>>,
    ) -> Self {
        Self {
            schema,
            key,
            source,
            cache,
            current: ArcSwapOption::empty(),
            reload: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn current(&self) -> Option<Arc<Hierarchy<R>>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// 已加载则直接返回，否则执行一次 `load`。
    pub fn init(&self) -> anyhow::Result<Arc<Hierarchy<R>>> {
        if let Some(h) = self.current() {
            return Ok(h);
        }
        let _guard = self.reload.lock();
        // 等锁期间可能已被其它调用方加载
        if let Some(h) = self.current() {
            return Ok(h);
        }
        self.load_locked()
    }

    /// 缓存优先加载，未命中回退到来源重建。
    pub fn load(&self) -> anyhow::Result<Arc<Hierarchy<R>>> {
        let _guard = self.reload.lock();
        self.load_locked()
    }

    /// 只尝试缓存。空序列视为未命中。
    pub fn load_from_cache(&self) -> anyhow::Result<Option<Arc<Hierarchy<R>>>> {
        let Some(nodes) = self.cache.get(&self.key)? else {
            tracing::debug!("Cache miss: {}", self.key);
            return Ok(None);
        };
        if nodes.is_empty() {
            tracing::debug!("Cache entry {} is empty, treating as miss", self.key);
            return Ok(None);
        }
        let h = Arc::new(Hierarchy::from_sequence(nodes, self.schema.clone())?);
        tracing::info!("Loaded hierarchy {} from cache: {} nodes", self.key, h.len());
        self.current.store(Some(h.clone()));
        Ok(Some(h))
    }

    /// 无视缓存，从来源全量物化，回写缓存后发布。
    pub fn load_from_source(&self) -> anyhow::Result<Arc<Hierarchy<R>>> {
        let _guard = self.reload.lock();
        self.rebuild_locked()
    }

    /// 删除缓存中的序列（不影响已发布的层级）。
    pub fn delete_cache(&self) -> anyhow::Result<()> {
        self.cache.delete(&self.key)?;
        tracing::info!("Cache entry {} deleted", self.key);
        Ok(())
    }

    /// 删除缓存并撤下当前层级，下次 `init` 会重新加载。
    pub fn invalidate(&self) -> anyhow::Result<()> {
        let _guard = self.reload.lock();
        self.cache.delete(&self.key)?;
        self.current.store(None);
        Ok(())
    }

    fn load_locked(&self) -> anyhow::Result<Arc<Hierarchy<R>>> {
        if let Some(h) = self.load_from_cache()? {
            return Ok(h);
        }
        self.rebuild_locked()
    }

    fn rebuild_locked(&self) -> anyhow::Result<Arc<Hierarchy<R>>> {
        let records = self.source.fetch_records()?;
        let h = Hierarchy::build(records, self.schema.clone())?;
        self.cache.set(&self.key, h.nodes())?;
        let h = Arc::new(h);
        self.current.store(Some(h.clone()));
        Ok(h)
    }
}
