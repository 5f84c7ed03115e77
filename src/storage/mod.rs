pub mod file;
pub mod memory;
pub mod snapshot;

use std::fmt;

use crate::core::Node;

pub use file::FileCache;
pub use memory::MemoryCache;
pub use snapshot::SnapshotStore;

/// 缓存 key：逻辑结构名 + 可选变体（如语言）。
///
/// 渲染形式：`name` 或 `name.variant`，只用于日志；后端按字段区分 key。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub variant: Option<String>,
}

impl CacheKey {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variant: None,
        }
    }

    pub fn with_variant(name: &str, variant: &str) -> Self {
        Self {
            name: name.to_string(),
            variant: Some(variant.to_string()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{}.{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Ordered Sequence 缓存桥接（内存 / 文件 / 分布式后端的统一接口）。
///
/// ## 契约
/// - `get` 未命中返回 `Ok(None)`；损坏的缓存内容也按未命中处理
/// - 只有后端本身不可用（IO 等）才返回 Err，由构建调用方决定如何处理
/// - 只缓存序列，索引永不落缓存
pub trait CacheBridge<R>: Send + Sync {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<Node<R>>>>;
    fn set(&self, key: &CacheKey, nodes: &[Node<R>]) -> anyhow::Result<()>;
    fn delete(&self, key: &CacheKey) -> anyhow::Result<()>;
}

/// 永远未命中的后端（禁用缓存）
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCache;

impl<R> CacheBridge<R> for NullCache {
    fn get(&self, _key: &CacheKey) -> anyhow::Result<Option<Vec<Node<R>>>> {
        Ok(None)
    }

    fn set(&self, _key: &CacheKey, _nodes: &[Node<R>]) -> anyhow::Result<()> {
        Ok(())
    }

    fn delete(&self, _key: &CacheKey) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 按变体批量删除缓存（例如所有语言版本）。
pub fn delete_cache_for_variants<R>(
    cache: &dyn CacheBridge<R>,
    name: &str,
    variants: &[String],
) -> anyhow::Result<()> {
    for v in variants {
        let key = CacheKey::with_variant(name, v);
        cache.delete(&key)?;
        tracing::debug!("Cache entry {} deleted", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Item;

    #[test]
    fn key_renders_with_optional_variant() {
        assert_eq!(CacheKey::new("categories").to_string(), "categories");
        assert_eq!(
            CacheKey::with_variant("categories", "en").to_string(),
            "categories.en"
        );
    }

    #[test]
    fn null_cache_always_misses() {
        let cache = NullCache;
        let key = CacheKey::new("x");
        CacheBridge::<Item>::set(&cache, &key, &[Node::new(0, Item::new())]).unwrap();
        assert!(CacheBridge::<Item>::get(&cache, &key).unwrap().is_none());
    }

    #[test]
    fn delete_for_variants_only_touches_listed_variants() {
        let cache = MemoryCache::<Item>::new();
        let nodes = vec![Node::new(0, Item::new().with("id", 1))];
        for v in ["en", "ru", "de"] {
            cache
                .set(&CacheKey::with_variant("cat", v), &nodes)
                .unwrap();
        }
        delete_cache_for_variants(&cache, "cat", &["en".to_string(), "ru".to_string()])
            .unwrap();
        assert!(cache.get(&CacheKey::with_variant("cat", "en")).unwrap().is_none());
        assert!(cache.get(&CacheKey::with_variant("cat", "ru")).unwrap().is_none());
        assert!(cache.get(&CacheKey::with_variant("cat", "de")).unwrap().is_some());
    }
}
