use dashmap::DashMap;

use crate::core::Node;
use crate::storage::{CacheBridge, CacheKey};

/// 进程内缓存后端（DashMap 实现），按 `CacheKey` 本身存放序列副本。
pub struct MemoryCache<R> {
    inner: DashMap<CacheKey, Vec<Node<R>>>,
}

impl<R> MemoryCache<R> {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<R> Default for MemoryCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone + Send + Sync> CacheBridge<R> for MemoryCache<R> {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<Node<R>>>> {
        Ok(self.inner.get(key).map(|e| e.value().clone()))
    }

    fn set(&self, key: &CacheKey, nodes: &[Node<R>]) -> anyhow::Result<()> {
        self.inner.insert(key.clone(), nodes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.inner.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Item;

    #[test]
    fn set_get_delete() {
        let cache = MemoryCache::<Item>::new();
        let key = CacheKey::with_variant("cat", "en");
        assert!(cache.get(&key).unwrap().is_none());

        let nodes = vec![
            Node::new(0, Item::new().with("id", 1)),
            Node::new(1, Item::new().with("id", 2)),
        ];
        cache.set(&key, &nodes).unwrap();
        assert_eq!(cache.get(&key).unwrap().unwrap(), nodes);
        assert_eq!(cache.len(), 1);

        // 其它变体互不影响
        assert!(cache.get(&CacheKey::with_variant("cat", "ru")).unwrap().is_none());

        cache.delete(&key).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn dotted_name_does_not_alias_variant_key() {
        let cache = MemoryCache::<Item>::new();
        let with_variant = CacheKey::with_variant("cat", "en");
        let dotted = CacheKey::new("cat.en");
        // 两者渲染相同，但是不同的 key
        assert_eq!(with_variant.to_string(), dotted.to_string());

        cache
            .set(&with_variant, &[Node::new(0, Item::new().with("id", 1))])
            .unwrap();
        assert!(cache.get(&dotted).unwrap().is_none());

        cache
            .set(&dotted, &[Node::new(0, Item::new().with("id", 2))])
            .unwrap();
        assert_eq!(cache.len(), 2);
        let kept = cache.get(&with_variant).unwrap().unwrap();
        assert_eq!(kept[0].record.get("id"), Some(&crate::core::FieldValue::Int(1)));
    }
}
