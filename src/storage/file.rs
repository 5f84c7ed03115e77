use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use crate::core::Node;
use crate::storage::snapshot::SnapshotStore;
use crate::storage::{CacheBridge, CacheKey};

/// 文件缓存后端：目录下每个 key 一个原子快照文件。
///
/// 文件名 = 清洗后的 key + `name` / `variant` 分段编码的 xxh3。
/// 渲染形式可能撞名（`cat.en` 与 `cat` + `en`），哈希不能基于渲染形式。
pub struct FileCache<R> {
    dir: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> FileCache<R> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        let raw = key.to_string();
        let clean: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir
            .join(format!("{}-{:016x}.hier", clean, key_digest(key)))
    }

    fn store(&self, key: &CacheKey) -> SnapshotStore {
        SnapshotStore::new(self.path_for(key))
    }
}

/// 长度前缀 + 变体标记，保证不同的 `CacheKey` 编码不同。
fn key_digest(key: &CacheKey) -> u64 {
    let mut h = Xxh3::new();
    h.update(&(key.name.len() as u64).to_le_bytes());
    h.update(key.name.as_bytes());
    match &key.variant {
        Some(v) => {
            h.update(&[1]);
            h.update(&(v.len() as u64).to_le_bytes());
            h.update(v.as_bytes());
        }
        None => h.update(&[0]),
    }
    h.digest()
}

impl<R: Serialize + DeserializeOwned> CacheBridge<R> for FileCache<R> {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<Node<R>>>> {
        self.store(key).load_if_valid()
    }

    fn set(&self, key: &CacheKey, nodes: &[Node<R>]) -> anyhow::Result<()> {
        self.store(key).write_atomic(nodes)
    }

    fn delete(&self, key: &CacheKey) -> anyhow::Result<()> {
        self.store(key).remove()
    }
}
