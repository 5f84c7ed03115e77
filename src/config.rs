use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::Schema;
use crate::storage::{CacheBridge, CacheKey, FileCache, MemoryCache, NullCache};

/// 运行配置（TOML）
///
/// ```toml
/// [schema]
/// id_field = "id"
/// parent_field = "p"
/// level_field = "l"
/// root = 0
/// lookup_fields = ["a"]
///
/// [cache]
/// backend = "file"
/// dir = "/var/cache/hier-index"
/// name = "categories"
/// variant = "en"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema: Schema,
    pub cache: CacheConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    None,
    Memory,
    #[default]
    File,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// 文件后端目录；缺省为 `<cache_dir>/hier-index`
    pub dir: Option<PathBuf>,
    pub name: String,
    pub variant: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            dir: None,
            name: "hierarchy".to_string(),
            variant: None,
        }
    }
}

impl CacheConfig {
    pub fn key(&self) -> CacheKey {
        match &self.variant {
            Some(v) => CacheKey::with_variant(&self.name, v),
            None => CacheKey::new(&self.name),
        }
    }

    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// 按配置选择缓存后端
    pub fn build<R>(&self) -> Box<dyn CacheBridge<R>>
    where
        R: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        match self.backend {
            CacheBackend::None => Box::new(NullCache),
            CacheBackend::Memory => Box::new(MemoryCache::<R>::new()),
            CacheBackend::File => Box::new(FileCache::<R>::new(self.resolved_dir())),
        }
    }
}

pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hier-index")
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {:?}: {}", path, e))?;
        let cfg: Config = toml::from_str(&raw)?;
        cfg.schema.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Item, Node};

    #[test]
    fn parse_full_config() {
        let cfg: Config = toml::from_str(
            r#"
            [schema]
            parent_field = "p"
            level_field = "l"
            lookup_fields = ["a"]

            [cache]
            backend = "memory"
            name = "categories"
            variant = "en"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schema.parent_field, "p");
        assert_eq!(cfg.schema.root, FieldValue::Int(0));
        assert_eq!(cfg.cache.backend, CacheBackend::Memory);
        assert_eq!(cfg.cache.key().to_string(), "categories.en");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.schema.id_field, "id");
        assert_eq!(cfg.cache.backend, CacheBackend::File);
        assert_eq!(cfg.cache.key(), CacheKey::new("hierarchy"));
        assert!(cfg.cache.resolved_dir().ends_with("hier-index"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let res: Result<Config, _> = toml::from_str("[cache]\nbackend = \"redis\"");
        assert!(res.is_err());
    }

    #[test]
    fn built_backend_follows_config() {
        let cfg = CacheConfig {
            backend: CacheBackend::None,
            ..CacheConfig::default()
        };
        let cache = cfg.build::<Item>();
        cache
            .set(&cfg.key(), &[Node::new(0, Item::new().with("id", 1))])
            .unwrap();
        assert!(cache.get(&cfg.key()).unwrap().is_none());

        let cfg = CacheConfig {
            backend: CacheBackend::Memory,
            ..CacheConfig::default()
        };
        let cache = cfg.build::<Item>();
        cache
            .set(&cfg.key(), &[Node::new(0, Item::new().with("id", 1))])
            .unwrap();
        assert!(cache.get(&cfg.key()).unwrap().is_some());
    }
}
