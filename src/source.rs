use std::path::{Path, PathBuf};

use crate::core::Item;

/// 原始扁平记录来源（数据库查询、文件、远端接口……）。
///
/// 返回顺序即兄弟节点的最终顺序（物化保持输入顺序）。
pub trait RecordSource<R>: Send + Sync {
    fn fetch_records(&self) -> anyhow::Result<Vec<R>>;
}

impl<R: Clone + Send + Sync> RecordSource<R> for Vec<R> {
    fn fetch_records(&self) -> anyhow::Result<Vec<R>> {
        Ok(self.clone())
    }
}

impl<R, F> RecordSource<R> for F
where
    F: Fn() -> anyhow::Result<Vec<R>> + Send + Sync,
{
    fn fetch_records(&self) -> anyhow::Result<Vec<R>> {
        self()
    }
}

/// 从 JSON 文件读取记录：顶层必须是对象数组。
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(raw: &str) -> anyhow::Result<Vec<Item>> {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(raw)?;
        Ok(rows.into_iter().map(Item::from_json_object).collect())
    }
}

impl RecordSource<Item> for JsonFileSource {
    fn fetch_records(&self) -> anyhow::Result<Vec<Item>> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| anyhow::anyhow!("failed to read records {:?}: {}", self.path, e))?;
        let items = Self::parse(&raw)?;
        tracing::debug!("Fetched {} records from {:?}", items.len(), self.path);
        Ok(items)
    }
}
