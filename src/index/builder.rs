use std::collections::HashMap;

use crate::core::{FieldValue, Node, Record};
use crate::error::{HierarchyError, Result};

/// 字段值 -> Ordered Sequence 位置。
pub type PositionIndex = HashMap<FieldValue, usize>;

/// 按登记字段名组织的位置索引集合。
///
/// 字段集合在构建时固定；查询未登记字段返回 `UnregisteredField`。
/// 同一字段出现重复值时后写覆盖（last-write-wins），唯一性由调用方保证。
#[derive(Clone, Debug, Default)]
pub struct Indices {
    by_field: HashMap<String, PositionIndex>,
}

impl Indices {
    pub fn field(&self, name: &str) -> Result<&PositionIndex> {
        self.by_field
            .get(name)
            .ok_or_else(|| HierarchyError::UnregisteredField(name.to_string()))
    }

    pub fn position(&self, name: &str, value: &FieldValue) -> Result<Option<usize>> {
        Ok(self.field(name)?.get(value).copied())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.by_field.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(|k| k.as_str())
    }

    /// 所有索引的 key 总数（用于统计）。
    pub fn total_keys(&self) -> usize {
        self.by_field.values().map(|m| m.len()).sum()
    }
}

/// 单次前向扫描构建全部索引。缓存命中与否都必须调用（索引不落缓存）。
pub fn build_indices<R: Record>(sequence: &[Node<R>], lookup_fields: &[&str]) -> Result<Indices> {
    let mut by_field: HashMap<String, PositionIndex> = lookup_fields
        .iter()
        .map(|f| (f.to_string(), HashMap::with_capacity(sequence.len())))
        .collect();

    for (pos, node) in sequence.iter().enumerate() {
        for (name, index) in by_field.iter_mut() {
            let value = node
                .record
                .field(name)
                .ok_or_else(|| HierarchyError::MissingField {
                    field: name.clone(),
                    position: pos,
                })?;
            index.insert(value, pos);
        }
    }

    for (name, index) in by_field.iter() {
        let dups = sequence.len() - index.len();
        if dups > 0 {
            tracing::warn!(
                "Index '{}': {} duplicate values, later positions win",
                name,
                dups
            );
        }
    }

    Ok(Indices { by_field })
}
