use serde::{Deserialize, Serialize};

use crate::core::record::Item;

/// Ordered Sequence 中的一项：记录 + 注入的层级。
///
/// 根的直接子节点 level = 0，每下降一层 +1。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node<R> {
    pub level: u32,
    pub record: R,
}

impl<R> Node<R> {
    pub fn new(level: u32, record: R) -> Self {
        Self { level, record }
    }
}

impl Node<Item> {
    /// 渲染为 JSON 对象，level 以 `level_field` 为名注入（如 `level` 或 `l`）。
    pub fn to_json(&self, level_field: &str) -> serde_json::Value {
        let mut obj = serde_json::Map::with_capacity(self.record.0.len() + 1);
        for (k, v) in self.record.0.iter() {
            obj.insert(k.clone(), v.to_json());
        }
        obj.insert(level_field.to_string(), serde_json::Value::from(self.level));
        serde_json::Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_injects_level_under_configured_name() {
        let node = Node::new(2, Item::new().with("id", 7).with("a", "shoes"));
        let v = node.to_json("l");
        assert_eq!(v["id"], 7);
        assert_eq!(v["a"], "shoes");
        assert_eq!(v["l"], 2);
        assert!(v.get("level").is_none());
    }
}
