use std::fmt;

use crate::core::Node;
use crate::index::Indices;

/// 层级结构统计（一次前向扫描得出）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HierarchyStats {
    /// 序列中的节点总数
    pub nodes: usize,
    /// level 0 节点数
    pub roots: usize,
    /// 无后代的节点数
    pub leaves: usize,
    /// 最大 level（空序列为 0）
    pub max_depth: u32,
    /// 每一层的节点数，下标即 level
    pub per_level: Vec<usize>,
    /// 已登记的查找字段（排序后）
    pub lookup_fields: Vec<String>,
    /// 全部索引 key 数
    pub indexed_keys: usize,
}

impl HierarchyStats {
    pub fn collect<R>(nodes: &[Node<R>], indices: &Indices) -> Self {
        let mut stats = HierarchyStats {
            nodes: nodes.len(),
            ..Default::default()
        };

        for (i, node) in nodes.iter().enumerate() {
            let level = node.level as usize;
            if stats.per_level.len() <= level {
                stats.per_level.resize(level + 1, 0);
            }
            stats.per_level[level] += 1;
            stats.max_depth = stats.max_depth.max(node.level);

            // 前序序列中：下一项 level 更深才说明有后代
            let has_child = nodes
                .get(i + 1)
                .map(|next| next.level > node.level)
                .unwrap_or(false);
            if !has_child {
                stats.leaves += 1;
            }
        }
        stats.roots = stats.per_level.first().copied().unwrap_or(0);

        let mut fields: Vec<String> = indices.fields().map(|f| f.to_string()).collect();
        fields.sort();
        stats.lookup_fields = fields;
        stats.indexed_keys = indices.total_keys();
        stats
    }
}

impl fmt::Display for HierarchyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════╗")?;
        writeln!(f, "║           hier-index Hierarchy Report            ║")?;
        writeln!(f, "╠══════════════════════════════════════════════════╣")?;
        writeln!(f, "║   nodes:        {:>10}                       ║", self.nodes)?;
        writeln!(f, "║   roots:        {:>10}                       ║", self.roots)?;
        writeln!(f, "║   leaves:       {:>10}                       ║", self.leaves)?;
        writeln!(f, "║   max depth:    {:>10}                       ║", self.max_depth)?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        for (level, count) in self.per_level.iter().enumerate() {
            writeln!(f, "║   level {:>3}:    {:>10}                       ║", level, count)?;
        }
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(
            f,
            "║   index keys:   {:>10}                       ║",
            self.indexed_keys
        )?;
        for field in &self.lookup_fields {
            writeln!(f, "║   lookup:       {:>10}                       ║", field)?;
        }
        write!(f, "╚══════════════════════════════════════════════════╝")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Item, Schema};
    use crate::index::Hierarchy;

    fn rec(id: i64, parent: i64) -> Item {
        Item::new().with("id", id).with("parent_id", parent)
    }

    #[test]
    fn counts_levels_roots_and_leaves() {
        let h = Hierarchy::build(
            vec![rec(1, 0), rec(2, 1), rec(3, 1), rec(4, 2), rec(5, 0)],
            Schema::default(),
        )
        .unwrap();
        let s = h.stats();
        assert_eq!(s.nodes, 5);
        assert_eq!(s.roots, 2);
        assert_eq!(s.leaves, 3); // 4, 3, 5
        assert_eq!(s.max_depth, 2);
        assert_eq!(s.per_level, vec![2, 2, 1]);
        assert_eq!(s.lookup_fields, vec!["id".to_string()]);
        assert_eq!(s.indexed_keys, 5);
    }

    #[test]
    fn empty_hierarchy_report_renders() {
        let h = Hierarchy::<Item>::build(Vec::new(), Schema::default()).unwrap();
        let s = h.stats();
        assert_eq!(s.nodes, 0);
        assert_eq!(s.roots, 0);
        assert!(s.to_string().contains("nodes:"));
    }
}
