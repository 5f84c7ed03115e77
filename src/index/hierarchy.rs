use crate::core::{Materializer, Node, Record, Schema};
use crate::error::Result;
use crate::index::builder::{build_indices, Indices};
use crate::query::NodeFilter;
use crate::stats::HierarchyStats;

/// 物化后的层级：前序序列 + 位置索引，构建后只读。
///
/// 生命周期只有"构建完成"一种状态：要么 `build`（缓存未命中，全量物化），
/// 要么 `from_sequence`（缓存命中，只重建索引）。变更一律整体重建替换。
#[derive(Clone, Debug)]
pub struct Hierarchy<R> {
    nodes: Vec<Node<R>>,
    indices: Indices,
    schema: Schema,
}

impl<R: Record> Hierarchy<R> {
    pub fn build(records: Vec<R>, schema: Schema) -> Result<Self> {
        schema.validate()?;
        let input = records.len();
        let nodes = Materializer::new(&schema.id_field, &schema.parent_field, &schema.root)
            .materialize(records)?;
        tracing::info!(
            "Hierarchy materialized: {} of {} records placed",
            nodes.len(),
            input
        );
        Self::from_sequence(nodes, schema)
    }

    /// 缓存命中路径：序列已是前序 + level，只需重建索引。
    pub fn from_sequence(nodes: Vec<Node<R>>, schema: Schema) -> Result<Self> {
        schema.validate()?;
        let indices = build_indices(&nodes, &schema.registered_fields())?;
        Ok(Self {
            nodes,
            indices,
            schema,
        })
    }

    /// 按过滤器剪枝后构建新的层级（被剔除节点的整棵子树一并剔除）。
    ///
    /// 剪枝结果仍满足前序/子树连续性：保留节点的父节点必然也被保留。
    pub fn retain<F>(&self, filter: &F) -> Result<Self>
    where
        R: Clone,
        F: NodeFilter<R> + ?Sized,
    {
        let kept: Vec<Node<R>> = self
            .get_all_items_by_predicate(filter)
            .into_iter()
            .cloned()
            .collect();
        Self::from_sequence(kept, self.schema.clone())
    }

    pub fn stats(&self) -> HierarchyStats {
        HierarchyStats::collect(&self.nodes, &self.indices)
    }
}

impl<R> Hierarchy<R> {
    pub fn nodes(&self) -> &[Node<R>] {
        &self.nodes
    }

    pub fn get_all_items(&self) -> &[Node<R>] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node<R>> {
        self.nodes
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Item};
    use crate::error::HierarchyError;

    fn rec(id: i64, parent: i64, alias: &str) -> Item {
        Item::new()
            .with("id", id)
            .with("parent_id", parent)
            .with("alias", alias)
    }

    #[test]
    fn build_then_from_sequence_agree() {
        let schema = Schema::default().with_lookup("alias");
        let h = Hierarchy::build(
            vec![rec(1, 0, "a"), rec(2, 1, "b"), rec(3, 0, "c")],
            schema.clone(),
        )
        .unwrap();
        let again = Hierarchy::from_sequence(h.nodes().to_vec(), schema).unwrap();
        assert_eq!(h.nodes(), again.nodes());
        assert_eq!(
            again
                .indices()
                .position("alias", &FieldValue::from("c"))
                .unwrap(),
            Some(2)
        );
    }

    #[test]
    fn id_field_is_always_indexed() {
        let h = Hierarchy::build(vec![rec(1, 0, "a")], Schema::default()).unwrap();
        assert!(h.indices().is_registered("id"));
        assert!(!h.indices().is_registered("alias"));
    }

    #[test]
    fn invalid_schema_fails_fast() {
        let err = Hierarchy::build(vec![rec(1, 0, "a")], Schema::new("id", "id", 0)).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidSchema(_)));
    }

    #[test]
    fn retain_rebuilds_indices_over_pruned_sequence() {
        let h = Hierarchy::build(
            vec![rec(1, 0, "a"), rec(2, 1, "b"), rec(4, 2, "d"), rec(3, 1, "c")],
            Schema::default().with_lookup("alias"),
        )
        .unwrap();
        let pruned = h
            .retain(&|n: &Node<Item>| n.record.get("alias") != Some(&FieldValue::from("b")))
            .unwrap();
        assert_eq!(pruned.len(), 2);
        assert_eq!(
            pruned
                .indices()
                .position("alias", &FieldValue::from("c"))
                .unwrap(),
            Some(1)
        );
        assert_eq!(
            pruned
                .indices()
                .position("alias", &FieldValue::from("d"))
                .unwrap(),
            None
        );
    }
}
