use crate::core::{FieldValue, Node, Record};
use crate::error::{HierarchyError, Result};
use crate::index::Hierarchy;
use crate::query::filter::NodeFilter;

/// 只读查询：全部基于前序序列 + 位置索引，不重新遍历树。
///
/// ## 约定
/// - `field` 必须是登记过的查找字段，否则返回 `UnregisteredField`
/// - 值在索引中不存在 -> `Ok(None)` / 空集合
/// - `(id_field, root)` 表示虚拟根：子节点查询返回整个序列 / 全部 level 0 节点
impl<R: Record> Hierarchy<R> {
    pub fn get_item(&self, value: &FieldValue, field: &str) -> Result<Option<&Node<R>>> {
        Ok(self
            .indices()
            .position(field, value)?
            .map(|pos| &self.nodes()[pos]))
    }

    /// 全部后代（多层），不含节点本身。
    pub fn get_children(&self, value: &FieldValue, field: &str) -> Result<Option<&[Node<R>]>> {
        if self.is_virtual_root(value, field)? {
            return Ok(Some(self.nodes()));
        }
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(None);
        };
        Ok(Some(&self.nodes()[pos + 1..self.subtree_end(pos)]))
    }

    /// 节点本身 + 全部后代；虚拟根没有节点本身，等同于整个序列。
    pub fn get_item_with_children(
        &self,
        value: &FieldValue,
        field: &str,
    ) -> Result<Option<&[Node<R>]>> {
        if self.is_virtual_root(value, field)? {
            return Ok(Some(self.nodes()));
        }
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(None);
        };
        Ok(Some(&self.nodes()[pos..self.subtree_end(pos)]))
    }

    /// 直接子节点：扫描整段子树，只保留 level == L + 1 的项。
    pub fn get_children_first_level(
        &self,
        value: &FieldValue,
        field: &str,
    ) -> Result<Option<Vec<&Node<R>>>> {
        if self.is_virtual_root(value, field)? {
            return Ok(Some(self.nodes().iter().filter(|n| n.level == 0).collect()));
        }
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(None);
        };
        let want = self.nodes()[pos].level + 1;
        Ok(Some(
            self.nodes()[pos + 1..self.subtree_end(pos)]
                .iter()
                .filter(|n| n.level == want)
                .collect(),
        ))
    }

    /// 父节点；父为根哨兵或父 id 未被索引时返回 `None`。
    pub fn get_parent(&self, value: &FieldValue, field: &str) -> Result<Option<&Node<R>>> {
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(None);
        };
        Ok(self.parent_position(pos)?.map(|p| &self.nodes()[p]))
    }

    /// 祖先链，由近及远，不含节点本身；长度等于节点 level。
    pub fn get_parents(&self, value: &FieldValue, field: &str) -> Result<Vec<&Node<R>>> {
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(Vec::new());
        };
        self.ancestor_chain(pos, false)
    }

    /// 节点本身 + 祖先链（以节点自身 id 作为第一个种子）。
    pub fn get_item_with_parents(&self, value: &FieldValue, field: &str) -> Result<Vec<&Node<R>>> {
        let Some(pos) = self.indices().position(field, value)? else {
            return Ok(Vec::new());
        };
        self.ancestor_chain(pos, true)
    }

    /// 把命令行等外部文本转换为与该字段已索引值同类型的 `FieldValue`。
    ///
    /// 依次尝试 `parse_cli` 的结果与原始字符串，命中索引（或 id 字段上的根哨兵）即返回；
    /// 都未命中时返回 `parse_cli` 的结果（查询结果自然为空）。
    pub fn resolve_value(&self, raw: &str, field: &str) -> Result<FieldValue> {
        let index = self.indices().field(field)?;
        let parsed = FieldValue::parse_cli(raw);
        let text = FieldValue::from(raw);
        let is_id = field == self.schema().id_field;
        for candidate in [&parsed, &text] {
            if index.contains_key(candidate) || (is_id && *candidate == self.schema().root) {
                return Ok(candidate.clone());
            }
        }
        Ok(parsed)
    }

    fn is_virtual_root(&self, value: &FieldValue, field: &str) -> Result<bool> {
        // 先校验字段已登记，根哨兵也不能绕过
        self.indices().field(field)?;
        Ok(field == self.schema().id_field && *value == self.schema().root)
    }

    fn parent_position(&self, pos: usize) -> Result<Option<usize>> {
        let schema = self.schema();
        let parent = self.nodes()[pos]
            .record
            .field(&schema.parent_field)
            .ok_or_else(|| HierarchyError::MissingField {
                field: schema.parent_field.clone(),
                position: pos,
            })?;
        if parent == schema.root {
            return Ok(None);
        }
        self.indices().position(&schema.id_field, &parent)
    }

    fn ancestor_chain(&self, pos: usize, include_self: bool) -> Result<Vec<&Node<R>>> {
        let nodes = self.nodes();
        let mut chain = Vec::with_capacity(nodes[pos].level as usize + 1);
        if include_self {
            chain.push(&nodes[pos]);
        }
        let mut cur = pos;
        // level 严格递减才算祖先：重复 id 覆盖索引时防止绕圈
        while let Some(p) = self.parent_position(cur)? {
            if nodes[p].level >= nodes[cur].level {
                break;
            }
            chain.push(&nodes[p]);
            cur = p;
        }
        Ok(chain)
    }
}

impl<R> Hierarchy<R> {
    /// 前向单遍过滤：命中则保留并前进一格（后代仍逐个判定）；
    /// 未命中则跳过其整段子树。level 保持原值，不重新编号。
    pub fn get_all_items_by_predicate<F>(&self, filter: &F) -> Vec<&Node<R>>
    where
        F: NodeFilter<R> + ?Sized,
    {
        let nodes = self.nodes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < nodes.len() {
            if filter.keep(&nodes[i]) {
                out.push(&nodes[i]);
                i += 1;
            } else {
                i = self.subtree_end(i);
            }
        }
        out
    }

    /// `pos` 子树段的结束位置（开区间）：其后第一个 level <= 自身 level 的位置。
    pub(crate) fn subtree_end(&self, pos: usize) -> usize {
        let nodes = self.nodes();
        let level = nodes[pos].level;
        nodes[pos + 1..]
            .iter()
            .position(|n| n.level <= level)
            .map(|off| pos + 1 + off)
            .unwrap_or(nodes.len())
    }
}
