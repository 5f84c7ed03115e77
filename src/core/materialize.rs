use std::collections::HashMap;

use crate::core::node::Node;
use crate::core::record::{FieldValue, Record};
use crate::error::{HierarchyError, Result};

/// 扁平记录 -> 前序序列（深度优先，注入 level）。
///
/// 两阶段：
/// 1) 一次 O(n) 扫描建立 parent -> [child positions] 邻接表（children 保持输入顺序）
/// 2) 显式栈前序遍历：节点之后紧跟其整棵子树，再到下一个兄弟
///
/// 与"反复扫描剩余池"的朴素做法输出完全一致，但不会递归爆栈，也不是 O(n²)。
pub struct Materializer<'a> {
    pub id_field: &'a str,
    pub parent_field: &'a str,
    pub root: &'a FieldValue,
}

impl<'a> Materializer<'a> {
    pub fn new(id_field: &'a str, parent_field: &'a str, root: &'a FieldValue) -> Self {
        Self {
            id_field,
            parent_field,
            root,
        }
    }

    /// 不可达记录（悬空 parent / 不挂在根上的环）静默丢弃。
    /// 只有记录缺少 id / parent 字段，或其值超出精确整数范围时才报错。
    pub fn materialize<R: Record>(&self, records: Vec<R>) -> Result<Vec<Node<R>>> {
        let mut ids: Vec<FieldValue> = Vec::with_capacity(records.len());
        let mut children: HashMap<FieldValue, Vec<usize>> = HashMap::new();

        for (pos, rec) in records.iter().enumerate() {
            let id = rec
                .field(self.id_field)
                .ok_or_else(|| HierarchyError::MissingField {
                    field: self.id_field.to_string(),
                    position: pos,
                })?;
            let parent = rec
                .field(self.parent_field)
                .ok_or_else(|| HierarchyError::MissingField {
                    field: self.parent_field.to_string(),
                    position: pos,
                })?;
            for (field, value) in [(self.id_field, &id), (self.parent_field, &parent)] {
                if let FieldValue::Float(f) = value {
                    if value.is_lossy_key() {
                        return Err(HierarchyError::LossyKey {
                            field: field.to_string(),
                            position: pos,
                            value: *f,
                        });
                    }
                }
            }
            children.entry(parent).or_default().push(pos);
            ids.push(id);
        }

        let mut pool: Vec<Option<R>> = records.into_iter().map(Some).collect();
        let mut out: Vec<Node<R>> = Vec::with_capacity(pool.len());

        // 栈中存 (position, level)；兄弟逆序压栈，保证按输入顺序弹出。
        let mut stack: Vec<(usize, u32)> = Vec::new();
        if let Some(roots) = children.get(self.root) {
            stack.extend(roots.iter().rev().map(|&p| (p, 0)));
        }

        while let Some((pos, level)) = stack.pop() {
            // 重复 id 时同一个子列表可能被展开多次；已放置的记录不再放置。
            let Some(rec) = pool[pos].take() else {
                continue;
            };
            out.push(Node::new(level, rec));

            if let Some(kids) = children.get(&ids[pos]) {
                stack.extend(kids.iter().rev().map(|&p| (p, level + 1)));
            }
        }

        let dropped = pool.iter().filter(|r| r.is_some()).count();
        if dropped > 0 {
            tracing::warn!(
                "Materialize: {} records unreachable from root '{}', dropped",
                dropped,
                self.root
            );
        }

        Ok(out)
    }
}
