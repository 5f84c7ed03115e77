use regex::Regex;
use wildmatch::WildMatch;

use crate::core::{FieldValue, Node, Record};

/// 节点过滤抽象：`get_all_items_by_predicate` / `Hierarchy::retain` 的判定接口。
///
/// 返回 false 的节点连同整棵子树被剪掉；返回 true 只保留该节点本身，
/// 其后代仍逐个判定。
pub trait NodeFilter<R> {
    fn keep(&self, node: &Node<R>) -> bool;
}

impl<R, F> NodeFilter<R> for F
where
    F: Fn(&Node<R>) -> bool,
{
    fn keep(&self, node: &Node<R>) -> bool {
        self(node)
    }
}

/// 单字段匹配方式
#[derive(Clone, Debug)]
pub enum FieldMatch {
    Equals(FieldValue),
    Glob(WildMatch),
    Regex(Regex),
}

/// 按字段值过滤（缺失字段视为不匹配）
#[derive(Clone, Debug)]
pub struct FieldFilter {
    field: String,
    matcher: FieldMatch,
}

impl FieldFilter {
    pub fn new(field: &str, matcher: FieldMatch) -> Self {
        Self {
            field: field.to_string(),
            matcher,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn matches(&self, value: &FieldValue) -> bool {
        match &self.matcher {
            FieldMatch::Equals(expected) => value == expected,
            FieldMatch::Glob(wild) => wild.matches(&value.to_text()),
            FieldMatch::Regex(re) => re.is_match(&value.to_text()),
        }
    }
}

impl<R: Record> NodeFilter<R> for FieldFilter {
    fn keep(&self, node: &Node<R>) -> bool {
        node.record
            .field(&self.field)
            .map(|v| self.matches(&v))
            .unwrap_or(false)
    }
}

/// 过滤器工厂与自动识别：
/// - `re:<pattern>` -> 正则
/// - 含 `*` / `?` -> 通配符
/// - 其余 -> 相等（值按 CLI 规则解析：整数优先）
pub fn create_filter(field: &str, pattern: &str) -> anyhow::Result<FieldFilter> {
    let matcher = if let Some(re) = pattern.strip_prefix("re:") {
        FieldMatch::Regex(Regex::new(re)?)
    } else if pattern.contains('*') || pattern.contains('?') {
        FieldMatch::Glob(WildMatch::new(pattern))
    } else {
        FieldMatch::Equals(FieldValue::parse_cli(pattern))
    };
    Ok(FieldFilter::new(field, matcher))
}
