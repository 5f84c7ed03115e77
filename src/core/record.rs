use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 记录字段值（id / parent_id / 载荷字段共用）。
///
/// 作为索引 key 使用，因此实现了 `Eq + Hash`：
/// - `Float` 按 bit pattern 比较（`0.0 != -0.0`，`NaN == NaN` 当且仅当 bit 相同）
/// - 不同变体之间永不相等（`Int(1) != Str("1")`）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// 命令行值解析：能解析为整数就是 `Int`，否则是 `Str`。
    pub fn parse_cli(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(v) => FieldValue::Int(v),
            Err(_) => FieldValue::Str(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// 超出 f64 精确整数范围（2^53）的浮点值：不同的大整数可能落到同一个值上，
    /// 不能作为 id / parent 使用。超过 `i64::MAX` 的 JSON 整数会走到这里。
    pub fn is_lossy_key(&self) -> bool {
        const EXACT: f64 = 9_007_199_254_740_992.0;
        matches!(self, FieldValue::Float(f) if f.abs() >= EXACT)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 用于 glob / regex 过滤的文本形式（`Null` 为空串）。
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Null => {}
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Int(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// JSON 标量直接映射；数组 / 对象不参与层级与索引，降级为 `Null`。
/// 超出 `i64` 的整数只能以 `Float` 表示，见 `is_lossy_key`。
impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or_default(),
            },
            serde_json::Value::String(s) => FieldValue::Str(s),
            _ => FieldValue::Null,
        }
    }
}

/// 扁平记录抽象：层级只通过字段名读取 id / parent / 查找字段。
///
/// 缺失字段返回 `None`，由 materializer / index builder 转换为配置错误。
pub trait Record {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// 动态记录（字段名 -> 值），用于 JSON 输入与 CLI。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub BTreeMap<String, FieldValue>);

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn from_json_object(obj: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(obj.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect())
    }
}

impl Record for Item {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.0.get(name).cloned()
    }
}
