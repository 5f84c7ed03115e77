/// 层级核心的错误：全部是配置 / 契约错误（fail fast，不重试）。
///
/// "查不到" 不是错误，由 `Option` / 空集合表达。
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("lookup field '{0}' is not registered")]
    UnregisteredField(String),

    #[error("record at position {position} has no field '{field}'")]
    MissingField { field: String, position: usize },

    #[error("record at position {position} has field '{field}' = {value}, too large to be an exact key")]
    LossyKey {
        field: String,
        position: usize,
        value: f64,
    },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

pub type Result<T> = std::result::Result<T, HierarchyError>;
