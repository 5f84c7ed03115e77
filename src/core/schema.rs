use serde::{Deserialize, Deserializer};

use crate::core::record::FieldValue;
use crate::error::{HierarchyError, Result};

/// 层级结构的字段约定。
///
/// id 字段总是被索引（`get_parent` / `get_parents` 依赖它），
/// `lookup_fields` 中额外登记的字段必须在全量记录中唯一（调用方负责）。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub id_field: String,
    pub parent_field: String,
    /// 仅影响 JSON 输出时 level 的字段名。
    pub level_field: String,
    #[serde(deserialize_with = "de_field_value")]
    pub root: FieldValue,
    pub lookup_fields: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            parent_field: "parent_id".to_string(),
            level_field: "level".to_string(),
            root: FieldValue::Int(0),
            lookup_fields: Vec::new(),
        }
    }
}

impl Schema {
    pub fn new(id_field: &str, parent_field: &str, root: impl Into<FieldValue>) -> Self {
        Self {
            id_field: id_field.to_string(),
            parent_field: parent_field.to_string(),
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_lookup(mut self, field: &str) -> Self {
        self.lookup_fields.push(field.to_string());
        self
    }

    pub fn with_level_field(mut self, field: &str) -> Self {
        self.level_field = field.to_string();
        self
    }

    /// 全部登记字段：id 字段在前，其余按声明顺序去重。
    pub fn registered_fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![self.id_field.as_str()];
        for f in &self.lookup_fields {
            if !out.contains(&f.as_str()) {
                out.push(f.as_str());
            }
        }
        out
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_field.is_empty() || self.parent_field.is_empty() {
            return Err(HierarchyError::InvalidSchema(
                "id_field and parent_field must be non-empty".to_string(),
            ));
        }
        if self.id_field == self.parent_field {
            return Err(HierarchyError::InvalidSchema(format!(
                "id_field and parent_field are both '{}'",
                self.id_field
            )));
        }
        // level 写入 JSON 输出时会覆盖同名字段
        if self.level_field.is_empty()
            || self.level_field == self.id_field
            || self.level_field == self.parent_field
        {
            return Err(HierarchyError::InvalidSchema(format!(
                "level_field '{}' must be non-empty and differ from id / parent fields",
                self.level_field
            )));
        }
        if self.lookup_fields.iter().any(|f| f.is_empty()) {
            return Err(HierarchyError::InvalidSchema(
                "empty lookup field name".to_string(),
            ));
        }
        Ok(())
    }
}

fn de_field_value<'de, D>(deserializer: D) -> std::result::Result<FieldValue, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(FieldValue::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_fields_put_id_first_and_dedup() {
        let schema = Schema::default()
            .with_lookup("alias")
            .with_lookup("id")
            .with_lookup("alias");
        assert_eq!(schema.registered_fields(), vec!["id", "alias"]);
    }

    #[test]
    fn validate_rejects_same_id_and_parent() {
        let schema = Schema::new("id", "id", 0);
        assert!(matches!(
            schema.validate(),
            Err(HierarchyError::InvalidSchema(_))
        ));
        assert!(Schema::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_level_field_shadowing_id_or_parent() {
        for level in ["id", "parent_id", ""] {
            let schema = Schema::default().with_level_field(level);
            assert!(matches!(
                schema.validate(),
                Err(HierarchyError::InvalidSchema(_))
            ));
        }
        assert!(Schema::default().with_level_field("depth").validate().is_ok());
    }

    #[test]
    fn deserialize_from_toml_with_string_root() {
        let schema: Schema = toml::from_str(
            r#"
            id_field = "id"
            parent_field = "p"
            level_field = "l"
            root = "root"
            lookup_fields = ["a"]
            "#,
        )
        .unwrap();
        assert_eq!(schema.parent_field, "p");
        assert_eq!(schema.level_field, "l");
        assert_eq!(schema.root, FieldValue::from("root"));
        assert_eq!(schema.lookup_fields, vec!["a".to_string()]);
    }

    #[test]
    fn deserialize_defaults_missing_keys() {
        let schema: Schema = toml::from_str("lookup_fields = [\"alias\"]").unwrap();
        assert_eq!(schema.id_field, "id");
        assert_eq!(schema.parent_field, "parent_id");
        assert_eq!(schema.root, FieldValue::Int(0));
    }
}
