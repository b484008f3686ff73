use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target type used when a database type has no mapping.
pub const UNKNOWN_TARGET_TYPE: &str = "object";

/// One entry of the database type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TypeMapping {
    /// Database type name without size suffix (e.g. `nvarchar`).
    pub database_type: String,
    /// Target language type (e.g. `String`, `Int32`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Whether the target is a value type that accepts the nullable wrapper.
    #[serde(default)]
    pub allow_nullable: bool,
    /// Restricts the entry to columns with this precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Restricts the entry to columns with this scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Alias target for user-defined types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_database_type: Option<String>,
}

impl TypeMapping {
    pub fn value(database_type: &str, target_type: &str) -> Self {
        Self {
            database_type: database_type.to_string(),
            target_type: Some(target_type.to_string()),
            allow_nullable: true,
            precision: None,
            scale: None,
            parent_database_type: None,
        }
    }

    pub fn reference(database_type: &str, target_type: &str) -> Self {
        Self {
            allow_nullable: false,
            ..Self::value(database_type, target_type)
        }
    }

    /// User-defined type that resolves through `parent`.
    pub fn alias(database_type: &str, parent: &str) -> Self {
        Self {
            database_type: database_type.to_string(),
            target_type: None,
            allow_nullable: false,
            precision: None,
            scale: None,
            parent_database_type: Some(parent.to_string()),
        }
    }

    /// Restrict the mapping to a precision/scale variant.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn has_variant(&self) -> bool {
        self.precision.is_some() || self.scale.is_some()
    }
}

/// Strip a trailing parenthesized size suffix: `varchar(50)` becomes `varchar`.
pub fn strip_size_suffix(database_type: &str) -> &str {
    let trimmed = database_type.trim();
    match trimmed.find('(') {
        Some(idx) if trimmed.ends_with(')') => trimmed[..idx].trim_end(),
        _ => trimmed,
    }
}

/// Built-in SQL Server catalog.
pub fn sql_server_type_mappings() -> Vec<TypeMapping> {
    vec![
        TypeMapping::value("bigint", "Int64"),
        TypeMapping::reference("binary", "Byte[]"),
        TypeMapping::value("bit", "Boolean"),
        TypeMapping::reference("char", "String"),
        TypeMapping::value("date", "DateTime"),
        TypeMapping::value("datetime", "DateTime"),
        TypeMapping::value("datetime2", "DateTime"),
        TypeMapping::value("datetimeoffset", "DateTimeOffset"),
        TypeMapping::value("decimal", "Decimal"),
        TypeMapping::value("float", "Double"),
        TypeMapping::reference("geography", "Object"),
        TypeMapping::reference("geometry", "Object"),
        TypeMapping::reference("hierarchyid", "Object"),
        TypeMapping::reference("image", "Byte[]"),
        TypeMapping::value("int", "Int32"),
        TypeMapping::value("money", "Decimal"),
        TypeMapping::reference("nchar", "String"),
        TypeMapping::reference("ntext", "String"),
        TypeMapping::value("numeric", "Decimal"),
        TypeMapping::reference("nvarchar", "String"),
        TypeMapping::value("real", "Single"),
        TypeMapping::reference("rowversion", "Byte[]"),
        TypeMapping::value("smalldatetime", "DateTime"),
        TypeMapping::value("smallint", "Int16"),
        TypeMapping::value("smallmoney", "Decimal"),
        TypeMapping::reference("sql_variant", "Object"),
        TypeMapping::alias("sysname", "nvarchar"),
        TypeMapping::reference("text", "String"),
        TypeMapping::value("time", "TimeSpan"),
        TypeMapping::reference("timestamp", "Byte[]"),
        TypeMapping::value("tinyint", "Byte"),
        TypeMapping::value("uniqueidentifier", "Guid"),
        TypeMapping::reference("varbinary", "Byte[]"),
        TypeMapping::reference("varchar", "String"),
        TypeMapping::reference("xml", "String"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_size_suffix() {
        assert_eq!(strip_size_suffix("varchar(50)"), "varchar");
        assert_eq!(strip_size_suffix("decimal (18, 2)"), "decimal");
        assert_eq!(strip_size_suffix("nvarchar(max)"), "nvarchar");
        assert_eq!(strip_size_suffix("int"), "int");
        assert_eq!(strip_size_suffix("weird(type"), "weird(type");
    }

    #[test]
    fn catalog_has_unique_base_entries() {
        let mappings = sql_server_type_mappings();
        let mut names: Vec<&str> = mappings
            .iter()
            .map(|mapping| mapping.database_type.as_str())
            .collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(before, names.len());
    }
}
