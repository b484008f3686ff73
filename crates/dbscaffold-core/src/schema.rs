use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{DefaultConstraint, ForeignKey, Identity, PrimaryKey, UniqueConstraint};
use crate::types::{TypeMapping, sql_server_type_mappings};

/// Schema used for objects that do not declare one.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Top-level schema snapshot handed to the scaffolder.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Database {
    /// Database name when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Schema that does not get its own namespace segment.
    #[serde(default = "default_schema")]
    pub default_schema: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
    /// Database type to target type catalog.
    #[serde(default = "sql_server_type_mappings")]
    pub type_mappings: Vec<TypeMapping>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Default for Database {
    fn default() -> Self {
        Self {
            name: None,
            default_schema: default_schema(),
            tables: Vec::new(),
            views: Vec::new(),
            type_mappings: sql_server_type_mappings(),
        }
    }
}

impl Database {
    /// Parse a `schema.json` document.
    pub fn from_json(value: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(value)?)
    }

    /// Find a table by `schema.name`.
    pub fn find_table(&self, full_name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.full_name() == full_name)
    }

    /// Find a view by `schema.name`.
    pub fn find_view(&self, full_name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.full_name() == full_name)
    }

    /// Schema names in first-appearance order (tables before views).
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let objects = self
            .tables
            .iter()
            .map(|table| table.schema.as_str())
            .chain(self.views.iter().map(|view| view.schema.as_str()));
        for name in objects {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Group tables and views by schema, keeping declaration order inside each group.
    pub fn group_by_schema(&self) -> Vec<SchemaGroup<'_>> {
        self.schema_names()
            .into_iter()
            .map(|schema| SchemaGroup {
                schema,
                tables: self
                    .tables
                    .iter()
                    .filter(|table| table.schema == schema)
                    .collect(),
                views: self
                    .views
                    .iter()
                    .filter(|view| view.schema == schema)
                    .collect(),
            })
            .collect()
    }

    /// Tables that declare a foreign key referencing `full_name`, in declaration order.
    pub fn tables_referencing<'a>(
        &'a self,
        full_name: &'a str,
    ) -> impl Iterator<Item = (&'a Table, &'a ForeignKey)> + 'a {
        self.tables.iter().flat_map(move |table| {
            table
                .foreign_keys
                .iter()
                .filter(move |fk| fk.references == full_name)
                .map(move |fk| (table, fk))
        })
    }
}

/// Tables and views that share a schema.
#[derive(Debug, Clone)]
pub struct SchemaGroup<'a> {
    pub schema: &'a str,
    pub tables: Vec<&'a Table>,
    pub views: Vec<&'a View>,
}

/// Common shape of schema objects addressed by selections.
pub trait DbObject {
    fn schema(&self) -> &str;
    fn name(&self) -> &str;
    fn columns(&self) -> &[Column];

    /// `schema.name`, the join key used by foreign keys and selections.
    fn full_name(&self) -> String {
        format!("{}.{}", self.schema(), self.name())
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns().iter().find(|column| column.name == name)
    }
}

/// Lightweight `schema.name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct ObjectName {
    pub schema: String,
    pub name: String,
}

impl ObjectName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Split a `schema.name` key; a key without a dot lands in the default schema.
    pub fn parse(full_name: &str) -> Self {
        match full_name.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new(DEFAULT_SCHEMA, full_name),
        }
    }

    pub fn of(object: &impl DbObject) -> Self {
        Self::new(object.schema(), object.name())
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A base table with keys and constraints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub uniques: Vec<UniqueConstraint>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub defaults: Vec<DefaultConstraint>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            description: None,
            columns,
            primary_key: None,
            identity: None,
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Columns that make up the primary key, in key order.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.iter().filter_map(|name| self.column(name)).collect())
            .unwrap_or_default()
    }

    /// The key column when the primary key has exactly one column.
    pub fn single_key_column(&self) -> Option<&Column> {
        match self.primary_key.as_ref() {
            Some(pk) if pk.columns.len() == 1 => self.column(&pk.columns[0]),
            _ => None,
        }
    }

    pub fn is_primary_key_column(&self, column: &str) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns.iter().any(|name| name == column))
    }

    pub fn is_identity_column(&self, column: &str) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.column == column)
    }

    /// Whether `column` participates in any foreign key.
    pub fn is_foreign_key_column(&self, column: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.key_columns.iter().any(|name| name == column))
    }

    pub fn default_for(&self, column: &str) -> Option<&DefaultConstraint> {
        self.defaults.iter().find(|default| default.column == column)
    }
}

impl DbObject for Table {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// A view; only its column shape is known.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct View {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<Column>,
}

impl View {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            description: None,
            columns,
        }
    }
}

impl DbObject for View {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Column metadata for a table or view.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Raw database type, possibly with a size suffix (`varchar(50)`).
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            description: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Database type without its parenthesized size suffix, lowercased.
    pub fn base_type(&self) -> String {
        crate::types::strip_size_suffix(&self.data_type).to_lowercase()
    }
}
