use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

impl PrimaryKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unique constraint definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UniqueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub key_columns: Vec<String>,
}

impl UniqueConstraint {
    pub fn new<I, S>(key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            key_columns: key_columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub key_columns: Vec<String>,
    /// Full name (`schema.table`) of the referenced table.
    pub references: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    pub fn new<I, S>(key_columns: I, references: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            references: references.into(),
            referenced_columns: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Identity column specification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    pub column: String,
    #[serde(default = "one")]
    pub seed: i64,
    #[serde(default = "one")]
    pub increment: i64,
}

fn one() -> i64 {
    1
}

impl Identity {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            seed: 1,
            increment: 1,
        }
    }
}

/// Column default expressed as raw SQL.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DefaultConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub column: String,
    pub value: String,
}
