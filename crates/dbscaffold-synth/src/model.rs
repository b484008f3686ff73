use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::Definition;

/// Structured scaffold issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    /// `schema.name` of the object the issue belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Definition the issue was found in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl ScaffoldIssue {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.into(),
            message: message.into(),
            object: None,
            definition: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "error".to_string(),
            ..Self::warning(code, message)
        }
    }

    pub fn for_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn in_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

/// Report for a scaffold run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldReport {
    pub objects_processed: u64,
    pub objects_failed: u64,
    pub definitions_by_kind: BTreeMap<String, u64>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<ScaffoldIssue>,
    pub errors: Vec<ScaffoldIssue>,
}

impl ScaffoldReport {
    pub fn record_definition(&mut self, definition: &Definition) {
        *self
            .definitions_by_kind
            .entry(definition.kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn record_warning(&mut self, issue: ScaffoldIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn record_failure(&mut self, issue: ScaffoldIssue) {
        self.objects_failed += 1;
        self.errors.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn definitions_of(&self, kind: &str) -> u64 {
        self.definitions_by_kind.get(kind).copied().unwrap_or(0)
    }
}

/// Definitions produced by a run, in deterministic order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaffoldOutput {
    pub definitions: Vec<Definition>,
    pub report: ScaffoldReport,
}

impl ScaffoldOutput {
    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|definition| definition.name == name)
    }
}
