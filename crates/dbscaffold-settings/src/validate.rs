use std::collections::{HashMap, HashSet};
use std::path::Path;

use dbscaffold_core::{Database, DbObject, ObjectName};
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{SettingsError, ValidationReport};
use crate::model::{ProjectConfig, SelectionConfig};
use crate::schema::project_json_schema;
use crate::selection::Pattern;

/// Validate a project config document against the project JSON Schema.
pub fn validate_project_json(
    project_json: &Value,
    project_schema: &Value,
) -> Result<ValidationReport, SettingsError> {
    let compiled =
        JSONSchema::compile(project_schema).map_err(|err| SettingsError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(project_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error("schema_violation", path, error.to_string(), None);
        }
    }

    Ok(report)
}

/// Validate a parsed project config against a database snapshot.
pub fn validate_project_against_database(
    config: &ProjectConfig,
    database: &Database,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.namespace.trim().is_empty() {
        report.push_error(
            "empty_namespace",
            "/namespace",
            "project namespace must not be empty",
            None,
        );
    }

    let index = ObjectIndex::new(database);
    let mut seen: HashMap<Pattern, usize> = HashMap::new();

    for (idx, selection) in config.selections.iter().enumerate() {
        let base_path = format!("/selections/{idx}");
        let pattern = match Pattern::parse(&selection.pattern) {
            Ok(pattern) => pattern,
            Err(err) => {
                report.push_error(
                    "invalid_pattern",
                    format!("{base_path}/pattern"),
                    err.to_string(),
                    Some("use `schema.object`, `schema.*`, `*.object` or `*.*`".to_string()),
                );
                continue;
            }
        };

        if let Some(first) = seen.get(&pattern) {
            report.push_warning(
                "duplicate_pattern",
                format!("{base_path}/pattern"),
                format!(
                    "pattern '{}' already declared at /selections/{first}",
                    selection.pattern
                ),
                Some("both entries are applied in order to the same selection".to_string()),
            );
        } else {
            seen.insert(pattern.clone(), idx);
        }

        let matched = index.matching(&pattern);
        if matched.is_empty() {
            report.push_warning(
                "pattern_matches_nothing",
                format!("{base_path}/pattern"),
                format!("pattern '{}' matches no table or view", selection.pattern),
                None,
            );
        }

        validate_selection_settings(selection, &base_path, &matched, &index, &mut report);
    }

    report
}

/// Validate a project config end-to-end, returning structured issues on failure.
pub fn validate_project(
    project_json: &Value,
    database: &Database,
) -> Result<(ProjectConfig, ValidationReport), ValidationReport> {
    let project_schema = match serde_json::to_value(project_json_schema()) {
        Ok(value) => value,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error("schema_validation_error", "/", err.to_string(), None);
            return Err(report);
        }
    };

    let structural = match validate_project_json(project_json, &project_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error("schema_validation_error", "/", err.to_string(), None);
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let config: ProjectConfig = match serde_json::from_value(project_json.clone()) {
        Ok(config) => config,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error("invalid_project", "/", err.to_string(), None);
            return Err(report);
        }
    };

    let report = validate_project_against_database(&config, database);
    if !report.is_ok() {
        return Err(report);
    }

    Ok((config, report))
}

/// Read a project config file as a JSON value (`.json` or TOML otherwise).
pub fn load_project_value(path: &Path) -> Result<Value, SettingsError> {
    let contents = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(toml::from_str(&contents)?)
    }
}

fn validate_selection_settings(
    selection: &SelectionConfig,
    base_path: &str,
    matched: &[&ObjectInfo],
    index: &ObjectIndex,
    report: &mut ValidationReport,
) {
    let patch = &selection.settings;

    if let Some(token) = patch
        .concurrency_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        && !matched.is_empty()
        && !matched.iter().any(|object| object.columns.contains(token))
    {
        report.push_warning(
            "unknown_concurrency_token",
            format!("{base_path}/settings/concurrency_token"),
            format!(
                "no object selected by '{}' has a column named '{token}'",
                selection.pattern
            ),
            None,
        );
    }

    if let Some(fields) = &patch.backing_fields {
        for (field_idx, field) in fields.iter().enumerate() {
            if !index.has_column_full_name(field) {
                report.push_warning(
                    "unknown_backing_field",
                    format!("{base_path}/settings/backing_fields/{field_idx}"),
                    format!("column '{field}' not found in schema.json"),
                    Some("backing fields use `schema.table.column`".to_string()),
                );
            }
        }
    }

    if let Some(audit) = &patch.audit_entity
        && audit.column_names().len() < 4
    {
        report.push_warning(
            "incomplete_audit_entity",
            format!("{base_path}/settings/audit_entity"),
            "audit entity declares fewer than four column names".to_string(),
            Some("only the non-empty names take part in audit matching".to_string()),
        );
    }

    let required_names = [
        ("navigation_collection_type", &patch.navigation_collection_type),
        ("entity_interface_name", &patch.entity_interface_name),
        ("audit_entity_interface_name", &patch.audit_entity_interface_name),
    ];
    for (field, value) in required_names {
        if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
            report.push_error(
                "empty_setting",
                format!("{base_path}/settings/{field}"),
                format!("{field} must not be empty"),
                None,
            );
        }
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

struct ObjectIndex {
    objects: Vec<ObjectInfo>,
    column_full_names: HashSet<String>,
}

struct ObjectInfo {
    name: ObjectName,
    columns: HashSet<String>,
}

impl ObjectIndex {
    fn new(database: &Database) -> Self {
        let mut objects = Vec::new();
        let mut column_full_names = HashSet::new();

        let entries = database
            .tables
            .iter()
            .map(|table| (ObjectName::of(table), table.columns()))
            .chain(
                database
                    .views
                    .iter()
                    .map(|view| (ObjectName::of(view), view.columns())),
            );

        for (name, columns) in entries {
            for column in columns {
                column_full_names.insert(format!("{name}.{}", column.name));
            }
            objects.push(ObjectInfo {
                columns: columns.iter().map(|column| column.name.clone()).collect(),
                name,
            });
        }

        Self {
            objects,
            column_full_names,
        }
    }

    fn matching(&self, pattern: &Pattern) -> Vec<&ObjectInfo> {
        self.objects
            .iter()
            .filter(|object| pattern.matches(&object.name))
            .collect()
    }

    fn has_column_full_name(&self, full_name: &str) -> bool {
        self.column_full_names.contains(full_name)
    }
}
