use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column names that mark a table as audit-tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuditEntity {
    pub creation_user_column_name: String,
    pub creation_date_time_column_name: String,
    pub last_update_user_column_name: String,
    pub last_update_date_time_column_name: String,
}

impl AuditEntity {
    pub fn new(
        creation_user: impl Into<String>,
        creation_date_time: impl Into<String>,
        last_update_user: impl Into<String>,
        last_update_date_time: impl Into<String>,
    ) -> Self {
        Self {
            creation_user_column_name: creation_user.into(),
            creation_date_time_column_name: creation_date_time.into(),
            last_update_user_column_name: last_update_user.into(),
            last_update_date_time_column_name: last_update_date_time.into(),
        }
    }

    /// Configured (non-empty) audit column names.
    pub fn column_names(&self) -> Vec<&str> {
        [
            self.creation_user_column_name.as_str(),
            self.creation_date_time_column_name.as_str(),
            self.last_update_user_column_name.as_str(),
            self.last_update_date_time_column_name.as_str(),
        ]
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect()
    }
}

/// Generation options for one schema object.
///
/// Every field has a default; `Clone` is the deep copy used when a selection
/// is first materialized from the global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Whether the renderer may replace existing output files.
    pub force_overwrite: bool,
    /// Rewrite `Int32`-style names to their short aliases.
    pub simplify_data_types: bool,
    /// Automatic properties instead of backing fields.
    pub use_automatic_properties: bool,
    /// Column full names (`schema.table.column`) that get a backing field.
    pub backing_fields: Vec<String>,
    /// Change notification on entity setters.
    pub enable_data_bindings: bool,
    /// Attribute mapping instead of configuration classes.
    pub use_data_annotations: bool,
    pub declare_navigation_properties: bool,
    pub declare_navigation_properties_as_virtual: bool,
    pub navigation_collection_namespace: String,
    pub navigation_collection_type: String,
    /// Column guarded as a concurrency token.
    pub concurrency_token: Option<String>,
    pub entity_interface_name: String,
    pub audit_entity_interface_name: String,
    pub audit_entity: Option<AuditEntity>,
    pub entities_with_data_contracts: bool,
    pub add_configuration_for_uniques_in_fluent_api: bool,
    pub add_configuration_for_foreign_keys_in_fluent_api: bool,
    pub add_configuration_for_defaults_in_fluent_api: bool,
    pub declare_db_set_properties_in_db_context: bool,
    /// Column names left out of insert column lists.
    pub insert_exclusions: Vec<String>,
    /// Column names left out of update column lists.
    pub update_exclusions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            force_overwrite: false,
            simplify_data_types: true,
            use_automatic_properties: true,
            backing_fields: Vec::new(),
            enable_data_bindings: false,
            use_data_annotations: false,
            declare_navigation_properties: true,
            declare_navigation_properties_as_virtual: false,
            navigation_collection_namespace: "System.Collections.ObjectModel".to_string(),
            navigation_collection_type: "Collection".to_string(),
            concurrency_token: None,
            entity_interface_name: "IEntity".to_string(),
            audit_entity_interface_name: "IAuditEntity".to_string(),
            audit_entity: None,
            entities_with_data_contracts: false,
            add_configuration_for_uniques_in_fluent_api: true,
            add_configuration_for_foreign_keys_in_fluent_api: true,
            add_configuration_for_defaults_in_fluent_api: false,
            declare_db_set_properties_in_db_context: false,
            insert_exclusions: Vec::new(),
            update_exclusions: Vec::new(),
        }
    }
}

impl Settings {
    /// Whether `column_full_name` is stored in a backing field.
    pub fn uses_backing_field(&self, column_full_name: &str) -> bool {
        !self.use_automatic_properties
            || self.enable_data_bindings
            || self
                .backing_fields
                .iter()
                .any(|name| name == column_full_name)
    }

    pub fn is_concurrency_token(&self, column: &str) -> bool {
        self.concurrency_token.as_deref() == Some(column)
    }

    /// Collection spelling for child navigation properties.
    pub fn navigation_collection(&self, item_type: &str) -> String {
        format!("{}<{item_type}>", self.navigation_collection_type)
    }
}

/// Partial settings; `None` leaves the target field untouched.
///
/// Applying a patch is the declarative form of an override callback and is
/// what config files carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simplify_data_types: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_automatic_properties: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_data_bindings: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_data_annotations: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declare_navigation_properties: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declare_navigation_properties_as_virtual: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_collection_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_collection_type: Option<String>,
    /// An empty string clears the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_interface_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_entity_interface_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_entity: Option<AuditEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities_with_data_contracts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_configuration_for_uniques_in_fluent_api: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_configuration_for_foreign_keys_in_fluent_api: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_configuration_for_defaults_in_fluent_api: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declare_db_set_properties_in_db_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_exclusions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_exclusions: Option<Vec<String>>,
}

macro_rules! apply_fields {
    ($patch:expr, $settings:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $settings.$field = value.clone();
            }
        )*
    };
}

impl SettingsPatch {
    /// Overwrite every field the patch sets.
    pub fn apply(&self, settings: &mut Settings) {
        apply_fields!(
            self,
            settings,
            [
                force_overwrite,
                simplify_data_types,
                use_automatic_properties,
                backing_fields,
                enable_data_bindings,
                use_data_annotations,
                declare_navigation_properties,
                declare_navigation_properties_as_virtual,
                navigation_collection_namespace,
                navigation_collection_type,
                entity_interface_name,
                audit_entity_interface_name,
                entities_with_data_contracts,
                add_configuration_for_uniques_in_fluent_api,
                add_configuration_for_foreign_keys_in_fluent_api,
                add_configuration_for_defaults_in_fluent_api,
                declare_db_set_properties_in_db_context,
                insert_exclusions,
                update_exclusions,
            ]
        );

        if let Some(token) = &self.concurrency_token {
            settings.concurrency_token = if token.trim().is_empty() {
                None
            } else {
                Some(token.clone())
            };
        }

        if let Some(audit) = &self.audit_entity {
            settings.audit_entity = Some(audit.clone());
        }
    }
}

/// Namespace segments appended to the project namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProjectNamespaces {
    pub entity_layer: String,
    pub data_layer: String,
    pub configurations: String,
    pub contracts: String,
    pub data_contracts: String,
    pub repositories: String,
}

impl Default for ProjectNamespaces {
    fn default() -> Self {
        Self {
            entity_layer: "EntityLayer".to_string(),
            data_layer: "DataLayer".to_string(),
            configurations: "Configurations".to_string(),
            contracts: "Contracts".to_string(),
            data_contracts: "DataContracts".to_string(),
            repositories: "Repositories".to_string(),
        }
    }
}

/// One selection entry of a project config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionConfig {
    /// `schema.object`, `schema.*`, `*.object` or `*.*`.
    pub pattern: String,
    #[serde(default)]
    pub settings: SettingsPatch,
}

/// Project configuration file (`project.toml` or JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectConfig {
    pub name: String,
    /// Root namespace of the generated code.
    pub namespace: String,
    #[serde(default)]
    pub namespaces: ProjectNamespaces,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<SelectionConfig>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            namespaces: ProjectNamespaces::default(),
            selections: Vec::new(),
        }
    }

    /// Parse a TOML project config.
    pub fn from_toml(value: &str) -> crate::Result<Self> {
        Ok(toml::from_str(value)?)
    }

    /// Parse a JSON project config.
    pub fn from_json(value: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_set_fields() {
        let mut settings = Settings::default();
        let patch = SettingsPatch {
            use_data_annotations: Some(true),
            concurrency_token: Some("Timestamp".to_string()),
            ..SettingsPatch::default()
        };
        patch.apply(&mut settings);

        assert!(settings.use_data_annotations);
        assert_eq!(settings.concurrency_token.as_deref(), Some("Timestamp"));
        assert!(settings.declare_navigation_properties);
        assert_eq!(settings.entity_interface_name, "IEntity");
    }

    #[test]
    fn empty_concurrency_token_clears_it() {
        let mut settings = Settings {
            concurrency_token: Some("RowVersion".to_string()),
            ..Settings::default()
        };
        let patch = SettingsPatch {
            concurrency_token: Some(String::new()),
            ..SettingsPatch::default()
        };
        patch.apply(&mut settings);

        assert_eq!(settings.concurrency_token, None);
    }

    #[test]
    fn audit_names_skip_blank_entries() {
        let audit = AuditEntity::new("CreationUser", "CreationDateTime", "", " ");
        assert_eq!(audit.column_names(), vec!["CreationUser", "CreationDateTime"]);
    }

    #[test]
    fn parses_toml_project() {
        let config = ProjectConfig::from_toml(
            r#"
name = "School"
namespace = "School.Core"

[[selections]]
pattern = "*.*"
settings = { concurrency_token = "Timestamp" }

[[selections]]
pattern = "dbo.Student"
settings = { use_data_annotations = true }
"#,
        )
        .expect("parse project.toml");

        assert_eq!(config.namespaces.entity_layer, "EntityLayer");
        assert_eq!(config.selections.len(), 2);
        assert_eq!(
            config.selections[0].settings.concurrency_token.as_deref(),
            Some("Timestamp")
        );
    }

    #[test]
    fn rejects_unknown_patch_fields() {
        let result = ProjectConfig::from_json(
            r#"{"name":"x","namespace":"X","selections":[{"pattern":"*.*","settings":{"bogus":true}}]}"#,
        );
        assert!(result.is_err());
    }
}
