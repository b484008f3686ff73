//! Generation settings and pattern-based selection for dbscaffold.
//!
//! Settings are layered: a global selection provides defaults and more
//! specific patterns (`schema.*`, `*.object`, `schema.object`) override it.
//! Project configs carry those selections as TOML or JSON.

pub mod errors;
pub mod model;
pub mod schema;
pub mod selection;
pub mod validate;

pub use errors::{IssueSeverity, Result, SettingsError, ValidationIssue, ValidationReport};
pub use model::{
    AuditEntity, ProjectConfig, ProjectNamespaces, SelectionConfig, Settings, SettingsPatch,
};
pub use schema::project_json_schema;
pub use selection::{GLOBAL_PATTERN, Pattern, Selection, SelectionEngine};
pub use validate::{
    load_project_value, validate_project, validate_project_against_database,
    validate_project_json,
};
