use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::ProjectConfig;

/// Emit the JSON Schema for project configs.
pub fn project_json_schema() -> RootSchema {
    schema_for!(ProjectConfig)
}
