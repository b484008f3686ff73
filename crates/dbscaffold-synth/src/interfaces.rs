//! Entity marker interfaces shared by every entity class.

use dbscaffold_core::{DbObject, Table};
use dbscaffold_settings::Settings;

use crate::context::ScaffoldContext;
use crate::definition::{Definition, DefinitionKind, Property};

/// Empty marker interface implemented by non-audit entities.
pub fn build_entity_interface(ctx: &ScaffoldContext<'_>, settings: &Settings) -> Definition {
    Definition::new(
        DefinitionKind::EntityInterface,
        ctx.entity_layer_namespace(),
        &settings.entity_interface_name,
    )
}

/// Audit interface with one property per configured audit column.
///
/// Property types come from `sample` when it carries the column; otherwise
/// user columns are strings and date columns are optional `DateTime`.
/// Returns `None` when no audit columns are configured.
pub fn build_audit_interface(
    ctx: &ScaffoldContext<'_>,
    settings: &Settings,
    sample: Option<&Table>,
) -> Option<Definition> {
    let audit = settings.audit_entity.as_ref()?;
    if audit.column_names().is_empty() {
        return None;
    }

    let mut definition = Definition::new(
        DefinitionKind::AuditEntityInterface,
        ctx.entity_layer_namespace(),
        &settings.audit_entity_interface_name,
    );
    definition.add_import("System");
    definition
        .implements
        .push(settings.entity_interface_name.clone());

    let columns = [
        (&audit.creation_user_column_name, "String"),
        (&audit.creation_date_time_column_name, "DateTime?"),
        (&audit.last_update_user_column_name, "String"),
        (&audit.last_update_date_time_column_name, "DateTime?"),
    ];
    for (column, fallback) in columns {
        if column.trim().is_empty() {
            continue;
        }
        let type_name = sample
            .and_then(|table| table.column(column))
            .map(|column| ctx.property_type(column))
            .unwrap_or_else(|| fallback.to_string());
        definition.add_property_if_absent(Property::new(
            ctx.property_name(column, &definition.name),
            type_name,
        ));
    }
    Some(definition)
}
