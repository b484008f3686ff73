//! Entity classes for tables and views.

use dbscaffold_core::{DbObject, ObjectName, Table, View};
use dbscaffold_settings::Settings;
use tracing::debug;

use crate::context::ScaffoldContext;
use crate::definition::{
    Constructor, Definition, DefinitionKind, Event, Field, Line, Parameter, Property,
    PropertyOrigin,
};

const NOTIFY_INTERFACE: &str = "INotifyPropertyChanged";
const NOTIFY_NAMESPACE: &str = "System.ComponentModel";

/// Interface an entity class implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Entity(String),
    AuditEntity(String),
}

impl Capability {
    pub fn interface_name(&self) -> &str {
        match self {
            Capability::Entity(name) | Capability::AuditEntity(name) => name,
        }
    }

    pub fn is_audit(&self) -> bool {
        matches!(self, Capability::AuditEntity(_))
    }
}

/// Audit capability iff every configured audit column exists on the table.
///
/// Blank audit names are ignored; extra table columns do not matter.
pub fn capability(table: &Table, settings: &Settings) -> Capability {
    if let Some(audit) = &settings.audit_entity {
        let names = audit.column_names();
        if !names.is_empty() && names.iter().all(|name| table.column(name).is_some()) {
            return Capability::AuditEntity(settings.audit_entity_interface_name.clone());
        }
    }
    Capability::Entity(settings.entity_interface_name.clone())
}

/// Entity class for a table.
pub fn build_entity(ctx: &ScaffoldContext<'_>, table: &Table, settings: &Settings) -> Definition {
    let name = ctx.entity_name(table);
    let mut definition = Definition::new(
        DefinitionKind::EntityClass,
        ctx.entity_namespace(&table.schema),
        &name,
    )
    .with_source(ObjectName::of(table));
    definition.is_partial = true;
    definition.add_import("System");

    let capability = capability(table, settings);
    definition.add_import(ctx.entity_layer_namespace());
    definition
        .implements
        .push(capability.interface_name().to_string());
    if settings.enable_data_bindings {
        enable_data_bindings(&mut definition);
    }

    add_column_members(ctx, table, settings, &mut definition);

    definition.constructors.push(Constructor::default());
    if let Some(key) = table.single_key_column() {
        let property = ctx.property_name(&key.name, &name);
        let parameter = ctx.naming.to_parameter_name(&key.name);
        definition.constructors.push(Constructor {
            parameters: vec![Parameter::new(&parameter, ctx.property_type(key))],
            base_arguments: Vec::new(),
            lines: vec![Line::code(format!("{property} = {parameter};"))],
        });
    }

    if table.primary_key.is_none() {
        definition.warn(
            "missing_primary_key",
            format!("table '{}' has no primary key", table.full_name()),
        );
    }

    debug!(
        table = %table.full_name(),
        entity = %name,
        capability = capability.interface_name(),
        "entity built"
    );
    definition
}

/// Keyless entity class for a view.
pub fn build_view_entity(ctx: &ScaffoldContext<'_>, view: &View, settings: &Settings) -> Definition {
    let name = ctx.entity_name(view);
    let mut definition = Definition::new(
        DefinitionKind::EntityClass,
        ctx.entity_namespace(&view.schema),
        &name,
    )
    .with_source(ObjectName::of(view));
    definition.is_partial = true;
    definition.add_import("System");
    if settings.enable_data_bindings {
        enable_data_bindings(&mut definition);
    }

    add_column_members(ctx, view, settings, &mut definition);
    definition.constructors.push(Constructor::default());
    definition
}

fn enable_data_bindings(definition: &mut Definition) {
    definition.add_import(NOTIFY_NAMESPACE);
    definition.implements.push(NOTIFY_INTERFACE.to_string());
    definition.events.push(Event {
        name: "PropertyChanged".to_string(),
        type_name: "PropertyChangedEventHandler".to_string(),
    });
}

fn add_column_members(
    ctx: &ScaffoldContext<'_>,
    object: &impl DbObject,
    settings: &Settings,
    definition: &mut Definition,
) {
    let object_name = object.full_name();
    for column in object.columns() {
        let property_name = ctx.property_name(&column.name, &definition.name);
        let type_name = ctx.property_type(column);
        let mut property = Property::new(&property_name, &type_name)
            .with_origin(PropertyOrigin::new(&object_name, &column.name));

        let column_full_name = format!("{object_name}.{}", column.name);
        if settings.uses_backing_field(&column_full_name) {
            let field = ctx.naming.to_field_name(&column.name);
            property.is_automatic = false;
            property.getter = vec![Line::code(format!("return {field};"))];
            property.setter = if settings.enable_data_bindings {
                notifying_setter(&field, &property_name)
            } else {
                vec![Line::code(format!("{field} = value;"))]
            };
            if !definition.fields.iter().any(|existing| existing.name == field) {
                definition.fields.push(Field::new(&field, &type_name));
            }
        }

        if !definition.add_property_if_absent(property) {
            definition.warn(
                "duplicate_property",
                format!(
                    "column '{column_full_name}' maps to property '{property_name}' which is already declared"
                ),
            );
        }
    }
}

fn notifying_setter(field: &str, property: &str) -> Vec<Line> {
    vec![
        Line::code(format!("if ({field} != value)")),
        Line::code("{"),
        Line::indented(1, format!("{field} = value;")),
        Line::indented(
            1,
            format!("PropertyChanged?.Invoke(this, new PropertyChangedEventArgs(nameof({property})));"),
        ),
        Line::code("}"),
    ]
}
