//! The project's database context class.

use dbscaffold_settings::Settings;

use crate::context::ScaffoldContext;
use crate::definition::{Constructor, Definition, DefinitionKind, Line, Method, Parameter, Property};

const EF_NAMESPACE: &str = "Microsoft.EntityFrameworkCore";

/// An entity and, in fluent mode, its configuration class.
#[derive(Debug, Clone, Copy)]
pub struct DbContextEntry<'a> {
    pub entity: &'a Definition,
    pub configuration: Option<&'a Definition>,
}

/// `{Project}DbContext : DbContext`.
///
/// Declares one `DbSet<T>` per entity when the settings ask for it and
/// applies every configuration class in `OnModelCreating`.
pub fn build_db_context(
    ctx: &ScaffoldContext<'_>,
    settings: &Settings,
    entries: &[DbContextEntry<'_>],
) -> Definition {
    let name = ctx.db_context_name();
    let mut definition =
        Definition::new(DefinitionKind::DbContext, ctx.data_layer_namespace(), &name);
    definition.base_type = Some("DbContext".to_string());
    definition.add_import("System");
    definition.add_import(EF_NAMESPACE);

    definition.constructors.push(Constructor {
        parameters: vec![Parameter::new(
            "options",
            format!("DbContextOptions<{name}>"),
        )],
        base_arguments: vec!["options".to_string()],
        lines: Vec::new(),
    });

    if settings.declare_db_set_properties_in_db_context {
        for entry in entries {
            let entity = &entry.entity.name;
            let property = Property::new(
                ctx.naming.pluralize(entity),
                format!("DbSet<{entity}>"),
            );
            if definition.add_property_if_absent(property) {
                definition.add_import(entry.entity.namespace.clone());
            }
        }
    }

    let mut lines = Vec::new();
    for configuration in entries.iter().filter_map(|entry| entry.configuration) {
        definition.add_import(configuration.namespace.clone());
        lines.push(Line::code(format!(
            "modelBuilder.ApplyConfiguration(new {}());",
            configuration.name
        )));
    }
    if !lines.is_empty() {
        lines.push(Line::Empty);
    }
    lines.push(Line::code("base.OnModelCreating(modelBuilder);"));

    let mut on_model_creating = Method::new("OnModelCreating", None)
        .with_parameter(Parameter::new("modelBuilder", "ModelBuilder"));
    on_model_creating.is_override = true;
    on_model_creating.lines = lines;
    definition.methods.push(on_model_creating);

    definition
}
