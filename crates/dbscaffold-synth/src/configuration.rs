//! Fluent mapping classes (`IEntityTypeConfiguration<T>`).

use dbscaffold_core::{Column, DbObject, ForeignKey, ObjectName, Table, View};
use dbscaffold_settings::Settings;

use crate::context::{ScaffoldContext, declared_length, is_row_version};
use crate::definition::{
    Definition, DefinitionKind, Line, Method, NavigationKind, Parameter, string_literal,
};

const EF_NAMESPACE: &str = "Microsoft.EntityFrameworkCore";
const BUILDERS_NAMESPACE: &str = "Microsoft.EntityFrameworkCore.Metadata.Builders";

/// `{Entity}Configuration`.
pub fn configuration_name(entity: &str) -> String {
    format!("{entity}Configuration")
}

fn configuration_shell(
    ctx: &ScaffoldContext<'_>,
    object: &impl DbObject,
    entity: &Definition,
) -> Definition {
    let mut definition = Definition::new(
        DefinitionKind::EntityConfiguration,
        ctx.configuration_namespace(object.schema()),
        configuration_name(&entity.name),
    )
    .with_source(ObjectName::new(object.schema(), object.name()));
    definition.add_import(EF_NAMESPACE);
    definition.add_import(BUILDERS_NAMESPACE);
    definition.add_import(entity.namespace.clone());
    definition
        .implements
        .push(format!("IEntityTypeConfiguration<{}>", entity.name));
    definition
}

fn configure_method(entity: &Definition, lines: Vec<Line>) -> Method {
    let mut method = Method::new("Configure", None).with_parameter(Parameter::new(
        "builder",
        format!("EntityTypeBuilder<{}>", entity.name),
    ));
    method.lines = lines;
    method
}

/// Property selector for one or more members: `p => p.A` or `p => new { p.A, p.B }`.
fn selector(members: &[String]) -> String {
    match members {
        [single] => format!("p => p.{single}"),
        _ => format!(
            "p => new {{ {} }}",
            members
                .iter()
                .map(|member| format!("p.{member}"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn column_mapping(ctx: &ScaffoldContext<'_>, column: &Column, entity: &str) -> Line {
    let property = ctx.property_name(&column.name, entity);
    let mut text = format!(
        "builder.Property(p => p.{property}).HasColumnName({}).HasColumnType({})",
        string_literal(&column.name),
        string_literal(&column.data_type)
    );
    if let Some(length) = declared_length(column)
        && ctx.base_type(column) == "String"
    {
        text.push_str(&format!(".HasMaxLength({length})"));
    }
    if !column.nullable {
        text.push_str(".IsRequired()");
    }
    text.push(';');
    Line::code(text)
}

/// Configuration class for a table entity.
///
/// `entities` holds the other scaffolded entity classes; relationships only
/// name a parent collection that the parent entity actually declares.
pub fn build_table_configuration(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
    settings: &Settings,
    entity: &Definition,
    entities: &[&Definition],
) -> Definition {
    let mut definition = configuration_shell(ctx, table, entity);
    let name = &entity.name;
    let member = |column: &str| ctx.property_name(column, name);
    let mut lines = Vec::new();

    lines.push(Line::comment("Set configuration for entity"));
    lines.push(Line::code(format!(
        "builder.ToTable({}, {});",
        string_literal(&table.name),
        string_literal(&table.schema)
    )));

    lines.push(Line::Empty);
    match &table.primary_key {
        Some(pk) if !pk.columns.is_empty() => {
            let members: Vec<String> = pk
                .columns
                .iter()
                .map(|column| member(column.as_str()))
                .collect();
            lines.push(Line::comment("Set key for entity"));
            lines.push(Line::code(format!("builder.HasKey({});", selector(&members))));
        }
        _ => {
            lines.push(Line::warning(
                "missing_primary_key",
                format!("table '{}' has no primary key", table.full_name()),
            ));
            lines.push(Line::code("builder.HasNoKey();"));
        }
    }

    if let Some(identity) = &table.identity {
        lines.push(Line::Empty);
        lines.push(Line::comment("Set identity for entity (auto increment)"));
        lines.push(Line::code(format!(
            "builder.Property(p => p.{}).UseSqlServerIdentityColumn();",
            member(identity.column.as_str())
        )));
    }

    lines.push(Line::Empty);
    lines.push(Line::comment("Set mapping for columns"));
    for column in &table.columns {
        lines.push(column_mapping(ctx, column, name));
    }

    if let Some(token) = settings.concurrency_token.as_deref()
        && let Some(column) = table.column(token)
    {
        let guard = if is_row_version(column) {
            "IsRowVersion()"
        } else {
            "IsConcurrencyToken()"
        };
        lines.push(Line::Empty);
        lines.push(Line::comment("Set concurrency token for entity"));
        lines.push(Line::code(format!(
            "builder.Property(p => p.{}).{guard};",
            member(column.name.as_str())
        )));
    }

    if settings.add_configuration_for_uniques_in_fluent_api && !table.uniques.is_empty() {
        lines.push(Line::Empty);
        lines.push(Line::comment("Add configuration for uniques"));
        for unique in &table.uniques {
            if unique.key_columns.is_empty() {
                continue;
            }
            let members: Vec<String> = unique
                .key_columns
                .iter()
                .map(|column| member(column.as_str()))
                .collect();
            let mut text = format!("builder.HasIndex({}).IsUnique()", selector(&members));
            if let Some(constraint) = &unique.name {
                text.push_str(&format!(".HasDatabaseName({})", string_literal(constraint)));
            }
            text.push(';');
            lines.push(Line::code(text));
        }
    }

    if settings.add_configuration_for_foreign_keys_in_fluent_api {
        let relationships: Vec<Line> = table
            .foreign_keys
            .iter()
            .filter_map(|fk| relationship_line(ctx, table, fk, entity, entities))
            .collect();
        if !relationships.is_empty() {
            lines.push(Line::Empty);
            lines.push(Line::comment("Add configuration for foreign keys"));
            lines.extend(relationships);
        }
    }

    if settings.add_configuration_for_defaults_in_fluent_api && !table.defaults.is_empty() {
        lines.push(Line::Empty);
        lines.push(Line::comment("Add configuration for defaults"));
        for default in &table.defaults {
            lines.push(Line::code(format!(
                "builder.Property(p => p.{}).HasDefaultValueSql({});",
                member(default.column.as_str()),
                string_literal(&default.value)
            )));
        }
    }

    definition.methods.push(configure_method(entity, lines));
    definition
}

fn relationship_line(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
    fk: &ForeignKey,
    entity: &Definition,
    entities: &[&Definition],
) -> Option<Line> {
    let [key_column] = fk.key_columns.as_slice() else {
        return None;
    };
    let parent = ctx.referenced_table(&fk.references)?;
    let key = ctx.property_name(key_column, &entity.name);

    let navigation = entity.properties.iter().find(|property| {
        property.navigation.as_ref().is_some_and(|navigation| {
            navigation.kind == NavigationKind::Parent
                && navigation.target == fk.references
                && navigation.key_columns == fk.key_columns
        })
    });
    let with_many = match child_collection(entities, parent, table, fk) {
        Some(collection) => format!("WithMany(b => b.{collection})"),
        None => "WithMany()".to_string(),
    };

    let text = match navigation {
        Some(property) => format!(
            "builder.HasOne(p => p.{}).{with_many}.HasForeignKey(p => p.{key});",
            property.name
        ),
        None => format!(
            "builder.HasOne<{}>().{with_many}.HasForeignKey(p => p.{key});",
            ctx.entity_name(parent)
        ),
    };
    Some(Line::code(text))
}

/// Collection the parent entity declares for `fk`, if any.
fn child_collection<'d>(
    entities: &[&'d Definition],
    parent: &Table,
    table: &Table,
    fk: &ForeignKey,
) -> Option<&'d str> {
    let source = ObjectName::of(parent);
    let child = table.full_name();
    let parent_entity = entities
        .iter()
        .find(|definition| definition.source.as_ref() == Some(&source))?;
    parent_entity
        .properties
        .iter()
        .find(|property| {
            property.navigation.as_ref().is_some_and(|navigation| {
                navigation.kind == NavigationKind::Child
                    && navigation.target == child
                    && navigation.key_columns == fk.key_columns
            })
        })
        .map(|property| property.name.as_str())
}

/// Configuration class for a keyless view entity.
pub fn build_view_configuration(
    ctx: &ScaffoldContext<'_>,
    view: &View,
    entity: &Definition,
) -> Definition {
    let mut definition = configuration_shell(ctx, view, entity);
    let mut lines = vec![
        Line::comment("Set configuration for entity"),
        Line::code(format!(
            "builder.ToView({}, {});",
            string_literal(&view.name),
            string_literal(&view.schema)
        )),
        Line::code("builder.HasNoKey();"),
        Line::Empty,
        Line::comment("Set mapping for columns"),
    ];
    for column in &view.columns {
        lines.push(column_mapping(ctx, column, &entity.name));
    }
    definition.methods.push(configure_method(entity, lines));
    definition
}

#[cfg(test)]
mod tests {
    use dbscaffold_core::{Database, DefaultConstraint, Identity, PrimaryKey, UniqueConstraint};

    use super::*;
    use crate::entity::{build_entity, build_view_entity};
    use crate::navigation::add_navigation_properties;
    use crate::test_support::with_context;

    fn store() -> Database {
        let mut order = Table::new(
            "Sales",
            "Order",
            vec![
                Column::new("OrderId", "int"),
                Column::new("Number", "varchar(20)"),
                Column::new("CustomerId", "int"),
                Column::new("CreatedAt", "datetime"),
                Column::new("RowVersion", "rowversion"),
            ],
        );
        order.primary_key = Some(PrimaryKey::new(["OrderId"]));
        order.identity = Some(Identity::new("OrderId"));
        order.uniques = vec![UniqueConstraint::new(["Number"])];
        order.foreign_keys = vec![ForeignKey::new(["CustomerId"], "Sales.Customer")];
        order.defaults = vec![DefaultConstraint {
            name: None,
            column: "CreatedAt".to_string(),
            value: "getdate()".to_string(),
        }];

        let mut customer = Table::new("Sales", "Customer", vec![Column::new("CustomerId", "int")]);
        customer.primary_key = Some(PrimaryKey::new(["CustomerId"]));

        Database {
            tables: vec![order, customer],
            ..Database::default()
        }
    }

    fn configure_lines(definition: &Definition) -> Vec<String> {
        definition
            .method("Configure")
            .expect("configure method")
            .lines
            .iter()
            .filter(|line| matches!(line, Line::Code { .. }))
            .map(|line| line.text().to_string())
            .collect()
    }

    fn order_configuration_with(settings: &Settings, customer_settings: &Settings) -> Definition {
        let database = store();
        with_context(&database, |ctx| {
            let table = &database.tables[0];
            let mut entity = build_entity(ctx, table, settings);
            add_navigation_properties(ctx, table, settings, &mut entity);
            let customer_table = &database.tables[1];
            let mut customer = build_entity(ctx, customer_table, customer_settings);
            add_navigation_properties(ctx, customer_table, customer_settings, &mut customer);
            build_table_configuration(ctx, table, settings, &entity, &[&entity, &customer])
        })
    }

    fn order_configuration(settings: &Settings) -> Definition {
        order_configuration_with(settings, settings)
    }

    #[test]
    fn maps_table_key_identity_columns_and_relationships() {
        let settings = Settings {
            concurrency_token: Some("RowVersion".to_string()),
            add_configuration_for_defaults_in_fluent_api: true,
            ..Settings::default()
        };
        let definition = order_configuration(&settings);

        assert_eq!(definition.name, "OrderConfiguration");
        assert_eq!(
            definition.namespace,
            "Store.DataLayer.Configurations.Sales"
        );
        assert_eq!(
            definition.implements,
            vec!["IEntityTypeConfiguration<Order>".to_string()]
        );
        assert!(definition.imports.contains(&"Store.EntityLayer.Sales".to_string()));

        let lines = configure_lines(&definition);
        let expected = [
            "builder.ToTable(\"Order\", \"Sales\");",
            "builder.HasKey(p => p.OrderId);",
            "builder.Property(p => p.OrderId).UseSqlServerIdentityColumn();",
            "builder.Property(p => p.Number).HasColumnName(\"Number\").HasColumnType(\"varchar(20)\").HasMaxLength(20).IsRequired();",
            "builder.Property(p => p.RowVersion).IsRowVersion();",
            "builder.HasIndex(p => p.Number).IsUnique();",
            "builder.HasOne(p => p.CustomerFk).WithMany(b => b.Orders).HasForeignKey(p => p.CustomerId);",
            "builder.Property(p => p.CreatedAt).HasDefaultValueSql(\"getdate()\");",
        ];
        for line in expected {
            assert!(lines.iter().any(|actual| actual == line), "missing {line}\n{lines:#?}");
        }
    }

    #[test]
    fn fluent_sections_follow_settings() {
        let settings = Settings {
            add_configuration_for_uniques_in_fluent_api: false,
            add_configuration_for_foreign_keys_in_fluent_api: false,
            ..Settings::default()
        };
        let lines = configure_lines(&order_configuration(&settings));

        assert!(!lines.iter().any(|line| line.contains("HasIndex")));
        assert!(!lines.iter().any(|line| line.contains("HasOne")));
        assert!(!lines.iter().any(|line| line.contains("HasDefaultValueSql")));
        assert!(!lines.iter().any(|line| line.contains("IsRowVersion")));
    }

    #[test]
    fn relationships_without_navigation_use_the_generic_form() {
        let settings = Settings {
            declare_navigation_properties: false,
            ..Settings::default()
        };
        let lines = configure_lines(&order_configuration(&settings));
        assert!(lines.contains(
            &"builder.HasOne<Customer>().WithMany().HasForeignKey(p => p.CustomerId);".to_string()
        ));
    }

    #[test]
    fn parent_without_collection_gets_an_unnamed_many_side() {
        let customer_settings = Settings {
            declare_navigation_properties: false,
            ..Settings::default()
        };
        let lines = configure_lines(&order_configuration_with(
            &Settings::default(),
            &customer_settings,
        ));
        assert!(lines.contains(
            &"builder.HasOne(p => p.CustomerFk).WithMany().HasForeignKey(p => p.CustomerId);"
                .to_string()
        ));
        assert!(!lines.iter().any(|line| line.contains("b.Orders")));
    }

    #[test]
    fn renamed_parent_collection_is_followed() {
        let mut database = store();
        database.tables[1].name = "Orders".to_string();
        database.tables[0].foreign_keys = vec![ForeignKey::new(["CustomerId"], "Sales.Orders")];
        let settings = Settings::default();
        let lines = with_context(&database, |ctx| {
            let table = &database.tables[0];
            let mut entity = build_entity(ctx, table, &settings);
            add_navigation_properties(ctx, table, &settings, &mut entity);
            let parent_table = &database.tables[1];
            let mut parent = build_entity(ctx, parent_table, &settings);
            add_navigation_properties(ctx, parent_table, &settings, &mut parent);
            assert!(parent.has_property("Orders1"));
            configure_lines(&build_table_configuration(
                ctx,
                table,
                &settings,
                &entity,
                &[&entity, &parent],
            ))
        });
        assert!(lines.contains(
            &"builder.HasOne(p => p.OrdersFk).WithMany(b => b.Orders1).HasForeignKey(p => p.CustomerId);"
                .to_string()
        ));
    }

    #[test]
    fn missing_key_is_flagged_in_the_method_body() {
        let mut database = store();
        database.tables[0].primary_key = None;
        let definition = with_context(&database, |ctx| {
            let table = &database.tables[0];
            let entity = build_entity(ctx, table, &Settings::default());
            build_table_configuration(ctx, table, &Settings::default(), &entity, &[])
        });

        let method = definition.method("Configure").expect("configure");
        assert!(method.lines.iter().any(|line| matches!(
            line,
            Line::Warning { code, .. } if code == "missing_primary_key"
        )));
        assert!(configure_lines(&definition).contains(&"builder.HasNoKey();".to_string()));
    }

    #[test]
    fn views_map_to_keyless_entities() {
        let view = View::new(
            "dbo",
            "OrderTotals",
            vec![Column::new("OrderId", "int"), Column::new("Total", "money").nullable()],
        );
        let database = Database {
            views: vec![view],
            ..Database::default()
        };
        let definition = with_context(&database, |ctx| {
            let view = &database.views[0];
            let entity = build_view_entity(ctx, view, &Settings::default());
            build_view_configuration(ctx, view, &entity)
        });

        let lines = configure_lines(&definition);
        assert_eq!(lines[0], "builder.ToView(\"OrderTotals\", \"dbo\");");
        assert_eq!(lines[1], "builder.HasNoKey();");
        assert_eq!(
            lines[3],
            "builder.Property(p => p.Total).HasColumnName(\"Total\").HasColumnType(\"money\");"
        );
    }
}
