//! Repository contracts and implementations, one pair per schema.

use std::collections::HashSet;

use dbscaffold_core::{Column, DbObject, Table};
use dbscaffold_settings::Settings;

use crate::context::ScaffoldContext;
use crate::definition::{
    Constructor, Definition, DefinitionKind, Line, Method, Parameter, Property,
};

const REPOSITORY_BASE: &str = "Repository";
const EF_NAMESPACE: &str = "Microsoft.EntityFrameworkCore";
const PAGE_SIZE: &str = "10";
const PAGE_NUMBER: &str = "1";

/// One table's inputs to its schema repository.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryTable<'a> {
    pub table: &'a Table,
    pub settings: &'a Settings,
    pub entity: &'a Definition,
    pub data_contract: Option<&'a Definition>,
}

/// Guard placed in front of an optional filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGuard {
    /// Numeric and date/time filters: `x.HasValue`.
    HasValue,
    /// String filters: `!string.IsNullOrEmpty(x)`.
    NotEmpty,
    /// Everything else: `x != null`.
    NotNull,
}

impl FilterGuard {
    pub fn for_type(target_type: &str) -> Self {
        match target_type {
            "String" => FilterGuard::NotEmpty,
            "Byte" | "SByte" | "Int16" | "UInt16" | "Int32" | "UInt32" | "Int64" | "UInt64"
            | "Decimal" | "Double" | "Single" | "DateTime" | "DateTimeOffset" | "TimeSpan" => {
                FilterGuard::HasValue
            }
            _ => FilterGuard::NotNull,
        }
    }

    pub fn condition(self, parameter: &str) -> String {
        match self {
            FilterGuard::HasValue => format!("{parameter}.HasValue"),
            FilterGuard::NotEmpty => format!("!string.IsNullOrEmpty({parameter})"),
            FilterGuard::NotNull => format!("{parameter} != null"),
        }
    }
}

/// Columns written on insert: no identity, no concurrency token, no exclusions.
pub fn insert_columns<'t>(table: &'t Table, settings: &Settings) -> Vec<&'t Column> {
    table
        .columns
        .iter()
        .filter(|column| {
            !table.is_identity_column(&column.name)
                && !settings.is_concurrency_token(&column.name)
                && !settings.insert_exclusions.contains(&column.name)
        })
        .collect()
}

/// Columns written on update: insert rules plus no key and no creation audit columns.
pub fn update_columns<'t>(table: &'t Table, settings: &Settings) -> Vec<&'t Column> {
    let creation: Vec<&str> = settings
        .audit_entity
        .as_ref()
        .map(|audit| {
            vec![
                audit.creation_user_column_name.as_str(),
                audit.creation_date_time_column_name.as_str(),
            ]
        })
        .unwrap_or_default();

    table
        .columns
        .iter()
        .filter(|column| {
            !table.is_primary_key_column(&column.name)
                && !table.is_identity_column(&column.name)
                && !settings.is_concurrency_token(&column.name)
                && !settings.update_exclusions.contains(&column.name)
                && !creation.contains(&column.name.as_str())
        })
        .collect()
}

/// `I{Schema}Repository` and `{Schema}Repository` for the tables of one schema.
pub fn build_schema_repository(
    ctx: &ScaffoldContext<'_>,
    schema: &str,
    tables: &[RepositoryTable<'_>],
) -> (Definition, Definition) {
    let schema_name = ctx.naming.to_identifier(schema);
    let interface_name = format!("I{schema_name}Repository");

    let mut interface = Definition::new(
        DefinitionKind::RepositoryInterface,
        ctx.contracts_namespace(),
        &interface_name,
    );
    let mut class = Definition::new(
        DefinitionKind::RepositoryClass,
        ctx.repositories_namespace(),
        format!("{schema_name}Repository"),
    );
    class.base_type = Some(REPOSITORY_BASE.to_string());
    class.implements.push(interface_name);
    class.constructors.push(Constructor {
        parameters: vec![Parameter::new("dbContext", ctx.db_context_name())],
        base_arguments: vec!["dbContext".to_string()],
        lines: Vec::new(),
    });

    for definition in [&mut interface, &mut class] {
        definition.add_import("System");
        definition.add_import("System.Linq");
        definition.add_import("System.Threading.Tasks");
    }
    class.add_import(EF_NAMESPACE);
    class.add_import(ctx.data_layer_namespace());
    class.add_import(ctx.contracts_namespace());

    for entry in tables {
        for definition in [&mut interface, &mut class] {
            definition.add_import(entry.entity.namespace.clone());
            if let Some(contract) = entry.data_contract {
                definition.add_import(contract.namespace.clone());
            }
        }
        for method in table_methods(ctx, entry) {
            interface.methods.push(method.signature());
            class.methods.push(method);
        }
    }

    (interface, class)
}

/// Base class shared by every schema repository.
pub fn build_repository_base(ctx: &ScaffoldContext<'_>) -> Definition {
    let context = ctx.db_context_name();
    let mut definition = Definition::new(
        DefinitionKind::RepositoryBase,
        ctx.repositories_namespace(),
        REPOSITORY_BASE,
    );
    definition.add_import("System.Threading.Tasks");
    definition.add_import(ctx.data_layer_namespace());
    definition.properties.push(Property::new("DbContext", &context));
    definition.constructors.push(Constructor {
        parameters: vec![Parameter::new("dbContext", &context)],
        base_arguments: Vec::new(),
        lines: vec![Line::code("DbContext = dbContext;")],
    });

    let mut commit = Method::new("CommitChanges", Some("Int32".to_string()));
    commit.lines = vec![Line::code("return DbContext.SaveChanges();")];
    let mut commit_async = Method::new("CommitChangesAsync", Some("Task<Int32>".to_string()));
    commit_async.is_async = true;
    commit_async.lines = vec![Line::code("return await DbContext.SaveChangesAsync();")];
    definition.methods.push(commit);
    definition.methods.push(commit_async);
    definition
}

fn table_methods(ctx: &ScaffoldContext<'_>, entry: &RepositoryTable<'_>) -> Vec<Method> {
    let table = entry.table;
    let entity = entry.entity.name.as_str();
    let mut methods = vec![get_all_method(ctx, entry)];
    let mut names: HashSet<String> = HashSet::new();

    let key_columns = table.primary_key_columns();
    let key_lookup = format!("Get{entity}Async");
    if !key_columns.is_empty() {
        names.insert(key_lookup.clone());
        methods.push(lookup_method(ctx, entity, key_lookup.clone(), &key_columns));
    }

    for unique in &table.uniques {
        let columns: Vec<&Column> = unique
            .key_columns
            .iter()
            .filter_map(|name| table.column(name))
            .collect();
        if columns.is_empty() || columns.len() != unique.key_columns.len() {
            continue;
        }
        let suffix: String = columns
            .iter()
            .map(|column| ctx.property_name(&column.name, entity))
            .collect();
        let name = format!("Get{entity}By{suffix}Async");
        if names.insert(name.clone()) {
            methods.push(lookup_method(ctx, entity, name, &columns));
        }
    }

    methods.push(add_method(ctx, entry));
    if !key_columns.is_empty() {
        methods.push(update_method(ctx, entry, &key_lookup));
        methods.push(remove_method(entity));
    }
    methods
}

/// Single-column foreign key columns, in declaration order.
fn filter_columns(table: &Table) -> Vec<&Column> {
    let mut columns: Vec<&Column> = Vec::new();
    for fk in &table.foreign_keys {
        if let [key] = fk.key_columns.as_slice()
            && let Some(column) = table.column(key)
            && !columns.iter().any(|existing| existing.name == column.name)
        {
            columns.push(column);
        }
    }
    columns
}

fn get_all_method(ctx: &ScaffoldContext<'_>, entry: &RepositoryTable<'_>) -> Method {
    let entity = entry.entity.name.as_str();
    let item_type = entry
        .data_contract
        .map_or(entity, |contract| contract.name.as_str());
    let mut method = Method::new(
        format!("Get{}", ctx.naming.pluralize(entity)),
        Some(format!("IQueryable<{item_type}>")),
    )
    .with_parameter(Parameter::new("pageSize", "Int32").with_default(PAGE_SIZE))
    .with_parameter(Parameter::new("pageNumber", "Int32").with_default(PAGE_NUMBER));

    let filters = filter_columns(entry.table);
    for column in &filters {
        method.parameters.push(
            Parameter::new(ctx.naming.to_parameter_name(&column.name), ctx.optional_type(column))
                .with_default("null"),
        );
    }

    let mut lines = vec![Line::comment("Get query from DbSet")];
    match entry.data_contract {
        Some(contract) => lines.extend(projection_lines(ctx, entry, contract)),
        None => lines.push(Line::code(format!(
            "var query = DbContext.Set<{entity}>().AsQueryable();"
        ))),
    }

    for column in &filters {
        let parameter = ctx.naming.to_parameter_name(&column.name);
        let guard = FilterGuard::for_type(&ctx.base_type(column));
        lines.push(Line::Empty);
        lines.push(Line::comment(format!("Filter by: '{}'", column.name)));
        lines.push(Line::code(format!("if ({})", guard.condition(&parameter))));
        lines.push(Line::indented(
            1,
            format!(
                "query = query.Where(item => item.{} == {parameter});",
                item_member(ctx, entry, column)
            ),
        ));
    }

    lines.push(Line::Empty);
    lines.push(Line::code(
        "return query.Skip((pageNumber - 1) * pageSize).Take(pageSize);",
    ));
    method.lines = lines;
    method
}

/// Member of the queried item that holds `column`.
fn item_member(ctx: &ScaffoldContext<'_>, entry: &RepositoryTable<'_>, column: &Column) -> String {
    let object_name = entry.table.full_name();
    entry
        .data_contract
        .and_then(|contract| {
            contract.properties.iter().find(|property| {
                property
                    .origin
                    .as_ref()
                    .is_some_and(|origin| origin.object == object_name && origin.column == column.name)
            })
        })
        .map(|property| property.name.clone())
        .unwrap_or_else(|| ctx.property_name(&column.name, &entry.entity.name))
}

struct Join {
    parent: String,
    parent_entity: String,
    alias: String,
}

fn projection_lines(
    ctx: &ScaffoldContext<'_>,
    entry: &RepositoryTable<'_>,
    contract: &Definition,
) -> Vec<Line> {
    let table = entry.table;
    let entity = entry.entity.name.as_str();
    let object_name = table.full_name();
    let mut lines = vec![Line::code(format!(
        "var query = from item in DbContext.Set<{entity}>()"
    ))];
    let mut joins: Vec<Join> = Vec::new();

    for fk in &table.foreign_keys {
        let [key_column] = fk.key_columns.as_slice() else {
            continue;
        };
        let Some(parent) = ctx.referenced_table(&fk.references) else {
            continue;
        };
        let parent_name = parent.full_name();
        if parent_name == object_name || joins.iter().any(|join| join.parent == parent_name) {
            continue;
        }
        let Some(parent_key) = fk
            .referenced_columns
            .first()
            .map(String::as_str)
            .or_else(|| parent.single_key_column().map(|column| column.name.as_str()))
        else {
            continue;
        };

        let parent_entity = ctx.entity_name(parent);
        let mut alias = format!(
            "{}Item",
            ctx.naming.to_parameter_name(&parent_entity).trim_start_matches('@')
        );
        if joins.iter().any(|join| join.alias == alias) {
            alias = format!("{alias}{}", joins.len() + 1);
        }
        let child_member = ctx.property_name(key_column, entity);
        let parent_member = ctx.property_name(parent_key, &parent_entity);
        let optional = table.column(key_column).is_some_and(|column| column.nullable);

        if optional {
            lines.push(Line::indented(
                1,
                format!(
                    "join {alias}Join in DbContext.Set<{parent_entity}>() on item.{child_member} equals {alias}Join.{parent_member} into {alias}Joins"
                ),
            ));
            lines.push(Line::indented(
                1,
                format!("from {alias} in {alias}Joins.DefaultIfEmpty()"),
            ));
        } else {
            lines.push(Line::indented(
                1,
                format!(
                    "join {alias} in DbContext.Set<{parent_entity}>() on item.{child_member} equals {alias}.{parent_member}"
                ),
            ));
        }
        joins.push(Join {
            parent: parent_name,
            parent_entity,
            alias,
        });
    }

    lines.push(Line::indented(1, format!("select new {}", contract.name)));
    lines.push(Line::indented(1, "{"));
    for property in &contract.properties {
        let Some(origin) = &property.origin else {
            continue;
        };
        let source = if origin.object == object_name {
            Some(("item", ctx.property_name(&origin.column, entity)))
        } else {
            joins
                .iter()
                .find(|join| join.parent == origin.object)
                .map(|join| {
                    (
                        join.alias.as_str(),
                        ctx.property_name(&origin.column, &join.parent_entity),
                    )
                })
        };
        if let Some((alias, member)) = source {
            lines.push(Line::indented(2, format!("{} = {alias}.{member},", property.name)));
        }
    }
    lines.push(Line::indented(1, "};"));
    lines
}

fn lookup_method(
    ctx: &ScaffoldContext<'_>,
    entity: &str,
    name: String,
    columns: &[&Column],
) -> Method {
    let condition = columns
        .iter()
        .map(|column| {
            let member = ctx.property_name(&column.name, entity);
            format!("item.{member} == entity.{member}")
        })
        .collect::<Vec<_>>()
        .join(" && ");

    let mut method = Method::new(name, Some(format!("Task<{entity}>")))
        .with_parameter(Parameter::new("entity", entity));
    method.is_async = true;
    method.lines = vec![Line::code(format!(
        "return await DbContext.Set<{entity}>().FirstOrDefaultAsync(item => {condition});"
    ))];
    method
}

fn add_method(ctx: &ScaffoldContext<'_>, entry: &RepositoryTable<'_>) -> Method {
    let entity = entry.entity.name.as_str();
    let mut lines = vec![
        Line::code(format!("DbContext.Add(new {entity}")),
        Line::code("{"),
    ];
    for column in insert_columns(entry.table, entry.settings) {
        let member = ctx.property_name(&column.name, entity);
        lines.push(Line::indented(1, format!("{member} = entity.{member},")));
    }
    lines.push(Line::code("});"));
    lines.push(Line::Empty);
    lines.push(Line::code("return await CommitChangesAsync();"));

    let mut method = Method::new(format!("Add{entity}Async"), Some("Task<Int32>".to_string()))
        .with_parameter(Parameter::new("entity", entity));
    method.is_async = true;
    method.lines = lines;
    method
}

fn update_method(ctx: &ScaffoldContext<'_>, entry: &RepositoryTable<'_>, key_lookup: &str) -> Method {
    let entity = entry.entity.name.as_str();
    let mut lines = vec![
        Line::code(format!("var entity = await {key_lookup}(changes);")),
        Line::Empty,
        Line::code("if (entity == null)"),
        Line::indented(1, "return 0;"),
        Line::Empty,
    ];
    for column in update_columns(entry.table, entry.settings) {
        let member = ctx.property_name(&column.name, entity);
        lines.push(Line::code(format!("entity.{member} = changes.{member};")));
    }
    lines.push(Line::Empty);
    lines.push(Line::code("return await CommitChangesAsync();"));

    let mut method = Method::new(format!("Update{entity}Async"), Some("Task<Int32>".to_string()))
        .with_parameter(Parameter::new("changes", entity));
    method.is_async = true;
    method.lines = lines;
    method
}

fn remove_method(entity: &str) -> Method {
    let mut method = Method::new(format!("Remove{entity}Async"), Some("Task<Int32>".to_string()))
        .with_parameter(Parameter::new("entity", entity));
    method.is_async = true;
    method.lines = vec![
        Line::code("DbContext.Remove(entity);"),
        Line::Empty,
        Line::code("return await CommitChangesAsync();"),
    ];
    method
}
