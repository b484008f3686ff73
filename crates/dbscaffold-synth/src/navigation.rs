//! Navigation properties derived from foreign keys.
//!
//! The parent side gets one reference per single-column foreign key, the
//! referenced side gets one collection per child table. Every add checks the
//! property names already on the definition, column properties included.

use dbscaffold_core::{DbObject, ForeignKey, Table};
use dbscaffold_settings::Settings;
use tracing::debug;

use crate::context::ScaffoldContext;
use crate::definition::{Constructor, Definition, Line, Navigation, NavigationKind, Property};

/// Add parent and child navigation properties when the settings ask for them.
pub fn add_navigation_properties(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
    settings: &Settings,
    definition: &mut Definition,
) {
    if !settings.declare_navigation_properties {
        return;
    }
    add_parent_navigations(ctx, table, settings, definition);
    add_child_navigations(ctx, table, settings, definition);
}

/// Name of the reference property generated for a parent entity.
pub fn parent_property_name(parent_entity: &str) -> String {
    format!("{parent_entity}Fk")
}

fn constraint_label(table: &Table, fk: &ForeignKey) -> String {
    match &fk.name {
        Some(name) => format!("'{name}'"),
        None => format!("on '{}' ({})", table.full_name(), fk.key_columns.join(", ")),
    }
}

fn add_parent_navigations(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
    settings: &Settings,
    definition: &mut Definition,
) {
    for fk in &table.foreign_keys {
        if fk.key_columns.is_empty() {
            debug!(table = %table.full_name(), "foreign key without columns skipped");
            continue;
        }

        let Some(parent) = ctx.referenced_table(&fk.references) else {
            definition.warn(
                "dangling_foreign_key",
                format!(
                    "foreign key {} references '{}' which is not in the schema",
                    constraint_label(table, fk),
                    fk.references
                ),
            );
            continue;
        };

        if fk.key_columns.len() > 1 {
            definition.warn(
                "multi_column_foreign_key",
                format!(
                    "foreign key {} spans {} columns; no navigation property generated",
                    constraint_label(table, fk),
                    fk.key_columns.len()
                ),
            );
            continue;
        }

        let parent_entity = ctx.entity_name(parent);
        let mut property = Property::new(parent_property_name(&parent_entity), &parent_entity);
        property.is_virtual = settings.declare_navigation_properties_as_virtual;
        property.navigation = Some(Navigation {
            kind: NavigationKind::Parent,
            target: parent.full_name(),
            key_columns: fk.key_columns.clone(),
            constraint: fk.name.clone(),
        });

        let name = property.name.clone();
        if definition.add_property_if_absent(property) {
            definition.add_import(ctx.entity_namespace(&parent.schema));
        } else {
            debug!(entity = %definition.name, property = %name, "navigation already declared");
        }
    }
}

fn add_child_navigations(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
    settings: &Settings,
    definition: &mut Definition,
) {
    let full_name = table.full_name();
    let mut initializers = Vec::new();

    for (child, fk) in ctx.database.tables_referencing(&full_name) {
        if child.full_name() == full_name || fk.key_columns.is_empty() {
            continue;
        }

        let child_entity = ctx.entity_name(child);
        let mut name = ctx.naming.pluralize(&child_entity);
        if name == definition.name {
            name.push('1');
        }
        let collection = settings.navigation_collection(&child_entity);
        let mut property = Property::new(&name, &collection);
        property.is_virtual = settings.declare_navigation_properties_as_virtual;
        property.navigation = Some(Navigation {
            kind: NavigationKind::Child,
            target: child.full_name(),
            key_columns: fk.key_columns.clone(),
            constraint: fk.name.clone(),
        });

        if definition.add_property_if_absent(property) {
            definition.add_import(ctx.entity_namespace(&child.schema));
            initializers.push(Line::code(format!("{name} = new {collection}();")));
        } else {
            debug!(entity = %definition.name, property = %name, "navigation already declared");
        }
    }

    if initializers.is_empty() {
        return;
    }
    definition.add_import(settings.navigation_collection_namespace.clone());
    match definition
        .constructors
        .iter_mut()
        .find(|constructor| constructor.parameters.is_empty())
    {
        Some(constructor) => constructor.lines.extend(initializers),
        None => definition.constructors.insert(
            0,
            Constructor {
                lines: initializers,
                ..Constructor::default()
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use dbscaffold_core::{Column, Database, PrimaryKey};

    use super::*;
    use crate::entity::build_entity;
    use crate::test_support::with_context;

    fn keyed(schema: &str, name: &str, columns: Vec<Column>) -> Table {
        let key = columns[0].name.clone();
        let mut table = Table::new(schema, name, columns);
        table.primary_key = Some(PrimaryKey::new([key]));
        table
    }

    fn entity_with_navigation(database: &Database, table: &str, settings: &Settings) -> Definition {
        with_context(database, |ctx| {
            let table = database.find_table(table).expect("table");
            let mut definition = build_entity(ctx, table, settings);
            add_navigation_properties(ctx, table, settings, &mut definition);
            definition
        })
    }

    fn navigation_names(definition: &Definition) -> Vec<&str> {
        definition
            .properties
            .iter()
            .filter(|property| property.navigation.is_some())
            .map(|property| property.name.as_str())
            .collect()
    }

    #[test]
    fn repeated_foreign_keys_add_a_single_reference() {
        let mut order = keyed(
            "dbo",
            "Order",
            vec![
                Column::new("OrderId", "int"),
                Column::new("BillingAddressId", "int"),
                Column::new("ShippingAddressId", "int"),
            ],
        );
        order.foreign_keys = vec![
            ForeignKey::new(["BillingAddressId"], "dbo.Address"),
            ForeignKey::new(["ShippingAddressId"], "dbo.Address"),
        ];
        let address = keyed("dbo", "Address", vec![Column::new("AddressId", "int")]);
        let database = Database {
            tables: vec![order, address],
            ..Database::default()
        };

        let order = entity_with_navigation(&database, "dbo.Order", &Settings::default());
        assert_eq!(navigation_names(&order), vec!["AddressFk"]);

        let address = entity_with_navigation(&database, "dbo.Address", &Settings::default());
        assert_eq!(navigation_names(&address), vec!["Orders"]);
        assert_eq!(address.property("Orders").expect("orders").type_name, "Collection<Order>");
        assert_eq!(
            address.constructors[0].lines,
            vec![Line::code("Orders = new Collection<Order>();")]
        );
        assert!(address
            .imports
            .contains(&"System.Collections.ObjectModel".to_string()));
    }

    #[test]
    fn cyclic_and_self_references_stay_finite() {
        let mut employee = keyed(
            "dbo",
            "Employee",
            vec![
                Column::new("EmployeeId", "int"),
                Column::new("ManagerId", "int").nullable(),
                Column::new("DepartmentId", "int"),
            ],
        );
        employee.foreign_keys = vec![
            ForeignKey::new(["ManagerId"], "dbo.Employee"),
            ForeignKey::new(["DepartmentId"], "dbo.Department"),
        ];
        let mut department = keyed(
            "dbo",
            "Department",
            vec![Column::new("DepartmentId", "int"), Column::new("HeadId", "int")],
        );
        department.foreign_keys = vec![ForeignKey::new(["HeadId"], "dbo.Employee")];
        let database = Database {
            tables: vec![employee, department],
            ..Database::default()
        };

        let employee = entity_with_navigation(&database, "dbo.Employee", &Settings::default());
        assert_eq!(
            navigation_names(&employee),
            vec!["EmployeeFk", "DepartmentFk", "Departments"]
        );
        let department = entity_with_navigation(&database, "dbo.Department", &Settings::default());
        assert_eq!(navigation_names(&department), vec!["EmployeeFk", "Employees"]);
    }

    #[test]
    fn column_properties_win_over_navigations() {
        let mut item = keyed(
            "dbo",
            "Item",
            vec![
                Column::new("ItemId", "int"),
                Column::new("CategoryId", "int"),
                Column::new("CategoryFk", "int"),
            ],
        );
        item.foreign_keys = vec![ForeignKey::new(["CategoryId"], "dbo.Category")];
        let category = keyed("dbo", "Category", vec![Column::new("CategoryId", "int")]);
        let database = Database {
            tables: vec![item, category],
            ..Database::default()
        };

        let item = entity_with_navigation(&database, "dbo.Item", &Settings::default());
        let property = item.property("CategoryFk").expect("column property");
        assert_eq!(property.type_name, "Int32");
        assert!(property.navigation.is_none());
    }

    #[test]
    fn unsupported_keys_leave_warnings() {
        let mut line = keyed(
            "dbo",
            "OrderLine",
            vec![
                Column::new("OrderLineId", "int"),
                Column::new("OrderId", "int"),
                Column::new("ProductId", "int"),
                Column::new("VendorId", "int"),
            ],
        );
        line.foreign_keys = vec![
            ForeignKey::new(["OrderId", "ProductId"], "dbo.OrderProduct").named("FK_Line_OrderProduct"),
            ForeignKey::new(["VendorId"], "dbo.Vendor"),
            ForeignKey::new(Vec::<String>::new(), "dbo.Order"),
        ];
        let order_product = Table::new("dbo", "OrderProduct", vec![Column::new("OrderId", "int")]);
        let database = Database {
            tables: vec![line, order_product],
            ..Database::default()
        };

        let line = entity_with_navigation(&database, "dbo.OrderLine", &Settings::default());
        assert!(navigation_names(&line).is_empty());
        let codes: Vec<&str> = line.warnings().map(|(code, _)| code).collect();
        assert_eq!(codes, vec!["multi_column_foreign_key", "dangling_foreign_key"]);
    }

    #[test]
    fn virtual_flag_and_disabled_navigation() {
        let mut child = keyed(
            "dbo",
            "Child",
            vec![Column::new("ChildId", "int"), Column::new("ParentId", "int")],
        );
        child.foreign_keys = vec![ForeignKey::new(["ParentId"], "dbo.Parent")];
        let parent = keyed("dbo", "Parent", vec![Column::new("ParentId", "int")]);
        let database = Database {
            tables: vec![child, parent],
            ..Database::default()
        };

        let settings = Settings {
            declare_navigation_properties_as_virtual: true,
            ..Settings::default()
        };
        let child_entity = entity_with_navigation(&database, "dbo.Child", &settings);
        assert!(child_entity.property("ParentFk").expect("parent").is_virtual);

        let settings = Settings {
            declare_navigation_properties: false,
            ..Settings::default()
        };
        let child_entity = entity_with_navigation(&database, "dbo.Child", &settings);
        assert!(navigation_names(&child_entity).is_empty());
    }
}
