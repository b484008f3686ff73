//! Attribute-based mapping post-pass.

use dbscaffold_core::DbObject;
use dbscaffold_settings::Settings;

use crate::context::{ScaffoldContext, SchemaObject, declared_length, is_row_version};
use crate::definition::{Attribute, Definition, NavigationKind, string_literal};

const ANNOTATIONS_NAMESPACE: &str = "System.ComponentModel.DataAnnotations";
const SCHEMA_ANNOTATIONS_NAMESPACE: &str = "System.ComponentModel.DataAnnotations.Schema";
const EF_NAMESPACE: &str = "Microsoft.EntityFrameworkCore";

/// Decorate an entity class with mapping attributes for its source object.
pub fn add_data_annotations(
    ctx: &ScaffoldContext<'_>,
    object: SchemaObject<'_>,
    settings: &Settings,
    definition: &mut Definition,
) {
    definition.add_import(ANNOTATIONS_NAMESPACE);
    definition.add_import(SCHEMA_ANNOTATIONS_NAMESPACE);
    definition.attributes.push(
        Attribute::new("Table")
            .with_argument(string_literal(object.name()))
            .with_argument(format!("Schema = {}", string_literal(object.schema()))),
    );
    if object.is_view() {
        definition.add_import(EF_NAMESPACE);
        definition.attributes.push(Attribute::new("Keyless"));
    }

    let object_name = object.full_name();
    let entity_name = definition.name.clone();
    let table = object.as_table();

    for property in &mut definition.properties {
        if let Some(navigation) = &property.navigation {
            if navigation.kind == NavigationKind::Parent
                && let [key_column] = navigation.key_columns.as_slice()
            {
                let key_property = ctx.property_name(key_column, &entity_name);
                property
                    .attributes
                    .push(Attribute::new("ForeignKey").with_argument(string_literal(&key_property)));
            }
            continue;
        }

        let Some(origin) = property.origin.as_ref().filter(|origin| origin.object == object_name)
        else {
            continue;
        };
        let Some(column) = object.column(&origin.column) else {
            continue;
        };

        let is_key = table.is_some_and(|table| table.is_primary_key_column(&column.name));
        if is_key {
            property.attributes.push(Attribute::new("Key"));
        }
        if table.is_some_and(|table| table.is_identity_column(&column.name)) {
            property.attributes.push(
                Attribute::new("DatabaseGenerated")
                    .with_argument("DatabaseGeneratedOption.Identity"),
            );
        }
        property.attributes.push(
            Attribute::new("Column")
                .with_argument(string_literal(&column.name))
                .with_argument(format!("TypeName = {}", string_literal(&column.data_type))),
        );
        if !column.nullable && !is_key {
            property.attributes.push(Attribute::new("Required"));
        }
        if let Some(length) = declared_length(column)
            && property.type_name == "String"
        {
            property
                .attributes
                .push(Attribute::new("StringLength").with_argument(length.to_string()));
        }
        if settings.is_concurrency_token(&column.name) {
            let name = if is_row_version(column) {
                "Timestamp"
            } else {
                "ConcurrencyCheck"
            };
            property.attributes.push(Attribute::new(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use dbscaffold_core::{Column, Database, ForeignKey, Identity, PrimaryKey, Table, View};

    use super::*;
    use crate::entity::{build_entity, build_view_entity};
    use crate::navigation::add_navigation_properties;
    use crate::test_support::with_context;

    fn attribute_names(definition: &Definition, property: &str) -> Vec<String> {
        definition
            .property(property)
            .expect("property")
            .attributes
            .iter()
            .map(|attribute| attribute.name.clone())
            .collect()
    }

    #[test]
    fn table_columns_get_mapping_attributes() {
        let mut student = Table::new(
            "dbo",
            "Student",
            vec![
                Column::new("StudentId", "int"),
                Column::new("FirstName", "nvarchar(50)"),
                Column::new("Nickname", "nvarchar(20)").nullable(),
                Column::new("CourseId", "int"),
                Column::new("Timestamp", "rowversion"),
            ],
        );
        student.primary_key = Some(PrimaryKey::new(["StudentId"]));
        student.identity = Some(Identity::new("StudentId"));
        student.foreign_keys = vec![ForeignKey::new(["CourseId"], "dbo.Course")];
        let mut course = Table::new("dbo", "Course", vec![Column::new("CourseId", "int")]);
        course.primary_key = Some(PrimaryKey::new(["CourseId"]));
        let database = Database {
            tables: vec![student, course],
            ..Database::default()
        };
        let settings = Settings {
            use_data_annotations: true,
            concurrency_token: Some("Timestamp".to_string()),
            ..Settings::default()
        };

        let definition = with_context(&database, |ctx| {
            let table = &database.tables[0];
            let mut definition = build_entity(ctx, table, &settings);
            add_navigation_properties(ctx, table, &settings, &mut definition);
            add_data_annotations(ctx, SchemaObject::Table(table), &settings, &mut definition);
            definition
        });

        assert_eq!(definition.attributes[0].name, "Table");
        assert_eq!(
            definition.attributes[0].arguments,
            vec!["\"Student\"".to_string(), "Schema = \"dbo\"".to_string()]
        );
        assert_eq!(
            attribute_names(&definition, "StudentId"),
            vec!["Key", "DatabaseGenerated", "Column"]
        );
        assert_eq!(
            attribute_names(&definition, "FirstName"),
            vec!["Column", "Required", "StringLength"]
        );
        assert_eq!(
            attribute_names(&definition, "Nickname"),
            vec!["Column", "StringLength"]
        );
        assert_eq!(
            attribute_names(&definition, "Timestamp"),
            vec!["Column", "Required", "Timestamp"]
        );
        let course = definition.property("CourseFk").expect("navigation");
        assert_eq!(course.attributes[0].name, "ForeignKey");
        assert_eq!(course.attributes[0].arguments, vec!["\"CourseId\"".to_string()]);
    }

    #[test]
    fn views_are_keyless() {
        let view = View::new("dbo", "ActiveStudents", vec![Column::new("StudentId", "int")]);
        let database = Database {
            views: vec![view],
            ..Database::default()
        };
        let settings = Settings::default();
        let definition = with_context(&database, |ctx| {
            let view = &database.views[0];
            let mut definition = build_view_entity(ctx, view, &settings);
            add_data_annotations(ctx, SchemaObject::View(view), &settings, &mut definition);
            definition
        });

        let names: Vec<&str> = definition
            .attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .collect();
        assert_eq!(names, vec!["Table", "Keyless"]);
        assert_eq!(attribute_names(&definition, "StudentId"), vec!["Column", "Required"]);
    }
}
