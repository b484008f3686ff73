//! Data-contract (query model) classes.

use std::collections::HashSet;

use dbscaffold_core::{DbObject, ObjectName, Table};
use tracing::debug;

use crate::context::ScaffoldContext;
use crate::definition::{Definition, DefinitionKind, Property, PropertyOrigin};
use crate::errors::SynthesisError;

/// `{Entity}Dto` holding the table's own columns plus the non-key columns
/// of every table it references.
///
/// Referenced columns are captured once per `schema.table.column` key, so a
/// second foreign key to the same table adds nothing. Unmapped column types
/// fail the whole object.
pub fn build_data_contract(
    ctx: &ScaffoldContext<'_>,
    table: &Table,
) -> Result<Definition, SynthesisError> {
    let name = data_contract_name(&ctx.entity_name(table));
    let mut definition = Definition::new(
        DefinitionKind::DataContract,
        ctx.data_contract_namespace(&table.schema),
        &name,
    )
    .with_source(ObjectName::of(table));
    definition.add_import("System");

    let mut captured: HashSet<String> = HashSet::new();
    let object_name = table.full_name();

    for column in &table.columns {
        let type_name = ctx.strict_property_type(table, column, column.nullable)?;
        let origin = PropertyOrigin::new(&object_name, &column.name);
        captured.insert(origin.key());
        definition.add_property_if_absent(
            Property::new(ctx.property_name(&column.name, &name), type_name).with_origin(origin),
        );
    }

    for fk in &table.foreign_keys {
        if fk.key_columns.len() != 1 {
            continue;
        }
        let Some(parent) = ctx.referenced_table(&fk.references) else {
            continue;
        };

        let optional = fk
            .key_columns
            .iter()
            .any(|key| table.column(key).is_some_and(|column| column.nullable));
        let prefix = ctx.entity_name(parent);
        let parent_name = parent.full_name();

        for column in parent
            .columns
            .iter()
            .filter(|column| !parent.is_primary_key_column(&column.name))
        {
            let origin = PropertyOrigin::new(&parent_name, &column.name);
            if captured.contains(&origin.key()) {
                debug!(contract = %name, source = %origin.key(), "column already captured");
                continue;
            }

            let property_name = ctx.property_name(
                &format!("{prefix}{}", ctx.naming.to_identifier(&column.name)),
                &name,
            );
            if definition.has_property(&property_name) {
                continue;
            }
            let type_name = ctx.strict_property_type(parent, column, column.nullable || optional)?;
            captured.insert(origin.key());
            definition.properties.push(Property::new(property_name, type_name).with_origin(origin));
        }
    }

    Ok(definition)
}

/// `{Entity}Dto`.
pub fn data_contract_name(entity: &str) -> String {
    format!("{entity}Dto")
}

#[cfg(test)]
mod tests {
    use dbscaffold_core::{Column, Database, ForeignKey, PrimaryKey};

    use super::*;
    use crate::test_support::with_context;

    fn school() -> Database {
        let mut student = Table::new(
            "dbo",
            "Student",
            vec![
                Column::new("StudentId", "int"),
                Column::new("Name", "nvarchar(100)"),
                Column::new("CourseId", "int").nullable(),
                Column::new("ElectiveCourseId", "int").nullable(),
                Column::new("MentorId", "int"),
            ],
        );
        student.primary_key = Some(PrimaryKey::new(["StudentId"]));
        student.foreign_keys = vec![
            ForeignKey::new(["CourseId"], "dbo.Course"),
            ForeignKey::new(["ElectiveCourseId"], "dbo.Course"),
            ForeignKey::new(["MentorId"], "dbo.Mentor"),
        ];

        let mut course = Table::new(
            "dbo",
            "Course",
            vec![
                Column::new("CourseId", "int"),
                Column::new("Title", "nvarchar(100)"),
                Column::new("Credits", "tinyint"),
            ],
        );
        course.primary_key = Some(PrimaryKey::new(["CourseId"]));

        let mut mentor = Table::new(
            "dbo",
            "Mentor",
            vec![Column::new("MentorId", "int"), Column::new("Name", "nvarchar(100)")],
        );
        mentor.primary_key = Some(PrimaryKey::new(["MentorId"]));

        Database {
            tables: vec![student, course, mentor],
            ..Database::default()
        }
    }

    #[test]
    fn pulls_non_key_columns_of_referenced_tables() {
        let database = school();
        let contract = with_context(&database, |ctx| build_data_contract(ctx, &database.tables[0]))
            .expect("data contract");

        assert_eq!(contract.name, "StudentDto");
        assert_eq!(contract.namespace, "Store.DataLayer.DataContracts");
        let names: Vec<&str> = contract
            .properties
            .iter()
            .map(|property| property.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "StudentId",
                "Name",
                "CourseId",
                "ElectiveCourseId",
                "MentorId",
                "CourseTitle",
                "CourseCredits",
                "MentorName",
            ]
        );
        // Reached through a nullable key, so value types become nullable.
        assert_eq!(
            contract.property("CourseCredits").expect("credits").type_name,
            "Byte?"
        );
        assert_eq!(contract.property("MentorName").expect("mentor").type_name, "String");
    }

    #[test]
    fn unmapped_types_fail_the_object() {
        let mut database = school();
        database.tables[2]
            .columns
            .push(Column::new("Location", "cursor"));

        let error = with_context(&database, |ctx| build_data_contract(ctx, &database.tables[0]))
            .expect_err("unmapped referenced column");
        match error {
            SynthesisError::MappingNotFound {
                object,
                column,
                data_type,
            } => {
                assert_eq!(object, "dbo.Mentor");
                assert_eq!(column, "Location");
                assert_eq!(data_type, "cursor");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
