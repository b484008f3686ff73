use dbscaffold_core::{Column, Database, DbObject, Table, TypeResolver};

#[test]
fn parses_minimal_schema_with_defaults() {
    let json = r#"{
  "tables": [
    {
      "name": "Student",
      "columns": [
        { "name": "StudentId", "type": "int" },
        { "name": "FirstName", "type": "nvarchar(50)", "length": 50 },
        { "name": "MiddleName", "type": "nvarchar(50)", "length": 50, "nullable": true }
      ],
      "primary_key": { "columns": ["StudentId"] }
    }
  ]
}"#;

    let database = Database::from_json(json).expect("parse schema.json");
    assert_eq!(database.default_schema, "dbo");
    assert!(database.views.is_empty());

    let student = database.find_table("dbo.Student").expect("student table");
    assert_eq!(student.full_name(), "dbo.Student");
    assert_eq!(student.columns.len(), 3);
    assert!(student.columns[2].nullable);
    assert_eq!(
        student.single_key_column().map(|column| column.name.as_str()),
        Some("StudentId")
    );

    let resolver = TypeResolver::new(&database.type_mappings);
    assert_eq!(resolver.resolve_column(&student.columns[1]), "String");
}

#[test]
fn serializes_column_type_under_type_key() {
    let table = Table::new("dbo", "Course", vec![Column::new("CourseId", "int")]);
    let value = serde_json::to_value(&table).expect("serialize table");

    assert_eq!(value["columns"][0]["type"], "int");
    assert_eq!(value["columns"][0]["nullable"], false);
    assert!(value.get("primary_key").is_none());
}

#[test]
fn groups_objects_by_schema_in_declaration_order() {
    let database = Database {
        tables: vec![
            Table::new("sales", "Order", Vec::new()),
            Table::new("dbo", "Customer", Vec::new()),
            Table::new("sales", "OrderDetail", Vec::new()),
        ],
        ..Database::default()
    };

    let groups = database.group_by_schema();
    let layout: Vec<(&str, Vec<&str>)> = groups
        .iter()
        .map(|group| {
            (
                group.schema,
                group.tables.iter().map(|table| table.name.as_str()).collect(),
            )
        })
        .collect();

    assert_eq!(
        layout,
        vec![
            ("sales", vec!["Order", "OrderDetail"]),
            ("dbo", vec!["Customer"]),
        ]
    );
}
