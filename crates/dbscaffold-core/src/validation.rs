use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::{Database, DbObject, Table};

/// Validate internal consistency of a database schema.
///
/// This checks:
/// - duplicate tables/views/columns
/// - primary key, identity, unique, default and foreign key columns exist locally
///
/// Foreign keys pointing at unknown tables are not rejected here; the
/// synthesizer skips them with a warning.
pub fn validate_schema(database: &Database) -> Result<()> {
    let mut catalog: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();

    let objects = database
        .tables
        .iter()
        .map(|table| (table.full_name(), table.columns()))
        .chain(
            database
                .views
                .iter()
                .map(|view| (view.full_name(), view.columns())),
        );

    for (full_name, columns) in objects {
        if catalog.contains_key(&full_name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate object name: {full_name}"
            )));
        }

        let mut names = BTreeSet::new();
        for column in columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {full_name}.{}",
                    column.name
                )));
            }
        }

        catalog.insert(full_name, names);
    }

    for table in &database.tables {
        let full_name = table.full_name();
        let columns = catalog.get(&full_name).ok_or_else(|| {
            Error::InvalidSchema(format!("missing table in catalog: {full_name}"))
        })?;
        validate_table_columns(table, &full_name, columns)?;
    }

    Ok(())
}

fn validate_table_columns(table: &Table, full_name: &str, columns: &BTreeSet<&str>) -> Result<()> {
    let require = |kind: &str, column: &str| -> Result<()> {
        if columns.contains(column) {
            Ok(())
        } else {
            Err(Error::InvalidSchema(format!(
                "{kind} column not found: {full_name}.{column}"
            )))
        }
    };

    if let Some(pk) = &table.primary_key {
        for column in &pk.columns {
            require("primary key", column)?;
        }
    }

    if let Some(identity) = &table.identity {
        require("identity", &identity.column)?;
    }

    for unique in &table.uniques {
        for column in &unique.key_columns {
            require("unique", column)?;
        }
    }

    for fk in &table.foreign_keys {
        for column in &fk.key_columns {
            require("foreign key", column)?;
        }
    }

    for default in &table.defaults {
        require("default", &default.column)?;
    }

    Ok(())
}
