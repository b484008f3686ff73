//! Shared inputs for the per-kind builders.

use dbscaffold_core::{
    Column, Database, DbObject, NamingService, ObjectName, Table, TypeResolver, TypeSpec, View,
};
use dbscaffold_settings::{ProjectConfig, ProjectNamespaces};

use crate::errors::SynthesisError;

/// Where each kind of definition lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project_name: String,
    pub root_namespace: String,
    pub namespaces: ProjectNamespaces,
}

impl ProjectLayout {
    pub fn new(project_name: impl Into<String>, root_namespace: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            root_namespace: root_namespace.into(),
            namespaces: ProjectNamespaces::default(),
        }
    }

    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            project_name: config.name.clone(),
            root_namespace: config.namespace.clone(),
            namespaces: config.namespaces.clone(),
        }
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut namespace = self.root_namespace.clone();
        for segment in segments.iter().filter(|segment| !segment.is_empty()) {
            if !namespace.is_empty() {
                namespace.push('.');
            }
            namespace.push_str(segment);
        }
        namespace
    }
}

/// A table or a view, as the builders see it.
#[derive(Debug, Clone, Copy)]
pub enum SchemaObject<'a> {
    Table(&'a Table),
    View(&'a View),
}

impl<'a> SchemaObject<'a> {
    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(self.schema(), self.name())
    }

    pub fn as_table(&self) -> Option<&'a Table> {
        match self {
            SchemaObject::Table(table) => Some(table),
            SchemaObject::View(_) => None,
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, SchemaObject::View(_))
    }
}

impl DbObject for SchemaObject<'_> {
    fn schema(&self) -> &str {
        match self {
            SchemaObject::Table(table) => &table.schema,
            SchemaObject::View(view) => &view.schema,
        }
    }

    fn name(&self) -> &str {
        match self {
            SchemaObject::Table(table) => &table.name,
            SchemaObject::View(view) => &view.name,
        }
    }

    fn columns(&self) -> &[Column] {
        match self {
            SchemaObject::Table(table) => &table.columns,
            SchemaObject::View(view) => &view.columns,
        }
    }
}

/// Read-only services handed to every builder.
#[derive(Clone, Copy)]
pub struct ScaffoldContext<'a> {
    pub database: &'a Database,
    pub types: &'a TypeResolver,
    pub naming: &'a dyn NamingService,
    pub layout: &'a ProjectLayout,
}

impl<'a> ScaffoldContext<'a> {
    pub fn new(
        database: &'a Database,
        types: &'a TypeResolver,
        naming: &'a dyn NamingService,
        layout: &'a ProjectLayout,
    ) -> Self {
        Self {
            database,
            types,
            naming,
            layout,
        }
    }

    /// Class name generated for a table or view.
    pub fn entity_name(&self, object: &impl DbObject) -> String {
        self.naming.to_identifier(object.name())
    }

    /// Property name of `column` inside a type called `enclosing_type`.
    pub fn property_name(&self, column: &str, enclosing_type: &str) -> String {
        self.naming.property_name(column, enclosing_type)
    }

    /// Target type for a column; unknown types fall back to `object`.
    pub fn property_type(&self, column: &Column) -> String {
        self.types.resolve_column(column)
    }

    /// Target type for a column, failing when the type map has no entry.
    pub fn strict_property_type(
        &self,
        object: &impl DbObject,
        column: &Column,
        nullable: bool,
    ) -> Result<String, SynthesisError> {
        let spec = TypeSpec {
            nullable,
            ..TypeSpec::from(column)
        };
        self.types
            .lookup(spec)
            .map(|resolved| resolved.spelling(nullable))
            .ok_or_else(|| SynthesisError::MappingNotFound {
                object: object.full_name(),
                column: column.name.clone(),
                data_type: column.data_type.clone(),
            })
    }

    /// Target type with nullability forced on, used for optional filters.
    pub fn optional_type(&self, column: &Column) -> String {
        self.types.resolve(TypeSpec {
            nullable: true,
            ..TypeSpec::from(column)
        })
    }

    /// Target type without nullability.
    pub fn base_type(&self, column: &Column) -> String {
        self.types.resolve(TypeSpec {
            nullable: false,
            ..TypeSpec::from(column)
        })
    }

    fn schema_segment(&self, schema: &str) -> String {
        if schema == self.database.default_schema {
            String::new()
        } else {
            self.naming.to_identifier(schema)
        }
    }

    /// Namespace holding the shared entity interfaces.
    pub fn entity_layer_namespace(&self) -> String {
        self.layout.join(&[self.layout.namespaces.entity_layer.as_str()])
    }

    pub fn entity_namespace(&self, schema: &str) -> String {
        let segment = self.schema_segment(schema);
        self.layout
            .join(&[self.layout.namespaces.entity_layer.as_str(), segment.as_str()])
    }

    pub fn data_layer_namespace(&self) -> String {
        self.layout.join(&[self.layout.namespaces.data_layer.as_str()])
    }

    pub fn configuration_namespace(&self, schema: &str) -> String {
        let segment = self.schema_segment(schema);
        let namespaces = &self.layout.namespaces;
        self.layout.join(&[
            namespaces.data_layer.as_str(),
            namespaces.configurations.as_str(),
            segment.as_str(),
        ])
    }

    pub fn data_contract_namespace(&self, schema: &str) -> String {
        let segment = self.schema_segment(schema);
        let namespaces = &self.layout.namespaces;
        self.layout.join(&[
            namespaces.data_layer.as_str(),
            namespaces.data_contracts.as_str(),
            segment.as_str(),
        ])
    }

    pub fn contracts_namespace(&self) -> String {
        let namespaces = &self.layout.namespaces;
        self.layout
            .join(&[namespaces.data_layer.as_str(), namespaces.contracts.as_str()])
    }

    pub fn repositories_namespace(&self) -> String {
        let namespaces = &self.layout.namespaces;
        self.layout
            .join(&[namespaces.data_layer.as_str(), namespaces.repositories.as_str()])
    }

    /// `{Project}DbContext`.
    pub fn db_context_name(&self) -> String {
        format!(
            "{}DbContext",
            self.naming.to_identifier(&self.layout.project_name)
        )
    }

    /// Table a foreign key points at, when it exists in the snapshot.
    pub fn referenced_table(&self, references: &str) -> Option<&'a Table> {
        self.database.find_table(references)
    }
}

/// Declared length from the column metadata or the `(n)` type suffix.
pub fn declared_length(column: &Column) -> Option<u32> {
    if column.length.is_some() {
        return column.length;
    }
    let (_, suffix) = column.data_type.split_once('(')?;
    suffix.trim_end_matches(')').trim().parse().ok()
}

/// Whether the column is a server-generated row version.
pub fn is_row_version(column: &Column) -> bool {
    matches!(column.base_type().as_str(), "rowversion" | "timestamp")
}

#[cfg(test)]
mod tests {
    use dbscaffold_core::DotNetNaming;

    use super::*;

    #[test]
    fn namespaces_add_a_segment_for_non_default_schemas() {
        let database = Database::default();
        let types = TypeResolver::default();
        let naming = DotNetNaming::new();
        let layout = ProjectLayout::new("Store", "Store.Core");
        let ctx = ScaffoldContext::new(&database, &types, &naming, &layout);

        assert_eq!(ctx.entity_namespace("dbo"), "Store.Core.EntityLayer");
        assert_eq!(ctx.entity_namespace("sales"), "Store.Core.EntityLayer.Sales");
        assert_eq!(
            ctx.configuration_namespace("Sales"),
            "Store.Core.DataLayer.Configurations.Sales"
        );
        assert_eq!(ctx.contracts_namespace(), "Store.Core.DataLayer.Contracts");
        assert_eq!(ctx.db_context_name(), "StoreDbContext");
    }

    #[test]
    fn length_comes_from_metadata_or_suffix() {
        assert_eq!(declared_length(&Column::new("Name", "nvarchar(50)")), Some(50));
        assert_eq!(
            declared_length(&Column::new("Name", "nvarchar").with_length(20)),
            Some(20)
        );
        assert_eq!(declared_length(&Column::new("Body", "nvarchar(max)")), None);
        assert_eq!(declared_length(&Column::new("Id", "int")), None);
    }

    #[test]
    fn strict_types_report_the_column() {
        let database = Database::default();
        let types = TypeResolver::default();
        let naming = DotNetNaming::new();
        let layout = ProjectLayout::new("Store", "Store");
        let ctx = ScaffoldContext::new(&database, &types, &naming, &layout);
        let table = Table::new("dbo", "Shape", vec![Column::new("Area", "cursor")]);

        let err = ctx
            .strict_property_type(&table, &table.columns[0], false)
            .expect_err("unmapped type");
        assert!(matches!(
            err,
            SynthesisError::MappingNotFound { ref column, .. } if column == "Area"
        ));
        assert_eq!(ctx.property_type(&table.columns[0]), "object");
    }
}
