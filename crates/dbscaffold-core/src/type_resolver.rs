use std::collections::HashMap;

use tracing::debug;

use crate::schema::Column;
use crate::types::{TypeMapping, UNKNOWN_TARGET_TYPE, strip_size_suffix};

/// Type facts needed to resolve a target type.
///
/// Columns and routine parameters both reduce to this shape so they resolve
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec<'a> {
    pub data_type: &'a str,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
}

impl<'a> TypeSpec<'a> {
    pub fn new(data_type: &'a str, nullable: bool) -> Self {
        Self {
            data_type,
            length: None,
            precision: None,
            scale: None,
            nullable,
        }
    }
}

impl<'a> From<&'a Column> for TypeSpec<'a> {
    fn from(column: &'a Column) -> Self {
        Self {
            data_type: &column.data_type,
            length: column.length,
            precision: column.precision,
            scale: column.scale,
            nullable: column.nullable,
        }
    }
}

/// Resolved target mapping before nullability is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub target_type: String,
    pub allow_nullable: bool,
}

impl ResolvedType {
    fn unknown() -> Self {
        Self {
            target_type: UNKNOWN_TARGET_TYPE.to_string(),
            allow_nullable: false,
        }
    }

    /// Spelling for a column with the given nullability.
    pub fn spelling(&self, nullable: bool) -> String {
        if nullable && self.allow_nullable {
            format!("{}?", self.target_type)
        } else {
            self.target_type.clone()
        }
    }
}

/// Maps database types to target language types.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    mappings: HashMap<String, Vec<TypeMapping>>,
}

impl TypeResolver {
    pub fn new(mappings: &[TypeMapping]) -> Self {
        let mut index: HashMap<String, Vec<TypeMapping>> = HashMap::new();
        for mapping in mappings {
            index
                .entry(mapping.database_type.to_lowercase())
                .or_default()
                .push(mapping.clone());
        }
        Self { mappings: index }
    }

    /// Resolve to a target type name; unknown types yield `object`.
    pub fn resolve(&self, spec: TypeSpec<'_>) -> String {
        let resolved = self.lookup(spec).unwrap_or_else(|| {
            debug!(data_type = spec.data_type, "no type mapping, using fallback");
            ResolvedType::unknown()
        });
        resolved.spelling(spec.nullable)
    }

    /// Resolve a column's target type.
    pub fn resolve_column(&self, column: &Column) -> String {
        self.resolve(TypeSpec::from(column))
    }

    /// Resolve a routine parameter's target type.
    pub fn resolve_parameter(&self, data_type: &str, nullable: bool) -> String {
        self.resolve(TypeSpec::new(data_type, nullable))
    }

    /// Find the mapping for a type, following one parent alias.
    pub fn lookup(&self, spec: TypeSpec<'_>) -> Option<ResolvedType> {
        let mapping = self.find(strip_size_suffix(spec.data_type), spec)?;
        match (&mapping.target_type, &mapping.parent_database_type) {
            (Some(target), _) => Some(ResolvedType {
                target_type: target.clone(),
                allow_nullable: mapping.allow_nullable,
            }),
            (None, Some(parent)) => {
                let parent = self.find(strip_size_suffix(parent), spec)?;
                parent.target_type.as_ref().map(|target| ResolvedType {
                    target_type: target.clone(),
                    allow_nullable: parent.allow_nullable,
                })
            }
            (None, None) => None,
        }
    }

    /// Whether a type resolves to a concrete mapping.
    pub fn is_mapped(&self, data_type: &str) -> bool {
        self.lookup(TypeSpec::new(data_type, false)).is_some()
    }

    fn find(&self, base_type: &str, spec: TypeSpec<'_>) -> Option<&TypeMapping> {
        let candidates = self.mappings.get(&base_type.to_lowercase())?;
        candidates
            .iter()
            .find(|mapping| {
                mapping.has_variant()
                    && mapping.precision.is_none_or(|value| Some(value) == spec.precision)
                    && mapping.scale.is_none_or(|value| Some(value) == spec.scale)
            })
            .or_else(|| candidates.iter().find(|mapping| !mapping.has_variant()))
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(&crate::types::sql_server_type_mappings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sql_server_type_mappings;

    fn resolver() -> TypeResolver {
        let mut mappings = sql_server_type_mappings();
        mappings.push(TypeMapping::value("decimal", "Boolean").with_precision(1, 0));
        mappings.push(TypeMapping::alias("Flag", "bit"));
        mappings.push(TypeMapping::alias("Phone", "Name"));
        mappings.push(TypeMapping::alias("Name", "nvarchar"));
        TypeResolver::new(&mappings)
    }

    #[test]
    fn strips_suffix_before_lookup() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(TypeSpec::new("varchar(50)", false)), "String");
        assert_eq!(resolver.resolve(TypeSpec::new("INT", false)), "Int32");
    }

    #[test]
    fn wraps_only_value_types() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(TypeSpec::new("int", true)), "Int32?");
        assert_eq!(resolver.resolve(TypeSpec::new("nvarchar", true)), "String");
        assert_eq!(resolver.resolve(TypeSpec::new("varbinary(max)", true)), "Byte[]");
        assert_eq!(resolver.resolve(TypeSpec::new("datetime", true)), "DateTime?");
    }

    #[test]
    fn unknown_types_fall_back_to_object() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(TypeSpec::new("cursor", false)), "object");
        assert_eq!(resolver.resolve(TypeSpec::new("cursor", true)), "object");
        assert!(!resolver.is_mapped("cursor"));
    }

    #[test]
    fn prefers_precision_variant() {
        let resolver = resolver();
        let spec = TypeSpec {
            data_type: "decimal(1,0)",
            length: None,
            precision: Some(1),
            scale: Some(0),
            nullable: false,
        };
        assert_eq!(resolver.resolve(spec), "Boolean");

        let spec = TypeSpec {
            precision: Some(18),
            scale: Some(2),
            ..spec
        };
        assert_eq!(resolver.resolve(spec), "Decimal");
    }

    #[test]
    fn follows_parent_alias_once() {
        let resolver = resolver();
        assert_eq!(resolver.resolve(TypeSpec::new("Flag", true)), "Boolean?");
        assert_eq!(resolver.resolve(TypeSpec::new("Name", true)), "String");
        // Two hops are not followed.
        assert_eq!(resolver.resolve(TypeSpec::new("Phone", false)), "object");
    }

    #[test]
    fn parameters_resolve_like_columns() {
        let resolver = resolver();
        let column = Column::new("Total", "money").nullable();
        assert_eq!(
            resolver.resolve_column(&column),
            resolver.resolve_parameter("money", true)
        );
    }
}
