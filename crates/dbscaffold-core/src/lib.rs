//! Core contracts for dbscaffold.
//!
//! This crate defines the schema model handed to the scaffolder, the type
//! catalog and resolver, and the naming service shared by the synthesizer.

pub mod constraints;
pub mod error;
pub mod naming;
pub mod schema;
pub mod type_resolver;
pub mod types;
pub mod validation;

pub use constraints::{DefaultConstraint, ForeignKey, Identity, PrimaryKey, UniqueConstraint};
pub use error::{Error, Result};
pub use naming::{DotNetNaming, EnglishInflector, NamingService, Pluralizer};
pub use schema::{Column, Database, DbObject, ObjectName, SchemaGroup, Table, View};
pub use type_resolver::{ResolvedType, TypeResolver, TypeSpec};
pub use types::{TypeMapping, UNKNOWN_TARGET_TYPE, sql_server_type_mappings, strip_size_suffix};
pub use validation::validate_schema;
