//! Object model synthesis for `dbscaffold`.
//!
//! Turns a schema snapshot plus resolved selection settings into abstract
//! code definitions (entities, data contracts, configurations,
//! repositories and the db context) for an external renderer.

pub mod annotations;
pub mod configuration;
pub mod context;
pub mod data_contract;
pub mod db_context;
pub mod definition;
pub mod entity;
pub mod errors;
pub mod interfaces;
pub mod model;
pub mod navigation;
pub mod repository;
pub mod scaffold;
pub mod simplify;

#[cfg(test)]
mod test_support;

pub use context::{ProjectLayout, ScaffoldContext, SchemaObject};
pub use definition::{Definition, DefinitionKind, Line, Shape};
pub use errors::SynthesisError;
pub use model::{ScaffoldIssue, ScaffoldOutput, ScaffoldReport};
pub use scaffold::{NoHooks, ScaffoldHooks, Scaffolder};
