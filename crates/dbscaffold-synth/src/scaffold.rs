//! Scaffold run driver.
//!
//! A run walks schemas in first-appearance order and, inside each schema,
//! tables then views in declaration order. Every object is built in
//! isolation: a failure drops that object's definitions and is recorded in
//! the report, the rest of the run carries on.

use std::time::Instant;

use dbscaffold_core::{Database, DbObject, NamingService, ObjectName, Table, TypeResolver};
use dbscaffold_settings::{GLOBAL_PATTERN, ProjectConfig, SelectionEngine, Settings};
use tracing::{debug, info, warn};

use crate::annotations::add_data_annotations;
use crate::configuration::{build_table_configuration, build_view_configuration};
use crate::context::{ProjectLayout, ScaffoldContext, SchemaObject};
use crate::data_contract::build_data_contract;
use crate::db_context::{DbContextEntry, build_db_context};
use crate::definition::Definition;
use crate::entity::{build_entity, build_view_entity, capability};
use crate::errors::SynthesisError;
use crate::interfaces::{build_audit_interface, build_entity_interface};
use crate::model::{ScaffoldIssue, ScaffoldOutput};
use crate::navigation::add_navigation_properties;
use crate::repository::{RepositoryTable, build_repository_base, build_schema_repository};
use crate::simplify::simplify_data_types;

/// Callbacks invoked while a run progresses.
pub trait ScaffoldHooks {
    fn before_object(&mut self, _object: &ObjectName, _settings: &Settings) {}

    fn after_definition(&mut self, _definition: &Definition) {}

    fn object_failed(&mut self, _object: &ObjectName, _error: &SynthesisError) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ScaffoldHooks for NoHooks {}

/// Definitions built for one table or view.
struct ObjectDefinitions {
    entity: Definition,
    data_contract: Option<Definition>,
    configuration: Option<Definition>,
}

struct ScaffoldedObject<'a> {
    object: SchemaObject<'a>,
    settings: Settings,
    definitions: ObjectDefinitions,
}

struct Collector<'h> {
    hooks: &'h mut dyn ScaffoldHooks,
    output: ScaffoldOutput,
}

impl Collector<'_> {
    fn emit(&mut self, definition: Definition, object: Option<&str>) {
        for (code, text) in definition.warnings() {
            warn!(
                definition = %definition.full_name(),
                object = object.unwrap_or_default(),
                code,
                "{text}"
            );
            let mut issue = ScaffoldIssue::warning(code, text).in_definition(definition.full_name());
            if let Some(object) = object {
                issue = issue.for_object(object);
            }
            self.output.report.record_warning(issue);
        }
        self.output.report.record_definition(&definition);
        self.hooks.after_definition(&definition);
        self.output.definitions.push(definition);
    }

    fn warn(&mut self, issue: ScaffoldIssue) {
        warn!(
            object = issue.object.as_deref().unwrap_or_default(),
            code = %issue.code,
            "{}",
            issue.message
        );
        self.output.report.record_warning(issue);
    }
}

/// Builds the definitions for every object of a database.
pub struct Scaffolder<'a> {
    database: &'a Database,
    types: TypeResolver,
    naming: &'a dyn NamingService,
    selections: SelectionEngine,
    layout: ProjectLayout,
}

impl<'a> Scaffolder<'a> {
    pub fn new(
        database: &'a Database,
        naming: &'a dyn NamingService,
        selections: SelectionEngine,
        layout: ProjectLayout,
    ) -> Self {
        Self {
            database,
            types: TypeResolver::new(&database.type_mappings),
            naming,
            selections,
            layout,
        }
    }

    /// Scaffolder for a project config: its selections and namespace layout.
    pub fn from_config(
        database: &'a Database,
        naming: &'a dyn NamingService,
        config: &ProjectConfig,
    ) -> Result<Self, SynthesisError> {
        let selections = SelectionEngine::from_config(config)?;
        Ok(Self::new(
            database,
            naming,
            selections,
            ProjectLayout::from_config(config),
        ))
    }

    /// Selections, for registering overrides before a run.
    pub fn selections_mut(&mut self) -> &mut SelectionEngine {
        &mut self.selections
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Build every definition for the database.
    pub fn run(&mut self, hooks: &mut dyn ScaffoldHooks) -> ScaffoldOutput {
        let start = Instant::now();
        let database = self.database;
        let groups = database.group_by_schema();
        info!(
            project = %self.layout.project_name,
            schemas = groups.len(),
            tables = database.tables.len(),
            views = database.views.len(),
            "scaffold started"
        );

        let global = self.selections.global().clone();
        let mut resolved = Vec::with_capacity(groups.len());
        for group in &groups {
            let mut objects = Vec::with_capacity(group.tables.len() + group.views.len());
            let tables = group.tables.iter().copied().map(SchemaObject::Table);
            let views = group.views.iter().copied().map(SchemaObject::View);
            for object in tables.chain(views) {
                let settings = self.selections.resolve(&object).clone();
                let pattern = self
                    .selections
                    .matching_pattern(&object.object_name())
                    .map_or_else(|| GLOBAL_PATTERN.to_string(), ToString::to_string);
                objects.push((object, settings, pattern));
            }
            debug!(schema = group.schema, objects = objects.len(), "schema settings resolved");
            resolved.push((group.schema, objects));
        }

        let ctx = ScaffoldContext::new(database, &self.types, self.naming, &self.layout);
        let mut collector = Collector {
            hooks,
            output: ScaffoldOutput::default(),
        };

        let mut schemas: Vec<(&str, Vec<ScaffoldedObject<'_>>)> = Vec::with_capacity(resolved.len());
        for (schema, objects) in resolved {
            let mut scaffolded = Vec::with_capacity(objects.len());
            for (object, settings, pattern) in objects {
                let name = object.object_name();
                let full_name = object.full_name();
                collector.hooks.before_object(&name, &settings);
                collector.output.report.objects_processed += 1;

                match scaffold_object(&ctx, object, &settings) {
                    Ok(definitions) => {
                        info!(
                            object = %full_name,
                            entity = %definitions.entity.name,
                            pattern = %pattern,
                            "object scaffolded"
                        );
                        scaffolded.push(ScaffoldedObject {
                            object,
                            settings,
                            definitions,
                        });
                    }
                    Err(error) => {
                        warn!(object = %full_name, code = error.code(), error = %error, "object failed");
                        collector.hooks.object_failed(&name, &error);
                        collector.output.report.record_failure(
                            ScaffoldIssue::error(error.code(), error.to_string()).for_object(&full_name),
                        );
                    }
                }
            }
            schemas.push((schema, scaffolded));
        }

        let entities: Vec<&Definition> = schemas
            .iter()
            .flat_map(|(_, objects)| objects)
            .map(|scaffolded| &scaffolded.definitions.entity)
            .collect();
        let configurations: Vec<Option<Definition>> = schemas
            .iter()
            .flat_map(|(_, objects)| objects)
            .map(|scaffolded| configure_object(&ctx, scaffolded, &entities))
            .collect();
        let (interfaces, conflicts) = {
            let objects: Vec<&ScaffoldedObject<'_>> =
                schemas.iter().flat_map(|(_, objects)| objects).collect();
            build_interfaces(&ctx, &global, &objects)
        };
        for (scaffolded, configuration) in schemas
            .iter_mut()
            .flat_map(|(_, objects)| objects.iter_mut())
            .zip(configurations)
        {
            scaffolded.definitions.configuration = configuration;
        }

        for interface in interfaces {
            collector.emit(interface, None);
        }
        for issue in conflicts {
            collector.warn(issue);
        }

        for (schema, objects) in &schemas {
            for scaffolded in objects {
                let full_name = scaffolded.object.full_name();
                let definitions = &scaffolded.definitions;
                collector.emit(definitions.entity.clone(), Some(&full_name));
                if let Some(contract) = &definitions.data_contract {
                    collector.emit(contract.clone(), Some(&full_name));
                }
                if let Some(configuration) = &definitions.configuration {
                    collector.emit(configuration.clone(), Some(&full_name));
                }
            }

            let tables: Vec<RepositoryTable<'_>> = objects
                .iter()
                .filter_map(|scaffolded| {
                    scaffolded.object.as_table().map(|table| RepositoryTable {
                        table,
                        settings: &scaffolded.settings,
                        entity: &scaffolded.definitions.entity,
                        data_contract: scaffolded.definitions.data_contract.as_ref(),
                    })
                })
                .collect();
            if tables.is_empty() {
                continue;
            }
            let (mut interface, mut class) = build_schema_repository(&ctx, schema, &tables);
            if global.simplify_data_types {
                simplify_data_types(&mut interface);
                simplify_data_types(&mut class);
            }
            collector.emit(interface, None);
            collector.emit(class, None);
        }

        let mut repository_base = build_repository_base(&ctx);
        let entries: Vec<DbContextEntry<'_>> = schemas
            .iter()
            .flat_map(|(_, objects)| objects)
            .map(|scaffolded| DbContextEntry {
                entity: &scaffolded.definitions.entity,
                configuration: scaffolded.definitions.configuration.as_ref(),
            })
            .collect();
        let mut db_context = build_db_context(&ctx, &global, &entries);
        if global.simplify_data_types {
            simplify_data_types(&mut repository_base);
            simplify_data_types(&mut db_context);
        }
        collector.emit(repository_base, None);
        collector.emit(db_context, None);

        let output = collector.output;
        info!(
            definitions = output.definitions.len(),
            objects = output.report.objects_processed,
            failed = output.report.objects_failed,
            warnings = output.report.warnings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "scaffold completed"
        );
        output
    }

    /// Structural validation of generated definitions. Not available yet.
    pub fn validate_definitions(&self, _definitions: &[Definition]) -> Result<(), SynthesisError> {
        Err(SynthesisError::NotImplemented(
            "definition validation".to_string(),
        ))
    }
}

fn scaffold_object(
    ctx: &ScaffoldContext<'_>,
    object: SchemaObject<'_>,
    settings: &Settings,
) -> Result<ObjectDefinitions, SynthesisError> {
    let (mut entity, mut data_contract) = match object {
        SchemaObject::Table(table) => {
            let mut entity = build_entity(ctx, table, settings);
            add_navigation_properties(ctx, table, settings, &mut entity);
            let data_contract = if settings.entities_with_data_contracts {
                Some(build_data_contract(ctx, table)?)
            } else {
                None
            };
            (entity, data_contract)
        }
        SchemaObject::View(view) => (build_view_entity(ctx, view, settings), None),
    };
    if settings.use_data_annotations {
        add_data_annotations(ctx, object, settings, &mut entity);
    }

    if settings.simplify_data_types {
        simplify_data_types(&mut entity);
        if let Some(contract) = data_contract.as_mut() {
            simplify_data_types(contract);
        }
    }
    Ok(ObjectDefinitions {
        entity,
        data_contract,
        configuration: None,
    })
}

/// Fluent configuration for an object, unless it is mapped by annotations.
fn configure_object(
    ctx: &ScaffoldContext<'_>,
    scaffolded: &ScaffoldedObject<'_>,
    entities: &[&Definition],
) -> Option<Definition> {
    let settings = &scaffolded.settings;
    if settings.use_data_annotations {
        return None;
    }
    let entity = &scaffolded.definitions.entity;
    let mut configuration = match scaffolded.object {
        SchemaObject::Table(table) => {
            build_table_configuration(ctx, table, settings, entity, entities)
        }
        SchemaObject::View(view) => build_view_configuration(ctx, view, entity),
    };
    if settings.simplify_data_types {
        simplify_data_types(&mut configuration);
    }
    Some(configuration)
}

/// Marker interfaces for every interface name the scaffolded entities use.
///
/// The global entity interface is always present. An audit interface is
/// typed from the first table that implements it; a table naming the same
/// audit interface with other audit columns is reported.
fn build_interfaces(
    ctx: &ScaffoldContext<'_>,
    global: &Settings,
    objects: &[&ScaffoldedObject<'_>],
) -> (Vec<Definition>, Vec<ScaffoldIssue>) {
    let mut entity_interfaces: Vec<&Settings> = vec![global];
    let mut audit_interfaces: Vec<(&Settings, Option<&Table>)> = Vec::new();
    if global
        .audit_entity
        .as_ref()
        .is_some_and(|audit| !audit.column_names().is_empty())
    {
        audit_interfaces.push((global, None));
    }

    let mut conflicts = Vec::new();
    for scaffolded in objects {
        let Some(table) = scaffolded.object.as_table() else {
            continue;
        };
        let settings = &scaffolded.settings;
        if !entity_interfaces
            .iter()
            .any(|known| known.entity_interface_name == settings.entity_interface_name)
        {
            entity_interfaces.push(settings);
        }

        let capability = capability(table, settings);
        if !capability.is_audit() {
            continue;
        }
        match audit_interfaces
            .iter_mut()
            .find(|(known, _)| known.audit_entity_interface_name == capability.interface_name())
        {
            None => audit_interfaces.push((settings, Some(table))),
            Some((known, _)) if known.audit_entity != settings.audit_entity => {
                conflicts.push(
                    ScaffoldIssue::warning(
                        "conflicting_audit_interface",
                        format!(
                            "'{}' is already declared with other audit columns",
                            capability.interface_name()
                        ),
                    )
                    .for_object(table.full_name()),
                );
            }
            Some((_, sample)) => {
                if sample.is_none() {
                    *sample = Some(table);
                }
            }
        }
    }

    let mut definitions: Vec<Definition> = entity_interfaces
        .into_iter()
        .map(|settings| build_entity_interface(ctx, settings))
        .collect();
    for (settings, sample) in audit_interfaces {
        if let Some(mut audit) = build_audit_interface(ctx, settings, sample) {
            if settings.simplify_data_types {
                simplify_data_types(&mut audit);
            }
            definitions.push(audit);
        }
    }
    (definitions, conflicts)
}
