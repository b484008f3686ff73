//! Pattern-based settings resolution.
//!
//! A [`SelectionEngine`] owns one [`Selection`] per pattern. Resolving an
//! object walks the precedence tiers (exact, schema wildcard, name wildcard,
//! global) and returns the settings of the most specific match. Nothing is
//! merged across tiers.

use std::fmt;

use dbscaffold_core::{DbObject, ObjectName};
use tracing::debug;

use crate::errors::SettingsError;
use crate::model::{ProjectConfig, Settings, SettingsPatch};

/// Pattern string that always matches.
pub const GLOBAL_PATTERN: &str = "*.*";

const WILDCARD: &str = "*";

/// Parsed selection pattern, ordered from most to least specific.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Exact { schema: String, name: String },
    Schema { schema: String },
    Name { name: String },
    Global,
}

impl Pattern {
    pub fn parse(value: &str) -> Result<Self, SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidPattern {
            pattern: value.to_string(),
            reason: reason.to_string(),
        };

        let (schema, name) = value
            .split_once('.')
            .ok_or_else(|| invalid("expected `schema.object`"))?;
        if name.contains('.') {
            return Err(invalid("more than one `.` separator"));
        }
        if schema.trim().is_empty() || name.trim().is_empty() {
            return Err(invalid("empty schema or object part"));
        }

        Ok(match (schema, name) {
            (WILDCARD, WILDCARD) => Pattern::Global,
            (schema, WILDCARD) => Pattern::Schema {
                schema: schema.to_string(),
            },
            (WILDCARD, name) => Pattern::Name {
                name: name.to_string(),
            },
            (schema, name) => Pattern::Exact {
                schema: schema.to_string(),
                name: name.to_string(),
            },
        })
    }

    /// Precedence tier; lower wins.
    pub fn tier(&self) -> u8 {
        match self {
            Pattern::Exact { .. } => 0,
            Pattern::Schema { .. } => 1,
            Pattern::Name { .. } => 2,
            Pattern::Global => 3,
        }
    }

    /// Case-sensitive match against a `schema.name` pair.
    pub fn matches(&self, object: &ObjectName) -> bool {
        match self {
            Pattern::Exact { schema, name } => *schema == object.schema && *name == object.name,
            Pattern::Schema { schema } => *schema == object.schema,
            Pattern::Name { name } => *name == object.name,
            Pattern::Global => true,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact { schema, name } => write!(f, "{schema}.{name}"),
            Pattern::Schema { schema } => write!(f, "{schema}.{WILDCARD}"),
            Pattern::Name { name } => write!(f, "{WILDCARD}.{name}"),
            Pattern::Global => f.write_str(GLOBAL_PATTERN),
        }
    }
}

/// A pattern paired with the settings it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub pattern: Pattern,
    pub settings: Settings,
}

/// Ordered set of selections with lazy global defaults.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    selections: Vec<Selection>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from a project config.
    ///
    /// The global entry is applied first so that every other selection is
    /// cloned from the configured global state; the rest follow file order.
    pub fn from_config(config: &ProjectConfig) -> Result<Self, SettingsError> {
        let mut engine = Self::new();
        let mut parsed = Vec::with_capacity(config.selections.len());
        for selection in &config.selections {
            parsed.push((Pattern::parse(&selection.pattern)?, &selection.settings));
        }

        for (_, patch) in parsed.iter().filter(|(pattern, _)| *pattern == Pattern::Global) {
            engine.apply_patch_to(Pattern::Global, patch);
        }
        for (pattern, patch) in parsed.into_iter().filter(|(pattern, _)| *pattern != Pattern::Global) {
            engine.apply_patch_to(pattern, patch);
        }

        engine.global();
        Ok(engine)
    }

    /// Global settings, created with built-in defaults on first access.
    pub fn global(&mut self) -> &mut Settings {
        let index = self.ensure_global();
        &mut self.selections[index].settings
    }

    /// Register or mutate the selection for `pattern`.
    ///
    /// A new selection starts as a clone of the current global settings; an
    /// existing one is mutated in place.
    pub fn register_override<F>(&mut self, pattern: &str, mutate: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut Settings),
    {
        let pattern = Pattern::parse(pattern)?;
        mutate(self.settings_for_pattern(pattern));
        Ok(())
    }

    /// Apply a settings patch to the selection for `pattern`.
    pub fn apply_patch(&mut self, pattern: &str, patch: &SettingsPatch) -> Result<(), SettingsError> {
        self.register_override(pattern, |settings| patch.apply(settings))
    }

    /// Effective settings for an object.
    pub fn resolve(&mut self, object: &impl DbObject) -> &Settings {
        self.resolve_name(&ObjectName::of(object))
    }

    /// Effective settings for a `schema.name` pair.
    pub fn resolve_name(&mut self, object: &ObjectName) -> &Settings {
        let global = self.ensure_global();
        let index = self.best_match(object).unwrap_or(global);
        debug!(
            object = %object,
            pattern = %self.selections[index].pattern,
            "settings resolved"
        );
        &self.selections[index].settings
    }

    /// Read-only resolution; `None` only when no global selection exists yet.
    pub fn try_resolve(&self, object: &ObjectName) -> Option<&Settings> {
        self.best_match(object)
            .map(|index| &self.selections[index].settings)
    }

    /// Pattern that wins for `object`, if any selection matches.
    pub fn matching_pattern(&self, object: &ObjectName) -> Option<&Pattern> {
        self.best_match(object)
            .map(|index| &self.selections[index].pattern)
    }

    pub fn get(&self, pattern: &str) -> Option<&Selection> {
        let pattern = Pattern::parse(pattern).ok()?;
        self.selections
            .iter()
            .find(|selection| selection.pattern == pattern)
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    fn apply_patch_to(&mut self, pattern: Pattern, patch: &SettingsPatch) {
        patch.apply(self.settings_for_pattern(pattern));
    }

    fn settings_for_pattern(&mut self, pattern: Pattern) -> &mut Settings {
        if pattern == Pattern::Global {
            return self.global();
        }

        let index = match self.position(&pattern) {
            Some(index) => index,
            None => {
                let global = self.ensure_global();
                let settings = self.selections[global].settings.clone();
                debug!(pattern = %pattern, "selection materialized from global settings");
                self.selections.push(Selection { pattern, settings });
                self.selections.len() - 1
            }
        };
        &mut self.selections[index].settings
    }

    fn ensure_global(&mut self) -> usize {
        match self.position(&Pattern::Global) {
            Some(index) => index,
            None => {
                self.selections.push(Selection {
                    pattern: Pattern::Global,
                    settings: Settings::default(),
                });
                self.selections.len() - 1
            }
        }
    }

    fn position(&self, pattern: &Pattern) -> Option<usize> {
        self.selections
            .iter()
            .position(|selection| selection.pattern == *pattern)
    }

    fn best_match(&self, object: &ObjectName) -> Option<usize> {
        self.selections
            .iter()
            .enumerate()
            .filter(|(_, selection)| selection.pattern.matches(object))
            .min_by_key(|(_, selection)| selection.pattern.tier())
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(full: &str) -> ObjectName {
        ObjectName::parse(full)
    }

    #[test]
    fn parses_pattern_tiers() {
        assert_eq!(Pattern::parse("*.*").expect("global"), Pattern::Global);
        assert_eq!(
            Pattern::parse("Sales.*").expect("schema").to_string(),
            "Sales.*"
        );
        assert_eq!(Pattern::parse("*.Order").expect("name").tier(), 2);
        assert_eq!(Pattern::parse("Sales.Order").expect("exact").tier(), 0);
    }

    #[test]
    fn rejects_malformed_patterns() {
        for value in ["", "Order", "a.b.c", ".Order", "Sales.", " .x"] {
            assert!(Pattern::parse(value).is_err(), "pattern {value:?}");
        }
    }

    #[test]
    fn global_is_created_lazily_on_resolution() {
        let mut engine = SelectionEngine::new();
        assert!(engine.is_empty());
        assert!(engine.try_resolve(&name("dbo.Student")).is_none());

        let settings = engine.resolve_name(&name("dbo.Student")).clone();
        assert_eq!(settings, Settings::default());
        assert_eq!(engine.len(), 1);

        engine.resolve_name(&name("dbo.Course"));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn overrides_clone_current_global_state() {
        let mut engine = SelectionEngine::new();
        engine
            .register_override(GLOBAL_PATTERN, |settings| {
                settings.concurrency_token = Some("Timestamp".to_string());
            })
            .expect("global override");
        engine
            .register_override("Sales.*", |settings| settings.use_data_annotations = true)
            .expect("schema override");

        engine.global().enable_data_bindings = true;

        let sales = engine.resolve_name(&name("Sales.Order")).clone();
        assert_eq!(sales.concurrency_token.as_deref(), Some("Timestamp"));
        assert!(sales.use_data_annotations);
        // Later global changes do not leak into existing selections.
        assert!(!sales.enable_data_bindings);
    }

    #[test]
    fn existing_selection_is_mutated_in_place() {
        let mut engine = SelectionEngine::new();
        engine
            .register_override("dbo.Student", |settings| settings.use_data_annotations = true)
            .expect("first");
        engine
            .register_override("dbo.Student", |settings| {
                settings.declare_navigation_properties = false;
            })
            .expect("second");

        assert_eq!(engine.len(), 2);
        let student = engine.resolve_name(&name("dbo.Student"));
        assert!(student.use_data_annotations);
        assert!(!student.declare_navigation_properties);
    }

    #[test]
    fn most_specific_tier_wins() {
        let mut engine = SelectionEngine::new();
        engine
            .register_override("*.Order", |settings| {
                settings.entity_interface_name = "name".to_string();
            })
            .expect("name");
        engine
            .register_override("Sales.*", |settings| {
                settings.entity_interface_name = "schema".to_string();
            })
            .expect("schema");
        engine
            .register_override("Sales.Order", |settings| {
                settings.entity_interface_name = "exact".to_string();
            })
            .expect("exact");

        let pick = |engine: &mut SelectionEngine, full: &str| {
            engine.resolve_name(&name(full)).entity_interface_name.clone()
        };
        assert_eq!(pick(&mut engine, "Sales.Order"), "exact");
        assert_eq!(pick(&mut engine, "Sales.Customer"), "schema");
        assert_eq!(pick(&mut engine, "dbo.Order"), "name");
        assert_eq!(pick(&mut engine, "dbo.Customer"), "IEntity");
        // Exact patterns are case-sensitive.
        assert_eq!(pick(&mut engine, "sales.order"), "IEntity");
    }

    #[test]
    fn config_applies_global_before_other_selections() {
        let config = ProjectConfig {
            selections: vec![
                crate::model::SelectionConfig {
                    pattern: "dbo.Student".to_string(),
                    settings: SettingsPatch {
                        use_data_annotations: Some(true),
                        ..SettingsPatch::default()
                    },
                },
                crate::model::SelectionConfig {
                    pattern: GLOBAL_PATTERN.to_string(),
                    settings: SettingsPatch {
                        concurrency_token: Some("Timestamp".to_string()),
                        ..SettingsPatch::default()
                    },
                },
            ],
            ..ProjectConfig::new("School", "School")
        };

        let mut engine = SelectionEngine::from_config(&config).expect("engine");
        let student = engine.resolve_name(&name("dbo.Student"));
        assert!(student.use_data_annotations);
        assert_eq!(student.concurrency_token.as_deref(), Some("Timestamp"));
        assert_eq!(
            engine
                .matching_pattern(&name("dbo.Course"))
                .map(ToString::to_string)
                .as_deref(),
            Some(GLOBAL_PATTERN)
        );
    }
}
