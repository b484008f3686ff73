//! Language-neutral code model handed to the renderer.
//!
//! A [`Definition`] is a plain value: builders create it, post-passes may
//! rewrite it, and the caller owns it afterwards. There is no shared graph.

use dbscaffold_core::ObjectName;
use serde::{Deserialize, Serialize};

/// What a definition represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    EntityClass,
    EntityInterface,
    AuditEntityInterface,
    DataContract,
    EntityConfiguration,
    RepositoryInterface,
    RepositoryBase,
    RepositoryClass,
    DbContext,
}

/// Class or interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Class,
    Interface,
}

impl DefinitionKind {
    pub fn shape(self) -> Shape {
        match self {
            DefinitionKind::EntityInterface
            | DefinitionKind::AuditEntityInterface
            | DefinitionKind::RepositoryInterface => Shape::Interface,
            _ => Shape::Class,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::EntityClass => "entity_class",
            DefinitionKind::EntityInterface => "entity_interface",
            DefinitionKind::AuditEntityInterface => "audit_entity_interface",
            DefinitionKind::DataContract => "data_contract",
            DefinitionKind::EntityConfiguration => "entity_configuration",
            DefinitionKind::RepositoryInterface => "repository_interface",
            DefinitionKind::RepositoryBase => "repository_base",
            DefinitionKind::RepositoryClass => "repository_class",
            DefinitionKind::DbContext => "db_context",
        }
    }
}

/// Double-quoted string literal with `\` and `"` escaped.
pub fn string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// One opaque line of generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Line {
    Code { indent: u8, text: String },
    Comment { text: String },
    /// Structural problem surfaced to whoever reads the output.
    Warning { code: String, text: String },
    Empty,
}

impl Line {
    pub fn code(text: impl Into<String>) -> Self {
        Line::Code {
            indent: 0,
            text: text.into(),
        }
    }

    pub fn indented(indent: u8, text: impl Into<String>) -> Self {
        Line::Code {
            indent,
            text: text.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Line::Comment { text: text.into() }
    }

    pub fn warning(code: impl Into<String>, text: impl Into<String>) -> Self {
        Line::Warning {
            code: code.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Line::Code { text, .. }
            | Line::Comment { text }
            | Line::Warning { text, .. } => text,
            Line::Empty => "",
        }
    }
}

/// Attribute tag such as `[Key]` or `[Column("Name")]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }
}

/// Schema column a member was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyOrigin {
    /// Full name of the source table or view.
    pub object: String,
    pub column: String,
}

impl PropertyOrigin {
    pub fn new(object: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            column: column.into(),
        }
    }

    /// `"{object}.{column}"`, the capture key used for dedup.
    pub fn key(&self) -> String {
        format!("{}.{}", self.object, self.column)
    }
}

/// Direction of a navigation property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// Single reference to the table a foreign key points at.
    Parent,
    /// Collection of rows whose foreign key points at this table.
    Child,
}

/// Relationship behind a navigation property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub kind: NavigationKind,
    /// Full name of the table on the other side.
    pub target: String,
    pub key_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    pub is_automatic: bool,
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub getter: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setter: Vec<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<PropertyOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
}

impl Property {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            attributes: Vec::new(),
            is_automatic: true,
            is_virtual: false,
            getter: Vec::new(),
            setter: Vec::new(),
            origin: None,
            navigation: None,
        }
    }

    pub fn with_origin(mut self, origin: PropertyOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub is_readonly: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_readonly: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Arguments forwarded to the base constructor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// `None` for `void`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_override: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
            is_async: false,
            is_override: false,
            lines: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Same member without a body, as declared on an interface.
    pub fn signature(&self) -> Self {
        Self {
            is_async: false,
            is_override: false,
            lines: Vec::new(),
            ..self.clone()
        }
    }
}

/// A generated class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(default)]
    pub is_partial: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<Constructor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Method>,
    /// Definition-level comments and warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    /// Schema object this definition was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ObjectName>,
}

impl Definition {
    pub fn new(kind: DefinitionKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            imports: Vec::new(),
            attributes: Vec::new(),
            base_type: None,
            implements: Vec::new(),
            is_partial: false,
            events: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            lines: Vec::new(),
            source: None,
        }
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn with_source(mut self, source: ObjectName) -> Self {
        self.source = Some(source);
        self
    }

    /// `namespace.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Add an import unless it is already present or is the own namespace.
    pub fn add_import(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if namespace != self.namespace && !self.imports.contains(&namespace) {
            self.imports.push(namespace);
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|property| property.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Push `property` unless one with the same name exists; returns whether it was added.
    pub fn add_property_if_absent(&mut self, property: Property) -> bool {
        if self.has_property(&property.name) {
            return false;
        }
        self.properties.push(property);
        true
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn warn(&mut self, code: impl Into<String>, text: impl Into<String>) {
        self.lines.push(Line::warning(code, text));
    }

    /// `(code, text)` of every definition-level warning.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Warning { code, text } => Some((code.as_str(), text.as_str())),
            _ => None,
        })
    }
}
