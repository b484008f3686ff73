//! Identifier casing and inflection for generated code.
//!
//! The scaffolder never reaches for a global naming convention: callers
//! construct a [`NamingService`] and pass it in, so a run can swap casing or
//! pluralization rules without touching shared state.

use heck::{ToLowerCamelCase, ToPascalCase};

/// Prefix for identifiers that would otherwise start with a digit.
pub const IDENTIFIER_PREFIX: &str = "V";

/// Prefix for backing fields.
pub const FIELD_PREFIX: &str = "m_";

const MAX_CASE_PASSES: usize = 8;

const RESERVED_WORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Pluralization strategy consumed by the naming service.
pub trait Pluralizer {
    fn pluralize(&self, word: &str) -> String;
    fn singularize(&self, word: &str) -> String;
}

/// Identifier conventions for the generated language.
pub trait NamingService {
    /// Type or member identifier for a raw database name.
    fn to_identifier(&self, raw: &str) -> String;

    /// Method parameter / local variable name.
    fn to_parameter_name(&self, raw: &str) -> String;

    /// Private backing field name.
    fn to_field_name(&self, raw: &str) -> String;

    fn pluralize(&self, identifier: &str) -> String;

    fn singularize(&self, identifier: &str) -> String;

    /// Property identifier that never equals the enclosing type name.
    fn property_name(&self, raw: &str, enclosing_type: &str) -> String {
        let name = self.to_identifier(raw);
        if name == enclosing_type {
            format!("{name}1")
        } else {
            name
        }
    }
}

/// PascalCase members, camelCase parameters, `m_` fields.
#[derive(Debug, Clone, Default)]
pub struct DotNetNaming<P = EnglishInflector> {
    pluralizer: P,
}

impl DotNetNaming<EnglishInflector> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: Pluralizer> DotNetNaming<P> {
    pub fn with_pluralizer(pluralizer: P) -> Self {
        Self { pluralizer }
    }
}

impl<P: Pluralizer> NamingService for DotNetNaming<P> {
    fn to_identifier(&self, raw: &str) -> String {
        let cased = pascal_fixed_point(raw);
        if cased.is_empty() {
            return IDENTIFIER_PREFIX.to_string();
        }
        if cased.starts_with(|c: char| c.is_ascii_digit()) {
            format!("{IDENTIFIER_PREFIX}{cased}")
        } else {
            cased
        }
    }

    fn to_parameter_name(&self, raw: &str) -> String {
        let name = self.to_identifier(raw).to_lower_camel_case();
        if RESERVED_WORDS.contains(&name.as_str()) {
            format!("@{name}")
        } else {
            name
        }
    }

    fn to_field_name(&self, raw: &str) -> String {
        format!(
            "{FIELD_PREFIX}{}",
            self.to_identifier(raw).to_lower_camel_case()
        )
    }

    fn pluralize(&self, identifier: &str) -> String {
        self.pluralizer.pluralize(identifier)
    }

    fn singularize(&self, identifier: &str) -> String {
        self.pluralizer.singularize(identifier)
    }
}

// Single-letter words can make one casing pass produce input the next pass
// reads differently ("a_b" -> "AB" -> "Ab"), so iterate until stable.
fn pascal_fixed_point(raw: &str) -> String {
    let mut current = raw.to_pascal_case();
    for _ in 0..MAX_CASE_PASSES {
        let next = current.to_pascal_case();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const UNCOUNTABLE: &[&str] = &[
    "audio", "data", "deer", "equipment", "feedback", "fish", "information", "metadata",
    "money", "news", "rice", "series", "sheep", "software", "species", "staff",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("alias", "aliases"),
    ("analysis", "analyses"),
    ("bus", "buses"),
    ("campus", "campuses"),
    ("child", "children"),
    ("crisis", "crises"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("status", "statuses"),
    ("tooth", "teeth"),
    ("virus", "viruses"),
    ("woman", "women"),
];

/// Rule-based English inflector working on the last word of an identifier.
///
/// A word ending in `s` (but not `ss`) counts as plural already, which keeps
/// `pluralize` a fixed point under repetition.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl Pluralizer for EnglishInflector {
    fn pluralize(&self, word: &str) -> String {
        let (prefix, segment) = split_last_segment(word);
        if segment.is_empty() {
            return word.to_string();
        }
        let lower = segment.to_lowercase();

        if UNCOUNTABLE.contains(&lower.as_str()) {
            return word.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
            return format!("{prefix}{}", match_case(plural, segment));
        }
        if IRREGULAR.iter().any(|(_, plural)| *plural == lower) {
            return word.to_string();
        }
        if lower.ends_with('s') && !lower.ends_with("ss") {
            return word.to_string();
        }
        if ends_with_consonant_y(&lower) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
        if ["s", "x", "z", "ch", "sh"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
        {
            return format!("{word}es");
        }
        format!("{word}s")
    }

    fn singularize(&self, word: &str) -> String {
        let (prefix, segment) = split_last_segment(word);
        if segment.is_empty() {
            return word.to_string();
        }
        let lower = segment.to_lowercase();

        if UNCOUNTABLE.contains(&lower.as_str()) {
            return word.to_string();
        }
        if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == lower) {
            return format!("{prefix}{}", match_case(singular, segment));
        }
        if IRREGULAR.iter().any(|(singular, _)| *singular == lower) {
            return word.to_string();
        }
        if lower.len() > 3 && lower.ends_with("ies") {
            return format!("{}y", &word[..word.len() - 3]);
        }
        if ["sses", "xes", "ches", "shes"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
        {
            return word[..word.len() - 2].to_string();
        }
        if lower.ends_with('s') && !["ss", "us", "is"].iter().any(|suffix| lower.ends_with(suffix))
        {
            return word[..word.len() - 1].to_string();
        }
        word.to_string()
    }
}

fn split_last_segment(word: &str) -> (&str, &str) {
    let start = word
        .char_indices()
        .filter(|(idx, c)| *idx > 0 && c.is_uppercase())
        .map(|(idx, _)| idx)
        .last()
        .unwrap_or(0);
    word.split_at(start)
}

fn match_case(replacement: &str, original: &str) -> String {
    let mut chars = replacement.chars();
    match (chars.next(), original.chars().next()) {
        (Some(first), Some(lead)) if lead.is_uppercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}

fn ends_with_consonant_y(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    match (chars.next(), chars.next()) {
        (Some('y'), Some(prev)) => !matches!(prev, 'a' | 'e' | 'i' | 'o' | 'u'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "first_name",
        "FirstName",
        "student_id",
        "ORDER_DETAILS",
        "order details",
        "a_b",
        "x_yZ",
        "Order$Total",
        "123",
        "1st_place",
        "",
        "__",
        "XMLFile",
        "AbCd",
    ];

    #[test]
    fn identifiers_use_pascal_case() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.to_identifier("first_name"), "FirstName");
        assert_eq!(naming.to_identifier("student_id"), "StudentId");
        assert_eq!(naming.to_identifier("ORDER_DETAILS"), "OrderDetails");
        assert_eq!(naming.to_identifier("Order$Total"), "OrderTotal");
    }

    #[test]
    fn numeric_identifiers_get_a_letter_prefix() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.to_identifier("123"), "V123");
        assert_eq!(naming.to_identifier("1st_place"), "V1stPlace");
        assert_eq!(naming.to_identifier("$$"), "V");
    }

    #[test]
    fn to_identifier_is_idempotent() {
        let naming = DotNetNaming::new();
        for sample in SAMPLES {
            let once = naming.to_identifier(sample);
            assert_eq!(naming.to_identifier(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn property_names_never_match_the_enclosing_type() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.property_name("student", "Student"), "Student1");
        assert_eq!(naming.property_name("name", "Student"), "Name");
    }

    #[test]
    fn parameter_and_field_names() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.to_parameter_name("student_id"), "studentId");
        assert_eq!(naming.to_parameter_name("class"), "@class");
        assert_eq!(naming.to_field_name("first_name"), "m_firstName");
    }

    #[test]
    fn pluralizes_common_shapes() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.pluralize("Student"), "Students");
        assert_eq!(naming.pluralize("Category"), "Categories");
        assert_eq!(naming.pluralize("Address"), "Addresses");
        assert_eq!(naming.pluralize("Box"), "Boxes");
        assert_eq!(naming.pluralize("Day"), "Days");
        assert_eq!(naming.pluralize("SalesPerson"), "SalesPeople");
        assert_eq!(naming.pluralize("OrderStatus"), "OrderStatuses");
        assert_eq!(naming.pluralize("Data"), "Data");
    }

    #[test]
    fn pluralize_is_a_fixed_point() {
        let naming = DotNetNaming::new();
        let words = [
            "Student", "Students", "Category", "Address", "Box", "Person", "People", "Status",
            "Menu", "Taxi", "Analysis", "Bus", "Church", "Course", "Key", "x", "ID", "Sheep",
            "OrderDetail", "Courses", "s",
        ];
        for word in words {
            let once = naming.pluralize(word);
            assert_eq!(naming.pluralize(&once), once, "word {word:?}");
            let round = naming.pluralize(&naming.singularize(word));
            assert_eq!(naming.pluralize(&round), round, "word {word:?}");
        }
    }

    #[test]
    fn singularizes_common_shapes() {
        let naming = DotNetNaming::new();
        assert_eq!(naming.singularize("Students"), "Student");
        assert_eq!(naming.singularize("Categories"), "Category");
        assert_eq!(naming.singularize("Addresses"), "Address");
        assert_eq!(naming.singularize("Courses"), "Course");
        assert_eq!(naming.singularize("SalesPeople"), "SalesPerson");
        assert_eq!(naming.singularize("Status"), "Status");
    }
}
