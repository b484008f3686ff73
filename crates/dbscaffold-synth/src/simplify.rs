//! Rewrites CLR type names to their language keywords.

use crate::definition::Definition;

const SYSTEM_PREFIX: &str = "System.";

const KEYWORDS: &[(&str, &str)] = &[
    ("Boolean", "bool"),
    ("Byte", "byte"),
    ("Char", "char"),
    ("Decimal", "decimal"),
    ("Double", "double"),
    ("Int16", "short"),
    ("Int32", "int"),
    ("Int64", "long"),
    ("Object", "object"),
    ("SByte", "sbyte"),
    ("Single", "float"),
    ("String", "string"),
    ("UInt16", "ushort"),
    ("UInt32", "uint"),
    ("UInt64", "ulong"),
];

/// Simplify one type spelling, including generic arguments, `?` and `[]`.
pub fn simplify_type_name(type_name: &str) -> String {
    let mut simplified = String::with_capacity(type_name.len());
    let mut token = String::new();
    for c in type_name.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            token.push(c);
        } else {
            simplified.push_str(&keyword_for(&token));
            token.clear();
            simplified.push(c);
        }
    }
    simplified.push_str(&keyword_for(&token));
    simplified
}

fn keyword_for(token: &str) -> String {
    let bare = token.strip_prefix(SYSTEM_PREFIX).unwrap_or(token);
    KEYWORDS
        .iter()
        .find(|(clr, _)| *clr == bare)
        .map(|(_, keyword)| keyword.to_string())
        .unwrap_or_else(|| token.to_string())
}

/// Rewrite every type spelling carried by a definition.
pub fn simplify_data_types(definition: &mut Definition) {
    for property in &mut definition.properties {
        property.type_name = simplify_type_name(&property.type_name);
    }
    for field in &mut definition.fields {
        field.type_name = simplify_type_name(&field.type_name);
    }
    for constructor in &mut definition.constructors {
        for parameter in &mut constructor.parameters {
            parameter.type_name = simplify_type_name(&parameter.type_name);
        }
    }
    for method in &mut definition.methods {
        if let Some(return_type) = &method.return_type {
            method.return_type = Some(simplify_type_name(return_type));
        }
        for parameter in &mut method.parameters {
            parameter.type_name = simplify_type_name(&parameter.type_name);
        }
    }
    if let Some(base_type) = &definition.base_type {
        definition.base_type = Some(simplify_type_name(base_type));
    }
    for implemented in &mut definition.implements {
        *implemented = simplify_type_name(implemented);
    }
}
