//! Binding Expression Analysis
//!
//! Detects `@{...}` markers inside attribute values, extracts the referenced
//! variable, classifies the inner expression by fixed pattern precedence, and
//! infers plausible types for undeclared variables.
//!
//! Classification is an ordered rule table, not a branch chain: business-logic
//! constructs (ternary, null-coalescing, comparison, logical, string
//! interpolation, not-null assertion, range, method call with arguments) are
//! checked first and each produces one warning; the remaining shapes
//! (negation, array index, safe chain, nested property, action reference,
//! simple identifier) translate silently.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{ComponentNode, VariableScope};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "construct")]
pub enum BindingKind {
    SimpleProperty,
    NestedProperty,
    SafeChain,
    ArrayIndex,
    Negation,
    ActionReference,
    BusinessLogic(String),
}

/// One parsed `@{...}` expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingExpression {
    /// Inner expression with the wrapper stripped.
    pub raw: String,
    /// Root variable the expression reads.
    pub root: String,
    /// Trailing null-coalescing default, if any.
    pub default: Option<String>,
    pub kind: BindingKind,
}

pub fn contains_binding_marker(value: &str) -> bool {
    value.contains("@{")
}

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref CALL_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*\(([\s\S]*)\)$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL TOKEN SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Find `token` at bracket depth 0, skipping string literals.
fn find_top_level(code: &str, token: &str) -> Option<usize> {
    let bytes = code.as_bytes();
    let tok = token.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut string_char = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if i > 0 && bytes[i - 1] == b'\\' {
            i += 1;
            continue;
        }
        if !in_string && (c == b'"' || c == b'\'' || c == b'`') {
            in_string = true;
            string_char = c;
            i += 1;
            continue;
        }
        if in_string {
            if c == string_char {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == b'(' || c == b'{' || c == b'[' {
            depth += 1;
        } else if c == b')' || c == b'}' || c == b']' {
            depth -= 1;
        }
        if depth == 0 && bytes[i..].starts_with(tok) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Ternary `?`: a top-level question mark that is not part of `?.`, `??` or
/// `?:`, followed later by a matching top-level colon.
fn has_ternary(code: &str) -> bool {
    let bytes = code.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut string_char = 0u8;
    for i in 0..bytes.len() {
        let c = bytes[i];
        if i > 0 && bytes[i - 1] == b'\\' {
            continue;
        }
        if !in_string && (c == b'"' || c == b'\'' || c == b'`') {
            in_string = true;
            string_char = c;
            continue;
        }
        if in_string {
            if c == string_char {
                in_string = false;
            }
            continue;
        }
        if c == b'(' || c == b'{' || c == b'[' {
            depth += 1;
        } else if c == b')' || c == b'}' || c == b']' {
            depth -= 1;
        }
        if c == b'?' && depth == 0 {
            let next = bytes.get(i + 1).copied();
            let prev = if i > 0 { Some(bytes[i - 1]) } else { None };
            if next != Some(b'.')
                && next != Some(b'?')
                && next != Some(b':')
                && prev != Some(b'?')
            {
                return find_top_level(&code[i + 1..], ":").is_some();
            }
        }
    }
    false
}

fn has_null_coalescing(code: &str) -> bool {
    find_top_level(code, "??").is_some() || find_top_level(code, "?:").is_some()
}

fn has_comparison(code: &str) -> bool {
    ["==", "!=", "<=", ">=", "<", ">"]
        .iter()
        .any(|op| find_top_level(code, op).is_some())
}

fn has_logical(code: &str) -> bool {
    find_top_level(code, "&&").is_some() || find_top_level(code, "||").is_some()
}

/// A quoted literal mixed into the expression means the binding is building a
/// display string.
fn has_string_interpolation(code: &str) -> bool {
    let trimmed = code.trim();
    let quoted = trimmed.contains('\'') || trimmed.contains('"') || trimmed.contains('`');
    if !quoted {
        return false;
    }
    // A lone literal is odd but not logic.
    let only_literal = (trimmed.starts_with('\'') && trimmed.ends_with('\'')
        || trimmed.starts_with('"') && trimmed.ends_with('"'))
        && find_top_level(trimmed, "+").is_none();
    !only_literal
}

fn has_not_null_assertion(code: &str) -> bool {
    find_top_level(code, "!!").is_some()
}

/// Range shows up inside index brackets too (`items[0..2]`), so this scan is
/// string-aware but not depth-limited.
fn has_range(code: &str) -> bool {
    let bytes = code.as_bytes();
    let mut in_string = false;
    let mut string_char = 0u8;
    for i in 0..bytes.len() {
        let c = bytes[i];
        if i > 0 && bytes[i - 1] == b'\\' {
            continue;
        }
        if !in_string && (c == b'"' || c == b'\'' || c == b'`') {
            in_string = true;
            string_char = c;
        } else if in_string && c == string_char {
            in_string = false;
        } else if !in_string && c == b'.' && bytes.get(i + 1) == Some(&b'.') {
            return true;
        }
    }
    false
}

fn is_call_with_args(code: &str) -> bool {
    match CALL_RE.captures(code.trim()) {
        Some(caps) => !caps[1].trim().is_empty(),
        None => false,
    }
}

fn is_zero_arg_call(code: &str) -> bool {
    match CALL_RE.captures(code.trim()) {
        Some(caps) => caps[1].trim().is_empty(),
        None => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION RULE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Business-logic detectors in precedence order. Adding a construct is a data
/// change here, not a new control-flow branch.
struct BusinessLogicRule {
    construct: &'static str,
    detect: fn(&str) -> bool,
}

const BUSINESS_LOGIC_RULES: &[BusinessLogicRule] = &[
    BusinessLogicRule {
        construct: "ternary",
        detect: has_ternary,
    },
    BusinessLogicRule {
        construct: "null-coalescing operator",
        detect: has_null_coalescing,
    },
    BusinessLogicRule {
        construct: "comparison operator",
        detect: has_comparison,
    },
    BusinessLogicRule {
        construct: "logical operator",
        detect: has_logical,
    },
    BusinessLogicRule {
        construct: "string interpolation",
        detect: has_string_interpolation,
    },
    BusinessLogicRule {
        construct: "not-null assertion",
        detect: has_not_null_assertion,
    },
    BusinessLogicRule {
        construct: "range operator",
        detect: has_range,
    },
    BusinessLogicRule {
        construct: "method call with arguments",
        detect: is_call_with_args,
    },
];

fn classify(code: &str) -> BindingKind {
    for rule in BUSINESS_LOGIC_RULES {
        if (rule.detect)(code) {
            return BindingKind::BusinessLogic(rule.construct.to_string());
        }
    }
    let trimmed = code.trim();
    if is_zero_arg_call(trimmed) {
        return BindingKind::ActionReference;
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        if !rest.starts_with('!') {
            return BindingKind::Negation;
        }
    }
    if trimmed.contains('[') {
        return BindingKind::ArrayIndex;
    }
    if trimmed.contains("?.") {
        return BindingKind::SafeChain;
    }
    if trimmed.contains('.') {
        return BindingKind::NestedProperty;
    }
    // Bare `onSomething` identifiers are handler references, not reads.
    if IDENT_RE.is_match(trimmed)
        && trimmed.starts_with("on")
        && trimmed.chars().nth(2).map(|c| c.is_uppercase()).unwrap_or(false)
    {
        return BindingKind::ActionReference;
    }
    BindingKind::SimpleProperty
}

fn extract_root(code: &str) -> String {
    let trimmed = code.trim().trim_start_matches(|c| c == '!' || c == '(');
    trimmed
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Parse a whole-value binding: the string must be exactly one `@{...}`.
pub fn parse_binding(raw_value: &str) -> Option<BindingExpression> {
    let trimmed = raw_value.trim();
    if !trimmed.starts_with("@{") {
        return None;
    }
    let end = find_matching_brace(trimmed, 1)?;
    if end != trimmed.len() - 1 {
        return None;
    }
    let inner = trimmed[2..end].trim().to_string();

    // Trailing default clause is split off for translation, but the full
    // expression is what gets classified (so the null-coalescing warning
    // still fires).
    let default = find_top_level(&inner, "??")
        .or_else(|| find_top_level(&inner, "?:"))
        .map(|idx| inner[idx + 2..].trim().to_string())
        .filter(|d| !d.is_empty());

    Some(BindingExpression {
        kind: classify(&inner),
        root: extract_root(&inner),
        default,
        raw: inner,
    })
}

/// All bindings embedded in a string value, in order. Handles values that mix
/// literal text with one or more markers, and nested braces inside a marker.
pub fn extract_bindings(value: &str) -> Vec<BindingExpression> {
    let mut out = Vec::new();
    let bytes = value.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'@' && bytes[i + 1] == b'{' {
            if let Some(end) = find_matching_brace(value, i + 1) {
                if let Some(expr) = parse_binding(&value[i..=end]) {
                    out.push(expr);
                }
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Index of the `}` matching the `{` at `open`, accounting for nesting and
/// string literals.
fn find_matching_brace(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut string_char = 0u8;
    let mut i = open;
    while i < bytes.len() {
        let c = bytes[i];
        if i > 0 && bytes[i - 1] == b'\\' {
            i += 1;
            continue;
        }
        if !in_string && (c == b'"' || c == b'\'' || c == b'`') {
            in_string = true;
            string_char = c;
        } else if in_string && c == string_char {
            in_string = false;
        } else if !in_string {
            if c == b'{' {
                depth += 1;
            } else if c == b'}' {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPE INFERENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Plausible type for an undeclared variable, from its naming convention.
pub fn infer_type(name: &str) -> &'static str {
    let starts_upper_after = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
    };
    if starts_upper_after("is") || starts_upper_after("has") {
        return "Boolean";
    }
    if starts_upper_after("on") {
        if name.ends_with("Change") || name.starts_with("onTab") {
            return "(Any) -> Unit";
        }
        return "() -> Unit";
    }
    if name.ends_with("Items") || name.ends_with("List") {
        return "List<Any>";
    }
    if name.ends_with("Count") {
        return "Int";
    }
    "Any"
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE ANALYSIS
// ═══════════════════════════════════════════════════════════════════════════════

/// Walk the whole tree in document order and collect binding warnings:
/// business-logic constructs and undeclared variables. Item templates and
/// grid section cells are analyzed too, with their implicit `item`/`index`
/// variables in scope.
pub fn analyze_tree(node: &ComponentNode, scope: &VariableScope) -> Vec<String> {
    let mut warnings = Vec::new();
    let scope = scope.with_declarations(&node.data);

    for (attr, value) in &node.attributes {
        analyze_value(attr, value, &scope, &mut warnings);
    }

    if let Some(template) = node.attr_node("itemTemplate") {
        let item_scope = template_scope(&scope);
        warnings.extend(analyze_tree(&template, &item_scope));
    }
    if let Some(Value::Array(sections)) = node.attr("sections") {
        for section in sections {
            for key in ["header", "cell", "footer"] {
                if let Some(sub) = section.get(key) {
                    if let Ok(mut n) = serde_json::from_value::<ComponentNode>(sub.clone()) {
                        n.normalize();
                        let cell_scope = if key == "cell" {
                            template_scope(&scope)
                        } else {
                            scope.clone()
                        };
                        warnings.extend(analyze_tree(&n, &cell_scope));
                    }
                }
            }
        }
    }
    for child in &node.children {
        warnings.extend(analyze_tree(child, &scope));
    }
    warnings
}

fn template_scope(scope: &VariableScope) -> VariableScope {
    scope.with_declarations(&[
        crate::document::DataDeclaration {
            name: "item".to_string(),
            class_name: "Any".to_string(),
            default: None,
        },
        crate::document::DataDeclaration {
            name: "index".to_string(),
            class_name: "Int".to_string(),
            default: None,
        },
    ])
}

fn analyze_value(attr: &str, value: &Value, scope: &VariableScope, warnings: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for expr in extract_bindings(s) {
                report_expression(attr, &expr, scope, warnings);
            }
        }
        Value::Array(items) => {
            for item in items {
                analyze_value(attr, item, scope, warnings);
            }
        }
        Value::Object(map) => {
            // Nested widget subtrees are walked by analyze_tree; here we only
            // chase scalar leaves of plain configuration objects.
            if map.get("type").and_then(Value::as_str).is_some() {
                return;
            }
            for v in map.values() {
                analyze_value(attr, v, scope, warnings);
            }
        }
        _ => {}
    }
}

fn report_expression(
    attr: &str,
    expr: &BindingExpression,
    scope: &VariableScope,
    warnings: &mut Vec<String>,
) {
    if let BindingKind::BusinessLogic(construct) = &expr.kind {
        warnings.push(format!(
            "Business logic in binding '@{{{}}}' (attribute '{}'): {}. Move this logic into the owning view model; the expression is translated as-is.",
            expr.raw, attr, construct
        ));
    }
    if !expr.root.is_empty() && !scope.contains(&expr.root) {
        let inferred = infer_type(&expr.root);
        warnings.push(format!(
            "Undeclared variable '{}' in binding '@{{{}}}': assuming {}. Declare it with {{\"name\": \"{}\", \"class\": \"{}\"}} in a data block.",
            expr.root, expr.raw, inferred, expr.root, inferred
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Mechanical best-effort translation of one inner expression to Kotlin.
pub fn translate_expression(expr: &BindingExpression) -> String {
    let code = expr.raw.replace("??", "?:");
    code.trim().to_string()
}

/// Translate a string attribute value for emission. A whole-value binding
/// becomes the bare expression; mixed text becomes a Kotlin template string.
pub fn translate_value(value: &str) -> String {
    if let Some(expr) = parse_binding(value) {
        return translate_expression(&expr);
    }
    if !contains_binding_marker(value) {
        return format!("\"{}\"", escape_kotlin_string(value));
    }
    // Mixed literal + markers: "Hi @{name}" -> "Hi ${name}"
    let mut out = String::from("\"");
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'@' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(end) = find_matching_brace(value, i + 1) {
                let inner = value[i + 2..end].trim().replace("??", "?:");
                out.push_str(&format!("${{{}}}", inner));
                i = end + 1;
                continue;
            }
        }
        let ch = value[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push_str(&escape_kotlin_char(ch));
        i += ch.len_utf8();
    }
    out.push('"');
    out
}

pub fn escape_kotlin_string(s: &str) -> String {
    s.chars().map(|c| escape_kotlin_char(c)).collect()
}

fn escape_kotlin_char(c: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '"' => "\\\"".to_string(),
        '$' => "\\$".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => String::new(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
