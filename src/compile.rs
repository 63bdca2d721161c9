//! Compile Pipeline
//!
//! `compile(node) -> {code, warnings}`: style resolution, attribute
//! validation, binding analysis, then recursive emission, assembled into one
//! Kotlin source file. Compilation is a pure function of
//! (document, styles, options); the only fatal error is malformed JSON at the
//! boundary.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding;
use crate::document::{self, ComponentNode, VariableScope};
use crate::emit::{EmitContext, Emitter, Fragment};
use crate::modifier::fmt_number;
use crate::style::{resolve_styles, StyleTable};
use crate::validate::{self, CompilerError};
use crate::widgets::ConverterRegistry;

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Theme defaults threaded explicitly through the compile; converters never
/// consult ambient state for colors.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    pub fallback_color: String,
    pub border_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            fallback_color: "Color.Unspecified".to_string(),
            border_color: "Color.Black".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Originating file; prefixes every warning when set.
    pub file_path: Option<String>,
    /// Emitted composable name; derived from the file name when absent.
    pub screen_name: Option<String>,
    /// Kotlin package line for the emitted file.
    pub package: Option<String>,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub code: String,
    pub warnings: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile one layout document from JSON source.
pub fn compile_source(
    source: &str,
    styles: &StyleTable,
    options: CompileOptions,
) -> Result<CompileOutput, CompilerError> {
    let file = options.file_path.clone().unwrap_or_else(|| "layout".to_string());
    let root = document::parse_document(source, &file)?;
    Ok(compile_document(&root, styles, options))
}

/// Compile an already-parsed document. Never fails: structural problems
/// degrade to placeholders and advisory findings accumulate as warnings.
pub fn compile_document(
    root: &ComponentNode,
    styles: &StyleTable,
    options: CompileOptions,
) -> CompileOutput {
    let resolved = resolve_styles(root, styles);

    let mut ctx = EmitContext::new(options);
    let schema_warnings = validate::validate_tree(&resolved);
    ctx.warnings.extend(schema_warnings);
    ctx.warnings
        .extend(binding::analyze_tree(&resolved, &VariableScope::new()));

    ctx.require_import("androidx.compose.runtime.Composable");
    let registry = ConverterRegistry::standard();
    let emitter = Emitter::new(&registry);
    let body = emitter.emit_node(&resolved, 1, &mut ctx);

    let code = assemble_file(&resolved, body, &ctx);
    let warnings = match &ctx.options.file_path {
        Some(file) => ctx
            .warnings
            .iter()
            .map(|w| format!("{}: {}", file, w))
            .collect(),
        None => ctx.warnings.clone(),
    };

    CompileOutput { code, warnings }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

fn assemble_file(root: &ComponentNode, body: Fragment, ctx: &EmitContext) -> String {
    let mut out = String::new();

    if let Some(pkg) = &ctx.options.package {
        out.push_str(&format!("package {}\n\n", pkg));
    }
    for import in ctx.imports() {
        out.push_str(&format!("import {}\n", import));
    }
    out.push('\n');

    out.push_str("@Composable\n");
    out.push_str(&format!(
        "fun {}({}) {{\n",
        screen_fn_name(&ctx.options),
        fn_parameters(root)
    ));
    if body.is_empty() {
        out.push_str("    // Layout root emitted nothing\n");
    } else {
        out.push_str(&body.render());
    }
    out.push_str("}\n");
    out
}

fn screen_fn_name(options: &CompileOptions) -> String {
    if let Some(name) = &options.screen_name {
        return name.clone();
    }
    let derived = options
        .file_path
        .as_deref()
        .map(|p| {
            let base = p.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(p);
            let base = base
                .trim_end_matches(".json")
                .trim_end_matches(".layout");
            pascal_case(base)
        })
        .filter(|n| !n.is_empty());
    derived.unwrap_or_else(|| "Screen".to_string())
}

fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// The root node's `data` declarations become the composable's parameters.
fn fn_parameters(root: &ComponentNode) -> String {
    root.data
        .iter()
        .map(|d| {
            let mut param = format!("{}: {}", d.name, d.class_name);
            if let Some(default) = d.default.as_ref().and_then(kotlin_literal) {
                param.push_str(&format!(" = {}", default));
            }
            param
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn kotlin_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(format!("\"{}\"", binding::escape_kotlin_string(s))),
        Value::Number(n) => n.as_f64().map(fmt_number),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn compile_layout_native(
    source: String,
    styles_json: Option<String>,
    file_path: Option<String>,
) -> napi::Result<serde_json::Value> {
    let styles = match styles_json {
        Some(json) => StyleTable::from_json(&json, "styles.json")
            .map_err(|e| napi::Error::from_reason(e.message.clone()))?,
        None => StyleTable::new(),
    };
    let options = CompileOptions {
        file_path,
        ..Default::default()
    };
    let output = compile_source(&source, &styles, options)
        .map_err(|e| napi::Error::from_reason(e.message.clone()))?;
    serde_json::to_value(output).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn analyze_binding_native(value: String) -> Option<serde_json::Value> {
    binding::parse_binding(&value).and_then(|b| serde_json::to_value(b).ok())
}

#[cfg(feature = "napi")]
#[napi]
pub fn validate_layout_native(source: String, file_path: String) -> napi::Result<Vec<String>> {
    let root = document::parse_document(&source, &file_path)
        .map_err(|e| napi::Error::from_reason(e.message.clone()))?;
    Ok(validate::validate_tree(&root))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(v: serde_json::Value) -> CompileOutput {
        let root: ComponentNode = serde_json::from_value(v).unwrap();
        let mut root = root;
        root.normalize();
        compile_document(&root, &StyleTable::new(), CompileOptions::default())
    }

    #[test]
    fn test_scaffold_structure() {
        let output = compile(json!({
            "type": "column",
            "children": [{ "type": "text", "text": "hi" }]
        }));
        assert!(output.code.contains("import androidx.compose.runtime.Composable"));
        assert!(output.code.contains("import androidx.compose.material3.Text"));
        assert!(output.code.contains("@Composable\nfun Screen() {"));
        assert!(output.code.contains("    Column {"));
        assert!(output.code.contains("        Text(text = \"hi\")"));
        assert!(output.code.trim_end().ends_with('}'));
    }

    #[test]
    fn test_imports_sorted_and_deduplicated() {
        let output = compile(json!({
            "type": "column",
            "children": [
                { "type": "text", "text": "a" },
                { "type": "text", "text": "b" }
            ]
        }));
        let imports: Vec<&str> = output
            .code
            .lines()
            .filter(|l| l.starts_with("import "))
            .collect();
        let mut sorted = imports.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(imports, sorted);
    }

    #[test]
    fn test_data_declarations_become_parameters() {
        let output = compile(json!({
            "type": "column",
            "data": [
                { "name": "title", "class": "String", "default": "Home" },
                { "name": "count", "class": "Int" }
            ],
            "children": [{ "type": "text", "text": "@{title}" }]
        }));
        assert!(output
            .code
            .contains("fun Screen(title: String = \"Home\", count: Int) {"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_package_line_and_screen_name() {
        let root: ComponentNode =
            serde_json::from_value(json!({ "type": "column" })).unwrap();
        let output = compile_document(
            &root,
            &StyleTable::new(),
            CompileOptions {
                package: Some("com.example.app".to_string()),
                file_path: Some("screens/home_screen.layout.json".to_string()),
                ..Default::default()
            },
        );
        assert!(output.code.starts_with("package com.example.app\n"));
        assert!(output.code.contains("fun HomeScreen() {"));
    }

    #[test]
    fn test_warnings_prefixed_with_file() {
        let root: ComponentNode = serde_json::from_value(json!({
            "type": "text", "text": "x", "bogus": 1
        }))
        .unwrap();
        let output = compile_document(
            &root,
            &StyleTable::new(),
            CompileOptions {
                file_path: Some("home.layout.json".to_string()),
                ..Default::default()
            },
        );
        assert!(output.warnings[0].starts_with("home.layout.json: "));
    }

    #[test]
    fn test_compile_source_rejects_malformed_json() {
        let err = compile_source("{", &StyleTable::new(), CompileOptions::default()).unwrap_err();
        assert_eq!(err.code, validate::ERR_MALFORMED_DOCUMENT);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let doc = json!({
            "type": "box",
            "children": [
                { "type": "text", "text": "a", "alignParentTop": true },
                { "type": "text", "text": "b", "belowView": "view_0" }
            ]
        });
        let first = compile(doc.clone());
        let second = compile(doc);
        assert_eq!(first.code, second.code);
        assert_eq!(first.warnings, second.warnings);
    }
}
