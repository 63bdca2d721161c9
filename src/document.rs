//! # Layout Document Model
//!
//! A screen is one JSON document whose nodes all share the `ComponentNode`
//! shape: a `type` tag, a free-form attribute map, and optional nested
//! children.
//!
//! ## Key Invariants
//!
//! 1. **Single Parent**: every node except the root has exactly one logical
//!    parent; a node is never spliced into two subtrees.
//! 2. **Child Normalization**: `child` (singular) is folded into a one-element
//!    `children` list before any stage runs, so downstream code only ever
//!    sees `children`.
//! 3. **Data Visibility**: `data` declarations on a node are visible to that
//!    node's entire subtree and are excluded from attribute validation and
//!    binding analysis.
//! 4. **Statelessness**: the tree is parsed once per compile and discarded
//!    after emission; no stage mutates it except style resolution, which
//!    returns a new tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::validate::CompilerError;

// ═══════════════════════════════════════════════════════════════════════════════
// NODE MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// One node of the declarative layout tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    #[serde(rename = "type", default)]
    pub widget_type: String,

    /// Variables this node declares for its subtree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataDeclaration>,

    /// Singular child form; folded into `children` by [`ComponentNode::normalize`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<ComponentNode>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentNode>,

    /// Everything else: scalars, arrays, nested objects, or nested node
    /// subtrees (item templates, section cells).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A `{name, class}` variable declaration from a node's `data` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDeclaration {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ComponentNode {
    /// Fold `child` into `children` recursively. A singular child is always
    /// prepended, so `{child: A, children: [B]}` yields `[A, B]`.
    pub fn normalize(&mut self) {
        if let Some(single) = self.child.take() {
            self.children.insert(0, *single);
        }
        for c in &mut self.children {
            c.normalize();
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(Value::as_f64)
    }

    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attributes.get(name).and_then(Value::as_bool)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Explicit reference id, used by anchored positioning.
    pub fn id(&self) -> Option<&str> {
        self.attr_str("id")
    }

    /// Try to read an attribute value as a nested node subtree
    /// (e.g. a list's `itemTemplate`).
    pub fn attr_node(&self, name: &str) -> Option<ComponentNode> {
        let value = self.attributes.get(name)?;
        if !value.is_object() {
            return None;
        }
        let mut node: ComponentNode = serde_json::from_value(value.clone()).ok()?;
        if node.widget_type.is_empty() && node.attributes.is_empty() && node.children.is_empty() {
            return None;
        }
        node.normalize();
        Some(node)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VARIABLE SCOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Declared variables visible at one point of the tree walk.
/// A child scope sees everything its ancestors declared.
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    vars: HashMap<String, String>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope for a child subtree: this scope plus the child's own `data`.
    pub fn with_declarations(&self, decls: &[DataDeclaration]) -> Self {
        let mut vars = self.vars.clone();
        for d in decls {
            vars.insert(d.name.clone(), d.class_name.clone());
        }
        Self { vars }
    }

    /// Declared class for a variable name, if any ancestor declared it.
    pub fn get(&self, name: &str) -> Option<&String> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse one layout document. Malformed JSON is the only fatal error in the
/// whole pipeline; everything after this point degrades instead of failing.
pub fn parse_document(source: &str, file_path: &str) -> Result<ComponentNode, CompilerError> {
    let mut root: ComponentNode = serde_json::from_str(source).map_err(|e| {
        CompilerError::with_details(
            crate::validate::ERR_MALFORMED_DOCUMENT,
            &format!("Failed to parse layout JSON: {}", e),
            file_path,
            Some(e.to_string()),
            vec!["Check for trailing commas and unquoted keys.".to_string()],
        )
    })?;
    root.normalize();
    Ok(root)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_normalized_to_children() {
        let mut node: ComponentNode = serde_json::from_value(json!({
            "type": "column",
            "child": { "type": "text", "text": "hello" }
        }))
        .unwrap();
        node.normalize();
        assert!(node.child.is_none());
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].widget_type, "text");
    }

    #[test]
    fn test_child_prepended_before_children() {
        let mut node: ComponentNode = serde_json::from_value(json!({
            "type": "column",
            "child": { "type": "text" },
            "children": [{ "type": "image" }]
        }))
        .unwrap();
        node.normalize();
        assert_eq!(node.children[0].widget_type, "text");
        assert_eq!(node.children[1].widget_type, "image");
    }

    #[test]
    fn test_attributes_flattened() {
        let node: ComponentNode = serde_json::from_value(json!({
            "type": "text",
            "text": "hello",
            "fontSize": 14
        }))
        .unwrap();
        assert_eq!(node.attr_str("text"), Some("hello"));
        assert_eq!(node.attr_f64("fontSize"), Some(14.0));
        assert!(!node.has_attr("type"));
    }

    #[test]
    fn test_data_declarations_parsed() {
        let node: ComponentNode = serde_json::from_value(json!({
            "type": "column",
            "data": [{ "name": "title", "class": "String" }]
        }))
        .unwrap();
        assert_eq!(node.data.len(), 1);
        assert_eq!(node.data[0].name, "title");
        assert_eq!(node.data[0].class_name, "String");
        assert!(!node.has_attr("data"));
    }

    #[test]
    fn test_variable_scope_inheritance() {
        let root = VariableScope::new().with_declarations(&[DataDeclaration {
            name: "user".to_string(),
            class_name: "User".to_string(),
            default: None,
        }]);
        let child = root.with_declarations(&[DataDeclaration {
            name: "count".to_string(),
            class_name: "Int".to_string(),
            default: None,
        }]);
        assert!(child.contains("user"));
        assert!(child.contains("count"));
        assert!(!root.contains("count"));
    }

    #[test]
    fn test_attr_node_reads_template_subtree() {
        let node: ComponentNode = serde_json::from_value(json!({
            "type": "list",
            "itemTemplate": { "type": "text", "text": "@{item}" }
        }))
        .unwrap();
        let template = node.attr_node("itemTemplate").unwrap();
        assert_eq!(template.widget_type, "text");
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let err = parse_document("{ not json", "broken.layout.json").unwrap_err();
        assert_eq!(err.code, crate::validate::ERR_MALFORMED_DOCUMENT);
        assert_eq!(err.file, "broken.layout.json");
    }
}
