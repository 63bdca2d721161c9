//! Style Resolution
//!
//! Merges named style definitions into node attributes before validation,
//! binding analysis, or emission run. Resolution is a pure transform: it
//! returns a new tree and touches nothing else.
//!
//! Precedence, lowest to highest: earlier styles in the list, later styles,
//! the node's own literal attributes. Unknown style names are skipped, not
//! errors; a missing style is a cosmetic problem, not a structural one.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::document::ComponentNode;
use crate::validate::CompilerError;

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Named attribute-override sets, immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    styles: HashMap<String, Map<String, Value>>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON object of the shape `{styleName: {attr: value}}`.
    pub fn from_json(source: &str, file_path: &str) -> Result<Self, CompilerError> {
        let value: Value = serde_json::from_str(source).map_err(|e| {
            CompilerError::new(
                crate::validate::ERR_MALFORMED_DOCUMENT,
                &format!("Failed to parse style table JSON: {}", e),
                file_path,
            )
        })?;
        let mut table = StyleTable::new();
        if let Value::Object(entries) = value {
            for (name, overrides) in entries {
                if let Value::Object(map) = overrides {
                    table.insert(name, map);
                }
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: impl Into<String>, overrides: Map<String, Value>) {
        self.styles.insert(name.into(), overrides);
    }

    pub fn lookup(&self, name: &str) -> Option<&Map<String, Value>> {
        self.styles.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Names referenced by a node's `style` attribute, in application order.
fn style_names(node: &ComponentNode) -> Vec<String> {
    match node.attr("style") {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

/// Resolve styles over a whole tree, including item templates and grid
/// section subtrees. The `style` key itself never survives resolution.
pub fn resolve_styles(node: &ComponentNode, styles: &StyleTable) -> ComponentNode {
    let mut resolved = node.clone();

    let names = style_names(node);
    if !names.is_empty() {
        let mut merged: Map<String, Value> = Map::new();
        for name in &names {
            if let Some(overrides) = styles.lookup(name) {
                for (attr, value) in overrides {
                    if attr == "style" {
                        continue;
                    }
                    merged.insert(attr.clone(), value.clone());
                }
            }
        }
        // Literal node attributes always beat style values.
        for (attr, value) in &node.attributes {
            merged.insert(attr.clone(), value.clone());
        }
        resolved.attributes = merged;
    }
    resolved.attributes.remove("style");

    // Nested widget subtrees stored as attribute values.
    if let Some(template) = resolved.attr_node("itemTemplate") {
        let sub = resolve_styles(&template, styles);
        if let Ok(v) = serde_json::to_value(sub) {
            resolved.attributes.insert("itemTemplate".to_string(), v);
        }
    }
    if let Some(Value::Array(sections)) = resolved.attributes.get("sections").cloned() {
        let mut new_sections = Vec::with_capacity(sections.len());
        for mut section in sections {
            if let Value::Object(ref mut map) = section {
                for key in ["header", "cell", "footer"] {
                    let resolved_sub = map.get(key).and_then(|sub| {
                        let mut n: ComponentNode = serde_json::from_value(sub.clone()).ok()?;
                        n.normalize();
                        serde_json::to_value(resolve_styles(&n, styles)).ok()
                    });
                    if let Some(v) = resolved_sub {
                        map.insert(key.to_string(), v);
                    }
                }
            }
            new_sections.push(section);
        }
        resolved
            .attributes
            .insert("sections".to_string(), Value::Array(new_sections));
    }

    resolved.children = resolved
        .children
        .iter()
        .map(|c| resolve_styles(c, styles))
        .collect();
    resolved
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(v: serde_json::Value) -> ComponentNode {
        let mut n: ComponentNode = serde_json::from_value(v).unwrap();
        n.normalize();
        n
    }

    fn table(v: serde_json::Value) -> StyleTable {
        let mut t = StyleTable::new();
        if let Value::Object(entries) = v {
            for (name, overrides) in entries {
                if let Value::Object(map) = overrides {
                    t.insert(name, map);
                }
            }
        }
        t
    }

    #[test]
    fn test_inline_attribute_wins_over_style() {
        let styles = table(json!({ "s": { "fontSize": 2 } }));
        let resolved = resolve_styles(
            &node(json!({ "type": "text", "text": "x", "fontSize": 1, "style": "s" })),
            &styles,
        );
        assert_eq!(resolved.attr_f64("fontSize"), Some(1.0));
    }

    #[test]
    fn test_later_style_wins() {
        let styles = table(json!({
            "s1": { "fontSize": 2, "textColor": "#111111" },
            "s2": { "fontSize": 3 }
        }));
        let resolved = resolve_styles(
            &node(json!({ "type": "text", "text": "x", "style": ["s1", "s2"] })),
            &styles,
        );
        assert_eq!(resolved.attr_f64("fontSize"), Some(3.0));
        // s1's non-conflicting attribute survives.
        assert_eq!(resolved.attr_str("textColor"), Some("#111111"));
    }

    #[test]
    fn test_unknown_style_silently_skipped() {
        let styles = table(json!({ "known": { "fontSize": 5 } }));
        let resolved = resolve_styles(
            &node(json!({ "type": "text", "text": "x", "style": ["missing", "known"] })),
            &styles,
        );
        assert_eq!(resolved.attr_f64("fontSize"), Some(5.0));
    }

    #[test]
    fn test_style_key_removed() {
        let resolved = resolve_styles(
            &node(json!({ "type": "text", "text": "x", "style": "s" })),
            &StyleTable::new(),
        );
        assert!(!resolved.has_attr("style"));
    }

    #[test]
    fn test_resolution_recurses_into_children() {
        let styles = table(json!({ "s": { "fontSize": 9 } }));
        let resolved = resolve_styles(
            &node(json!({
                "type": "column",
                "children": [{ "type": "text", "text": "x", "style": "s" }]
            })),
            &styles,
        );
        assert_eq!(resolved.children[0].attr_f64("fontSize"), Some(9.0));
    }

    #[test]
    fn test_resolution_reaches_item_templates() {
        let styles = table(json!({ "s": { "textColor": "#ff0000" } }));
        let resolved = resolve_styles(
            &node(json!({
                "type": "list",
                "items": "@{rows}",
                "itemTemplate": { "type": "text", "text": "@{item}", "style": "s" }
            })),
            &styles,
        );
        let template = resolved.attr_node("itemTemplate").unwrap();
        assert_eq!(template.attr_str("textColor"), Some("#ff0000"));
        assert!(!template.has_attr("style"));
    }

    #[test]
    fn test_from_json_table() {
        let t = StyleTable::from_json(r#"{ "title": { "fontSize": 20 } }"#, "styles.json").unwrap();
        assert!(t.lookup("title").is_some());
        assert!(t.lookup("absent").is_none());
    }
}
