//! Whole-Pipeline Invariant Tests
//!
//! End-to-end checks that must hold for any input: determinism, graceful
//! degradation of malformed nodes, container selection, and the interaction
//! of style resolution with validation and emission.

#[cfg(test)]
mod tests {
    use crate::compile::{compile_document, compile_source, CompileOptions};
    use crate::document::ComponentNode;
    use crate::style::StyleTable;
    use serde_json::{json, Value};

    fn compile(doc: Value) -> crate::compile::CompileOutput {
        let mut root: ComponentNode = serde_json::from_value(doc).unwrap();
        root.normalize();
        compile_document(&root, &StyleTable::new(), CompileOptions::default())
    }

    fn compile_with_styles(doc: Value, styles: Value) -> crate::compile::CompileOutput {
        let mut root: ComponentNode = serde_json::from_value(doc).unwrap();
        root.normalize();
        let table = StyleTable::from_json(&styles.to_string(), "styles.json").unwrap();
        compile_document(&root, &table, CompileOptions::default())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DETERMINISM
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_full_document_compiles_byte_identical_twice() {
        let doc = json!({
            "type": "box",
            "data": [{ "name": "user", "class": "User" }],
            "children": [
                { "type": "image", "source": "@{user.avatar}", "alignParentTop": true,
                  "margin": [8, 0, 0, 8], "alignParentStart": true },
                { "type": "text", "text": "@{user.name}", "belowView": "view_0" },
                { "type": "button", "text": "Follow", "onClick": "@{onFollow}",
                  "alignParentEnd": true }
            ]
        });
        let first = compile(doc.clone());
        let second = compile(doc);
        assert_eq!(first.code, second.code);
        assert_eq!(first.warnings, second.warnings);
        // Auto ids are position-derived, so they are stable too.
        assert!(first.code.contains("val (view_0, view_1, view_2) = createRefs()"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // GRACEFUL DEGRADATION
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_list_without_template_or_items_still_emits_valid_fragment() {
        let output = compile(json!({
            "type": "column",
            "children": [
                { "type": "list" },
                { "type": "text", "text": "after" }
            ]
        }));
        // The placeholder keeps the document intact and the sibling emits.
        assert!(output.code.contains("// List node has no items source"));
        assert!(output.code.contains("Spacer(modifier = Modifier)"));
        assert!(output.code.contains("text = \"after\""));
    }

    #[test]
    fn test_one_bad_node_never_fails_the_file() {
        let output = compile(json!({
            "type": "column",
            "children": [
                { "type": "image" },
                { "type": "grid" },
                { "type": "icon" },
                { "type": "text", "text": "survivor" }
            ]
        }));
        assert!(output.code.contains("text = \"survivor\""));
        // Every brace opened is closed; cheap syntactic sanity check.
        let opens = output.code.matches('{').count();
        let closes = output.code.matches('}').count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn test_root_visibility_gone_emits_empty_screen() {
        let output = compile(json!({ "type": "column", "visibility": "gone" }));
        assert!(output.code.contains("// Layout root emitted nothing"));
        assert!(output.code.contains("fun Screen() {"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTAINER SELECTION END TO END
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_orientation_and_reverse_direction() {
        let doc = json!({
            "type": "box",
            "orientation": "vertical",
            "children": [
                { "type": "text", "text": "one" },
                { "type": "text", "text": "two" }
            ]
        });
        let output = compile(doc);
        assert!(output.code.contains("Column {"));
        assert!(output.code.find("one").unwrap() < output.code.find("two").unwrap());

        let reversed = compile(json!({
            "type": "box",
            "orientation": "vertical",
            "direction": "reverse",
            "children": [
                { "type": "text", "text": "one" },
                { "type": "text", "text": "two" }
            ]
        }));
        assert!(reversed.code.find("two").unwrap() < reversed.code.find("one").unwrap());
    }

    #[test]
    fn test_anchored_child_forces_constraint_container() {
        let output = compile(json!({
            "type": "box",
            "children": [{ "type": "text", "text": "a", "alignTopOfView": "view_0" }]
        }));
        assert!(output.code.contains("ConstraintLayout"));
        assert!(!output.code.contains("Box {"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STYLES + BINDINGS + EMISSION
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_style_resolution_feeds_validation_and_emission() {
        let output = compile_with_styles(
            json!({
                "type": "text",
                "text": "styled",
                "style": "title"
            }),
            json!({ "title": { "fontSize": 22, "fontWeight": "bold" } }),
        );
        assert!(output.code.contains("fontSize = 22.sp"));
        assert!(output.code.contains("fontWeight = FontWeight.Bold"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_invalid_style_value_caught_after_resolution() {
        let output = compile_with_styles(
            json!({ "type": "text", "text": "x", "style": "broken" }),
            json!({ "broken": { "fontSize": "enormous" } }),
        );
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("expected number, got string")));
    }

    #[test]
    fn test_binding_warnings_surface_with_inference() {
        let output = compile(json!({
            "type": "column",
            "children": [
                { "type": "text", "text": "@{isReady ? 'yes' : 'no'}" },
                { "type": "text", "text": "@{itemCount}" }
            ]
        }));
        let joined = output.warnings.join("\n");
        assert!(joined.contains("ternary"));
        assert!(joined.contains("'isReady'"));
        assert!(joined.contains("assuming Boolean"));
        assert!(joined.contains("'itemCount'"));
        assert!(joined.contains("assuming Int"));
    }

    #[test]
    fn test_elvis_default_translates_to_kotlin() {
        let output = compile(json!({
            "type": "text",
            "text": "@{user.name ?? 'Anonymous'}",
            "data": [{ "name": "user", "class": "User" }]
        }));
        assert!(output.code.contains("text = user.name ?: 'Anonymous'"));
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("null-coalescing operator")));
    }

    #[test]
    fn test_padding_array_flows_through_to_code() {
        let output = compile(json!({
            "type": "box",
            "padding": [10, 20, 30, 40],
            "children": [{ "type": "text", "text": "x" }]
        }));
        assert!(output
            .code
            .contains(".padding(start = 40.dp, top = 10.dp, end = 20.dp, bottom = 30.dp)"));
    }

    #[test]
    fn test_compile_source_end_to_end() {
        let source = r#"{
            "type": "column",
            "data": [{ "name": "title", "class": "String" }],
            "children": [
                { "type": "text", "text": "@{title}" },
                { "type": "button", "text": "OK", "onClick": "@{onConfirm}" }
            ]
        }"#;
        let output = compile_source(
            source,
            &StyleTable::new(),
            CompileOptions {
                file_path: Some("confirm.layout.json".to_string()),
                package: Some("com.example".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(output.code.starts_with("package com.example\n"));
        assert!(output.code.contains("fun Confirm(title: String) {"));
        assert!(output.code.contains("onClick = { onConfirm() }"));
        // onConfirm is undeclared but inferred as a zero-arg callback.
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("'onConfirm'") && w.contains("() -> Unit")));
    }
}
