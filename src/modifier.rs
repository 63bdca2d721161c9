//! Modifier Chain Construction
//!
//! Turns layout attributes into a deterministically ordered chain of
//! `Modifier` configuration calls. The category order is fixed because the
//! target framework layers later calls over earlier ones: clipping before the
//! border before the background changes the visual result.
//!
//! Fixed order: size → aspect ratio → clip → border → background → padding →
//! alignment-in-parent → click.

use serde_json::Value;

use crate::binding::{contains_binding_marker, translate_value};
use crate::document::ComponentNode;
use crate::emit::EmitContext;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Which categories the chain builder handles for a given widget. Widgets
/// with a native `onClick` parameter disable the clickable modifier; list
/// containers keep padding as a content parameter and disable it here.
#[derive(Debug, Clone, Copy)]
pub struct ModifierConfig {
    pub handle_padding: bool,
    pub handle_click: bool,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        ModifierConfig {
            handle_padding: true,
            handle_click: true,
        }
    }
}

impl ModifierConfig {
    pub fn without_click() -> Self {
        ModifierConfig {
            handle_click: false,
            ..Default::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALUE FORMATTING
// ═══════════════════════════════════════════════════════════════════════════════

/// `16` for whole numbers, `16.5` otherwise.
pub fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn fmt_dp(n: f64) -> String {
    format!("{}.dp", fmt_number(n))
}

pub fn fmt_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}f", n as i64)
    } else {
        format!("{}f", n)
    }
}

/// Convert a hex color string to `Color(0x...)` form.
/// `#RGB` and `#RRGGBB` gain full alpha; `#RRGGBBAA` (web RGBA order) is
/// reordered to ARGB.
pub fn convert_hex_to_color(hex: &str) -> Result<String, String> {
    let clean = hex.trim().trim_start_matches('#');
    if !clean.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "Invalid hex color '{}': contains non-hexadecimal characters",
            hex
        ));
    }
    match clean.len() {
        3 => {
            let mut expanded = String::new();
            for c in clean.chars() {
                expanded.push(c);
                expanded.push(c);
            }
            Ok(format!("Color(0xFF{})", expanded.to_uppercase()))
        }
        6 => Ok(format!("Color(0xFF{})", clean.to_uppercase())),
        8 => {
            let (rgb, alpha) = clean.split_at(6);
            Ok(format!(
                "Color(0x{}{})",
                alpha.to_uppercase(),
                rgb.to_uppercase()
            ))
        }
        n => Err(format!(
            "Invalid hex color '{}': expected 3, 6 or 8 hex digits, got {}",
            hex, n
        )),
    }
}

/// Resolve a color attribute value to a Kotlin expression. Hex strings are
/// converted; bindings pass through; anything else falls back to the theme
/// default with a warning.
pub fn resolve_color(value: &Value, attr: &str, ctx: &mut EmitContext) -> String {
    match value {
        Value::String(s) if contains_binding_marker(s) => translate_value(s),
        Value::String(s) => match convert_hex_to_color(s) {
            Ok(color) => color,
            Err(msg) => {
                ctx.warn(&format!("Attribute '{}': {}", attr, msg));
                ctx.options.theme.fallback_color.clone()
            }
        },
        other => {
            ctx.warn(&format!(
                "Attribute '{}': expected a color string, got {}",
                attr,
                if other.is_number() { "number" } else { "non-string value" }
            ));
            ctx.options.theme.fallback_color.clone()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolved edge insets, in dp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub fn uniform(v: f64) -> Self {
        Insets {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    pub fn is_uniform(&self) -> bool {
        self.top == self.right && self.right == self.bottom && self.bottom == self.left
    }
}

/// Parse an inset attribute value.
///
/// Accepted forms, in increasing precedence inside the object form:
/// - bare number or `[n]`: uniform
/// - `[top, right, bottom, left]`
/// - object: `all`, then `horizontal`/`vertical`, then individual edges
///   (`top`, `bottom`, `left`/`start`, `right`/`end`) each overriding the
///   broader key.
pub fn parse_insets(value: &Value) -> Option<Insets> {
    match value {
        Value::Number(n) => n.as_f64().map(Insets::uniform),
        Value::Array(items) => {
            let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            match nums.len() {
                1 => Some(Insets::uniform(nums[0])),
                4 => Some(Insets {
                    top: nums[0],
                    right: nums[1],
                    bottom: nums[2],
                    left: nums[3],
                }),
                _ => None,
            }
        }
        Value::Object(map) => {
            let get = |k: &str| map.get(k).and_then(Value::as_f64);
            let mut insets = get("all").map(Insets::uniform).unwrap_or_default();
            if let Some(h) = get("horizontal") {
                insets.left = h;
                insets.right = h;
            }
            if let Some(v) = get("vertical") {
                insets.top = v;
                insets.bottom = v;
            }
            if let Some(t) = get("top") {
                insets.top = t;
            }
            if let Some(b) = get("bottom") {
                insets.bottom = b;
            }
            if let Some(l) = get("left").or_else(|| get("start")) {
                insets.left = l;
            }
            if let Some(r) = get("right").or_else(|| get("end")) {
                insets.right = r;
            }
            Some(insets)
        }
        _ => None,
    }
}

/// Render one `.padding(...)` call for the given insets, collapsing to the
/// shortest equivalent form.
pub fn padding_call(insets: &Insets) -> Option<String> {
    if insets.is_zero() {
        return None;
    }
    if insets.is_uniform() {
        return Some(format!(".padding({})", fmt_dp(insets.top)));
    }
    if insets.left == insets.right && insets.top == insets.bottom {
        let mut parts = Vec::new();
        if insets.left != 0.0 {
            parts.push(format!("horizontal = {}", fmt_dp(insets.left)));
        }
        if insets.top != 0.0 {
            parts.push(format!("vertical = {}", fmt_dp(insets.top)));
        }
        return Some(format!(".padding({})", parts.join(", ")));
    }
    Some(format!(
        ".padding(start = {}, top = {}, end = {}, bottom = {})",
        fmt_dp(insets.left),
        fmt_dp(insets.top),
        fmt_dp(insets.right),
        fmt_dp(insets.bottom)
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

fn size_call(axis: &str, value: &Value, ctx: &mut EmitContext) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| format!(".{}({})", axis, fmt_dp(v))),
        Value::String(s) if s == "fill" => {
            let call = if axis == "width" {
                ".fillMaxWidth()"
            } else {
                ".fillMaxHeight()"
            };
            Some(call.to_string())
        }
        Value::String(s) if s == "wrap" => None,
        Value::String(s) if contains_binding_marker(s) => {
            Some(format!(".{}(({}).dp)", axis, translate_value(s)))
        }
        _ => {
            ctx.warn(&format!("Attribute '{}': unusable dimension value", axis));
            None
        }
    }
}

fn shape_expr(node: &ComponentNode, ctx: &mut EmitContext) -> Option<String> {
    let radius = node.attr_f64("cornerRadius")?;
    if radius <= 0.0 {
        return None;
    }
    ctx.require_import("androidx.compose.foundation.shape.RoundedCornerShape");
    Some(format!("RoundedCornerShape({})", fmt_dp(radius)))
}

/// Build the ordered modifier chain for one node.
pub fn build_chain(node: &ComponentNode, config: ModifierConfig, ctx: &mut EmitContext) -> Vec<String> {
    let mut chain = Vec::new();

    // 1. Size. Explicit beats fill beats wrap; both axes filled collapse to
    // one fillMaxSize call.
    let width = node.attr("width");
    let height = node.attr("height");
    let fills = |v: Option<&Value>| matches!(v, Some(Value::String(s)) if s == "fill");
    if fills(width) && fills(height) {
        chain.push(".fillMaxSize()".to_string());
        ctx.require_import("androidx.compose.foundation.layout.fillMaxSize");
    } else {
        if let Some(v) = width {
            if let Some(call) = size_call("width", v, ctx) {
                ctx.require_import(if call.contains("fillMax") {
                    "androidx.compose.foundation.layout.fillMaxWidth"
                } else {
                    "androidx.compose.foundation.layout.width"
                });
                chain.push(call);
            }
        }
        if let Some(v) = height {
            if let Some(call) = size_call("height", v, ctx) {
                ctx.require_import(if call.contains("fillMax") {
                    "androidx.compose.foundation.layout.fillMaxHeight"
                } else {
                    "androidx.compose.foundation.layout.height"
                });
                chain.push(call);
            }
        }
    }

    // 2. Aspect ratio.
    if let Some(ratio) = node.attr_f64("aspectRatio") {
        ctx.require_import("androidx.compose.foundation.layout.aspectRatio");
        chain.push(format!(".aspectRatio({})", fmt_float(ratio)));
    }

    // 3. Clip.
    let shape = shape_expr(node, ctx);
    if let Some(ref s) = shape {
        ctx.require_import("androidx.compose.ui.draw.clip");
        chain.push(format!(".clip({})", s));
    }

    // 4. Border.
    if let Some(border_width) = node.attr_f64("borderWidth") {
        if border_width > 0.0 {
            let color = node
                .attr("borderColor")
                .cloned()
                .map(|v| resolve_color(&v, "borderColor", ctx))
                .unwrap_or_else(|| ctx.options.theme.border_color.clone());
            ctx.require_import("androidx.compose.foundation.border");
            ctx.require_import("androidx.compose.ui.graphics.Color");
            match &shape {
                Some(s) => chain.push(format!(
                    ".border({}, {}, {})",
                    fmt_dp(border_width),
                    color,
                    s
                )),
                None => chain.push(format!(".border({}, {})", fmt_dp(border_width), color)),
            }
        }
    }

    // 5. Background.
    if let Some(bg) = node.attr("background").cloned() {
        let color = resolve_color(&bg, "background", ctx);
        ctx.require_import("androidx.compose.foundation.background");
        ctx.require_import("androidx.compose.ui.graphics.Color");
        match &shape {
            Some(s) => chain.push(format!(".background({}, {})", color, s)),
            None => chain.push(format!(".background({})", color)),
        }
    }

    // 6. Padding. Margins on unconstrained nodes have already been folded in
    // by the caller (anchored nodes keep margins as true offsets); the
    // margin-derived call precedes the node's own padding.
    if config.handle_padding {
        if !crate::constraint::has_positioning(node) {
            if let Some(margin) = node.attr("margin").and_then(|v| parse_insets(v)) {
                if let Some(call) = padding_call(&margin) {
                    ctx.require_import("androidx.compose.foundation.layout.padding");
                    chain.push(call);
                }
            }
        }
        if let Some(padding) = node.attr("padding").and_then(|v| parse_insets(v)) {
            if let Some(call) = padding_call(&padding) {
                ctx.require_import("androidx.compose.foundation.layout.padding");
                chain.push(call);
            }
        }
    }

    // 7. Alignment in parent.
    if let Some(alignment) = node.attr_str("alignment") {
        ctx.require_import("androidx.compose.ui.Alignment");
        chain.push(format!(".align(Alignment.{})", capitalize(alignment)));
    }

    // 8. Interaction.
    if config.handle_click {
        if let Some(Value::String(handler)) = node.attr("onClick") {
            ctx.require_import("androidx.compose.foundation.clickable");
            chain.push(format!(".clickable {{ {} }}", action_call(handler)));
        }
    }

    chain
}

/// Render an event attribute value as an invocation.
pub fn action_call(handler: &str) -> String {
    let expr = match crate::binding::parse_binding(handler) {
        Some(b) => crate::binding::translate_expression(&b),
        None => handler.trim().to_string(),
    };
    if expr.ends_with(')') {
        expr
    } else {
        format!("{}()", expr)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRID COLUMN RECONCILIATION
// ═══════════════════════════════════════════════════════════════════════════════

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Total grid columns: the least common multiple of every section's column
/// count, so sections with different counts share one grid by spanning
/// `total / sectionColumns` cells per item. No sections means one column.
pub fn reconcile_columns(section_columns: &[u32]) -> u32 {
    section_columns
        .iter()
        .filter(|&&c| c > 0)
        .fold(1u32, |acc, &c| lcm(acc, c))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileOptions;
    use serde_json::json;

    fn node(v: serde_json::Value) -> ComponentNode {
        let mut n: ComponentNode = serde_json::from_value(v).unwrap();
        n.normalize();
        n
    }

    fn ctx() -> EmitContext {
        EmitContext::new(CompileOptions::default())
    }

    #[test]
    fn test_four_element_padding_array() {
        let insets = parse_insets(&json!([10, 20, 30, 40])).unwrap();
        assert_eq!(insets.top, 10.0);
        assert_eq!(insets.right, 20.0);
        assert_eq!(insets.bottom, 30.0);
        assert_eq!(insets.left, 40.0);
        assert_eq!(
            padding_call(&insets).unwrap(),
            ".padding(start = 40.dp, top = 10.dp, end = 20.dp, bottom = 30.dp)"
        );
    }

    #[test]
    fn test_single_element_array_uniform() {
        let insets = parse_insets(&json!([16])).unwrap();
        assert_eq!(insets, Insets::uniform(16.0));
        assert_eq!(padding_call(&insets).unwrap(), ".padding(16.dp)");
    }

    #[test]
    fn test_scalar_padding_uniform() {
        assert_eq!(parse_insets(&json!(12)).unwrap(), Insets::uniform(12.0));
    }

    #[test]
    fn test_named_keys_override_broader_keys() {
        let insets = parse_insets(&json!({ "all": 16, "horizontal": 8, "top": 2 })).unwrap();
        assert_eq!(insets.top, 2.0);
        assert_eq!(insets.bottom, 16.0);
        assert_eq!(insets.left, 8.0);
        assert_eq!(insets.right, 8.0);
    }

    #[test]
    fn test_axis_padding_collapses() {
        let insets = parse_insets(&json!({ "horizontal": 16, "vertical": 8 })).unwrap();
        assert_eq!(
            padding_call(&insets).unwrap(),
            ".padding(horizontal = 16.dp, vertical = 8.dp)"
        );
    }

    #[test]
    fn test_chain_category_order() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({
                "type": "box",
                "onClick": "@{onTap}",
                "padding": 8,
                "background": "#336699",
                "borderWidth": 1,
                "borderColor": "#000000",
                "cornerRadius": 4,
                "aspectRatio": 1.5,
                "width": 100
            })),
            ModifierConfig::default(),
            &mut ctx,
        );
        let joined = chain.join("");
        let order = [
            ".width(", ".aspectRatio(", ".clip(", ".border(", ".background(", ".padding(",
            ".clickable",
        ];
        let mut last = 0;
        for needle in order {
            let pos = joined.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
            assert!(pos >= last, "{} out of order", needle);
            last = pos;
        }
    }

    #[test]
    fn test_fill_both_axes_collapses_to_fill_max_size() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({ "type": "box", "width": "fill", "height": "fill" })),
            ModifierConfig::default(),
            &mut ctx,
        );
        assert_eq!(chain, vec![".fillMaxSize()".to_string()]);
    }

    #[test]
    fn test_wrap_emits_nothing() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({ "type": "box", "width": "wrap" })),
            ModifierConfig::default(),
            &mut ctx,
        );
        assert!(chain.is_empty());
    }

    #[test]
    fn test_shape_shared_by_clip_border_background() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({
                "type": "box",
                "cornerRadius": 8,
                "borderWidth": 2,
                "background": "#ffffff"
            })),
            ModifierConfig::default(),
            &mut ctx,
        );
        assert!(chain[0].starts_with(".clip(RoundedCornerShape(8.dp))"));
        assert!(chain[1].contains("RoundedCornerShape(8.dp)"));
        assert!(chain[2].contains("RoundedCornerShape(8.dp)"));
    }

    #[test]
    fn test_margin_folds_to_padding_without_constraints() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({ "type": "text", "text": "x", "margin": 8, "padding": 4 })),
            ModifierConfig::default(),
            &mut ctx,
        );
        assert_eq!(chain, vec![".padding(8.dp)".to_string(), ".padding(4.dp)".to_string()]);
    }

    #[test]
    fn test_margin_stays_offset_with_constraints() {
        let mut ctx = ctx();
        let chain = build_chain(
            &node(json!({ "type": "text", "text": "x", "margin": 8, "alignParentTop": true })),
            ModifierConfig::default(),
            &mut ctx,
        );
        assert!(chain.is_empty());
    }

    #[test]
    fn test_hex_conversions() {
        assert_eq!(convert_hex_to_color("#fff").unwrap(), "Color(0xFFFFFFFF)");
        assert_eq!(convert_hex_to_color("#336699").unwrap(), "Color(0xFF336699)");
        assert_eq!(convert_hex_to_color("#33669980").unwrap(), "Color(0x80336699)");
        assert!(convert_hex_to_color("#33669").is_err());
        assert!(convert_hex_to_color("red").is_err());
    }

    #[test]
    fn test_lcm_reconciliation() {
        assert_eq!(reconcile_columns(&[2, 3]), 6);
        assert_eq!(reconcile_columns(&[2, 2]), 2);
        assert_eq!(reconcile_columns(&[]), 1);
        assert_eq!(reconcile_columns(&[4, 6, 8]), 24);
        assert_eq!(reconcile_columns(&[5]), 5);
    }

    #[test]
    fn test_action_call_forms() {
        assert_eq!(action_call("@{onTap}"), "onTap()");
        assert_eq!(action_call("@{onTap()}"), "onTap()");
        assert_eq!(action_call("submit"), "submit()");
    }
}
