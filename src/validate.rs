//! Attribute Schema Validation
//!
//! Advisory checking of node attributes against a per-widget schema plus a
//! shared "common" schema. Validation never mutates the tree and never stops
//! emission; it only accumulates warning strings.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::binding::contains_binding_marker;
use crate::document::ComponentNode;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_MALFORMED_DOCUMENT: &str = "BP-ERR-DOC-001";
pub const ERR_UNREADABLE_FILE: &str = "BP-ERR-IO-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_MALFORMED_DOCUMENT => {
            "Every layout document is well-formed JSON before compilation starts."
        }
        ERR_UNREADABLE_FILE => "Every discovered layout file is readable at compile time.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// The only fatal error shape in the pipeline. Attribute and binding findings
/// are warnings, not errors; a `CompilerError` is produced solely at the
/// document boundary (unreadable file, malformed JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str) -> Self {
        Self::with_details(code, message, file, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            context,
            hints,
        }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.file, self.message)
    }
}

impl std::error::Error for CompilerError {}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE SCHEMA
// ═══════════════════════════════════════════════════════════════════════════════

/// Value shape a schema entry accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    String,
    Number,
    Boolean,
    /// `#RGB` / `#RRGGBB` / `#RRGGBBAA` hex string.
    Color,
    /// Number, or the keywords `fill` / `wrap`.
    Dimension,
    /// Number, 1- or 4-element number array, or an edge-key object.
    Insets,
    /// String drawn from a fixed set; arrays are checked element-wise.
    Enum(&'static [&'static str]),
    /// Event handler reference (action binding).
    Event,
    Any,
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub kind: AttrKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub required: bool,
}

impl AttributeSpec {
    const fn of(kind: AttrKind) -> Self {
        AttributeSpec {
            kind,
            min: None,
            max: None,
            required: false,
        }
    }

    const fn ranged(kind: AttrKind, min: f64, max: f64) -> Self {
        AttributeSpec {
            kind,
            min: Some(min),
            max: Some(max),
            required: false,
        }
    }

    const fn at_least(kind: AttrKind, min: f64) -> Self {
        AttributeSpec {
            kind,
            min: Some(min),
            max: None,
            required: false,
        }
    }

    const fn required(kind: AttrKind) -> Self {
        AttributeSpec {
            kind,
            min: None,
            max: None,
            required: true,
        }
    }
}

type WidgetSchema = HashMap<&'static str, AttributeSpec>;

lazy_static! {
    /// Legacy and shorthand widget names mapping to canonical ones.
    static ref WIDGET_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("label", "text");
        m.insert("toggle", "switch");
        m.insert("input", "text_field");
        m.insert("edittext", "text_field");
        m.insert("textfield", "text_field");
        m.insert("img", "image");
        m.insert("vstack", "column");
        m.insert("hstack", "row");
        m.insert("zstack", "box");
        m.insert("frame", "box");
        m.insert("stack", "box");
        m.insert("container", "box");
        m.insert("recycler", "list");
        m.insert("collection", "grid");
        m.insert("progressbar", "progress");
        m
    };

    /// Attributes every widget type accepts: size, spacing, visuals,
    /// anchored-positioning attributes, interaction.
    static ref COMMON_SCHEMA: WidgetSchema = {
        let mut m: WidgetSchema = HashMap::new();
        m.insert("width", AttributeSpec::of(AttrKind::Dimension));
        m.insert("height", AttributeSpec::of(AttrKind::Dimension));
        m.insert("padding", AttributeSpec::of(AttrKind::Insets));
        m.insert("margin", AttributeSpec::of(AttrKind::Insets));
        m.insert("background", AttributeSpec::of(AttrKind::Color));
        m.insert("borderColor", AttributeSpec::of(AttrKind::Color));
        m.insert("borderWidth", AttributeSpec::at_least(AttrKind::Number, 0.0));
        m.insert("cornerRadius", AttributeSpec::at_least(AttrKind::Number, 0.0));
        m.insert("aspectRatio", AttributeSpec::at_least(AttrKind::Number, 0.0));
        m.insert("alpha", AttributeSpec::ranged(AttrKind::Number, 0.0, 1.0));
        m.insert("elevation", AttributeSpec::ranged(AttrKind::Number, 0.0, 100.0));
        m.insert("weight", AttributeSpec::at_least(AttrKind::Number, 0.0));
        m.insert(
            "visibility",
            AttributeSpec::of(AttrKind::Enum(&["visible", "invisible", "gone"])),
        );
        m.insert(
            "alignment",
            AttributeSpec::of(AttrKind::Enum(&[
                "topStart", "topCenter", "topEnd", "centerStart", "center", "centerEnd",
                "bottomStart", "bottomCenter", "bottomEnd",
            ])),
        );
        m.insert("onClick", AttributeSpec::of(AttrKind::Event));
        m.insert("testTag", AttributeSpec::of(AttrKind::String));
        m.insert("id", AttributeSpec::of(AttrKind::String));
        // Anchored positioning (validated structurally by the constraint builder;
        // here only the value shapes are checked).
        m.insert("alignParentTop", AttributeSpec::of(AttrKind::Boolean));
        m.insert("alignParentBottom", AttributeSpec::of(AttrKind::Boolean));
        m.insert("alignParentStart", AttributeSpec::of(AttrKind::Boolean));
        m.insert("alignParentEnd", AttributeSpec::of(AttrKind::Boolean));
        m.insert("centerInParent", AttributeSpec::of(AttrKind::Boolean));
        m.insert("centerHorizontal", AttributeSpec::of(AttrKind::Boolean));
        m.insert("centerVertical", AttributeSpec::of(AttrKind::Boolean));
        m.insert("alignTopOfView", AttributeSpec::of(AttrKind::String));
        m.insert("alignBottomOfView", AttributeSpec::of(AttrKind::String));
        m.insert("alignStartOfView", AttributeSpec::of(AttrKind::String));
        m.insert("alignEndOfView", AttributeSpec::of(AttrKind::String));
        m.insert("belowView", AttributeSpec::of(AttrKind::String));
        m.insert("aboveView", AttributeSpec::of(AttrKind::String));
        m
    };

    /// Per-widget schemas, keyed by canonical widget type.
    static ref WIDGET_SCHEMAS: HashMap<&'static str, WidgetSchema> = {
        let mut all: HashMap<&'static str, WidgetSchema> = HashMap::new();

        let mut text: WidgetSchema = HashMap::new();
        text.insert("text", AttributeSpec::required(AttrKind::String));
        text.insert("fontSize", AttributeSpec::ranged(AttrKind::Number, 1.0, 200.0));
        text.insert(
            "fontWeight",
            AttributeSpec::of(AttrKind::Enum(&["normal", "medium", "semibold", "bold"])),
        );
        text.insert(
            "textStyle",
            AttributeSpec::of(AttrKind::Enum(&["bold", "italic", "underline", "strikethrough"])),
        );
        text.insert(
            "textAlign",
            AttributeSpec::of(AttrKind::Enum(&["start", "center", "end", "justify"])),
        );
        text.insert("textColor", AttributeSpec::of(AttrKind::Color));
        text.insert("maxLines", AttributeSpec::at_least(AttrKind::Number, 1.0));
        all.insert("text", text);

        let mut button: WidgetSchema = HashMap::new();
        button.insert("text", AttributeSpec::of(AttrKind::String));
        button.insert(
            "buttonStyle",
            AttributeSpec::of(AttrKind::Enum(&["filled", "outlined", "text", "elevated"])),
        );
        button.insert("enabled", AttributeSpec::of(AttrKind::Boolean));
        button.insert("textColor", AttributeSpec::of(AttrKind::Color));
        all.insert("button", button);

        let mut image: WidgetSchema = HashMap::new();
        image.insert("source", AttributeSpec::required(AttrKind::String));
        image.insert(
            "contentScale",
            AttributeSpec::of(AttrKind::Enum(&[
                "crop", "fit", "fillBounds", "fillWidth", "fillHeight", "inside", "none",
            ])),
        );
        image.insert("contentDescription", AttributeSpec::of(AttrKind::String));
        all.insert("image", image);

        let mut text_field: WidgetSchema = HashMap::new();
        text_field.insert("value", AttributeSpec::of(AttrKind::String));
        text_field.insert("hint", AttributeSpec::of(AttrKind::String));
        text_field.insert("onChange", AttributeSpec::of(AttrKind::Event));
        text_field.insert(
            "keyboard",
            AttributeSpec::of(AttrKind::Enum(&["text", "number", "email", "phone", "password"])),
        );
        text_field.insert(
            "fieldStyle",
            AttributeSpec::of(AttrKind::Enum(&["filled", "outlined"])),
        );
        text_field.insert("maxLines", AttributeSpec::at_least(AttrKind::Number, 1.0));
        all.insert("text_field", text_field);

        let mut switch: WidgetSchema = HashMap::new();
        switch.insert("checked", AttributeSpec::of(AttrKind::Boolean));
        switch.insert("onChange", AttributeSpec::of(AttrKind::Event));
        switch.insert("enabled", AttributeSpec::of(AttrKind::Boolean));
        all.insert("switch", switch);
        all.insert("checkbox", all["switch"].clone());

        let mut slider: WidgetSchema = HashMap::new();
        slider.insert("value", AttributeSpec::of(AttrKind::Number));
        slider.insert("min", AttributeSpec::of(AttrKind::Number));
        slider.insert("max", AttributeSpec::of(AttrKind::Number));
        slider.insert("steps", AttributeSpec::at_least(AttrKind::Number, 0.0));
        slider.insert("onChange", AttributeSpec::of(AttrKind::Event));
        all.insert("slider", slider);

        let mut progress: WidgetSchema = HashMap::new();
        progress.insert("value", AttributeSpec::ranged(AttrKind::Number, 0.0, 1.0));
        progress.insert("indeterminate", AttributeSpec::of(AttrKind::Boolean));
        progress.insert("color", AttributeSpec::of(AttrKind::Color));
        all.insert("progress", progress);

        let mut stack: WidgetSchema = HashMap::new();
        stack.insert(
            "orientation",
            AttributeSpec::of(AttrKind::Enum(&["vertical", "horizontal"])),
        );
        stack.insert(
            "direction",
            AttributeSpec::of(AttrKind::Enum(&["normal", "reverse"])),
        );
        stack.insert(
            "arrangement",
            AttributeSpec::of(AttrKind::Enum(&[
                "start", "center", "end", "spaceBetween", "spaceAround", "spaceEvenly",
            ])),
        );
        stack.insert("spacing", AttributeSpec::at_least(AttrKind::Number, 0.0));
        stack.insert("scrollable", AttributeSpec::of(AttrKind::Boolean));
        stack.insert(
            "contentAlignment",
            AttributeSpec::of(AttrKind::Enum(&[
                "topStart", "topCenter", "topEnd", "centerStart", "center", "centerEnd",
                "bottomStart", "bottomCenter", "bottomEnd",
            ])),
        );
        all.insert("column", stack.clone());
        all.insert("row", stack.clone());
        all.insert("box", stack);

        let mut card: WidgetSchema = HashMap::new();
        card.insert(
            "cardStyle",
            AttributeSpec::of(AttrKind::Enum(&["elevated", "outlined", "filled"])),
        );
        all.insert("card", card);

        let mut list: WidgetSchema = HashMap::new();
        list.insert("items", AttributeSpec::of(AttrKind::Any));
        list.insert("itemTemplate", AttributeSpec::of(AttrKind::Any));
        list.insert(
            "orientation",
            AttributeSpec::of(AttrKind::Enum(&["vertical", "horizontal"])),
        );
        list.insert("spacing", AttributeSpec::at_least(AttrKind::Number, 0.0));
        all.insert("list", list);

        let mut grid: WidgetSchema = HashMap::new();
        grid.insert("sections", AttributeSpec::of(AttrKind::Any));
        grid.insert("columns", AttributeSpec::ranged(AttrKind::Number, 1.0, 12.0));
        grid.insert("spacing", AttributeSpec::at_least(AttrKind::Number, 0.0));
        all.insert("grid", grid);

        let mut spacer: WidgetSchema = HashMap::new();
        spacer.insert("size", AttributeSpec::at_least(AttrKind::Number, 0.0));
        all.insert("spacer", spacer);

        let mut divider: WidgetSchema = HashMap::new();
        divider.insert("thickness", AttributeSpec::at_least(AttrKind::Number, 0.0));
        divider.insert("color", AttributeSpec::of(AttrKind::Color));
        all.insert("divider", divider);

        let mut icon: WidgetSchema = HashMap::new();
        icon.insert("name", AttributeSpec::required(AttrKind::String));
        icon.insert("tint", AttributeSpec::of(AttrKind::Color));
        icon.insert("contentDescription", AttributeSpec::of(AttrKind::String));
        all.insert("icon", icon);

        let mut scroll: WidgetSchema = HashMap::new();
        scroll.insert(
            "orientation",
            AttributeSpec::of(AttrKind::Enum(&["vertical", "horizontal"])),
        );
        all.insert("scroll", scroll);

        all
    };
}

/// Resolve a raw widget type to its canonical schema key.
pub fn canonical_widget_type(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    WIDGET_ALIASES
        .get(lower.as_str())
        .map(|s| s.to_string())
        .unwrap_or(lower)
}

fn lookup_spec(widget: &str, attr: &str) -> Option<AttributeSpec> {
    if let Some(schema) = WIDGET_SCHEMAS.get(widget) {
        if let Some(spec) = schema.get(attr) {
            return Some(*spec);
        }
    }
    COMMON_SCHEMA.get(attr).copied()
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// A runtime-bound value cannot be statically typed, so any value that *is*
/// or *contains* a binding marker is exempt from kind/enum/range checks.
fn is_binding_exempt(value: &Value) -> bool {
    match value {
        Value::String(s) => contains_binding_marker(s),
        Value::Array(items) => items.iter().any(is_binding_exempt),
        Value::Object(map) => map.values().any(is_binding_exempt),
        _ => false,
    }
}

fn check_kind(widget: &str, attr: &str, spec: &AttributeSpec, value: &Value) -> Option<String> {
    let mismatch = |expected: &str| {
        Some(format!(
            "Attribute '{}' on '{}': expected {}, got {}",
            attr,
            widget,
            expected,
            kind_of(value)
        ))
    };
    match spec.kind {
        AttrKind::Any | AttrKind::Event => None,
        AttrKind::String => {
            if value.is_string() {
                None
            } else {
                mismatch("string")
            }
        }
        AttrKind::Number => {
            if value.is_number() {
                None
            } else {
                mismatch("number")
            }
        }
        AttrKind::Boolean => {
            if value.is_boolean() {
                None
            } else {
                mismatch("boolean")
            }
        }
        AttrKind::Color => match value {
            Value::String(s) if is_hex_color(s) => None,
            Value::String(s) => Some(format!(
                "Attribute '{}' on '{}': '{}' is not a hex color (#RGB, #RRGGBB or #RRGGBBAA)",
                attr, widget, s
            )),
            _ => mismatch("color string"),
        },
        AttrKind::Dimension => match value {
            Value::Number(_) => None,
            Value::String(s) if s == "fill" || s == "wrap" => None,
            Value::String(s) => Some(format!(
                "Attribute '{}' on '{}': '{}' is not a dimension (number, 'fill' or 'wrap')",
                attr, widget, s
            )),
            _ => mismatch("dimension"),
        },
        AttrKind::Insets => match value {
            Value::Number(_) => None,
            Value::Array(items) => {
                if (items.len() == 1 || items.len() == 4)
                    && items.iter().all(|v| v.is_number())
                {
                    None
                } else {
                    Some(format!(
                        "Attribute '{}' on '{}': inset arrays take 1 or 4 numbers",
                        attr, widget
                    ))
                }
            }
            Value::Object(_) => None,
            _ => mismatch("inset (number, array or edge object)"),
        },
        AttrKind::Enum(valid) => match value {
            Value::String(s) => {
                if valid.contains(&s.as_str()) {
                    None
                } else {
                    Some(format!(
                        "Attribute '{}' on '{}': invalid value '{}' (valid: {})",
                        attr,
                        widget,
                        s,
                        valid.join(", ")
                    ))
                }
            }
            Value::Array(items) => {
                // Element-wise: report only the invalid subset.
                let bad: Vec<&str> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !valid.contains(s))
                    .collect();
                if bad.is_empty() && items.iter().all(|v| v.is_string()) {
                    None
                } else if !bad.is_empty() {
                    Some(format!(
                        "Attribute '{}' on '{}': invalid values [{}] (valid: {})",
                        attr,
                        widget,
                        bad.join(", "),
                        valid.join(", ")
                    ))
                } else {
                    mismatch("enum string or string array")
                }
            }
            _ => mismatch("enum string"),
        },
    }
}

fn check_range(widget: &str, attr: &str, spec: &AttributeSpec, value: &Value) -> Option<String> {
    let n = value.as_f64()?;
    if let Some(min) = spec.min {
        if n < min {
            return Some(format!(
                "Attribute '{}' on '{}': value {} below minimum {}",
                attr, widget, n, min
            ));
        }
    }
    if let Some(max) = spec.max {
        if n > max {
            return Some(format!(
                "Attribute '{}' on '{}': value {} above maximum {}",
                attr, widget, n, max
            ));
        }
    }
    None
}

/// Validate one node's attributes. Advisory only.
pub fn validate_node(node: &ComponentNode) -> Vec<String> {
    let mut warnings = Vec::new();
    let widget = canonical_widget_type(&node.widget_type);

    for (attr, value) in &node.attributes {
        // `style` is consumed by the resolver before validation; tolerate a
        // leftover when callers validate unresolved trees.
        if attr == "style" {
            continue;
        }
        let Some(spec) = lookup_spec(&widget, attr) else {
            warnings.push(format!("Unknown attribute '{}' on widget '{}'", attr, widget));
            continue;
        };
        if is_binding_exempt(value) {
            continue;
        }
        if let Some(w) = check_kind(&widget, attr, &spec, value) {
            warnings.push(w);
            continue;
        }
        if let Some(w) = check_range(&widget, attr, &spec, value) {
            warnings.push(w);
        }
    }

    // Required attributes for this widget type.
    if let Some(schema) = WIDGET_SCHEMAS.get(widget.as_str()) {
        let mut required: Vec<&str> = schema
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| *name)
            .collect();
        required.sort();
        for name in required {
            if !node.has_attr(name) {
                warnings.push(format!(
                    "Required attribute '{}' missing on widget '{}'",
                    name, widget
                ));
            }
        }
    }

    warnings
}

/// Validate a whole subtree in document order, including nested widget
/// collections (item templates, grid section cells).
pub fn validate_tree(node: &ComponentNode) -> Vec<String> {
    let mut warnings = validate_node(node);

    if let Some(template) = node.attr_node("itemTemplate") {
        warnings.extend(validate_tree(&template));
    }
    if let Some(Value::Array(sections)) = node.attr("sections") {
        for section in sections {
            for key in ["header", "cell", "footer"] {
                if let Some(sub) = section.get(key) {
                    if let Ok(mut n) = serde_json::from_value::<ComponentNode>(sub.clone()) {
                        n.normalize();
                        warnings.extend(validate_tree(&n));
                    }
                }
            }
        }
    }
    for child in &node.children {
        warnings.extend(validate_tree(child));
    }
    warnings
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
