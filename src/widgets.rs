//! Widget Converters
//!
//! One small pure converter per widget type, registered in a table keyed by
//! canonical type with a single generic fallback. Each converter reads
//! already-resolved attributes, picks its primitive construct and sub-variant,
//! delegates the shared layout attributes to the modifier builder, and splices
//! its children's fragments into its own body.
//!
//! Sub-variant precedence everywhere: explicit style attribute > structural
//! hint (a border implies the outlined variant) > default.

use std::collections::HashMap;

use serde_json::Value;

use crate::binding::{contains_binding_marker, parse_binding, translate_expression, translate_value};
use crate::constraint;
use crate::document::ComponentNode;
use crate::emit::{
    block_call, leaf_call, modifier_param, placeholder, select_container, ContainerKind,
    EmitContext, Emitter, Fragment,
};
use crate::modifier::{
    action_call, build_chain, fmt_dp, fmt_float, fmt_number, reconcile_columns, resolve_color,
    ModifierConfig,
};

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERTER TRAIT + REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

pub trait WidgetConverter: Send + Sync {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment;
}

/// `canonical type -> converter` table with one explicit fallback entry.
pub struct ConverterRegistry {
    converters: HashMap<&'static str, Box<dyn WidgetConverter>>,
    fallback: Box<dyn WidgetConverter>,
}

impl ConverterRegistry {
    pub fn standard() -> Self {
        let mut converters: HashMap<&'static str, Box<dyn WidgetConverter>> = HashMap::new();
        converters.insert("column", Box::new(StackConverter { orientation: Some(ContainerKind::Column) }));
        converters.insert("row", Box::new(StackConverter { orientation: Some(ContainerKind::Row) }));
        converters.insert("box", Box::new(StackConverter { orientation: None }));
        converters.insert("text", Box::new(TextConverter));
        converters.insert("button", Box::new(ButtonConverter));
        converters.insert("image", Box::new(ImageConverter));
        converters.insert("text_field", Box::new(TextFieldConverter));
        converters.insert("switch", Box::new(ToggleConverter { widget: "Switch" }));
        converters.insert("checkbox", Box::new(ToggleConverter { widget: "Checkbox" }));
        converters.insert("slider", Box::new(SliderConverter));
        converters.insert("progress", Box::new(ProgressConverter));
        converters.insert("spacer", Box::new(SpacerConverter));
        converters.insert("divider", Box::new(DividerConverter));
        converters.insert("card", Box::new(CardConverter));
        converters.insert("list", Box::new(ListConverter));
        converters.insert("grid", Box::new(GridConverter));
        converters.insert("scroll", Box::new(ScrollConverter));
        converters.insert("icon", Box::new(IconConverter));
        ConverterRegistry {
            converters,
            fallback: Box::new(FallbackConverter),
        }
    }

    pub fn get(&self, widget: &str) -> &dyn WidgetConverter {
        self.converters
            .get(widget)
            .map(|b| b.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn push_modifier(params: &mut Vec<String>, node: &ComponentNode, config: ModifierConfig, ctx: &mut EmitContext) {
    let chain = build_chain(node, config, ctx);
    if !chain.is_empty() {
        ctx.require_import("androidx.compose.ui.Modifier");
    }
    if let Some(p) = modifier_param(&chain) {
        params.push(p);
    }
}

/// `onChange`-style handler invoked with the new value.
fn handler_with_arg(handler: &str) -> String {
    let call = action_call(handler);
    match call.strip_suffix("()") {
        Some(name) => format!("{}(it)", name),
        None => call,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Sub-variant selection: explicit style attribute first, then a structural
/// hint, then the default.
fn select_variant<'a>(
    node: &'a ComponentNode,
    style_attr: &str,
    structural: Option<&'a str>,
    default: &'a str,
) -> &'a str {
    if let Some(style) = node.attr_str(style_attr) {
        return style;
    }
    let has_border = node.attr_f64("borderWidth").map(|w| w > 0.0).unwrap_or(false);
    if has_border {
        if let Some(hinted) = structural {
            return hinted;
        }
    }
    default
}

fn arrangement_expr(kind: ContainerKind, value: &str) -> String {
    let name = match (kind, value) {
        (ContainerKind::Column, "start") => "Top",
        (ContainerKind::Column, "end") => "Bottom",
        (ContainerKind::Row, "start") => "Start",
        (ContainerKind::Row, "end") => "End",
        (_, "center") => "Center",
        (_, "spaceBetween") => "SpaceBetween",
        (_, "spaceAround") => "SpaceAround",
        (_, "spaceEvenly") => "SpaceEvenly",
        (_, other) => return format!("Arrangement.{}", capitalize(other)),
    };
    format!("Arrangement.{}", name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STACK / CONSTRAINT CONTAINERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared converter for `column`, `row` and `box`. The typed forms carry a
/// default axis; a `box` picks its primitive from its attributes and children
/// (orientation → stack, anchored children → constraint container, otherwise
/// overlay).
struct StackConverter {
    orientation: Option<ContainerKind>,
}

impl WidgetConverter for StackConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let kind = match node.attr_str("orientation") {
            Some(_) => select_container(node),
            None => self.orientation.unwrap_or_else(|| select_container(node)),
        };
        match kind {
            ContainerKind::Constraint => emit_constraint_container(node, indent, emitter, ctx),
            _ => emit_stack(node, kind, indent, emitter, ctx),
        }
    }
}

fn emit_stack(
    node: &ComponentNode,
    kind: ContainerKind,
    indent: usize,
    emitter: &Emitter,
    ctx: &mut EmitContext,
) -> Fragment {
    let (name, import) = match kind {
        ContainerKind::Column => ("Column", "androidx.compose.foundation.layout.Column"),
        ContainerKind::Row => ("Row", "androidx.compose.foundation.layout.Row"),
        _ => ("Box", "androidx.compose.foundation.layout.Box"),
    };
    ctx.require_import(import);

    let mut params = Vec::new();
    push_modifier(&mut params, node, ModifierConfig::default(), ctx);

    let spacing = node.attr_f64("spacing");
    let arrangement = node.attr_str("arrangement").map(str::to_string);
    if spacing.is_some() || arrangement.is_some() {
        if kind == ContainerKind::Column || kind == ContainerKind::Row {
            ctx.require_import("androidx.compose.foundation.layout.Arrangement");
            let expr = match (spacing, arrangement.as_deref()) {
                (Some(s), _) => format!("Arrangement.spacedBy({})", fmt_dp(s)),
                (None, Some(a)) => arrangement_expr(kind, a),
                (None, None) => unreachable!(),
            };
            let param = if kind == ContainerKind::Column {
                format!("verticalArrangement = {}", expr)
            } else {
                format!("horizontalArrangement = {}", expr)
            };
            params.push(param);
        }
    }
    if kind == ContainerKind::Overlay {
        if let Some(align) = node.attr_str("contentAlignment") {
            ctx.require_import("androidx.compose.ui.Alignment");
            params.push(format!("contentAlignment = Alignment.{}", capitalize(align)));
        }
    }
    if node.attr_bool("scrollable") == Some(true) {
        // Scrollability rides on the modifier; append after the built chain.
        ctx.require_import("androidx.compose.foundation.rememberScrollState");
        let scroll_call = if kind == ContainerKind::Row {
            ctx.require_import("androidx.compose.foundation.horizontalScroll");
            ".horizontalScroll(rememberScrollState())"
        } else {
            ctx.require_import("androidx.compose.foundation.verticalScroll");
            ".verticalScroll(rememberScrollState())"
        };
        ctx.require_import("androidx.compose.ui.Modifier");
        match params.iter_mut().find(|p| p.starts_with("modifier = ")) {
            Some(existing) => existing.push_str(&format!("\n{}", scroll_call)),
            None => params.push(format!("modifier = Modifier{}", scroll_call)),
        }
    }

    let children = emitter.emit_children(node, indent + 1, ctx);
    block_call(name, params, children, indent)
}

fn emit_constraint_container(
    node: &ComponentNode,
    indent: usize,
    emitter: &Emitter,
    ctx: &mut EmitContext,
) -> Fragment {
    ctx.require_import("androidx.constraintlayout.compose.ConstraintLayout");
    ctx.require_import("androidx.compose.ui.Modifier");

    let mut params = Vec::new();
    push_modifier(&mut params, node, ModifierConfig::default(), ctx);

    let (refs, graph_warnings) = constraint::build_graph(&node.children);
    for w in graph_warnings {
        ctx.warn(&w);
    }

    let mut body = Fragment::new();
    let names: Vec<&str> = refs.iter().map(|r| r.ref_id.as_str()).collect();
    body.line(
        indent + 1,
        format!("val ({}) = createRefs()", names.join(", ")),
    );

    // Children keep document order; each is wrapped in a Box carrying its
    // constrainAs modifier so arbitrary widget fragments need no knowledge of
    // the surrounding constraint scope.
    for reference in &refs {
        let child = &node.children[reference.node_index];
        let child_fragment = emitter.emit_node(child, indent + 2, ctx);
        if child_fragment.is_empty() {
            continue;
        }
        ctx.require_import("androidx.compose.foundation.layout.Box");
        let mut wrapper = Fragment::new();
        if reference.links.is_empty() {
            wrapper.line(
                indent + 1,
                format!(
                    "Box(modifier = Modifier.constrainAs({}) {{ }}) {{",
                    reference.ref_id
                ),
            );
        } else {
            wrapper.line(
                indent + 1,
                format!("Box(modifier = Modifier.constrainAs({}) {{", reference.ref_id),
            );
            for link in &reference.links {
                wrapper.line(indent + 2, link.clone());
            }
            wrapper.line(indent + 1, "}) {");
        }
        wrapper.append(child_fragment);
        wrapper.line(indent + 1, "}");
        body.append(wrapper);
    }

    let mut frag = Fragment::new();
    match params.len() {
        0 => frag.line(indent, "ConstraintLayout {"),
        _ => {
            if params.len() == 1 && !params[0].contains('\n') {
                frag.line(indent, format!("ConstraintLayout({}) {{", params[0]));
            } else {
                frag.line(indent, "ConstraintLayout(");
                for p in params {
                    frag.line(indent + 1, format!("{},", p));
                }
                frag.line(indent, ") {");
            }
        }
    }
    frag.append(body);
    frag.line(indent, "}");
    frag
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT
// ═══════════════════════════════════════════════════════════════════════════════

struct TextConverter;

impl WidgetConverter for TextConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.require_import("androidx.compose.material3.Text");
        let mut params = Vec::new();

        let text = node.attr_str("text").unwrap_or("");
        params.push(format!("text = {}", translate_value(text)));

        if let Some(color) = node.attr("textColor").cloned() {
            params.push(format!("color = {}", resolve_color(&color, "textColor", ctx)));
        }
        if let Some(size) = node.attr("fontSize") {
            ctx.require_import("androidx.compose.ui.unit.sp");
            match size.as_f64() {
                Some(n) => params.push(format!("fontSize = {}.sp", fmt_number(n))),
                None => {
                    if let Some(s) = size.as_str() {
                        params.push(format!("fontSize = ({}).sp", translate_value(s)));
                    }
                }
            }
        }
        if let Some(weight) = node.attr_str("fontWeight") {
            ctx.require_import("androidx.compose.ui.text.font.FontWeight");
            let mapped = match weight {
                "normal" => "Normal",
                "medium" => "Medium",
                "semibold" => "SemiBold",
                "bold" => "Bold",
                other => {
                    ctx.warn(&format!("Unknown fontWeight '{}'; using Normal", other));
                    "Normal"
                }
            };
            params.push(format!("fontWeight = FontWeight.{}", mapped));
        }
        let styles: Vec<&str> = match node.attr("textStyle") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        };
        if styles.contains(&"italic") {
            ctx.require_import("androidx.compose.ui.text.font.FontStyle");
            params.push("fontStyle = FontStyle.Italic".to_string());
        }
        let decorations: Vec<&str> = styles
            .iter()
            .filter_map(|s| match *s {
                "underline" => Some("TextDecoration.Underline"),
                "strikethrough" => Some("TextDecoration.LineThrough"),
                _ => None,
            })
            .collect();
        if !decorations.is_empty() {
            ctx.require_import("androidx.compose.ui.text.style.TextDecoration");
            if decorations.len() == 1 {
                params.push(format!("textDecoration = {}", decorations[0]));
            } else {
                params.push(format!(
                    "textDecoration = TextDecoration.combine(listOf({}))",
                    decorations.join(", ")
                ));
            }
        }
        if let Some(align) = node.attr_str("textAlign") {
            ctx.require_import("androidx.compose.ui.text.style.TextAlign");
            params.push(format!("textAlign = TextAlign.{}", capitalize(align)));
        }
        if let Some(max) = node.attr_f64("maxLines") {
            params.push(format!("maxLines = {}", fmt_number(max)));
        }
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        leaf_call("Text", params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUTTON
// ═══════════════════════════════════════════════════════════════════════════════

struct ButtonConverter;

impl WidgetConverter for ButtonConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let variant = select_variant(node, "buttonStyle", Some("outlined"), "filled");
        let (name, import) = match variant {
            "outlined" => ("OutlinedButton", "androidx.compose.material3.OutlinedButton"),
            "text" => ("TextButton", "androidx.compose.material3.TextButton"),
            "elevated" => ("ElevatedButton", "androidx.compose.material3.ElevatedButton"),
            _ => ("Button", "androidx.compose.material3.Button"),
        };
        ctx.require_import(import);

        let mut params = Vec::new();
        let on_click = node
            .attr_str("onClick")
            .map(action_call)
            .unwrap_or_default();
        params.push(format!("onClick = {{ {} }}", on_click).replace("{  }", "{ }"));
        if let Some(enabled) = node.attr("enabled") {
            params.push(format!("enabled = {}", bool_expr(enabled)));
        }
        // The button consumes clicks natively; never add a clickable modifier.
        push_modifier(&mut params, node, ModifierConfig::without_click(), ctx);

        let mut children = emitter.emit_children(node, indent + 1, ctx);
        if children.is_empty() {
            ctx.require_import("androidx.compose.material3.Text");
            let label = node.attr_str("text").unwrap_or("");
            let mut label_frag = Fragment::new();
            label_frag.line(indent + 1, format!("Text(text = {})", translate_value(label)));
            children.push(label_frag);
        }
        block_call(name, params, children, indent)
    }
}

fn bool_expr(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::String(s) => translate_value(s),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMAGE
// ═══════════════════════════════════════════════════════════════════════════════

struct ImageConverter;

impl WidgetConverter for ImageConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let Some(source) = node.attr_str("source") else {
            return placeholder("Image node has no source; skipped", indent, ctx);
        };
        ctx.require_import("coil.compose.AsyncImage");

        let mut params = Vec::new();
        params.push(format!("model = {}", translate_value(source)));
        let description = node
            .attr_str("contentDescription")
            .map(translate_value)
            .unwrap_or_else(|| "null".to_string());
        params.push(format!("contentDescription = {}", description));
        if let Some(scale) = node.attr_str("contentScale") {
            ctx.require_import("androidx.compose.ui.layout.ContentScale");
            params.push(format!("contentScale = ContentScale.{}", capitalize(scale)));
        }
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        leaf_call("AsyncImage", params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT FIELD
// ═══════════════════════════════════════════════════════════════════════════════

struct TextFieldConverter;

impl WidgetConverter for TextFieldConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let variant = select_variant(node, "fieldStyle", Some("outlined"), "filled");
        let (name, import) = match variant {
            "outlined" => ("OutlinedTextField", "androidx.compose.material3.OutlinedTextField"),
            _ => ("TextField", "androidx.compose.material3.TextField"),
        };
        ctx.require_import(import);

        let mut params = Vec::new();
        let value = node.attr_str("value").unwrap_or("");
        params.push(format!("value = {}", translate_value(value)));
        let on_change = node
            .attr_str("onChange")
            .map(|h| handler_with_arg(h))
            .unwrap_or_default();
        params.push(format!("onValueChange = {{ {} }}", on_change).replace("{  }", "{ }"));
        if let Some(hint) = node.attr_str("hint") {
            ctx.require_import("androidx.compose.material3.Text");
            params.push(format!(
                "placeholder = {{ Text(text = {}) }}",
                translate_value(hint)
            ));
        }
        if let Some(keyboard) = node.attr_str("keyboard") {
            ctx.require_import("androidx.compose.foundation.text.KeyboardOptions");
            ctx.require_import("androidx.compose.ui.text.input.KeyboardType");
            params.push(format!(
                "keyboardOptions = KeyboardOptions(keyboardType = KeyboardType.{})",
                capitalize(keyboard)
            ));
        }
        if let Some(max) = node.attr_f64("maxLines") {
            params.push(format!("maxLines = {}", fmt_number(max)));
        }
        push_modifier(&mut params, node, ModifierConfig::without_click(), ctx);
        leaf_call(name, params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOGGLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Switch and checkbox share the checked/onCheckedChange shape.
struct ToggleConverter {
    widget: &'static str,
}

impl WidgetConverter for ToggleConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.require_import(match self.widget {
            "Checkbox" => "androidx.compose.material3.Checkbox",
            _ => "androidx.compose.material3.Switch",
        });
        let mut params = Vec::new();
        let checked = node
            .attr("checked")
            .map(bool_expr)
            .unwrap_or_else(|| "false".to_string());
        params.push(format!("checked = {}", checked));
        let on_change = match node.attr_str("onChange") {
            Some(h) => format!("{{ {} }}", handler_with_arg(h)),
            None => "null".to_string(),
        };
        params.push(format!("onCheckedChange = {}", on_change));
        if let Some(enabled) = node.attr("enabled") {
            params.push(format!("enabled = {}", bool_expr(enabled)));
        }
        push_modifier(&mut params, node, ModifierConfig::without_click(), ctx);
        leaf_call(self.widget, params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SLIDER / PROGRESS
// ═══════════════════════════════════════════════════════════════════════════════

struct SliderConverter;

impl WidgetConverter for SliderConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.require_import("androidx.compose.material3.Slider");
        let mut params = Vec::new();
        let value = match node.attr("value") {
            Some(Value::Number(n)) => fmt_float(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => translate_value(s),
            _ => "0f".to_string(),
        };
        params.push(format!("value = {}", value));
        let on_change = node
            .attr_str("onChange")
            .map(|h| handler_with_arg(h))
            .unwrap_or_default();
        params.push(format!("onValueChange = {{ {} }}", on_change).replace("{  }", "{ }"));
        if let (Some(min), Some(max)) = (node.attr_f64("min"), node.attr_f64("max")) {
            params.push(format!("valueRange = {}..{}", fmt_float(min), fmt_float(max)));
        }
        if let Some(steps) = node.attr_f64("steps") {
            params.push(format!("steps = {}", fmt_number(steps)));
        }
        push_modifier(&mut params, node, ModifierConfig::without_click(), ctx);
        leaf_call("Slider", params, indent)
    }
}

struct ProgressConverter;

impl WidgetConverter for ProgressConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let mut params = Vec::new();
        let indeterminate = node.attr_bool("indeterminate") == Some(true)
            || !node.has_attr("value");
        let name = if indeterminate {
            ctx.require_import("androidx.compose.material3.CircularProgressIndicator");
            "CircularProgressIndicator"
        } else {
            ctx.require_import("androidx.compose.material3.LinearProgressIndicator");
            let progress = match node.attr("value") {
                Some(Value::Number(n)) => fmt_float(n.as_f64().unwrap_or(0.0)),
                Some(Value::String(s)) => translate_value(s),
                _ => "0f".to_string(),
            };
            params.push(format!("progress = {{ {} }}", progress));
            "LinearProgressIndicator"
        };
        if let Some(color) = node.attr("color").cloned() {
            params.push(format!("color = {}", resolve_color(&color, "color", ctx)));
        }
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        leaf_call(name, params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPACER / DIVIDER
// ═══════════════════════════════════════════════════════════════════════════════

struct SpacerConverter;

impl WidgetConverter for SpacerConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.require_import("androidx.compose.foundation.layout.Spacer");
        ctx.require_import("androidx.compose.ui.Modifier");
        let mut chain = Vec::new();
        if let Some(size) = node.attr_f64("size") {
            ctx.require_import("androidx.compose.foundation.layout.size");
            chain.push(format!(".size({})", fmt_dp(size)));
        }
        chain.extend(build_chain(node, ModifierConfig::default(), ctx));
        let param = modifier_param(&chain).unwrap_or_else(|| "modifier = Modifier".to_string());
        leaf_call("Spacer", vec![param], indent)
    }
}

struct DividerConverter;

impl WidgetConverter for DividerConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.require_import("androidx.compose.material3.HorizontalDivider");
        let mut params = Vec::new();
        if let Some(thickness) = node.attr_f64("thickness") {
            params.push(format!("thickness = {}", fmt_dp(thickness)));
        }
        if let Some(color) = node.attr("color").cloned() {
            params.push(format!("color = {}", resolve_color(&color, "color", ctx)));
        }
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        leaf_call("HorizontalDivider", params, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CARD
// ═══════════════════════════════════════════════════════════════════════════════

struct CardConverter;

impl WidgetConverter for CardConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let variant = select_variant(node, "cardStyle", Some("outlined"), "elevated");
        let (name, import) = match variant {
            "outlined" => ("OutlinedCard", "androidx.compose.material3.OutlinedCard"),
            "filled" => ("Card", "androidx.compose.material3.Card"),
            _ => ("ElevatedCard", "androidx.compose.material3.ElevatedCard"),
        };
        ctx.require_import(import);

        let mut params = Vec::new();
        if let Some(handler) = node.attr_str("onClick") {
            params.push(format!("onClick = {{ {} }}", action_call(handler)));
        }
        push_modifier(&mut params, node, ModifierConfig::without_click(), ctx);
        let children = emitter.emit_children(node, indent + 1, ctx);
        block_call(name, params, children, indent)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIST
// ═══════════════════════════════════════════════════════════════════════════════

struct ListConverter;

impl WidgetConverter for ListConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let items = node.attr_str("items");
        let template = node.attr_node("itemTemplate");
        let (Some(items), Some(template)) = (items, template) else {
            let reason = if node.attr_str("items").is_none() {
                "List node has no items source; skipped"
            } else {
                "List node has no item template; skipped"
            };
            return placeholder(reason, indent, ctx);
        };

        let horizontal = node.attr_str("orientation") == Some("horizontal");
        let (name, import) = if horizontal {
            ("LazyRow", "androidx.compose.foundation.lazy.LazyRow")
        } else {
            ("LazyColumn", "androidx.compose.foundation.lazy.LazyColumn")
        };
        ctx.require_import(import);
        ctx.require_import("androidx.compose.foundation.lazy.items");

        let mut params = Vec::new();
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        if let Some(spacing) = node.attr_f64("spacing") {
            ctx.require_import("androidx.compose.foundation.layout.Arrangement");
            let param = if horizontal {
                format!("horizontalArrangement = Arrangement.spacedBy({})", fmt_dp(spacing))
            } else {
                format!("verticalArrangement = Arrangement.spacedBy({})", fmt_dp(spacing))
            };
            params.push(param);
        }

        let source = match parse_binding(items) {
            Some(b) => translate_expression(&b),
            None => {
                ctx.warn(&format!(
                    "List items '{}' is not a binding; expected @{{source}}",
                    items
                ));
                items.to_string()
            }
        };

        let mut body = Fragment::new();
        body.line(indent + 1, format!("items({}) {{ item ->", source));
        body.append(emitter.emit_node(&template, indent + 2, ctx));
        body.line(indent + 1, "}");

        let mut frag = Fragment::new();
        if params.is_empty() {
            frag.line(indent, format!("{} {{", name));
        } else if params.len() == 1 && !params[0].contains('\n') {
            frag.line(indent, format!("{}({}) {{", name, params[0]));
        } else {
            frag.line(indent, format!("{}(", name));
            for p in params {
                frag.line(indent + 1, format!("{},", p));
            }
            frag.line(indent, ") {");
        }
        frag.append(body);
        frag.line(indent, "}");
        frag
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRID
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct GridSection {
    columns: u32,
    header: Option<ComponentNode>,
    cell: Option<ComponentNode>,
    items: Option<String>,
}

fn parse_sections(node: &ComponentNode) -> Option<Vec<GridSection>> {
    let Value::Array(raw) = node.attr("sections")? else {
        return None;
    };
    let mut sections = Vec::with_capacity(raw.len());
    for entry in raw {
        let columns = entry
            .get("columns")
            .and_then(Value::as_u64)
            .map(|c| c as u32)
            .unwrap_or(1);
        let read_node = |key: &str| {
            entry.get(key).and_then(|v| {
                let mut n: ComponentNode = serde_json::from_value(v.clone()).ok()?;
                n.normalize();
                Some(n)
            })
        };
        sections.push(GridSection {
            columns,
            header: read_node("header"),
            cell: read_node("cell"),
            items: entry.get("items").and_then(Value::as_str).map(str::to_string),
        });
    }
    Some(sections)
}

struct GridConverter;

impl WidgetConverter for GridConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let sections = parse_sections(node).unwrap_or_default();
        if sections.is_empty() && node.children.is_empty() {
            return placeholder("Grid node has no sections and no children; skipped", indent, ctx);
        }

        ctx.require_import("androidx.compose.foundation.lazy.grid.GridCells");
        ctx.require_import("androidx.compose.foundation.lazy.grid.LazyVerticalGrid");

        // One grid serves every section: the column count is the LCM of all
        // per-section counts and each section's cells span total/columns.
        let counts: Vec<u32> = sections.iter().map(|s| s.columns).collect();
        let total = if sections.is_empty() {
            node.attr_f64("columns").map(|c| c as u32).unwrap_or(1).max(1)
        } else {
            reconcile_columns(&counts)
        };

        let mut params = Vec::new();
        params.push(format!("columns = GridCells.Fixed({})", total));
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        if let Some(spacing) = node.attr_f64("spacing") {
            ctx.require_import("androidx.compose.foundation.layout.Arrangement");
            params.push(format!(
                "verticalArrangement = Arrangement.spacedBy({})",
                fmt_dp(spacing)
            ));
            params.push(format!(
                "horizontalArrangement = Arrangement.spacedBy({})",
                fmt_dp(spacing)
            ));
        }

        let mut body = Fragment::new();
        for (i, section) in sections.iter().enumerate() {
            if sections.len() > 1 {
                body.line(indent + 1, format!("// Section {} of {}", i + 1, sections.len()));
            }
            if let Some(ref header) = section.header {
                ctx.require_import("androidx.compose.foundation.lazy.grid.GridItemSpan");
                body.line(
                    indent + 1,
                    "item(span = { GridItemSpan(maxLineSpan) }) {",
                );
                body.append(emitter.emit_node(header, indent + 2, ctx));
                body.line(indent + 1, "}");
            }
            let span = total / section.columns.max(1);
            let (cell, items) = match (&section.cell, &section.items) {
                (Some(c), Some(i)) => (c, i),
                _ => {
                    body.append(placeholder(
                        "Grid section has no cell template or items source; skipped",
                        indent + 1,
                        ctx,
                    ));
                    continue;
                }
            };
            ctx.require_import("androidx.compose.foundation.lazy.grid.items");
            let source = match parse_binding(items.as_str()) {
                Some(b) => translate_expression(&b),
                None => items.clone(),
            };
            if span > 1 {
                ctx.require_import("androidx.compose.foundation.lazy.grid.GridItemSpan");
                body.line(
                    indent + 1,
                    format!(
                        "items({}, span = {{ GridItemSpan({}) }}) {{ item ->",
                        source, span
                    ),
                );
            } else {
                body.line(indent + 1, format!("items({}) {{ item ->", source));
            }
            body.append(emitter.emit_node(cell, indent + 2, ctx));
            body.line(indent + 1, "}");
        }
        if sections.is_empty() {
            ctx.require_import("androidx.compose.foundation.lazy.grid.items");
            for child in emitter.emit_children(node, indent + 2, ctx) {
                body.line(indent + 1, "item {");
                body.append(child);
                body.line(indent + 1, "}");
            }
        }

        let mut frag = Fragment::new();
        frag.line(indent, "LazyVerticalGrid(");
        for p in params {
            frag.line(indent + 1, format!("{},", p));
        }
        frag.line(indent, ") {");
        frag.append(body);
        frag.line(indent, "}");
        frag
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCROLL / ICON / FALLBACK
// ═══════════════════════════════════════════════════════════════════════════════

struct ScrollConverter;

impl WidgetConverter for ScrollConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        // A scroll node is a stack with the scroll modifier forced on.
        let mut scrollable = node.clone();
        scrollable
            .attributes
            .insert("scrollable".to_string(), Value::Bool(true));
        if !scrollable.attributes.contains_key("orientation") {
            scrollable
                .attributes
                .insert("orientation".to_string(), Value::String("vertical".to_string()));
        }
        let kind = select_container(&scrollable);
        emit_stack(&scrollable, kind, indent, emitter, ctx)
    }
}

struct IconConverter;

impl WidgetConverter for IconConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        _emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        let Some(name) = node.attr_str("name") else {
            return placeholder("Icon node has no name; skipped", indent, ctx);
        };
        ctx.require_import("androidx.compose.material3.Icon");
        ctx.require_import("androidx.compose.material.icons.Icons");

        let icon = if contains_binding_marker(name) {
            translate_value(name)
        } else {
            format!("Icons.Default.{}", pascal_case(name))
        };
        let mut params = Vec::new();
        params.push(format!("imageVector = {}", icon));
        let description = node
            .attr_str("contentDescription")
            .map(translate_value)
            .unwrap_or_else(|| "null".to_string());
        params.push(format!("contentDescription = {}", description));
        if let Some(tint) = node.attr("tint").cloned() {
            params.push(format!("tint = {}", resolve_color(&tint, "tint", ctx)));
        }
        push_modifier(&mut params, node, ModifierConfig::default(), ctx);
        leaf_call("Icon", params, indent)
    }
}

fn pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|seg| !seg.is_empty())
        .map(capitalize)
        .collect()
}

/// Unknown widget types degrade to a plain container so the rest of the
/// document still compiles.
struct FallbackConverter;

impl WidgetConverter for FallbackConverter {
    fn emit(
        &self,
        node: &ComponentNode,
        indent: usize,
        emitter: &Emitter,
        ctx: &mut EmitContext,
    ) -> Fragment {
        ctx.warn(&format!(
            "Unknown widget type '{}'; emitted as a plain container",
            node.widget_type
        ));
        let mut frag = Fragment::new();
        frag.line(
            indent,
            format!("// Unknown widget type '{}'", node.widget_type),
        );
        frag.append(emit_stack(node, select_container(node), indent, emitter, ctx));
        frag
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileOptions;
    use serde_json::json;

    fn emit(v: serde_json::Value) -> (String, EmitContext) {
        let mut node: ComponentNode = serde_json::from_value(v).unwrap();
        node.normalize();
        let registry = ConverterRegistry::standard();
        let emitter = Emitter::new(&registry);
        let mut ctx = EmitContext::new(CompileOptions::default());
        let frag = emitter.emit_node(&node, 0, &mut ctx);
        (frag.render(), ctx)
    }

    #[test]
    fn test_vertical_stack_children_in_order() {
        let (code, _) = emit(json!({
            "type": "box",
            "orientation": "vertical",
            "children": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ]
        }));
        assert!(code.starts_with("Column {"));
        let first = code.find("first").unwrap();
        let second = code.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_reverse_direction_flips_children() {
        let (code, _) = emit(json!({
            "type": "box",
            "orientation": "vertical",
            "direction": "reverse",
            "children": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ]
        }));
        let first = code.find("first").unwrap();
        let second = code.find("second").unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_constraint_container_selected_for_anchored_children() {
        let (code, _) = emit(json!({
            "type": "box",
            "children": [
                { "type": "text", "text": "a", "alignParentTop": true },
                { "type": "text", "text": "b", "belowView": "view_0" }
            ]
        }));
        assert!(code.contains("ConstraintLayout"));
        assert!(code.contains("val (view_0, view_1) = createRefs()"));
        assert!(code.contains("top.linkTo(view_0.bottom)"));
    }

    #[test]
    fn test_gone_child_skipped() {
        let (code, _) = emit(json!({
            "type": "column",
            "children": [
                { "type": "text", "text": "shown" },
                { "type": "text", "text": "hidden", "visibility": "gone" }
            ]
        }));
        assert!(code.contains("shown"));
        assert!(!code.contains("hidden"));
    }

    #[test]
    fn test_button_variant_precedence() {
        // Structural hint: border implies outlined.
        let (code, _) = emit(json!({ "type": "button", "text": "Go", "borderWidth": 1 }));
        assert!(code.contains("OutlinedButton("));
        // Explicit style beats the hint.
        let (code, _) = emit(json!({
            "type": "button", "text": "Go", "borderWidth": 1, "buttonStyle": "elevated"
        }));
        assert!(code.contains("ElevatedButton("));
        // Default.
        let (code, _) = emit(json!({ "type": "button", "text": "Go" }));
        assert!(code.contains("Button("));
    }

    #[test]
    fn test_button_click_is_native_not_modifier() {
        let (code, _) = emit(json!({
            "type": "button", "text": "Go", "onClick": "@{onSubmit}"
        }));
        assert!(code.contains("onClick = { onSubmit() }"));
        assert!(!code.contains(".clickable"));
    }

    #[test]
    fn test_text_emits_sp_and_weight() {
        let (code, ctx) = emit(json!({
            "type": "text", "text": "hi", "fontSize": 14, "fontWeight": "bold"
        }));
        assert!(code.contains("fontSize = 14.sp"));
        assert!(code.contains("fontWeight = FontWeight.Bold"));
        assert!(ctx.imports().contains("androidx.compose.ui.unit.sp"));
    }

    #[test]
    fn test_text_binding_translates() {
        let (code, _) = emit(json!({ "type": "text", "text": "@{user.name}" }));
        assert!(code.contains("text = user.name"));
        let (code, _) = emit(json!({ "type": "text", "text": "Hi @{name}" }));
        assert!(code.contains("text = \"Hi ${name}\""));
    }

    #[test]
    fn test_image_without_source_degrades() {
        let (code, _) = emit(json!({ "type": "image" }));
        assert!(code.contains("// Image node has no source"));
        assert!(code.contains("Spacer(modifier = Modifier)"));
    }

    #[test]
    fn test_list_emits_lazy_column_with_template() {
        let (code, ctx) = emit(json!({
            "type": "list",
            "items": "@{rows}",
            "itemTemplate": { "type": "text", "text": "@{item.title}" }
        }));
        assert!(code.contains("LazyColumn"));
        assert!(code.contains("items(rows) { item ->"));
        assert!(code.contains("text = item.title"));
        assert!(ctx
            .imports()
            .contains("androidx.compose.foundation.lazy.LazyColumn"));
    }

    #[test]
    fn test_list_without_template_degrades() {
        let (code, _) = emit(json!({ "type": "list", "items": "@{rows}" }));
        assert!(code.contains("// List node has no item template"));
    }

    #[test]
    fn test_grid_lcm_columns_and_spans() {
        let (code, _) = emit(json!({
            "type": "grid",
            "sections": [
                { "columns": 2, "items": "@{a}", "cell": { "type": "text", "text": "@{item}" } },
                { "columns": 3, "items": "@{b}", "cell": { "type": "text", "text": "@{item}" } }
            ]
        }));
        assert!(code.contains("columns = GridCells.Fixed(6)"));
        assert!(code.contains("items(a, span = { GridItemSpan(3) })"));
        assert!(code.contains("items(b, span = { GridItemSpan(2) })"));
    }

    #[test]
    fn test_grid_section_without_cell_degrades() {
        let (code, _) = emit(json!({
            "type": "grid",
            "sections": [{ "columns": 2, "items": "@{a}" }]
        }));
        assert!(code.contains("// Grid section has no cell template"));
        assert!(code.contains("LazyVerticalGrid"));
    }

    #[test]
    fn test_unknown_widget_falls_back_to_container() {
        let (code, ctx) = emit(json!({
            "type": "hologram",
            "children": [{ "type": "text", "text": "inside" }]
        }));
        assert!(code.contains("// Unknown widget type 'hologram'"));
        assert!(code.contains("Box {"));
        assert!(code.contains("inside"));
        assert!(ctx.warnings.iter().any(|w| w.contains("hologram")));
    }

    #[test]
    fn test_switch_alias_and_null_handler() {
        let (code, _) = emit(json!({ "type": "toggle", "checked": true }));
        assert!(code.contains("Switch("));
        assert!(code.contains("onCheckedChange = null"));
    }

    #[test]
    fn test_text_field_variant_and_handler() {
        let (code, _) = emit(json!({
            "type": "input",
            "value": "@{query}",
            "onChange": "@{onQueryChange}",
            "fieldStyle": "outlined"
        }));
        assert!(code.contains("OutlinedTextField"));
        assert!(code.contains("value = query"));
        assert!(code.contains("onValueChange = { onQueryChange(it) }"));
    }

    #[test]
    fn test_icon_name_pascal_cased() {
        let (code, _) = emit(json!({ "type": "icon", "name": "arrow_back" }));
        assert!(code.contains("imageVector = Icons.Default.ArrowBack"));
    }

    #[test]
    fn test_box_content_alignment() {
        let (code, _) = emit(json!({
            "type": "box",
            "contentAlignment": "center",
            "children": [{ "type": "text", "text": "x" }]
        }));
        assert!(code.contains("contentAlignment = Alignment.Center"));
    }
}
