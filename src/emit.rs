//! Emission Engine
//!
//! The recursive core: one JSON node in, one code fragment out, children
//! composed depth-first. Fragments are structured (indented line lists), not
//! ad hoc string concatenation; a single final render pass produces text, so
//! the indentation and ordering invariants live in one place.
//!
//! The engine never aborts over one bad node. Structurally malformed nodes
//! degrade to inert placeholder fragments so the whole document stays
//! syntactically valid for manual review.

use std::collections::BTreeSet;

use crate::compile::CompileOptions;
use crate::constraint;
use crate::document::ComponentNode;
use crate::validate::canonical_widget_type;
use crate::widgets::ConverterRegistry;

/// Spaces per indent level in emitted Kotlin.
pub const INDENT_WIDTH: usize = 4;

// ═══════════════════════════════════════════════════════════════════════════════
// FRAGMENT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    indent: usize,
    text: String,
}

/// Structured emitted code: ordered lines, each with its own indent level.
/// Rendered to text once, at the end of the compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    lines: Vec<Line>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one line. Text containing embedded newlines is split and the
    /// continuation lines indented one extra level, which keeps multi-call
    /// modifier chains readable without converters doing their own layout.
    pub fn line(&mut self, indent: usize, text: impl Into<String>) {
        let text = text.into();
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.push_raw(indent, first);
        }
        for continuation in parts {
            self.push_raw(indent + 1, continuation);
        }
    }

    fn push_raw(&mut self, indent: usize, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.lines.push(Line {
            indent,
            text: text.to_string(),
        });
    }

    /// Splice a fully emitted child fragment into this one, as-is.
    pub fn append(&mut self, child: Fragment) {
        self.lines.extend(child.lines);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The final serialization pass.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            for _ in 0..line.indent * INDENT_WIDTH {
                out.push(' ');
            }
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMIT CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-compile mutable state: the warnings list and the required-imports set.
/// The import set is ordered so the emitted header is deterministic no matter
/// which converter ran first.
#[derive(Debug)]
pub struct EmitContext {
    pub options: CompileOptions,
    pub warnings: Vec<String>,
    imports: BTreeSet<String>,
}

impl EmitContext {
    pub fn new(options: CompileOptions) -> Self {
        EmitContext {
            options,
            warnings: Vec::new(),
            imports: BTreeSet::new(),
        }
    }

    pub fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    /// Record a capability the emitted file's header must declare.
    pub fn require_import(&mut self, path: &str) {
        self.imports.insert(path.to_string());
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTAINER SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Column,
    Row,
    Constraint,
    Overlay,
}

/// Container primitive for a layout node: explicit orientation wins; with no
/// orientation, anchored children force a constraint container; otherwise
/// children overlay in a Box.
pub fn select_container(node: &ComponentNode) -> ContainerKind {
    match node.attr_str("orientation") {
        Some("vertical") => ContainerKind::Column,
        Some("horizontal") => ContainerKind::Row,
        _ => {
            if constraint::any_child_positioned(&node.children) {
                ContainerKind::Constraint
            } else {
                ContainerKind::Overlay
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Dispatches nodes to converters and composes children.
pub struct Emitter<'a> {
    registry: &'a ConverterRegistry,
}

impl<'a> Emitter<'a> {
    pub fn new(registry: &'a ConverterRegistry) -> Self {
        Emitter { registry }
    }

    /// Emit one node. A node whose visibility resolves to `gone` legitimately
    /// emits nothing; the parent skips the blank fragment.
    pub fn emit_node(
        &self,
        node: &ComponentNode,
        indent: usize,
        ctx: &mut EmitContext,
    ) -> Fragment {
        if node.attr_str("visibility") == Some("gone") {
            return Fragment::new();
        }
        let widget = canonical_widget_type(&node.widget_type);
        let converter = self.registry.get(&widget);
        converter.emit(node, indent, self, ctx)
    }

    /// Emit all children in document order (reversed when the node sets
    /// `direction: "reverse"`), dropping fragments that emitted nothing.
    pub fn emit_children(
        &self,
        node: &ComponentNode,
        indent: usize,
        ctx: &mut EmitContext,
    ) -> Vec<Fragment> {
        let mut children: Vec<&ComponentNode> = node.children.iter().collect();
        if node.attr_str("direction") == Some("reverse") {
            children.reverse();
        }
        children
            .into_iter()
            .map(|c| self.emit_node(c, indent, ctx))
            .filter(|f| !f.is_empty())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL RENDERING HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Render the modifier parameter from a built chain. A single call stays on
/// one line; longer chains break one call per line.
pub fn modifier_param(chain: &[String]) -> Option<String> {
    match chain.len() {
        0 => None,
        1 => Some(format!("modifier = Modifier{}", chain[0])),
        _ => Some(format!("modifier = Modifier\n{}", chain.join("\n"))),
    }
}

/// `Name(param)` / multi-line call, no child block.
pub fn leaf_call(name: &str, params: Vec<String>, indent: usize) -> Fragment {
    let mut frag = Fragment::new();
    match params.len() {
        0 => frag.line(indent, format!("{}()", name)),
        1 if !params[0].contains('\n') => {
            frag.line(indent, format!("{}({})", name, params[0]));
        }
        _ => {
            frag.line(indent, format!("{}(", name));
            for p in params {
                frag.line(indent + 1, format!("{},", p));
            }
            frag.line(indent, ")");
        }
    }
    frag
}

/// `Name(params) { children }` with the trailing child block the target
/// framework uses for containers.
pub fn block_call(
    name: &str,
    params: Vec<String>,
    children: Vec<Fragment>,
    indent: usize,
) -> Fragment {
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
    for child in children {
        frag.append(child);
    }
    frag.line(indent, "}");
    frag
}

/// Inert placeholder for a structurally malformed node; keeps the document
/// compiling and marks the spot for manual review.
pub fn placeholder(reason: &str, indent: usize, ctx: &mut EmitContext) -> Fragment {
    ctx.require_import("androidx.compose.foundation.layout.Spacer");
    ctx.require_import("androidx.compose.ui.Modifier");
    let mut frag = Fragment::new();
    frag.line(indent, format!("// {}", reason));
    frag.line(indent, "Spacer(modifier = Modifier)");
    frag
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
