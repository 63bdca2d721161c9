//! Constraint Reference Graph
//!
//! Anchored positioning: a child's placement is expressed relative to named
//! siblings or the parent's edges/center instead of stacking order. This
//! module assigns every child of a constraint container a stable reference id
//! (`id` attribute, else `view_{index}` in zero-based document order among its
//! siblings), renders each child's link lines, and validates that referenced
//! siblings exist.
//!
//! Margin policy: a node that carries positioning constraints keeps its
//! margins as true offsets on the anchor links; a node with no constraints
//! has its margins folded into padding instead (the modifier builder does the
//! folding).

use serde_json::Value;

use crate::document::ComponentNode;
use crate::modifier::{fmt_dp, parse_insets, Insets};

// ═══════════════════════════════════════════════════════════════════════════════
// ANCHOR TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorTarget {
    Parent,
    Sibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Bottom,
    Start,
    End,
    CenterBoth,
    CenterHorizontal,
    CenterVertical,
}

/// Declaration order here is emission order. When conflicting anchors are
/// both set (e.g. `alignParentTop` and `alignParentBottom`) both links are
/// kept, in this order; the constraint system then centers or stretches the
/// child between them.
struct AnchorSpec {
    attr: &'static str,
    target: AnchorTarget,
    own_edge: Edge,
    /// Edge of the target the link attaches to.
    other_edge: Edge,
}

const ANCHOR_TABLE: &[AnchorSpec] = &[
    AnchorSpec { attr: "alignParentTop", target: AnchorTarget::Parent, own_edge: Edge::Top, other_edge: Edge::Top },
    AnchorSpec { attr: "alignParentBottom", target: AnchorTarget::Parent, own_edge: Edge::Bottom, other_edge: Edge::Bottom },
    AnchorSpec { attr: "alignParentStart", target: AnchorTarget::Parent, own_edge: Edge::Start, other_edge: Edge::Start },
    AnchorSpec { attr: "alignParentEnd", target: AnchorTarget::Parent, own_edge: Edge::End, other_edge: Edge::End },
    AnchorSpec { attr: "centerInParent", target: AnchorTarget::Parent, own_edge: Edge::CenterBoth, other_edge: Edge::CenterBoth },
    AnchorSpec { attr: "centerHorizontal", target: AnchorTarget::Parent, own_edge: Edge::CenterHorizontal, other_edge: Edge::CenterHorizontal },
    AnchorSpec { attr: "centerVertical", target: AnchorTarget::Parent, own_edge: Edge::CenterVertical, other_edge: Edge::CenterVertical },
    AnchorSpec { attr: "belowView", target: AnchorTarget::Sibling, own_edge: Edge::Top, other_edge: Edge::Bottom },
    AnchorSpec { attr: "aboveView", target: AnchorTarget::Sibling, own_edge: Edge::Bottom, other_edge: Edge::Top },
    AnchorSpec { attr: "alignTopOfView", target: AnchorTarget::Sibling, own_edge: Edge::Top, other_edge: Edge::Top },
    AnchorSpec { attr: "alignBottomOfView", target: AnchorTarget::Sibling, own_edge: Edge::Bottom, other_edge: Edge::Bottom },
    AnchorSpec { attr: "alignStartOfView", target: AnchorTarget::Sibling, own_edge: Edge::Start, other_edge: Edge::Start },
    AnchorSpec { attr: "alignEndOfView", target: AnchorTarget::Sibling, own_edge: Edge::End, other_edge: Edge::End },
];

/// True when the node declares any relative-positioning attribute.
pub fn has_positioning(node: &ComponentNode) -> bool {
    ANCHOR_TABLE.iter().any(|spec| match spec.target {
        AnchorTarget::Parent => node.attr_bool(spec.attr) == Some(true),
        AnchorTarget::Sibling => node.attr_str(spec.attr).is_some(),
    })
}

/// True when at least one child uses anchored positioning; the parent then
/// becomes a constraint container instead of a stack.
pub fn any_child_positioned(children: &[ComponentNode]) -> bool {
    children.iter().any(has_positioning)
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCE GRAPH
// ═══════════════════════════════════════════════════════════════════════════════

/// One child's place in the constraint graph.
#[derive(Debug, Clone)]
pub struct ConstraintReference {
    pub ref_id: String,
    pub node_index: usize,
    /// Rendered link lines for the `constrainAs` body, in anchor-table order.
    pub links: Vec<String>,
}

/// Reference id for a child at `index` among its siblings.
pub fn reference_id(node: &ComponentNode, index: usize) -> String {
    node.id()
        .map(str::to_string)
        .unwrap_or_else(|| format!("view_{}", index))
}

fn edge_name(edge: Edge) -> &'static str {
    match edge {
        Edge::Top => "top",
        Edge::Bottom => "bottom",
        Edge::Start => "start",
        Edge::End => "end",
        Edge::CenterBoth | Edge::CenterHorizontal | Edge::CenterVertical => "",
    }
}

/// Offset applied to a link, taken from the margin edge that matches the
/// child's own linked edge.
fn link_margin(edge: Edge, margins: &Insets) -> f64 {
    match edge {
        Edge::Top => margins.top,
        Edge::Bottom => margins.bottom,
        Edge::Start => margins.left,
        Edge::End => margins.right,
        _ => 0.0,
    }
}

fn render_link(own: Edge, target: &str, other: Edge, margins: &Insets) -> String {
    match own {
        Edge::CenterBoth => format!("centerTo({})", target),
        Edge::CenterHorizontal => format!("centerHorizontallyTo({})", target),
        Edge::CenterVertical => format!("centerVerticallyTo({})", target),
        _ => {
            let offset = link_margin(own, margins);
            if offset != 0.0 {
                format!(
                    "{}.linkTo({}.{}, margin = {})",
                    edge_name(own),
                    target,
                    edge_name(other),
                    fmt_dp(offset)
                )
            } else {
                format!("{}.linkTo({}.{})", edge_name(own), target, edge_name(other))
            }
        }
    }
}

/// Build the reference graph for the children of one constraint container.
/// Every child gets a reference (so siblings can anchor to it); only
/// positioned children carry links. Returns the graph plus validation
/// warnings for references to ids no sibling owns.
pub fn build_graph(children: &[ComponentNode]) -> (Vec<ConstraintReference>, Vec<String>) {
    let known_ids: Vec<String> = children
        .iter()
        .enumerate()
        .map(|(i, c)| reference_id(c, i))
        .collect();

    let mut warnings = Vec::new();
    let mut refs = Vec::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let ref_id = known_ids[index].clone();
        let margins = if has_positioning(child) {
            child
                .attr("margin")
                .and_then(parse_insets)
                .unwrap_or_default()
        } else {
            Insets::default()
        };

        let mut links = Vec::new();
        for spec in ANCHOR_TABLE {
            match spec.target {
                AnchorTarget::Parent => {
                    if child.attr_bool(spec.attr) == Some(true) {
                        links.push(render_link(spec.own_edge, "parent", spec.other_edge, &margins));
                    }
                }
                AnchorTarget::Sibling => {
                    if let Some(Value::String(target)) = child.attr(spec.attr) {
                        if known_ids.iter().any(|id| id == target) {
                            links.push(render_link(spec.own_edge, target, spec.other_edge, &margins));
                        } else {
                            warnings.push(format!(
                                "Constraint attribute '{}' on '{}' references unknown sibling '{}'",
                                spec.attr, ref_id, target
                            ));
                        }
                    }
                }
            }
        }

        refs.push(ConstraintReference {
            ref_id,
            node_index: index,
            links,
        });
    }

    (refs, warnings)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nodes(v: serde_json::Value) -> Vec<ComponentNode> {
        let arr: Vec<ComponentNode> = serde_json::from_value(v).unwrap();
        arr.into_iter()
            .map(|mut n| {
                n.normalize();
                n
            })
            .collect()
    }

    #[test]
    fn test_auto_ids_follow_document_order() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "alignParentTop": true },
            { "type": "text", "text": "b", "id": "title" },
            { "type": "text", "text": "c", "centerInParent": true }
        ]));
        let (refs, warnings) = build_graph(&children);
        assert!(warnings.is_empty());
        assert_eq!(refs[0].ref_id, "view_0");
        assert_eq!(refs[1].ref_id, "title");
        assert_eq!(refs[2].ref_id, "view_2");
    }

    #[test]
    fn test_ids_stable_across_runs() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "alignParentTop": true },
            { "type": "text", "text": "b" }
        ]));
        let (first, _) = build_graph(&children);
        let (second, _) = build_graph(&children);
        let a: Vec<_> = first.iter().map(|r| r.ref_id.clone()).collect();
        let b: Vec<_> = second.iter().map(|r| r.ref_id.clone()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sibling_reference_resolves_to_auto_id() {
        let children = nodes(json!([
            { "type": "image", "source": "a.png", "alignParentTop": true },
            { "type": "text", "text": "b", "belowView": "view_0" }
        ]));
        let (refs, warnings) = build_graph(&children);
        assert!(warnings.is_empty());
        assert_eq!(refs[1].links, vec!["top.linkTo(view_0.bottom)".to_string()]);
    }

    #[test]
    fn test_unknown_sibling_reference_warns() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "belowView": "ghost" }
        ]));
        let (refs, warnings) = build_graph(&children);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown sibling 'ghost'"));
        assert!(refs[0].links.is_empty());
    }

    #[test]
    fn test_margin_becomes_link_offset_for_positioned_node() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "alignParentTop": true, "margin": [8, 0, 0, 16],
              "alignParentStart": true }
        ]));
        let (refs, _) = build_graph(&children);
        assert_eq!(
            refs[0].links,
            vec![
                "top.linkTo(parent.top, margin = 8.dp)".to_string(),
                "start.linkTo(parent.start, margin = 16.dp)".to_string(),
            ]
        );
    }

    #[test]
    fn conflicting_anchors_keep_both() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "alignParentTop": true, "alignParentBottom": true }
        ]));
        let (refs, warnings) = build_graph(&children);
        assert!(warnings.is_empty());
        assert_eq!(
            refs[0].links,
            vec![
                "top.linkTo(parent.top)".to_string(),
                "bottom.linkTo(parent.bottom)".to_string(),
            ]
        );
    }

    #[test]
    fn test_center_in_parent() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "centerInParent": true }
        ]));
        let (refs, _) = build_graph(&children);
        assert_eq!(refs[0].links, vec!["centerTo(parent)".to_string()]);
    }

    #[test]
    fn test_unpositioned_child_gets_reference_without_links() {
        let children = nodes(json!([
            { "type": "text", "text": "a", "centerInParent": true },
            { "type": "text", "text": "b", "margin": 8 }
        ]));
        let (refs, _) = build_graph(&children);
        assert_eq!(refs[1].ref_id, "view_1");
        assert!(refs[1].links.is_empty());
    }

    #[test]
    fn test_positioning_detection() {
        let children = nodes(json!([
            { "type": "text", "text": "a" },
            { "type": "text", "text": "b", "alignTopOfView": "x" }
        ]));
        assert!(!has_positioning(&children[0]));
        assert!(has_positioning(&children[1]));
        assert!(any_child_positioned(&children));
    }
}
