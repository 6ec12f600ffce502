//! Graph rendering backends.
//!
//! The pipeline talks to a `GraphRenderer` capability rather than a concrete
//! drawing surface: `render` receives the reconciled node/link sets whenever
//! the visible structure changes, `update_positions` receives per-tick
//! motion. `SvgRenderer` is the built-in backend, producing a static SVG
//! snapshot; an interactive canvas or DOM backend slots in the same way.

use crate::models::{GraphLink, GraphNode};
use std::collections::HashMap;

// ============================================================================
// Renderer Capability
// ============================================================================

pub trait GraphRenderer {
    /// Structural update: the visible node or link set changed.
    fn render(&mut self, nodes: &[GraphNode], links: &[GraphLink]);

    /// Motion update: same structure, new positions.
    fn update_positions(&mut self, nodes: &[GraphNode]);
}

/// Backend that draws nothing. Useful when only the pipeline's filtering and
/// layout results are wanted.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl GraphRenderer for NullRenderer {
    fn render(&mut self, _nodes: &[GraphNode], _links: &[GraphLink]) {}
    fn update_positions(&mut self, _nodes: &[GraphNode]) {}
}

// ============================================================================
// SVG Snapshot Renderer
// ============================================================================

/// Fill color per node type.
fn node_color(node_type: &str) -> &'static str {
    match node_type {
        "standard" => "#4285F4",
        "lesson" => "#34A853",
        "question" => "#FBBC05",
        "article" => "#EA4335",
        _ => "#999",
    }
}

fn node_radius(node_type: &str) -> f64 {
    if node_type == "standard" {
        10.0
    } else {
        7.0
    }
}

fn link_color(link_type: Option<&str>) -> &'static str {
    if link_type == Some("standard-lesson") {
        "#666"
    } else {
        "#999"
    }
}

/// Escape text for inclusion in SVG/XML content.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the current graph state into an SVG document string.
pub struct SvgRenderer {
    width: f64,
    height: f64,
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
}

impl SvgRenderer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Emit the snapshot. Links whose endpoints are missing from the node set
    /// are skipped rather than drawn dangling.
    pub fn to_svg(&self) -> String {
        let positions: HashMap<&str, (f64, f64)> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), (n.x, n.y)))
            .collect();

        let mut out = String::new();
        out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        ));
        out.push('\n');

        out.push_str("  <g class=\"links\" stroke-opacity=\"0.6\">\n");
        for link in &self.links {
            let (Some(&(x1, y1)), Some(&(x2, y2))) = (
                positions.get(link.source.as_str()),
                positions.get(link.target.as_str()),
            ) else {
                continue;
            };
            let width = link.value.unwrap_or(1.0).max(0.0).sqrt() * 2.0;
            out.push_str(&format!(
                r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}"/>"#,
                x1,
                y1,
                x2,
                y2,
                link_color(link.link_type.as_deref()),
                width
            ));
            out.push('\n');
        }
        out.push_str("  </g>\n");

        out.push_str("  <g class=\"nodes\">\n");
        for node in &self.nodes {
            out.push_str(&format!(
                r##"    <circle cx="{:.1}" cy="{:.1}" r="{}" fill="{}" stroke="#fff" stroke-width="1.5"/>"##,
                node.x,
                node.y,
                node_radius(&node.node_type),
                node_color(&node.node_type)
            ));
            out.push('\n');
            out.push_str(&format!(
                r##"    <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="#333">{}</text>"##,
                node.x,
                node.y - 15.0,
                xml_escape(&node.display_label())
            ));
            out.push('\n');
        }
        out.push_str("  </g>\n</svg>\n");
        out
    }
}

impl GraphRenderer for SvgRenderer {
    fn render(&mut self, nodes: &[GraphNode], links: &[GraphLink]) {
        self.nodes = nodes.to_vec();
        self.links = links.to_vec();
    }

    fn update_positions(&mut self, nodes: &[GraphNode]) {
        self.nodes = nodes.to_vec();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeData;

    fn node(id: &str, node_type: &str, x: f64, y: f64) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type: node_type.to_string(),
            label: id.to_string(),
            data: NodeData {
                title: Some(format!("{} title", id)),
                ..NodeData::default()
            },
            x,
            y,
            fx: None,
            fy: None,
        }
    }

    #[test]
    fn svg_contains_nodes_and_links() {
        let mut renderer = SvgRenderer::new(960.0, 600.0);
        renderer.render(
            &[
                node("s1", "standard", 100.0, 100.0),
                node("l1", "lesson", 200.0, 200.0),
            ],
            &[GraphLink {
                source: "s1".to_string(),
                target: "l1".to_string(),
                value: Some(4.0),
                link_type: Some("standard-lesson".to_string()),
            }],
        );

        let svg = renderer.to_svg();
        assert!(svg.contains(r##"fill="#4285F4""##)); // standard color
        assert!(svg.contains(r##"fill="#34A853""##)); // lesson color
        assert!(svg.contains(r#"r="10""#));
        assert!(svg.contains(r##"stroke="#666""##));
        assert!(svg.contains(r#"stroke-width="4.0""#)); // sqrt(4) * 2
    }

    #[test]
    fn dangling_links_are_not_drawn() {
        let mut renderer = SvgRenderer::new(960.0, 600.0);
        renderer.render(
            &[node("a", "lesson", 10.0, 10.0)],
            &[GraphLink {
                source: "a".to_string(),
                target: "missing".to_string(),
                value: None,
                link_type: None,
            }],
        );
        assert!(!renderer.to_svg().contains("<line"));
    }

    #[test]
    fn labels_are_escaped() {
        let mut renderer = SvgRenderer::new(960.0, 600.0);
        let mut n = node("q1", "question", 10.0, 10.0);
        n.data.title = Some("Which is <smaller> & why?".to_string());
        renderer.render(&[n], &[]);
        let svg = renderer.to_svg();
        assert!(svg.contains("&lt;smaller&gt; &amp; why?"));
        assert!(!svg.contains("<smaller>"));
    }
}
