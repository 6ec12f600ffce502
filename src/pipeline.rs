//! Graph data pipeline: filtering, capping, and incremental rendering.
//!
//! A `GraphDataPipeline` owns the full node/link dataset for one view, the
//! currently visible subset, and the running layout simulation. Filter
//! changes recompute the subset without discarding the full dataset, and the
//! re-render preserves node identity: nodes that stay visible keep their
//! simulated positions, so the graph shifts instead of jumping.

use crate::models::{
    FilterOptions, GraphDataset, GraphFilter, GraphLink, GraphNode, GraphStats, StructurePayload,
};
use crate::render::GraphRenderer;
use crate::simulation::{ForceSimulation, SimulationParameters};
use std::collections::HashSet;

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

/// Node ceiling used by the compact dashboard variant of the graph.
pub const MINI_NODE_CAP: usize = 50;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// Structurally valid payload with no node collection.
    MissingNodes,
    /// Structurally valid payload with no link collection.
    MissingLinks,
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::MissingNodes => write!(f, "Malformed dataset: missing nodes"),
            DatasetError::MissingLinks => write!(f, "Malformed dataset: missing links"),
        }
    }
}

impl std::error::Error for DatasetError {}

// ============================================================================
// Pipeline
// ============================================================================

pub struct GraphDataPipeline<R: GraphRenderer> {
    renderer: R,
    sim: ForceSimulation,
    // 0 disables the ceiling; the mini variant passes MINI_NODE_CAP.
    max_nodes: usize,
    dataset: GraphDataset,
    options: FilterOptions,
    filter: GraphFilter,
    rendered_nodes: Vec<GraphNode>,
    rendered_links: Vec<GraphLink>,
    capped_nodes: usize,
}

impl<R: GraphRenderer> GraphDataPipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_node_cap(renderer, 0)
    }

    /// Compact variant: caps the rendered node count at `MINI_NODE_CAP`,
    /// retaining standards first, then lessons.
    pub fn mini(renderer: R) -> Self {
        Self::with_node_cap(renderer, MINI_NODE_CAP)
    }

    pub fn with_node_cap(renderer: R, max_nodes: usize) -> Self {
        Self {
            renderer,
            sim: ForceSimulation::new(SimulationParameters::default()),
            max_nodes,
            dataset: GraphDataset::default(),
            options: FilterOptions::default(),
            filter: GraphFilter::default(),
            rendered_nodes: Vec::new(),
            rendered_links: Vec::new(),
            capped_nodes: 0,
        }
    }

    pub fn with_simulation(renderer: R, params: SimulationParameters, max_nodes: usize) -> Self {
        Self {
            sim: ForceSimulation::new(params),
            ..Self::with_node_cap(renderer, max_nodes)
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Replace the full dataset, reset the filter and its option lists, and
    /// render the unfiltered graph. A malformed payload fails fast and
    /// leaves the previous render untouched.
    pub fn load_dataset(&mut self, payload: StructurePayload) -> Result<(), DatasetError> {
        let nodes = payload.nodes.ok_or(DatasetError::MissingNodes)?;
        let links = payload.links.ok_or(DatasetError::MissingLinks)?;

        tracing::debug!(
            nodes = nodes.len(),
            links = links.len(),
            "loading structure dataset"
        );

        self.options = FilterOptions::from_nodes(&nodes);
        self.dataset = GraphDataset { nodes, links };
        self.filter = GraphFilter::default();
        self.render_current();
        Ok(())
    }

    /// Narrow the visible subset. Nodes are filtered first, then links are
    /// re-derived so both endpoints are always present.
    pub fn apply_filter(&mut self, filter: GraphFilter) {
        tracing::debug!(filter = %filter.describe(), "applying filter");
        self.filter = filter;
        self.render_current();
    }

    /// Return to the full dataset.
    pub fn reset_filter(&mut self) {
        self.apply_filter(GraphFilter::default());
    }

    /// Advance the layout one step and push new positions to the renderer.
    /// Returns false once the layout has settled.
    pub fn tick(&mut self) -> bool {
        let active = self.sim.step();
        if active {
            self.sim.write_positions(&mut self.rendered_nodes);
            self.renderer.update_positions(&self.rendered_nodes);
        }
        active
    }

    /// Pin a node at a fixed position (the drag escape hatch).
    pub fn pin_node(&mut self, id: &str, x: f64, y: f64) {
        self.sim.pin(id, x, y);
        self.sim.write_positions(&mut self.rendered_nodes);
    }

    pub fn unpin_node(&mut self, id: &str) {
        self.sim.unpin(id);
        self.sim.write_positions(&mut self.rendered_nodes);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn rendered_nodes(&self) -> &[GraphNode] {
        &self.rendered_nodes
    }

    pub fn rendered_links(&self) -> &[GraphLink] {
        &self.rendered_links
    }

    pub fn filter(&self) -> &GraphFilter {
        &self.filter
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn is_settled(&self) -> bool {
        self.sim.is_settled()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.dataset.nodes.len(),
            total_links: self.dataset.links.len(),
            rendered_nodes: self.rendered_nodes.len(),
            rendered_links: self.rendered_links.len(),
            capped_nodes: self.capped_nodes,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Recompute the visible subset and reconcile it against the previous
    /// render. The simulation reheats only when the structure changed.
    fn render_current(&mut self) {
        let mut nodes: Vec<GraphNode> = self
            .dataset
            .nodes
            .iter()
            .filter(|n| node_matches(n, &self.filter))
            .cloned()
            .collect();

        self.capped_nodes = 0;
        if self.max_nodes > 0 && nodes.len() > self.max_nodes {
            let before = nodes.len();
            nodes = cap_nodes(nodes, self.max_nodes);
            self.capped_nodes = before - nodes.len();
            tracing::debug!(
                kept = nodes.len(),
                dropped = self.capped_nodes,
                "node ceiling applied"
            );
        }

        // Links survive only when both endpoints do.
        let visible: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let links: Vec<GraphLink> = self
            .dataset
            .links
            .iter()
            .filter(|l| visible.contains(l.source.as_str()) && visible.contains(l.target.as_str()))
            .cloned()
            .collect();

        let changed = structure_changed(&self.rendered_nodes, &self.rendered_links, &nodes, &links);
        if changed {
            self.sim.sync(&nodes, &links);
            self.sim.reheat();
        }

        self.rendered_nodes = nodes;
        self.rendered_links = links;
        self.sim.write_positions(&mut self.rendered_nodes);

        tracing::debug!(
            nodes = self.rendered_nodes.len(),
            links = self.rendered_links.len(),
            reheated = changed,
            "rendering graph"
        );
        self.renderer
            .render(&self.rendered_nodes, &self.rendered_links);
    }
}

/// Node predicate for a filter. The standard-code rule keeps the matching
/// standard itself OR anything belonging to it; a grade rule then applies to
/// every remaining node, including standards.
fn node_matches(node: &GraphNode, filter: &GraphFilter) -> bool {
    if let Some(ref sc) = filter.standard_code {
        let is_standard =
            node.node_type == "standard" && node.data.code.as_deref() == Some(sc.as_str());
        let belongs = node.data.standard_code.as_deref() == Some(sc.as_str());
        if !is_standard && !belongs {
            return false;
        }
    }
    if let Some(ref grade) = filter.grade {
        if node.data.grade.as_deref() != Some(grade.as_str()) {
            return false;
        }
    }
    true
}

/// Priority-retention truncation: keep standards first, fill the remaining
/// capacity with lessons, drop everything else. Input order is preserved, so
/// the result is deterministic for a given dataset.
fn cap_nodes(nodes: Vec<GraphNode>, max_nodes: usize) -> Vec<GraphNode> {
    let mut kept: Vec<GraphNode> = Vec::with_capacity(max_nodes);

    for node in nodes.iter().filter(|n| n.node_type == "standard") {
        if kept.len() == max_nodes {
            return kept;
        }
        kept.push(node.clone());
    }
    for node in nodes.iter().filter(|n| n.node_type == "lesson") {
        if kept.len() == max_nodes {
            return kept;
        }
        kept.push(node.clone());
    }
    kept
}

fn structure_changed(
    prev_nodes: &[GraphNode],
    prev_links: &[GraphLink],
    nodes: &[GraphNode],
    links: &[GraphLink],
) -> bool {
    if prev_nodes.len() != nodes.len() || prev_links.len() != links.len() {
        return true;
    }
    let prev_ids: HashSet<&str> = prev_nodes.iter().map(|n| n.id.as_str()).collect();
    if nodes.iter().any(|n| !prev_ids.contains(n.id.as_str())) {
        return true;
    }
    let prev_pairs: HashSet<(&str, &str)> = prev_links
        .iter()
        .map(|l| (l.source.as_str(), l.target.as_str()))
        .collect();
    links
        .iter()
        .any(|l| !prev_pairs.contains(&(l.source.as_str(), l.target.as_str())))
}
