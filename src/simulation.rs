//! Force-directed layout simulation.
//!
//! An iterative, stepped physics process that assigns 2D coordinates so
//! linked nodes cluster and unlinked ones repel. Each `step()` is meant to
//! be driven from a per-frame callback; energy (`alpha`) decays toward zero
//! until the layout settles, and `reheat()` restores it so repositioning
//! after a data change animates instead of teleporting.
//!
//! Node identity is the contract: `sync()` keys its reconciliation on node
//! ids, so nodes that survive a data change keep their positions and
//! velocities while new nodes seed deterministically on a circle around the
//! center.

use crate::models::{GraphLink, GraphNode};
use std::collections::HashMap;
use std::f64::consts::PI;

pub const DEFAULT_WIDTH: f64 = 960.0;
pub const DEFAULT_HEIGHT: f64 = 600.0;
const SEED_RADIUS: f64 = 100.0;
const MIN_DISTANCE: f64 = 1e-6;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimulationParameters {
    pub link_distance: f64,
    pub link_strength: f64,
    pub charge_strength: f64, // negative repels
    pub collision_radius: f64,
    pub width: f64,
    pub height: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub velocity_decay: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            link_strength: 0.1,
            charge_strength: -300.0,
            collision_radius: 30.0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            velocity_decay: 0.4,
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

pub struct ForceSimulation {
    params: SimulationParameters,
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>, // resolved node indices
    index: HashMap<String, usize>,
    alpha: f64,
}

impl ForceSimulation {
    pub fn new(params: SimulationParameters) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            links: Vec::new(),
            index: HashMap::new(),
            alpha: 1.0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.params.alpha_min
    }

    /// Restore full energy so the next steps animate repositioning.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    /// Replace the simulated set, carrying over position and velocity for
    /// every node id that survives. Links resolve to node indices; a link
    /// whose endpoint is absent is skipped.
    pub fn sync(&mut self, nodes: &[GraphNode], links: &[GraphLink]) {
        let count = nodes.len().max(1);
        let cx = self.params.width / 2.0;
        let cy = self.params.height / 2.0;

        let mut previous: HashMap<String, SimNode> = HashMap::new();
        for node in self.nodes.drain(..) {
            previous.insert(node.id.clone(), node);
        }

        let mut next = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let sim_node = previous.remove(&node.id).unwrap_or_else(|| {
                let angle = (i as f64) * 2.0 * PI / count as f64;
                SimNode {
                    id: node.id.clone(),
                    x: cx + SEED_RADIUS * angle.cos(),
                    y: cy + SEED_RADIUS * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            });
            index.insert(node.id.clone(), i);
            next.push(sim_node);
        }

        let mut resolved = Vec::with_capacity(links.len());
        for link in links {
            if let (Some(&s), Some(&t)) = (index.get(&link.source), index.get(&link.target)) {
                resolved.push((s, t));
            }
        }

        self.nodes = next;
        self.links = resolved;
        self.index = index;
    }

    /// Advance the layout one step. Returns false once the simulation has
    /// settled below `alpha_min` and stops moving nodes.
    pub fn step(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.alpha += (0.0 - self.alpha) * self.params.alpha_decay;

        self.apply_link_force();
        self.apply_charge_force();
        self.apply_collision();
        self.integrate();
        self.apply_centering();

        true
    }

    /// Pin a node at a position; the layout holds it there until unpinned.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) {
        if let Some(&i) = self.index.get(id) {
            self.nodes[i].fx = Some(x);
            self.nodes[i].fy = Some(y);
        }
    }

    pub fn unpin(&mut self, id: &str) {
        if let Some(&i) = self.index.get(id) {
            self.nodes[i].fx = None;
            self.nodes[i].fy = None;
        }
    }

    /// Copy simulated positions back onto graph nodes, matched by id.
    pub fn write_positions(&self, nodes: &mut [GraphNode]) {
        for node in nodes.iter_mut() {
            if let Some(&i) = self.index.get(&node.id) {
                let sim = &self.nodes[i];
                node.x = sim.x;
                node.y = sim.y;
                node.fx = sim.fx;
                node.fy = sim.fy;
            }
        }
    }

    // ------------------------------------------------------------------
    // Forces
    // ------------------------------------------------------------------

    fn apply_link_force(&mut self) {
        let strength = self.params.link_strength * self.alpha;
        for &(s, t) in &self.links {
            let (dx, dy, dist) = self.separation(s, t);
            let delta = (dist - self.params.link_distance) / dist * strength;
            let (fx, fy) = (dx * delta, dy * delta);
            // Each endpoint takes half the correction.
            self.nodes[t].vx -= fx / 2.0;
            self.nodes[t].vy -= fy / 2.0;
            self.nodes[s].vx += fx / 2.0;
            self.nodes[s].vy += fy / 2.0;
        }
    }

    fn apply_charge_force(&mut self) {
        // Pairwise many-body pass, O(n²).
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let (dx, dy, dist) = self.separation(i, j);
                let force = self.params.charge_strength * self.alpha / (dist * dist);
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                self.nodes[i].vx += fx;
                self.nodes[i].vy += fy;
                self.nodes[j].vx -= fx;
                self.nodes[j].vy -= fy;
            }
        }
    }

    fn apply_collision(&mut self) {
        // Positional correction keeping node centers a minimum distance apart.
        let min_sep = self.params.collision_radius;
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let (dx, dy, dist) = self.separation(i, j);
                if dist < min_sep {
                    let push = (min_sep - dist) / dist / 2.0;
                    let (px, py) = (dx * push, dy * push);
                    if self.nodes[i].fx.is_none() {
                        self.nodes[i].x -= px;
                        self.nodes[i].y -= py;
                    }
                    if self.nodes[j].fx.is_none() {
                        self.nodes[j].x += px;
                        self.nodes[j].y += py;
                    }
                }
            }
        }
    }

    fn integrate(&mut self) {
        let damping = 1.0 - self.params.velocity_decay;
        for node in &mut self.nodes {
            match (node.fx, node.fy) {
                (Some(fx), Some(fy)) => {
                    node.x = fx;
                    node.y = fy;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                _ => {
                    node.vx *= damping;
                    node.vy *= damping;
                    node.x += node.vx;
                    node.y += node.vy;
                }
            }
        }
    }

    fn apply_centering(&mut self) {
        let free: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].fx.is_none())
            .collect();
        if free.is_empty() {
            return;
        }
        let n = free.len() as f64;
        let sx: f64 = free.iter().map(|&i| self.nodes[i].x).sum();
        let sy: f64 = free.iter().map(|&i| self.nodes[i].y).sum();
        let (shift_x, shift_y) = (
            sx / n - self.params.width / 2.0,
            sy / n - self.params.height / 2.0,
        );
        for &i in &free {
            self.nodes[i].x -= shift_x;
            self.nodes[i].y -= shift_y;
        }
    }

    /// Separation vector between two nodes with a deterministic nudge when
    /// they coincide, so forces never divide by zero.
    fn separation(&self, a: usize, b: usize) -> (f64, f64, f64) {
        let mut dx = self.nodes[b].x - self.nodes[a].x;
        let mut dy = self.nodes[b].y - self.nodes[a].y;
        let mut dist = (dx * dx + dy * dy).sqrt();
        if dist < MIN_DISTANCE {
            dx = (b as f64 - a as f64) * MIN_DISTANCE;
            dy = MIN_DISTANCE;
            dist = (dx * dx + dy * dy).sqrt();
        }
        (dx, dy, dist)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeData;

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            node_type: "lesson".to_string(),
            label: id.to_string(),
            data: NodeData::default(),
            x: 0.0,
            y: 0.0,
            fx: None,
            fy: None,
        }
    }

    fn link(source: &str, target: &str) -> GraphLink {
        GraphLink {
            source: source.to_string(),
            target: target.to_string(),
            value: Some(1.0),
            link_type: None,
        }
    }

    #[test]
    fn sync_seeds_deterministic_positions() {
        let nodes = vec![node("a"), node("b"), node("c")];

        let mut sim1 = ForceSimulation::new(SimulationParameters::default());
        sim1.sync(&nodes, &[]);
        let mut sim2 = ForceSimulation::new(SimulationParameters::default());
        sim2.sync(&nodes, &[]);

        for (n1, n2) in sim1.nodes().iter().zip(sim2.nodes()) {
            assert_eq!((n1.x, n1.y), (n2.x, n2.y));
        }
    }

    #[test]
    fn sync_preserves_surviving_positions() {
        let mut sim = ForceSimulation::new(SimulationParameters::default());
        sim.sync(&[node("a"), node("b"), node("c")], &[]);
        for _ in 0..10 {
            sim.step();
        }
        let before: Vec<(String, f64, f64)> = sim
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), n.x, n.y))
            .collect();

        // Drop "c", keep "a" and "b": their positions must carry over exactly.
        sim.sync(&[node("a"), node("b")], &[link("a", "b")]);
        for survivor in sim.nodes() {
            let old = before.iter().find(|(id, _, _)| id == &survivor.id).unwrap();
            assert_eq!((survivor.x, survivor.y), (old.1, old.2));
        }
    }

    #[test]
    fn linked_nodes_pull_toward_link_distance() {
        let params = SimulationParameters {
            charge_strength: 0.0,
            collision_radius: 0.0,
            ..SimulationParameters::default()
        };
        let mut sim = ForceSimulation::new(params.clone());
        sim.sync(&[node("a"), node("b")], &[link("a", "b")]);

        let gap = |sim: &ForceSimulation| {
            let n = sim.nodes();
            let (dx, dy) = (n[1].x - n[0].x, n[1].y - n[0].y);
            (dx * dx + dy * dy).sqrt()
        };

        // Seeded on a circle of radius 100 the pair starts 200 apart; the
        // spring should close most of the excess over the link distance.
        let start = gap(&sim);
        for _ in 0..300 {
            sim.step();
        }
        let end = gap(&sim);
        assert!(end < start);
        assert!((end - params.link_distance).abs() < (start - params.link_distance).abs());
    }

    #[test]
    fn unlinked_nodes_repel() {
        let mut sim = ForceSimulation::new(SimulationParameters {
            collision_radius: 0.0,
            ..SimulationParameters::default()
        });
        sim.sync(&[node("a"), node("b")], &[]);

        let n = sim.nodes();
        let start = ((n[1].x - n[0].x).powi(2) + (n[1].y - n[0].y).powi(2)).sqrt();
        for _ in 0..50 {
            sim.step();
        }
        let n = sim.nodes();
        let end = ((n[1].x - n[0].x).powi(2) + (n[1].y - n[0].y).powi(2)).sqrt();
        assert!(end > start);
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut sim = ForceSimulation::new(SimulationParameters::default());
        sim.sync(&[node("a"), node("b"), node("c")], &[link("a", "b")]);
        sim.pin("a", 42.0, 24.0);

        for _ in 0..100 {
            sim.step();
        }

        let pinned = sim.nodes().iter().find(|n| n.id == "a").unwrap();
        assert_eq!((pinned.x, pinned.y), (42.0, 24.0));

        sim.unpin("a");
        sim.reheat();
        sim.step();
        let freed = sim.nodes().iter().find(|n| n.id == "a").unwrap();
        assert!(freed.fx.is_none());
        assert_ne!((freed.x, freed.y), (42.0, 24.0));
    }

    #[test]
    fn alpha_decays_until_settled_and_reheats() {
        let mut sim = ForceSimulation::new(SimulationParameters::default());
        sim.sync(&[node("a"), node("b")], &[]);

        let mut steps = 0;
        while sim.step() {
            steps += 1;
            assert!(steps < 1000, "simulation never settled");
        }
        assert!(sim.is_settled());
        assert!(!sim.step());

        sim.reheat();
        assert!(!sim.is_settled());
        assert!(sim.step());
    }

    #[test]
    fn dangling_links_are_skipped() {
        let mut sim = ForceSimulation::new(SimulationParameters::default());
        sim.sync(&[node("a")], &[link("a", "ghost")]);
        assert_eq!(sim.links.len(), 0);
        sim.step();
    }
}
