//! The interactive graph engine: layout, scene, view, picking. One engine
//! instance drives the main graph; the drill-down panels each own another.

pub mod input;
pub mod layout;
pub mod pick;
pub mod scene;
pub mod view;

mod draw;

use std::collections::HashSet;

use eframe::egui::Color32;
use glam::Vec3;
use tracing::debug;

use input::{LayoutKind, SceneInput};
use layout::{ForceLayout, Layout, LayoutNode, RadialLayout};
use scene::Scene;
use view::{ViewController, ViewMode};

const SEARCH_EMISSIVE: Color32 = Color32::from_rgb(24, 72, 128);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorStyle {
    /// Triangle arrowhead at the receiving end.
    Arrow,
    /// Disk-and-halo marker docked onto the receiving node.
    Receptor,
}

#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    pub directed: bool,
    pub connector: ConnectorStyle,
    pub link_opacity: f32,
    pub node_scale: f32,
    pub show_labels: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            directed: true,
            connector: ConnectorStyle::Arrow,
            link_opacity: 0.2,
            node_scale: 1.0,
            show_labels: false,
        }
    }
}

/// What a node click resolved to, for the shell to route.
#[derive(Clone, Debug)]
pub struct ClickedNode {
    pub module_id: Option<String>,
    pub is_library: bool,
    pub pinned: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DrawOutput {
    pub hovered: Option<usize>,
    pub clicked: Option<ClickedNode>,
}

/// One self-contained rendering engine over a [`SceneInput`].
pub struct GraphEngine {
    pub settings: RenderSettings,
    view: ViewController,
    scene: Scene,
    input: SceneInput,
    layout_kind: LayoutKind,
    layout_seed: Option<u64>,
    positions: Vec<Vec3>,
    /// Hover identity, kept by id so it survives rebuilds and view swaps.
    hovered: Option<String>,
    search_matches: HashSet<String>,
}

impl GraphEngine {
    pub fn new(mode: ViewMode, layout_kind: LayoutKind) -> Self {
        Self {
            settings: RenderSettings::default(),
            view: ViewController::new(mode),
            scene: Scene::default(),
            input: SceneInput::default(),
            layout_kind,
            layout_seed: None,
            positions: Vec::new(),
            hovered: None,
            search_matches: HashSet::new(),
        }
    }

    /// Deterministic layout for tests.
    pub fn with_seed(mode: ViewMode, layout_kind: LayoutKind, seed: u64) -> Self {
        let mut engine = Self::new(mode, layout_kind);
        engine.layout_seed = Some(seed);
        engine
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn node_count(&self) -> usize {
        self.scene.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.scene.edges.len()
    }

    pub fn hovered_id(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    fn build_layout(&self) -> Box<dyn Layout> {
        let dims = self.view.dimensionality();
        match (self.layout_kind, self.layout_seed) {
            (LayoutKind::Force { iterations }, None) => {
                Box::new(ForceLayout::new(dims, iterations))
            }
            (LayoutKind::Force { iterations }, Some(seed)) => {
                Box::new(ForceLayout::with_seed(dims, iterations, seed))
            }
            (LayoutKind::Radial, None) => Box::new(RadialLayout::new(dims)),
            (LayoutKind::Radial, Some(seed)) => Box::new(RadialLayout::with_seed(dims, seed)),
        }
    }

    /// Installs new input: full layout run, then a fresh scene generation.
    pub fn set_input(&mut self, input: SceneInput) {
        self.input = input;
        self.relayout();
    }

    fn relayout(&mut self) {
        let mut layout_nodes = self
            .input
            .nodes
            .iter()
            .map(|node| {
                if node.pinned {
                    LayoutNode::pinned_at(Vec3::ZERO)
                } else {
                    LayoutNode::free()
                }
            })
            .collect::<Vec<_>>();

        let mut layout = self.build_layout();
        layout::run(layout.as_mut(), &mut layout_nodes, &self.input.edges);
        self.positions = layout_nodes.iter().map(|node| node.position).collect();
        self.rebuild_scene();
    }

    /// Rebuilds scene objects from the current positions and reapplies the
    /// persistent highlight layers.
    fn rebuild_scene(&mut self) {
        self.scene.rebuild(
            &self.input,
            &self.positions,
            self.view.dimensionality(),
            self.settings.node_scale,
            self.settings.link_opacity,
        );

        let matches = self.match_indices();
        if !matches.is_empty() {
            self.scene.apply_search(&matches, SEARCH_EMISSIVE);
        }
        if let Some(id) = self.hovered.clone() {
            if let Some(index) = self.scene.node_by_id(&id) {
                self.scene.apply_hover(index);
            }
        }
        debug!(
            generation = self.scene.generation(),
            nodes = self.scene.nodes.len(),
            edges = self.scene.edges.len(),
            "scene rebuilt"
        );
    }

    fn match_indices(&self) -> HashSet<usize> {
        self.search_matches
            .iter()
            .filter_map(|id| self.scene.node_by_id(id))
            .collect()
    }

    /// Atomic projection swap: counterpart camera, then relayout under the
    /// new dimensionality, then a fresh scene.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.view.mode() {
            return;
        }
        self.view.set_mode(mode);
        self.relayout();
    }

    pub fn set_node_scale(&mut self, scale: f32) {
        if (scale - self.settings.node_scale).abs() <= f32::EPSILON {
            return;
        }
        self.settings.node_scale = scale;
        self.rebuild_scene();
    }

    pub fn set_link_opacity(&mut self, opacity: f32) {
        self.settings.link_opacity = opacity;
        self.scene.set_link_opacity(opacity);
    }

    /// Replaces the search highlight set. Previous matches are restored
    /// before the new set is painted.
    pub fn set_search(&mut self, matches: HashSet<String>) {
        self.scene.clear_search();
        self.search_matches = matches;
        let indices = self.match_indices();
        if !indices.is_empty() {
            self.scene.apply_search(&indices, SEARCH_EMISSIVE);
        }
    }

    pub fn clear_search(&mut self) {
        self.scene.clear_search();
        self.search_matches.clear();
    }

    pub fn reset_camera(&mut self, now: f64) {
        self.view.reset(now);
    }

    /// Animated jump to a node by id, if it is in the current scene.
    pub fn center_on(&mut self, id: &str, now: f64) {
        if let Some(index) = self.scene.node_by_id(id) {
            let position = self.scene.nodes[index].position;
            self.view.center_on(position, now);
        }
    }

    fn set_hover(&mut self, index: Option<usize>) {
        let next_id = index.and_then(|i| self.scene.nodes.get(i).map(|n| n.id.clone()));
        if next_id == self.hovered {
            return;
        }
        self.scene.clear_hover();
        if let Some(index) = index {
            self.scene.apply_hover(index);
        }
        self.hovered = next_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ingest_value;
    use serde_json::json;

    fn engine_with_chain(mode: ViewMode) -> GraphEngine {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "a": {"type": ".ts", "size": 100},
                "b": {"type": ".ts", "size": 100},
                "c": {"type": ".ts", "size": 100}
            },
            "dependencies": {"a": ["b"], "b": ["c"]}
        }))
        .unwrap();
        let visible = vec![true; 3];
        let mut engine = GraphEngine::with_seed(mode, LayoutKind::Force { iterations: 30 }, 5);
        engine.set_input(SceneInput::from_graph(&graph, &visible));
        engine
    }

    #[test]
    fn scene_tracks_input_exactly() {
        let engine = engine_with_chain(ViewMode::Planar);
        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.edge_count(), 2);
    }

    #[test]
    fn planar_positions_stay_flat_and_volumetric_do_not() {
        let engine = engine_with_chain(ViewMode::Planar);
        assert!(engine.scene.nodes.iter().all(|n| n.position.z == 0.0));

        let mut engine = engine_with_chain(ViewMode::Planar);
        engine.set_view_mode(ViewMode::Volumetric);
        assert!(engine.scene.nodes.iter().any(|n| n.position.z.abs() > 0.5));
    }

    #[test]
    fn hover_survives_a_view_swap() {
        let mut engine = engine_with_chain(ViewMode::Planar);
        let index = engine.scene.node_by_id("b").unwrap();
        engine.set_hover(Some(index));
        assert_eq!(engine.hovered_id(), Some("b"));

        engine.set_view_mode(ViewMode::Volumetric);
        assert_eq!(engine.hovered_id(), Some("b"));

        let index = engine.scene.node_by_id("b").unwrap();
        let node = &engine.scene.nodes[index];
        assert_ne!(node.material, node.base, "hover highlight reapplied");
    }

    #[test]
    fn search_highlight_survives_rebuilds() {
        let mut engine = engine_with_chain(ViewMode::Planar);
        engine.set_search(HashSet::from(["a".to_owned()]));

        engine.set_node_scale(1.5);
        let index = engine.scene.node_by_id("a").unwrap();
        let node = &engine.scene.nodes[index];
        assert_ne!(node.material, node.base);

        engine.clear_search();
        let node = &engine.scene.nodes[index];
        assert_eq!(node.material, node.base);
    }

    #[test]
    fn hover_cycle_leaves_no_residue() {
        let mut engine = engine_with_chain(ViewMode::Planar);
        let before = engine
            .scene
            .nodes
            .iter()
            .map(|n| n.material)
            .collect::<Vec<_>>();

        let index = engine.scene.node_by_id("a").unwrap();
        engine.set_hover(Some(index));
        engine.set_hover(None);

        for (node, original) in engine.scene.nodes.iter().zip(&before) {
            assert_eq!(node.material, *original);
        }
    }
}
