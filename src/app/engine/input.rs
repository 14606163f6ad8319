use eframe::egui::Color32;

use crate::analysis::{ModuleGraph, NodeCategory};
use crate::app::render_utils::category_color;
use crate::util::short_name;

/// Which layout variant an engine runs over its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Force { iterations: usize },
    Radial,
}

/// One node as handed to an engine: already filtered, already coloured.
#[derive(Clone, Debug)]
pub struct InputNode {
    /// Identity within this engine; unique per input.
    pub id: String,
    pub label: String,
    /// Underlying module id when the node stands for a file or library in
    /// the main graph; drill-down targets resolve through this.
    pub module_id: Option<String>,
    pub path: String,
    pub category_label: String,
    pub color: Color32,
    /// World-unit radius before the user scale factor.
    pub radius: f32,
    pub is_library: bool,
    /// Pinned nodes sit at the origin and are skipped by the layout.
    pub pinned: bool,
    pub size: u64,
    pub import_count: usize,
    pub importer_count: usize,
}

/// The visible slice of a graph an engine renders. Edges are directed in
/// data order (source imports target); the scene builder applies the visual
/// reversal.
#[derive(Clone, Debug, Default)]
pub struct SceneInput {
    pub nodes: Vec<InputNode>,
    pub edges: Vec<(usize, usize)>,
}

impl SceneInput {
    /// Projects the visible portion of the module graph. Edges survive only
    /// when both endpoints are visible.
    pub fn from_graph(graph: &ModuleGraph, visible: &[bool]) -> Self {
        let mut nodes = Vec::new();
        let mut engine_index = vec![usize::MAX; graph.node_count()];

        for (index, node) in graph.nodes.iter().enumerate() {
            if !visible.get(index).copied().unwrap_or(false) {
                continue;
            }
            engine_index[index] = nodes.len();
            nodes.push(InputNode {
                id: node.id.clone(),
                label: short_name(&node.name).to_owned(),
                module_id: Some(node.id.clone()),
                path: node.path.clone(),
                category_label: node.category.label().to_owned(),
                color: category_color(&node.category),
                radius: node.render_size,
                is_library: node.category.is_library(),
                pinned: false,
                size: node.size,
                import_count: graph.dependency_count(index),
                importer_count: graph.dependent_count(index),
            });
        }

        let edges = graph
            .edges
            .iter()
            .filter_map(|&(source, target)| {
                let s = engine_index[source];
                let t = engine_index[target];
                (s != usize::MAX && t != usize::MAX).then_some((s, t))
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node_for_module(graph: &ModuleGraph, index: usize, pinned: bool) -> InputNode {
        let node = &graph.nodes[index];
        InputNode {
            id: node.id.clone(),
            label: short_name(&node.name).to_owned(),
            module_id: Some(node.id.clone()),
            path: node.path.clone(),
            category_label: node.category.label().to_owned(),
            color: category_color(&node.category),
            radius: node.render_size,
            is_library: node.category.is_library(),
            pinned,
            size: node.size,
            import_count: graph.dependency_count(index),
            importer_count: graph.dependent_count(index),
        }
    }

    /// A synthetic node with no module behind it (method-graph entries).
    pub fn synthetic_node(id: String, label: String, color: Color32, radius: f32) -> InputNode {
        InputNode {
            id,
            path: String::new(),
            category_label: String::new(),
            module_id: None,
            color,
            radius,
            is_library: false,
            pinned: false,
            size: 0,
            import_count: 0,
            importer_count: 0,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ingest_value;
    use serde_json::json;

    #[test]
    fn hidden_endpoints_drop_their_edges() {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "a": {"type": ".js", "size": 1},
                "b": {"type": ".js", "size": 1},
                "c": {"type": ".js", "size": 1}
            },
            "dependencies": {"a": ["b", "c"], "b": ["c"]}
        }))
        .unwrap();

        let mut visible = vec![true; 3];
        visible[graph.index_of("c").unwrap()] = false;
        let input = SceneInput::from_graph(&graph, &visible);

        assert_eq!(input.nodes.len(), 2);
        assert_eq!(input.edges.len(), 1, "only a->b survives");
    }
}
