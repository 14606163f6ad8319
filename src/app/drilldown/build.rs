use std::collections::{HashMap, HashSet};

use eframe::egui::Color32;
use tracing::debug;

use crate::analysis::{CallKind, MethodKind, ModuleGraph};
use crate::app::engine::input::{LayoutKind, SceneInput};
use crate::app::engine::layout::PANEL_ITERATIONS;
use crate::app::engine::view::ViewMode;
use crate::app::engine::GraphEngine;

use super::{PanelError, PanelSet, PanelSlot};

const PANEL_LINK_OPACITY: f32 = 0.35;

const FUNCTION_COLOR: Color32 = Color32::from_rgb(100, 181, 246);
const METHOD_COLOR: Color32 = Color32::from_rgb(186, 104, 200);
const ARROW_FN_COLOR: Color32 = Color32::from_rgb(77, 182, 172);
const IMPORTED_STUB_COLOR: Color32 = Color32::from_rgb(120, 124, 130);

const METHOD_RADIUS: f32 = 3.0;
const STUB_RADIUS: f32 = 2.5;

pub(super) fn build_panels(
    graph: &ModuleGraph,
    focus_id: &str,
    seed: Option<u64>,
) -> Result<PanelSet, PanelError> {
    let focus = graph
        .index_of(focus_id)
        .ok_or_else(|| PanelError::UnknownModule(focus_id.to_owned()))?;
    if graph.nodes[focus].category.is_library() {
        return Err(PanelError::LibraryFocus(graph.nodes[focus].name.clone()));
    }

    debug!(focus = %focus_id, "building drill-down panels");
    Ok(PanelSet {
        focus_id: focus_id.to_owned(),
        focus_label: graph.nodes[focus].name.clone(),
        imports: imports_panel(graph, focus, seed),
        methods: methods_panel(graph, focus, seed),
        importers: importers_panel(graph, focus, seed),
    })
}

fn make_engine(input: SceneInput, kind: LayoutKind, seed: Option<u64>) -> PanelSlot {
    let mut engine = match seed {
        Some(seed) => GraphEngine::with_seed(ViewMode::Planar, kind, seed),
        None => GraphEngine::new(ViewMode::Planar, kind),
    };
    engine.settings.link_opacity = PANEL_LINK_OPACITY;
    engine.set_input(input);
    PanelSlot::Engine(Box::new(engine))
}

/// Focus pinned at the centre, its imports in a ring around it. The edges
/// run focus -> import in data order, so the drawn arrows point back at the
/// centre.
fn imports_panel(graph: &ModuleGraph, focus: usize, seed: Option<u64>) -> PanelSlot {
    let targets = &graph.out_edges[focus];
    if targets.is_empty() {
        return PanelSlot::Empty("This module imports nothing.");
    }

    let mut nodes = vec![SceneInput::node_for_module(graph, focus, true)];
    let mut edges = Vec::with_capacity(targets.len());
    for &target in targets {
        edges.push((0, nodes.len()));
        nodes.push(SceneInput::node_for_module(graph, target, false));
    }

    make_engine(SceneInput { nodes, edges }, LayoutKind::Radial, seed)
}

/// Declared functions and methods, wired by local call edges. Calls into
/// other modules appear as disconnected grey stubs so the call surface is
/// still visible.
fn methods_panel(graph: &ModuleGraph, focus: usize, seed: Option<u64>) -> PanelSlot {
    let id = &graph.nodes[focus].id;
    let methods = graph.methods_for(id);
    if methods.is_empty() {
        if graph.calls_for(id).is_some() {
            return PanelSlot::Failed(
                "Call data present without method declarations; artifact is inconsistent."
                    .to_owned(),
            );
        }
        return PanelSlot::Empty("No method data recorded for this module.");
    }

    let mut nodes = Vec::with_capacity(methods.len());
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();
    for method in methods {
        let color = match method.kind {
            MethodKind::Function => FUNCTION_COLOR,
            MethodKind::Method => METHOD_COLOR,
            MethodKind::Arrow => ARROW_FN_COLOR,
        };
        let label = match &method.class {
            Some(class) => format!("{class}.{}", method.name),
            None => method.name.clone(),
        };
        index_by_name.entry(method.name.as_str()).or_insert(nodes.len());
        nodes.push(SceneInput::synthetic_node(
            label.clone(),
            label,
            color,
            METHOD_RADIUS,
        ));
    }

    let mut edges = Vec::new();
    let mut seen_edges = HashSet::new();
    let mut seen_stubs = HashSet::new();
    if let Some(calls) = graph.calls_for(id) {
        for (caller, records) in calls {
            let Some(&from) = index_by_name.get(caller.as_str()) else {
                continue;
            };
            for call in records {
                match call.kind {
                    CallKind::Local => {
                        if let Some(&to) = index_by_name.get(call.name.as_str()) {
                            if from != to && seen_edges.insert((from, to)) {
                                edges.push((from, to));
                            }
                        }
                    }
                    CallKind::Imported => {
                        if seen_stubs.insert(call.name.clone()) {
                            let label = match &call.module {
                                Some(module) => format!("{} ({module})", call.name),
                                None => call.name.clone(),
                            };
                            nodes.push(SceneInput::synthetic_node(
                                format!("imported:{}", call.name),
                                label,
                                IMPORTED_STUB_COLOR,
                                STUB_RADIUS,
                            ));
                        }
                    }
                }
            }
        }
    }

    make_engine(
        SceneInput { nodes, edges },
        LayoutKind::Force {
            iterations: PANEL_ITERATIONS,
        },
        seed,
    )
}

/// Every module that imports the focus, plus the dependency edges between
/// those importers themselves. The focus is deliberately absent; the panel
/// shows the client neighbourhood, not the star.
fn importers_panel(graph: &ModuleGraph, focus: usize, seed: Option<u64>) -> PanelSlot {
    let sources = &graph.in_edges[focus];
    if sources.is_empty() {
        return PanelSlot::Empty("Nothing imports this module.");
    }

    let mut nodes = Vec::with_capacity(sources.len());
    let mut panel_index: HashMap<usize, usize> = HashMap::new();
    for &source in sources {
        panel_index.insert(source, nodes.len());
        nodes.push(SceneInput::node_for_module(graph, source, false));
    }

    let mut edges = Vec::new();
    for &source in sources {
        for &target in &graph.out_edges[source] {
            if let (Some(&from), Some(&to)) = (panel_index.get(&source), panel_index.get(&target)) {
                edges.push((from, to));
            }
        }
    }

    make_engine(
        SceneInput { nodes, edges },
        LayoutKind::Force {
            iterations: PANEL_ITERATIONS,
        },
        seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ingest_value;
    use serde_json::json;

    /// b and c import a; a imports d and lodash; c also imports b.
    fn sample_graph() -> ModuleGraph {
        ingest_value(json!({
            "nodeInfo": {
                "a": {"type": ".ts", "size": 100},
                "b": {"type": ".ts", "size": 100},
                "c": {"type": ".ts", "size": 100},
                "d": {"type": ".ts", "size": 100},
                "library:lodash": {"type": "library", "size": 0}
            },
            "dependencies": {
                "a": ["d", "library:lodash"],
                "b": ["a"],
                "c": ["a", "b"]
            },
            "methodInfo": {
                "a": {"methods": [
                    {"name": "run", "type": "function"},
                    {"name": "tick", "type": "method", "class": "Engine"}
                ]}
            },
            "methodDependencies": {
                "a": {"run": [
                    {"name": "tick", "type": "local"},
                    {"name": "debounce", "type": "imported", "module": "lodash"}
                ]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn imports_panel_pins_the_focus_at_the_centre() {
        let graph = sample_graph();
        let mut set = PanelSet::build_seeded(&graph, "a", 7).unwrap();

        let engine = set.imports.engine_mut().unwrap();
        assert_eq!(engine.node_count(), 3, "focus plus two imports");
        let focus = &engine.scene().nodes[0];
        assert!(focus.pinned);
        assert_eq!(focus.position.length(), 0.0);
        // Data order is focus -> import; the visual curve arrives back at
        // the focus.
        for edge in &engine.scene().edges {
            assert_eq!(edge.data_source, 0);
            assert_eq!(edge.visual_target, 0);
        }
    }

    #[test]
    fn methods_panel_links_local_calls_and_stubs_imports() {
        let graph = sample_graph();
        let mut set = PanelSet::build_seeded(&graph, "a", 7).unwrap();

        let engine = set.methods.engine_mut().unwrap();
        // run, Engine.tick, and the debounce stub.
        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.edge_count(), 1, "only the local call is an edge");

        let stub = engine.scene().node_by_id("imported:debounce").unwrap();
        let stub = &engine.scene().nodes[stub];
        assert!(stub.module_id.is_none(), "stubs resolve to no module");
        assert!(engine.scene().edges.iter().all(|e| !e.touches(stub.index)));
    }

    #[test]
    fn importers_panel_excludes_the_focus_but_keeps_cross_edges() {
        let graph = sample_graph();
        let mut set = PanelSet::build_seeded(&graph, "a", 7).unwrap();

        let engine = set.importers.engine_mut().unwrap();
        assert_eq!(engine.node_count(), 2, "b and c");
        assert!(engine.scene().node_by_id("a").is_none());
        // c -> b survives as an inter-importer edge.
        assert_eq!(engine.edge_count(), 1);
    }

    #[test]
    fn leaf_modules_get_empty_panels_not_errors() {
        let graph = sample_graph();
        let set = PanelSet::build(&graph, "d").unwrap();
        assert!(matches!(set.imports, PanelSlot::Empty(_)));
        assert!(matches!(set.methods, PanelSlot::Empty(_)));
        assert!(matches!(set.importers, PanelSlot::Engine(_)));
    }

    #[test]
    fn bad_focus_targets_are_rejected() {
        let graph = sample_graph();
        assert!(matches!(
            PanelSet::build(&graph, "ghost"),
            Err(PanelError::UnknownModule(_))
        ));
        assert!(matches!(
            PanelSet::build(&graph, "library:lodash"),
            Err(PanelError::LibraryFocus(_))
        ));
    }
}
