//! Drill-down view: three side-by-side panels for one focused module —
//! what it imports, what it declares, and what imports it. Each populated
//! panel owns its own [`GraphEngine`].

mod build;

use thiserror::Error;

use crate::analysis::ModuleGraph;
use crate::app::engine::GraphEngine;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("module `{0}` is not in the graph")]
    UnknownModule(String),
    #[error("`{0}` is an external package; drill-down needs a source file")]
    LibraryFocus(String),
}

/// What one panel column holds. Empty and failed panels render a message in
/// place of a canvas; one failed panel never takes the others down.
pub enum PanelSlot {
    Empty(&'static str),
    Failed(String),
    Engine(Box<GraphEngine>),
}

impl PanelSlot {
    pub fn engine_mut(&mut self) -> Option<&mut GraphEngine> {
        match self {
            Self::Engine(engine) => Some(engine),
            _ => None,
        }
    }
}

pub struct PanelSet {
    pub focus_id: String,
    pub focus_label: String,
    pub imports: PanelSlot,
    pub methods: PanelSlot,
    pub importers: PanelSlot,
}

impl PanelSet {
    /// Builds all three panels for `focus_id`. Fails only when the focus
    /// itself is unusable.
    pub fn build(graph: &ModuleGraph, focus_id: &str) -> Result<Self, PanelError> {
        build::build_panels(graph, focus_id, None)
    }

    #[cfg(test)]
    pub fn build_seeded(graph: &ModuleGraph, focus_id: &str, seed: u64) -> Result<Self, PanelError> {
        build::build_panels(graph, focus_id, Some(seed))
    }
}
