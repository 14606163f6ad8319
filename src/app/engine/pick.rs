use eframe::egui::{Pos2, Rect};
use tracing::debug;

use super::scene::Scene;
use super::view::{Projected, ViewController};

/// Minimum on-screen radius a node can be picked or drawn at.
pub const MIN_SCREEN_RADIUS: f32 = 2.0;
pub const MAX_SCREEN_RADIUS: f32 = 60.0;

/// Per-frame projection of every scene node, shared between picking and
/// drawing so clicks always test against exactly what was rendered.
#[derive(Debug, Default)]
pub struct ProjectedScene {
    /// Parallel to `scene.nodes`; `None` when behind the camera.
    pub nodes: Vec<Option<Projected>>,
    pub radii: Vec<f32>,
}

impl ProjectedScene {
    pub fn project(view: &ViewController, scene: &Scene, rect: Rect) -> Self {
        let mut nodes = Vec::with_capacity(scene.nodes.len());
        let mut radii = Vec::with_capacity(scene.nodes.len());
        for node in &scene.nodes {
            let projected = view.project(node.position, rect);
            let radius = projected
                .map(|p| (node.radius * p.scale).clamp(MIN_SCREEN_RADIUS, MAX_SCREEN_RADIUS))
                .unwrap_or(0.0);
            nodes.push(projected);
            radii.push(radius);
        }
        Self { nodes, radii }
    }

    /// Nearest node under the cursor: closest by depth, then by cursor
    /// distance. Returns `None` on any inconsistency rather than escalating
    /// (picking faults are never fatal).
    pub fn pick(&self, pointer: Pos2) -> Option<usize> {
        if self.nodes.len() != self.radii.len() {
            debug!("projection buffers out of sync; ignoring pick");
            return None;
        }

        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, projected)| {
                let projected = (*projected)?;
                let distance = projected.screen.distance(pointer);
                (distance <= self.radii[index]).then_some((index, projected.depth, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)))
            .map(|(index, _, _)| index)
    }
}
