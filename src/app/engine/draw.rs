//! Per-frame rendering and input routing for a [`GraphEngine`].

use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, PointerButton, Pos2, Rect, RichText, Sense, Shape,
    Stroke, Ui, Vec2, vec2,
};
use glam::Vec3;

use crate::app::render_utils::{
    add_emissive, circle_visible, draw_background, draw_sphere, with_opacity,
};
use crate::util::format_bytes;

use super::pick::ProjectedScene;
use super::view::ViewMode;
use super::{ClickedNode, ConnectorStyle, DrawOutput, GraphEngine};

const EDGE_STROKE_WIDTH: f32 = 1.2;
const LABEL_COLOR: Color32 = Color32::from_rgb(222, 226, 230);
const PIN_RING_COLOR: Color32 = Color32::from_rgb(255, 213, 79);

impl GraphEngine {
    /// Renders one frame into the remaining space of `ui` and routes pointer
    /// input to the camera. Returns what the pointer resolved to.
    pub fn draw(&mut self, ui: &mut Ui) -> DrawOutput {
        let size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        if !rect.is_positive() {
            return DrawOutput::default();
        }
        let painter = ui.painter_at(rect);
        let now = ui.input(|i| i.time);

        self.route_input(rect, &response, ui);
        let animating = self.view.tick(now, rect);

        self.paint_background(&painter, rect);

        let projected = ProjectedScene::project(&self.view, &self.scene, rect);

        // Hover only follows the pointer while it is over the canvas and not
        // mid-drag; it persists while the pointer is away on the controls.
        if !response.dragged() {
            if let Some(pointer) = response.hover_pos() {
                self.set_hover(projected.pick(pointer));
            }
        }
        let hovered_index = self
            .hovered
            .as_deref()
            .and_then(|id| self.scene.node_by_id(id));

        self.paint_edges(&painter, rect, &projected);
        self.paint_nodes(&painter, rect, &projected, hovered_index);

        if hovered_index.is_some() && response.hover_pos().is_some() {
            ui.ctx().output_mut(|o| o.cursor_icon = CursorIcon::PointingHand);
        }
        if animating || response.dragged() {
            ui.ctx().request_repaint();
        }

        if let Some(index) = hovered_index {
            if response.hover_pos().is_some() {
                self.show_node_tooltip(&response, index);
            }
        }

        let clicked = if response.clicked_by(PointerButton::Primary) {
            hovered_index.map(|index| {
                let node = &self.scene.nodes[index];
                ClickedNode {
                    module_id: node.module_id.clone(),
                    is_library: node.is_library,
                    pinned: node.pinned,
                }
            })
        } else {
            None
        };

        DrawOutput {
            hovered: hovered_index,
            clicked,
        }
    }

    fn show_node_tooltip(&self, response: &eframe::egui::Response, index: usize) {
        let node = &self.scene.nodes[index];
        response.clone().on_hover_ui_at_pointer(|ui| {
            ui.strong(&node.label);
            if !node.path.is_empty() {
                ui.label(RichText::new(&node.path).monospace().small());
            }
            if !node.category_label.is_empty() {
                ui.label(node.category_label.as_str());
            }
            if node.size > 0 {
                ui.label(format_bytes(node.size));
            }
            if node.module_id.is_some() {
                ui.label(format!(
                    "imports {}, imported by {}",
                    node.import_count, node.importer_count
                ));
            }
        });
    }

    fn route_input(&mut self, rect: Rect, response: &eframe::egui::Response, ui: &Ui) {
        if response.dragged() {
            let delta = response.drag_delta();
            match self.view.mode() {
                ViewMode::Planar => self.view.pan_by(rect, delta),
                ViewMode::Volumetric => {
                    if response.dragged_by(PointerButton::Primary) {
                        self.view.orbit_by(delta);
                    } else {
                        self.view.pan_by(rect, delta);
                    }
                }
            }
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
                self.view.zoom_by(rect, pointer, scroll);
            }
        }
    }

    fn paint_background(&self, painter: &eframe::egui::Painter, rect: Rect) {
        // The grid tracks the planar camera; the orbit view gets a static one.
        let (pan, zoom) = match self.view.project(Vec3::ZERO, rect) {
            Some(p) if self.view.mode() == ViewMode::Planar => (
                p.screen - rect.center(),
                p.scale * 1000.0 / rect.height().max(1.0),
            ),
            _ => (Vec2::ZERO, 1.0),
        };
        draw_background(painter, rect, pan, zoom);
    }

    fn paint_edges(&self, painter: &eframe::egui::Painter, rect: Rect, projected: &ProjectedScene) {
        let culling = rect.expand(8.0);
        let mut points = Vec::new();

        for edge in &self.scene.edges {
            points.clear();
            for &world in &edge.points {
                match self.view.project(world, rect) {
                    Some(p) => points.push(p.screen),
                    None => break,
                }
            }
            if points.len() != edge.points.len() {
                continue;
            }
            if !points.iter().any(|p| culling.contains(*p)) {
                continue;
            }

            let color = with_opacity(edge.material.color, edge.material.opacity);
            painter.add(Shape::line(
                points.clone(),
                Stroke::new(EDGE_STROKE_WIDTH, color),
            ));

            if self.settings.directed {
                let end_scale = projected
                    .nodes
                    .get(edge.visual_target)
                    .and_then(|p| *p)
                    .map(|p| p.scale)
                    .unwrap_or(1.0);
                paint_connector(painter, self.settings.connector, &points, end_scale, color);
            }
        }
    }

    fn paint_nodes(
        &self,
        painter: &eframe::egui::Painter,
        rect: Rect,
        projected: &ProjectedScene,
        hovered_index: Option<usize>,
    ) {
        // Painter's algorithm: far nodes first. Planar depths are all zero,
        // so the stable sort keeps arena order there.
        let mut order = (0..self.scene.nodes.len())
            .filter(|&i| projected.nodes[i].is_some())
            .collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            let da = projected.nodes[a].map(|p| p.depth).unwrap_or(0.0);
            let db = projected.nodes[b].map(|p| p.depth).unwrap_or(0.0);
            db.total_cmp(&da)
        });

        for index in order {
            let Some(p) = projected.nodes[index] else {
                continue;
            };
            let node = &self.scene.nodes[index];
            let radius = projected.radii[index];
            if !circle_visible(rect, p.screen, radius) {
                continue;
            }

            let lit = add_emissive(node.material.color, node.material.emissive);
            draw_sphere(painter, p.screen, radius, with_opacity(lit, node.material.opacity));
            if node.pinned {
                painter.circle_stroke(p.screen, radius + 2.5, Stroke::new(1.5, PIN_RING_COLOR));
            }

            if self.settings.show_labels || hovered_index == Some(index) {
                painter.text(
                    p.screen - vec2(0.0, radius + 4.0),
                    Align2::CENTER_BOTTOM,
                    &node.label,
                    FontId::proportional(12.0),
                    LABEL_COLOR,
                );
            }
        }
    }
}

/// Direction marker at the receiving end of an edge curve, sized by the
/// projected scale there.
fn paint_connector(
    painter: &eframe::egui::Painter,
    style: ConnectorStyle,
    points: &[Pos2],
    scale: f32,
    color: Color32,
) {
    let [.., prev, tip] = points else {
        return;
    };
    let (prev, tip) = (*prev, *tip);
    let along = tip - prev;
    let length = along.length();
    if length < 0.01 {
        return;
    }
    let direction = along / length;

    match style {
        ConnectorStyle::Arrow => {
            let base = tip - direction * (5.0 * scale).clamp(3.0, 18.0);
            let half = vec2(-direction.y, direction.x) * (2.0 * scale).clamp(1.2, 8.0);
            painter.add(Shape::convex_polygon(
                vec![tip, base + half, base - half],
                color,
                Stroke::NONE,
            ));
        }
        ConnectorStyle::Receptor => {
            painter.circle_filled(tip, (2.2 * scale).clamp(1.5, 7.0), color);
            painter.circle_stroke(
                tip,
                (3.6 * scale).clamp(2.5, 11.0),
                Stroke::new(1.0, color),
            );
        }
    }
}
