use std::collections::HashSet;

use eframe::egui::Color32;
use glam::Vec3;

use super::input::SceneInput;
use super::layout::Dimensionality;

/// Samples per edge curve.
pub const EDGE_SAMPLES: usize = 25;
/// Incident edges at one node spread across this arc.
const FAN_ARC_DEGREES: f32 = 120.0;

const EDGE_BASE_COLOR: Color32 = Color32::from_rgb(130, 134, 142);
const EDGE_ACCENT_COLOR: Color32 = Color32::from_rgb(255, 183, 77);
const EDGE_ACCENT_OPACITY: f32 = 0.9;
const HOVER_EMISSIVE: Color32 = Color32::from_rgb(64, 64, 32);
const NEIGHBOR_EMISSIVE: Color32 = Color32::from_rgb(40, 40, 20);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeMaterial {
    pub color: Color32,
    pub emissive: Color32,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeMaterial {
    pub color: Color32,
    pub opacity: f32,
}

/// One visible node. Carries a back-pointer to its logical id so picking and
/// drill-down never depend on arena order.
#[derive(Clone, Debug)]
pub struct NodeObject {
    pub index: usize,
    pub id: String,
    pub module_id: Option<String>,
    pub label: String,
    pub path: String,
    pub category_label: String,
    pub size: u64,
    pub import_count: usize,
    pub importer_count: usize,
    pub is_library: bool,
    pub pinned: bool,
    pub position: Vec3,
    pub radius: f32,
    pub material: NodeMaterial,
    pub base: NodeMaterial,
    hover_saved: Option<NodeMaterial>,
    search_saved: Option<NodeMaterial>,
}

/// One visible edge. The curve runs in *visual* orientation — it arrives at
/// the data source from the data target, so arrows read "required by".
#[derive(Clone, Debug)]
pub struct EdgeObject {
    pub data_source: usize,
    pub data_target: usize,
    pub visual_source: usize,
    pub visual_target: usize,
    /// 25 points sampled along a quadratic Bézier from `visual_source`'s
    /// sphere surface to `visual_target`'s.
    pub points: Vec<Vec3>,
    pub material: EdgeMaterial,
    pub base: EdgeMaterial,
    hover_saved: Option<EdgeMaterial>,
}

impl EdgeObject {
    pub fn touches(&self, node: usize) -> bool {
        self.data_source == node || self.data_target == node
    }
}

/// One generation of scene objects. `rebuild` is the only constructor and
/// always releases the previous generation first.
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: Vec<NodeObject>,
    pub edges: Vec<EdgeObject>,
    generation: u64,
}

fn rotate_in_plane(direction: Vec3, angle: f32) -> Vec3 {
    // The endpoint fan lives in the xy plane in both view modes.
    let (sin, cos) = angle.sin_cos();
    Vec3::new(
        direction.x * cos - direction.y * sin,
        direction.x * sin + direction.y * cos,
        direction.z,
    )
}

fn fan_offset_angle(slot: usize, total: usize) -> f32 {
    if total <= 1 {
        return 0.0;
    }
    let arc = FAN_ARC_DEGREES.to_radians();
    (slot as f32 / (total - 1) as f32 - 0.5) * arc
}

fn surface_point(
    center: Vec3,
    radius: f32,
    toward: Vec3,
    slot: usize,
    total: usize,
) -> Vec3 {
    let chord = toward - center;
    let length = chord.length();
    if length < 0.0001 {
        return center + Vec3::new(radius, 0.0, 0.0);
    }
    let direction = rotate_in_plane(chord / length, fan_offset_angle(slot, total));
    center + direction * radius
}

fn chord_perpendicular(chord: Vec3, dims: Dimensionality) -> Vec3 {
    let length = chord.length();
    if length < 0.0001 {
        return Vec3::Y;
    }
    let unit = chord / length;
    match dims {
        Dimensionality::Planar => Vec3::new(-unit.y, unit.x, 0.0),
        Dimensionality::Volumetric => {
            let perp = unit.cross(Vec3::Z);
            if perp.length() < 0.0001 {
                Vec3::Y
            } else {
                perp.normalize()
            }
        }
    }
}

fn sample_quadratic(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec<Vec3> {
    (0..EDGE_SAMPLES)
        .map(|i| {
            let t = i as f32 / (EDGE_SAMPLES - 1) as f32;
            let u = 1.0 - t;
            p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
        })
        .collect()
}

impl Scene {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Releases every object owned by the current generation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Materializes scene objects for the given input and positions. The
    /// position slice must be parallel to `input.nodes`.
    pub fn rebuild(
        &mut self,
        input: &SceneInput,
        positions: &[Vec3],
        dims: Dimensionality,
        node_scale: f32,
        link_opacity: f32,
    ) {
        self.clear();

        for (index, node) in input.nodes.iter().enumerate() {
            let base = NodeMaterial {
                color: node.color,
                emissive: Color32::BLACK,
                opacity: 1.0,
            };
            self.nodes.push(NodeObject {
                index,
                id: node.id.clone(),
                module_id: node.module_id.clone(),
                label: node.label.clone(),
                path: node.path.clone(),
                category_label: node.category_label.clone(),
                size: node.size,
                import_count: node.import_count,
                importer_count: node.importer_count,
                is_library: node.is_library,
                pinned: node.pinned,
                position: positions.get(index).copied().unwrap_or(Vec3::ZERO),
                radius: node.radius * node_scale,
                material: base,
                base,
                hover_saved: None,
                search_saved: None,
            });
        }

        // Slot assignment for the endpoint fans: edges leaving a node in the
        // same visual direction fan out instead of coinciding.
        let mut out_total = vec![0usize; self.nodes.len()];
        let mut in_total = vec![0usize; self.nodes.len()];
        for &(source, target) in &input.edges {
            // Visual orientation: the curve runs target -> source.
            out_total[target] += 1;
            in_total[source] += 1;
        }
        let mut out_slot = vec![0usize; self.nodes.len()];
        let mut in_slot = vec![0usize; self.nodes.len()];

        let edge_base = EdgeMaterial {
            color: EDGE_BASE_COLOR,
            opacity: link_opacity,
        };

        for &(source, target) in &input.edges {
            let visual_source = target;
            let visual_target = source;
            let from = &self.nodes[visual_source];
            let to = &self.nodes[visual_target];

            let start = surface_point(
                from.position,
                from.radius,
                to.position,
                out_slot[visual_source],
                out_total[visual_source],
            );
            let end = surface_point(
                to.position,
                to.radius,
                from.position,
                in_slot[visual_target],
                in_total[visual_target],
            );
            out_slot[visual_source] += 1;
            in_slot[visual_target] += 1;

            let chord = end - start;
            let distance = chord.length();
            let bow = match dims {
                Dimensionality::Planar => (0.15 * distance).min(15.0),
                Dimensionality::Volumetric => (0.10 * distance).min(20.0),
            };
            let control = start + chord * 0.5 + chord_perpendicular(chord, dims) * bow;

            self.edges.push(EdgeObject {
                data_source: source,
                data_target: target,
                visual_source,
                visual_target,
                points: sample_quadratic(start, control, end),
                material: edge_base,
                base: edge_base,
                hover_saved: None,
            });
        }
    }

    /// Updates the resting edge opacity without disturbing hover overrides.
    pub fn set_link_opacity(&mut self, opacity: f32) {
        for edge in &mut self.edges {
            edge.base.opacity = opacity;
            match &mut edge.hover_saved {
                Some(saved) => saved.opacity = opacity,
                None => edge.material.opacity = opacity,
            }
        }
    }

    pub fn node_by_id(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    // Highlight layering. Stack order is base -> search -> hover; each layer
    // saves exactly the state it overwrites, so clearing a layer restores
    // what the layer below had painted.

    pub fn apply_hover(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.hover_saved = Some(node.material);
        node.material.emissive = HOVER_EMISSIVE;

        let mut neighbors = HashSet::new();
        for edge in &mut self.edges {
            if !edge.touches(index) {
                continue;
            }
            edge.hover_saved = Some(edge.material);
            edge.material = EdgeMaterial {
                color: EDGE_ACCENT_COLOR,
                opacity: EDGE_ACCENT_OPACITY,
            };
            neighbors.insert(if edge.data_source == index {
                edge.data_target
            } else {
                edge.data_source
            });
        }

        for neighbor in neighbors {
            if neighbor == index {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(neighbor) {
                if node.hover_saved.is_none() {
                    node.hover_saved = Some(node.material);
                    node.material.emissive = NEIGHBOR_EMISSIVE;
                }
            }
        }
    }

    pub fn clear_hover(&mut self) {
        for node in &mut self.nodes {
            if let Some(saved) = node.hover_saved.take() {
                node.material = saved;
            }
        }
        for edge in &mut self.edges {
            if let Some(saved) = edge.hover_saved.take() {
                edge.material = saved;
            }
        }
    }

    pub fn apply_search(&mut self, matches: &HashSet<usize>, emissive: Color32) {
        for index in matches {
            let Some(node) = self.nodes.get_mut(*index) else {
                continue;
            };
            if node.search_saved.is_some() {
                continue;
            }

            match &mut node.hover_saved {
                Some(under_hover) => {
                    // Hover sits on top; swap the layer underneath it.
                    node.search_saved = Some(*under_hover);
                    under_hover.emissive = emissive;
                }
                None => {
                    node.search_saved = Some(node.material);
                    node.material.emissive = emissive;
                }
            }
        }
    }

    pub fn clear_search(&mut self) {
        for node in &mut self.nodes {
            let Some(saved) = node.search_saved.take() else {
                continue;
            };
            match &mut node.hover_saved {
                Some(under_hover) => *under_hover = saved,
                None => node.material = saved,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::Color32;

    fn small_input() -> (SceneInput, Vec<Vec3>) {
        let nodes = (0..3)
            .map(|i| {
                SceneInput::synthetic_node(
                    format!("n{i}"),
                    format!("n{i}"),
                    Color32::from_rgb(10 * i as u8, 0, 0),
                    4.0,
                )
            })
            .collect::<Vec<_>>();
        let input = SceneInput {
            nodes,
            edges: vec![(0, 1), (1, 2)],
        };
        let positions = vec![
            Vec3::new(-100.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::new(100.0, 50.0, 0.0),
        ];
        (input, positions)
    }

    fn build(scene: &mut Scene) {
        let (input, positions) = small_input();
        scene.rebuild(&input, &positions, Dimensionality::Planar, 1.0, 0.2);
    }

    #[test]
    fn rebuild_matches_visible_sets_exactly() {
        let mut scene = Scene::default();
        build(&mut scene);

        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.edges.len(), 2);
        for edge in &scene.edges {
            assert_eq!(edge.points.len(), EDGE_SAMPLES);
        }

        // Rebuild replaces the generation wholesale.
        let generation = scene.generation();
        build(&mut scene);
        assert_eq!(scene.nodes.len(), 3);
        assert!(scene.generation() > generation);
    }

    #[test]
    fn clear_releases_every_object() {
        let mut scene = Scene::default();
        build(&mut scene);
        scene.clear();
        assert!(scene.nodes.is_empty());
        assert!(scene.edges.is_empty());
    }

    #[test]
    fn edges_record_both_orientations() {
        let mut scene = Scene::default();
        build(&mut scene);

        let edge = &scene.edges[0];
        assert_eq!(edge.data_source, 0);
        assert_eq!(edge.data_target, 1);
        assert_eq!(edge.visual_source, 1);
        assert_eq!(edge.visual_target, 0);

        // The curve arrives at the data source.
        let last = *edge.points.last().unwrap();
        let source_pos = scene.nodes[0].position;
        assert!((last - source_pos).length() <= scene.nodes[0].radius + 0.01);
    }

    #[test]
    fn edge_endpoints_sit_on_sphere_surfaces() {
        let mut scene = Scene::default();
        build(&mut scene);

        for edge in &scene.edges {
            let first = *edge.points.first().unwrap();
            let from = &scene.nodes[edge.visual_source];
            assert!(((first - from.position).length() - from.radius).abs() < 0.01);
        }
    }

    #[test]
    fn hover_cycle_restores_materials_exactly() {
        let mut scene = Scene::default();
        build(&mut scene);

        let before_nodes = scene.nodes.iter().map(|n| n.material).collect::<Vec<_>>();
        let before_edges = scene.edges.iter().map(|e| e.material).collect::<Vec<_>>();

        scene.apply_hover(1);
        assert_ne!(scene.nodes[1].material, before_nodes[1]);
        assert_ne!(scene.edges[0].material, before_edges[0]);

        scene.clear_hover();
        for (node, before) in scene.nodes.iter().zip(&before_nodes) {
            assert_eq!(node.material, *before);
        }
        for (edge, before) in scene.edges.iter().zip(&before_edges) {
            assert_eq!(edge.material, *before);
        }
    }

    #[test]
    fn search_cycle_restores_materials_exactly() {
        let mut scene = Scene::default();
        build(&mut scene);

        let before = scene.nodes.iter().map(|n| n.material).collect::<Vec<_>>();
        let matches = HashSet::from([0usize, 2usize]);

        scene.apply_search(&matches, Color32::from_rgb(30, 60, 90));
        assert_ne!(scene.nodes[0].material, before[0]);
        assert_eq!(scene.nodes[1].material, before[1]);

        scene.clear_search();
        for (node, original) in scene.nodes.iter().zip(&before) {
            assert_eq!(node.material, *original);
        }
    }

    #[test]
    fn layers_do_not_corrupt_each_other() {
        let mut scene = Scene::default();
        build(&mut scene);
        let original = scene.nodes[1].material;

        // Search under an active hover, then clear in either order.
        scene.apply_hover(1);
        let hovered = scene.nodes[1].material;
        scene.apply_search(&HashSet::from([1usize]), Color32::from_rgb(30, 60, 90));
        assert_eq!(scene.nodes[1].material, hovered, "hover stays on top");

        scene.clear_search();
        scene.clear_hover();
        assert_eq!(scene.nodes[1].material, original);

        scene.apply_hover(1);
        scene.apply_search(&HashSet::from([1usize]), Color32::from_rgb(30, 60, 90));
        scene.clear_hover();
        assert_ne!(scene.nodes[1].material, original, "search still applied");
        scene.clear_search();
        assert_eq!(scene.nodes[1].material, original);
    }

    #[test]
    fn set_link_opacity_respects_hover_override() {
        let mut scene = Scene::default();
        build(&mut scene);

        scene.apply_hover(0);
        scene.set_link_opacity(0.7);

        let touched = scene.edges.iter().find(|e| e.touches(0)).unwrap();
        assert_eq!(touched.material.opacity, EDGE_ACCENT_OPACITY);
        scene.clear_hover();
        let touched = scene.edges.iter().find(|e| e.touches(0)).unwrap();
        assert_eq!(touched.material.opacity, 0.7);
    }
}
