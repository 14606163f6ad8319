use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Width of the cube nodes are scattered in before iteration starts.
const INITIAL_SPREAD: f32 = 1000.0;
/// Hookean attraction constant along edges.
const ATTRACTION_K: f32 = 0.05;
/// Per-step displacement cap; keeps near-coincident nodes from being flung
/// out of the scene by the singular repulsion term.
const MAX_STEP: f32 = 100.0;

pub const MAIN_ITERATIONS: usize = 150;
pub const PANEL_ITERATIONS: usize = 50;

const RADIAL_IDEAL_RADIUS: f32 = 100.0;
const RADIAL_BAND: (f32, f32) = (50.0, 150.0);
const RADIAL_CENTER_PULL: f32 = 0.3;
const RADIAL_RING_SPRING: f32 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimensionality {
    Planar,
    Volumetric,
}

impl Dimensionality {
    fn repulsion(self) -> f32 {
        match self {
            Self::Planar => 3000.0,
            Self::Volumetric => 2000.0,
        }
    }
}

/// Positional state the layout mutates. Pinned nodes keep whatever position
/// they were given and never accumulate force.
#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutNode {
    pub position: Vec3,
    pub force: Vec3,
    pub pinned: bool,
}

impl LayoutNode {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn pinned_at(position: Vec3) -> Self {
        Self {
            position,
            force: Vec3::ZERO,
            pinned: true,
        }
    }
}

/// Capability the scene builder consumes; variants differ in force rules,
/// not in protocol.
pub trait Layout {
    fn iterations(&self) -> usize;
    fn initialize(&mut self, nodes: &mut [LayoutNode]);
    fn step(&mut self, iteration: usize, nodes: &mut [LayoutNode], edges: &[(usize, usize)]);
    fn finalize(&self, nodes: &mut [LayoutNode]);
}

pub fn run(layout: &mut dyn Layout, nodes: &mut [LayoutNode], edges: &[(usize, usize)]) {
    layout.initialize(nodes);
    for iteration in 0..layout.iterations() {
        layout.step(iteration, nodes, edges);
    }
    layout.finalize(nodes);
}

fn scatter(rng: &mut StdRng, dims: Dimensionality, nodes: &mut [LayoutNode]) {
    let half = INITIAL_SPREAD / 2.0;
    for node in nodes.iter_mut() {
        if node.pinned {
            continue;
        }
        node.position = Vec3::new(
            rng.gen_range(-half..half),
            rng.gen_range(-half..half),
            match dims {
                Dimensionality::Planar => 0.0,
                Dimensionality::Volumetric => rng.gen_range(-half..half),
            },
        );
        node.force = Vec3::ZERO;
    }
}

fn repulsion_between(a: Vec3, b: Vec3, strength: f32) -> Vec3 {
    let delta = a - b;
    let distance = delta.length().max(0.0001);
    let unit = delta / distance;
    unit * (strength / (distance.powf(1.8) + 0.1))
}

fn attract_edges(nodes: &mut [LayoutNode], edges: &[(usize, usize)]) {
    for &(source, target) in edges {
        if source >= nodes.len() || target >= nodes.len() || source == target {
            continue;
        }
        let delta = nodes[target].position - nodes[source].position;
        let pull = delta * ATTRACTION_K;
        nodes[source].force += pull;
        nodes[target].force -= pull;
    }
}

fn apply_displacement(
    nodes: &mut [LayoutNode],
    iteration: usize,
    iterations: usize,
    dims: Dimensionality,
) {
    let cooling = 1.0 - (iteration as f32 / iterations.max(1) as f32);
    for node in nodes.iter_mut() {
        if node.pinned {
            node.force = Vec3::ZERO;
            continue;
        }
        let mut step = node.force * cooling;
        let length = step.length();
        if length > MAX_STEP {
            step *= MAX_STEP / length;
        }
        node.position += step;
        if dims == Dimensionality::Planar {
            node.position.z = 0.0;
        }
        node.force = Vec3::ZERO;
    }
}

/// Uniform force-directed layout: pairwise repulsion, Hookean edge
/// attraction, linear cooling, centroid recentring.
pub struct ForceLayout {
    dims: Dimensionality,
    iterations: usize,
    rng: StdRng,
}

impl ForceLayout {
    pub fn new(dims: Dimensionality, iterations: usize) -> Self {
        Self {
            dims,
            iterations,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant; layout is a pure function of the seed.
    pub fn with_seed(dims: Dimensionality, iterations: usize, seed: u64) -> Self {
        Self {
            dims,
            iterations,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Layout for ForceLayout {
    fn iterations(&self) -> usize {
        self.iterations
    }

    fn initialize(&mut self, nodes: &mut [LayoutNode]) {
        scatter(&mut self.rng, self.dims, nodes);
    }

    fn step(&mut self, iteration: usize, nodes: &mut [LayoutNode], edges: &[(usize, usize)]) {
        let strength = self.dims.repulsion();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let push = repulsion_between(nodes[i].position, nodes[j].position, strength);
                nodes[i].force += push;
                nodes[j].force -= push;
            }
        }

        attract_edges(nodes, edges);
        apply_displacement(nodes, iteration, self.iterations, self.dims);
    }

    fn finalize(&self, nodes: &mut [LayoutNode]) {
        if nodes.is_empty() {
            return;
        }
        let centroid = nodes.iter().map(|node| node.position).sum::<Vec3>() / nodes.len() as f32;
        for node in nodes.iter_mut() {
            node.position -= centroid;
            if self.dims == Dimensionality::Planar {
                node.position.z = 0.0;
            }
        }
    }
}

/// Radial variant for ego-graphs: one pinned centre at the origin, excluded
/// from repulsion; satellites get a centre pull and a spring toward an ideal
/// ring radius.
pub struct RadialLayout {
    dims: Dimensionality,
    iterations: usize,
    rng: StdRng,
}

impl RadialLayout {
    pub fn new(dims: Dimensionality) -> Self {
        Self {
            dims,
            iterations: PANEL_ITERATIONS,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(dims: Dimensionality, seed: u64) -> Self {
        Self {
            dims,
            iterations: PANEL_ITERATIONS,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Layout for RadialLayout {
    fn iterations(&self) -> usize {
        self.iterations
    }

    fn initialize(&mut self, nodes: &mut [LayoutNode]) {
        scatter(&mut self.rng, self.dims, nodes);
    }

    fn step(&mut self, iteration: usize, nodes: &mut [LayoutNode], edges: &[(usize, usize)]) {
        let strength = self.dims.repulsion();
        for i in 0..nodes.len() {
            if nodes[i].pinned {
                continue;
            }
            for j in (i + 1)..nodes.len() {
                if nodes[j].pinned {
                    continue;
                }
                let push = repulsion_between(nodes[i].position, nodes[j].position, strength);
                nodes[i].force += push;
                nodes[j].force -= push;
            }
        }

        for node in nodes.iter_mut() {
            if node.pinned {
                continue;
            }
            let radius = node.position.length();
            node.force -= node.position * RADIAL_CENTER_PULL;
            if radius > 0.0001 && !(RADIAL_BAND.0..=RADIAL_BAND.1).contains(&radius) {
                let unit = node.position / radius;
                node.force -= unit * (RADIAL_RING_SPRING * (radius - RADIAL_IDEAL_RADIUS));
            }
        }

        attract_edges(nodes, edges);
        apply_displacement(nodes, iteration, self.iterations, self.dims);
    }

    fn finalize(&self, nodes: &mut [LayoutNode]) {
        // The centre must stay at the origin, so no centroid recentring.
        if self.dims == Dimensionality::Planar {
            for node in nodes.iter_mut() {
                node.position.z = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_nodes(count: usize) -> Vec<LayoutNode> {
        vec![LayoutNode::free(); count]
    }

    #[test]
    fn planar_layout_keeps_z_zero() {
        let mut nodes = free_nodes(12);
        let edges = vec![(0, 1), (1, 2), (2, 3)];
        let mut layout = ForceLayout::with_seed(Dimensionality::Planar, 40, 7);
        run(&mut layout, &mut nodes, &edges);

        for node in &nodes {
            assert_eq!(node.position.z, 0.0);
            assert!(node.position.is_finite());
        }
    }

    #[test]
    fn volumetric_layout_uses_depth() {
        let mut nodes = free_nodes(12);
        let mut layout = ForceLayout::with_seed(Dimensionality::Volumetric, 40, 7);
        run(&mut layout, &mut nodes, &[]);

        assert!(nodes.iter().any(|node| node.position.z.abs() > 1.0));
    }

    #[test]
    fn force_layout_recenters_on_origin() {
        let mut nodes = free_nodes(9);
        let edges = vec![(0, 1), (0, 2), (3, 4)];
        let mut layout = ForceLayout::with_seed(Dimensionality::Planar, 60, 99);
        run(&mut layout, &mut nodes, &edges);

        let centroid = nodes.iter().map(|node| node.position).sum::<Vec3>() / nodes.len() as f32;
        assert!(centroid.length() < 0.01, "centroid {centroid:?}");
    }

    #[test]
    fn layout_is_deterministic_for_a_fixed_seed() {
        let edges = vec![(0, 1), (1, 2)];
        let mut first = free_nodes(5);
        let mut second = free_nodes(5);
        run(
            &mut ForceLayout::with_seed(Dimensionality::Volumetric, 30, 42),
            &mut first,
            &edges,
        );
        run(
            &mut ForceLayout::with_seed(Dimensionality::Volumetric, 30, 42),
            &mut second,
            &edges,
        );

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn radial_layout_pins_the_centre() {
        let mut nodes = vec![LayoutNode::pinned_at(Vec3::ZERO)];
        nodes.extend(free_nodes(6));
        let edges = (1..7).map(|i| (0usize, i)).collect::<Vec<_>>();

        let mut layout = RadialLayout::with_seed(Dimensionality::Planar, 3);
        run(&mut layout, &mut nodes, &edges);

        assert_eq!(nodes[0].position, Vec3::ZERO);
        for node in nodes.iter().skip(1) {
            let radius = node.position.length();
            assert!(radius > 1.0 && radius < 400.0, "radius {radius}");
            assert_eq!(node.position.z, 0.0);
        }
    }
}
