//! Visibility filtering over the module graph. Filters never mutate the
//! graph; they produce a per-node visibility mask the engine consumes.

use std::collections::HashSet;

use crate::analysis::{Direction, ModuleGraph};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Extension(String),
    Library,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LibraryFilter {
    #[default]
    Any,
    /// Keep modules whose path mentions this package, plus the package node.
    Package(String),
}

/// How the name filter expands across the dependency relation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DependencyMode {
    #[default]
    None,
    Dependencies,
    Dependents,
    Both,
}

impl DependencyMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Matches only",
            Self::Dependencies => "With dependencies",
            Self::Dependents => "With dependents",
            Self::Both => "With both",
        }
    }

    fn direction(self) -> Option<Direction> {
        match self {
            Self::None => None,
            Self::Dependencies => Some(Direction::Out),
            Self::Dependents => Some(Direction::In),
            Self::Both => Some(Direction::Both),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    pub category: CategoryFilter,
    pub library: LibraryFilter,
    pub name_contains: String,
    pub min_connections: usize,
    pub dependency_mode: DependencyMode,
}

impl FilterConfig {
    pub fn is_default(&self) -> bool {
        self.category == CategoryFilter::Any
            && self.library == LibraryFilter::Any
            && self.name_contains.is_empty()
            && self.min_connections == 0
            && self.dependency_mode == DependencyMode::None
    }
}

fn base_pass(graph: &ModuleGraph, config: &FilterConfig, index: usize) -> bool {
    let node = &graph.nodes[index];

    let category_ok = match &config.category {
        CategoryFilter::Any => true,
        CategoryFilter::Library => node.category.is_library(),
        CategoryFilter::Extension(ext) => node.category.label() == ext.as_str(),
    };
    if !category_ok {
        return false;
    }

    match &config.library {
        LibraryFilter::Any => {}
        LibraryFilter::Package(package) => {
            let in_path = node.path.contains(package.as_str());
            let is_package = node.category.is_library() && node.name == *package;
            if !in_path && !is_package {
                return false;
            }
        }
    }

    if !config.name_contains.is_empty() {
        let needle = config.name_contains.to_lowercase();
        if !node.name.to_lowercase().contains(&needle) {
            return false;
        }
    }

    node.connections >= config.min_connections
}

/// Computes the visibility mask for the current filter settings.
///
/// With a closure mode active, the base survivors seed a reachability pass
/// and visibility becomes exactly the reached set (seeds included). With no
/// closure mode, a non-empty name filter still keeps direct neighbours of
/// its matches so a lone match never floats contextless.
pub fn compute_visibility(graph: &ModuleGraph, config: &FilterConfig) -> Vec<bool> {
    let mut visible = (0..graph.node_count())
        .map(|index| base_pass(graph, config, index))
        .collect::<Vec<_>>();

    let seeds = visible
        .iter()
        .enumerate()
        .filter_map(|(index, keep)| keep.then_some(index))
        .collect::<Vec<_>>();

    match config.dependency_mode.direction() {
        Some(direction) => {
            let closure = graph.transitive_closure(&seeds, direction);
            for (index, keep) in visible.iter_mut().enumerate() {
                *keep = closure.contains(&index);
            }
        }
        None if !config.name_contains.is_empty() => {
            let mut neighbours = HashSet::new();
            for &seed in &seeds {
                neighbours.extend(graph.out_edges[seed].iter().copied());
                neighbours.extend(graph.in_edges[seed].iter().copied());
            }
            for index in neighbours {
                visible[index] = true;
            }
        }
        None => {}
    }

    visible
}
