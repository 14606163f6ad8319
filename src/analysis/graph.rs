use std::collections::{HashMap, HashSet, VecDeque};

/// Base render size before the log-scaled size factor is applied.
const LIBRARY_BASE_SIZE: f32 = 4.5;
const FILE_BASE_SIZE: f32 = 3.5;

/// What kind of unit a graph node is. The `library:` id sentinel from the
/// artifact is folded into this sum type at ingest; nothing downstream
/// string-sniffs ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeCategory {
    /// A source file, tagged with its extension (including the leading dot).
    File(String),
    /// An external package.
    Library(String),
}

impl NodeCategory {
    pub fn is_library(&self) -> bool {
        matches!(self, Self::Library(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::File(ext) => ext,
            Self::Library(_) => "library",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModuleNode {
    /// Stable identity: the file path, or the raw `library:<name>` token.
    pub id: String,
    pub name: String,
    pub path: String,
    pub category: NodeCategory,
    pub size: u64,
    /// Derived draw radius in world units.
    pub render_size: f32,
    /// In-degree plus out-degree, filled once edges are indexed.
    pub connections: usize,
}

impl ModuleNode {
    pub(super) fn render_size_for(category: &NodeCategory, size: u64) -> f32 {
        let base = if category.is_library() {
            LIBRARY_BASE_SIZE
        } else {
            FILE_BASE_SIZE
        };
        let scale = (size.max(1) as f32).ln() / 10_000.0_f32.ln();
        base * (1.0 + scale * 0.5)
    }
}

/// Traversal direction for reachability queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Function,
    Method,
    Arrow,
}

impl MethodKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Arrow => "arrow",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParamRecord {
    pub name: String,
    pub ty: Option<String>,
    pub default_value: Option<String>,
    pub rest: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

#[derive(Clone, Debug)]
pub struct MethodRecord {
    pub name: String,
    pub kind: MethodKind,
    pub class: Option<String>,
    pub params: Vec<ParamRecord>,
    pub loc: Option<SourceSpan>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Local,
    Imported,
}

#[derive(Clone, Debug)]
pub struct CallRecord {
    pub name: String,
    pub kind: CallKind,
    pub module: Option<String>,
}

/// Arena-backed module graph. Nodes and edges live in flat vectors and every
/// derived structure (`out_edges`, `in_edges`, scene objects) refers to them
/// by index, so a graph reload is a wholesale swap.
#[derive(Clone, Debug, Default)]
pub struct ModuleGraph {
    pub nodes: Vec<ModuleNode>,
    /// Directed edges, unique per (source, target): source imports target.
    pub edges: Vec<(usize, usize)>,
    pub index_by_id: HashMap<String, usize>,
    pub out_edges: Vec<Vec<usize>>,
    pub in_edges: Vec<Vec<usize>>,
    /// Observed file extensions, for the category filter dropdown.
    pub file_types: Vec<String>,
    /// External package names, for the library filter dropdown.
    pub libraries: Vec<String>,
    /// Declared functions/methods per file id.
    pub methods: HashMap<String, Vec<MethodRecord>>,
    /// Per file id, per method name, the calls it makes.
    pub method_calls: HashMap<String, HashMap<String, Vec<CallRecord>>>,
}

impl ModuleGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn dependency_count(&self, index: usize) -> usize {
        self.out_edges.get(index).map_or(0, Vec::len)
    }

    pub fn dependent_count(&self, index: usize) -> usize {
        self.in_edges.get(index).map_or(0, Vec::len)
    }

    /// Every node reachable from `seeds` along `direction`, seeds included.
    /// Worklist traversal; each node enters the result at most once, so
    /// cycles terminate.
    pub fn transitive_closure(&self, seeds: &[usize], direction: Direction) -> HashSet<usize> {
        let mut reached = HashSet::new();
        let mut queue = VecDeque::new();

        for &seed in seeds {
            if seed < self.nodes.len() && reached.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(current) = queue.pop_front() {
            let forward = matches!(direction, Direction::Out | Direction::Both)
                .then(|| self.out_edges[current].iter());
            let backward = matches!(direction, Direction::In | Direction::Both)
                .then(|| self.in_edges[current].iter());

            for &next in forward.into_iter().flatten().chain(backward.into_iter().flatten()) {
                if reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reached
    }

    pub fn methods_for(&self, id: &str) -> &[MethodRecord] {
        self.methods.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn calls_for(&self, id: &str) -> Option<&HashMap<String, Vec<CallRecord>>> {
        self.method_calls.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ingest_value;

    fn chain_graph() -> ModuleGraph {
        // a -> b -> a cycle plus a tail.
        ingest_value(serde_json::json!({
            "nodeInfo": {
                "a": {"name": "a", "path": "a", "type": ".js", "size": 10},
                "b": {"name": "b", "path": "b", "type": ".js", "size": 10},
                "c": {"name": "c", "path": "c", "type": ".js", "size": 10}
            },
            "dependencies": {"a": ["b"], "b": ["a", "c"]}
        }))
        .expect("valid artifact")
    }

    #[test]
    fn indices_stay_in_sync_with_edge_list() {
        let graph = chain_graph();
        for &(source, target) in &graph.edges {
            assert!(graph.out_edges[source].contains(&target));
            assert!(graph.in_edges[target].contains(&source));
        }
        let forward: usize = graph.out_edges.iter().map(Vec::len).sum();
        let backward: usize = graph.in_edges.iter().map(Vec::len).sum();
        assert_eq!(forward, graph.edges.len());
        assert_eq!(backward, graph.edges.len());
    }

    #[test]
    fn closure_terminates_on_cycles() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let reached = graph.transitive_closure(&[a], Direction::Out);
        assert_eq!(reached.len(), 3);
    }

    #[test]
    fn closure_is_idempotent_and_a_superset_of_seeds() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let once = graph.transitive_closure(&[a], Direction::Both);
        assert!(once.contains(&a));

        let seeds = once.iter().copied().collect::<Vec<_>>();
        let twice = graph.transitive_closure(&seeds, Direction::Both);
        assert_eq!(once, twice);
    }

    #[test]
    fn closure_ignores_out_of_range_seeds() {
        let graph = chain_graph();
        let reached = graph.transitive_closure(&[999], Direction::Out);
        assert!(reached.is_empty());
    }

    #[test]
    fn render_size_grows_with_byte_size() {
        let file = NodeCategory::File(".ts".to_owned());
        let small = ModuleNode::render_size_for(&file, 10);
        let large = ModuleNode::render_size_for(&file, 100_000);
        assert!(large > small);
        assert!(small >= FILE_BASE_SIZE);

        let library = NodeCategory::Library("lodash".to_owned());
        assert!(ModuleNode::render_size_for(&library, 10) > small);
    }
}
