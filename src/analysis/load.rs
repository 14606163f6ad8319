use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::artifact::{RawArtifact, RawMethod, RawParam};
use super::error::IngestError;
use super::graph::{
    CallKind, CallRecord, MethodKind, MethodRecord, ModuleGraph, ModuleNode, NodeCategory,
    ParamRecord, SourceSpan,
};

/// Reads and ingests an artifact file. IO and JSON problems carry the file
/// path as context; structural problems surface as [`IngestError`].
pub fn load_artifact(path: &Path) -> Result<ModuleGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read artifact {}", path.display()))?;
    let artifact: RawArtifact = serde_json::from_str(&raw)
        .map_err(IngestError::Json)
        .with_context(|| format!("failed to parse artifact {}", path.display()))?;

    let graph = ingest(artifact)?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "artifact ingested"
    );
    Ok(graph)
}

/// Test helper: ingest directly from a JSON value.
#[cfg(test)]
pub fn ingest_value(value: serde_json::Value) -> Result<ModuleGraph, IngestError> {
    let artifact: RawArtifact = serde_json::from_value(value)?;
    ingest(artifact)
}

const LIBRARY_PREFIX: &str = "library:";

fn category_for(id: &str, kind: Option<&str>, name: &str) -> NodeCategory {
    if let Some(package) = id.strip_prefix(LIBRARY_PREFIX) {
        return NodeCategory::Library(package.to_owned());
    }
    match kind {
        Some("library") => NodeCategory::Library(name.to_owned()),
        Some(ext) if !ext.is_empty() => NodeCategory::File(ext.to_owned()),
        _ => {
            let ext = id
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{ext}"))
                .unwrap_or_default();
            NodeCategory::File(ext)
        }
    }
}

fn method_record(raw: RawMethod) -> MethodRecord {
    let kind = match raw.kind.as_deref() {
        Some("method") => MethodKind::Method,
        Some("arrow") => MethodKind::Arrow,
        _ => MethodKind::Function,
    };

    MethodRecord {
        name: raw.name,
        kind,
        class: raw.class,
        params: raw.params.into_iter().map(param_record).collect(),
        loc: raw.loc.map(|loc| SourceSpan {
            start_line: loc.start.line,
            start_col: loc.start.col,
            end_line: loc.end.line,
            end_col: loc.end.col,
        }),
    }
}

fn param_record(raw: RawParam) -> ParamRecord {
    ParamRecord {
        name: raw.name,
        ty: raw.ty,
        default_value: raw.default_value,
        rest: raw.rest,
    }
}

/// Builds the arena graph from the raw artifact. Idempotent with respect to
/// the caller: the returned graph carries no references into prior state.
///
/// Unknown edge endpoints are dropped with a debug log. Duplicate and self
/// edges are dropped silently.
pub(super) fn ingest(artifact: RawArtifact) -> Result<ModuleGraph, IngestError> {
    let node_info = artifact.node_info.ok_or(IngestError::MissingNodeInfo)?;
    let dependencies = artifact
        .dependencies
        .ok_or(IngestError::MissingDependencies)?;
    if node_info.is_empty() {
        return Err(IngestError::EmptyGraph);
    }

    // HashMap iteration order is arbitrary; sort ids so arena indices are
    // stable across loads of the same artifact.
    let mut ids = node_info.keys().cloned().collect::<Vec<_>>();
    ids.sort();

    let mut nodes = Vec::with_capacity(ids.len());
    let mut index_by_id = HashMap::with_capacity(ids.len());
    for id in &ids {
        let raw = &node_info[id];
        let path = raw.path.clone().unwrap_or_else(|| id.clone());
        let name = raw.name.clone().unwrap_or_else(|| {
            id.strip_prefix(LIBRARY_PREFIX)
                .unwrap_or_else(|| crate::util::short_name(id))
                .to_owned()
        });
        let category = category_for(id, raw.kind.as_deref(), &name);
        let render_size = ModuleNode::render_size_for(&category, raw.size);

        index_by_id.insert(id.clone(), nodes.len());
        nodes.push(ModuleNode {
            id: id.clone(),
            name,
            path,
            category,
            size: raw.size,
            render_size,
            connections: 0,
        });
    }

    let mut sources = dependencies.keys().cloned().collect::<Vec<_>>();
    sources.sort();

    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    for source_id in &sources {
        let Some(&source) = index_by_id.get(source_id) else {
            debug!(source = %source_id, "dropping edges from unknown source");
            continue;
        };

        for target_id in &dependencies[source_id] {
            let Some(&target) = index_by_id.get(target_id) else {
                debug!(source = %source_id, target = %target_id, "dropping edge to unknown target");
                continue;
            };
            if source != target && seen.insert((source, target)) {
                edges.push((source, target));
            }
        }
    }

    let mut out_edges = vec![Vec::new(); nodes.len()];
    let mut in_edges = vec![Vec::new(); nodes.len()];
    for &(source, target) in &edges {
        out_edges[source].push(target);
        in_edges[target].push(source);
    }
    for (index, node) in nodes.iter_mut().enumerate() {
        node.connections = out_edges[index].len() + in_edges[index].len();
    }

    let mut file_types = artifact.file_types;
    file_types.sort();
    file_types.dedup();
    let mut libraries = artifact.libraries;
    libraries.sort();
    libraries.dedup();

    let methods = artifact
        .method_info
        .into_iter()
        .map(|(file, table)| {
            (
                file,
                table.methods.into_iter().map(method_record).collect(),
            )
        })
        .collect();

    let method_calls = artifact
        .method_dependencies
        .into_iter()
        .map(|(file, by_method)| {
            let calls = by_method
                .into_iter()
                .map(|(method, raw_calls)| {
                    let records = raw_calls
                        .into_iter()
                        .map(|raw| CallRecord {
                            name: raw.name,
                            kind: match raw.kind.as_deref() {
                                Some("imported") => CallKind::Imported,
                                _ => CallKind::Local,
                            },
                            module: raw.module.or(raw.source),
                        })
                        .collect();
                    (method, records)
                })
                .collect();
            (file, calls)
        })
        .collect();

    Ok(ModuleGraph {
        nodes,
        edges,
        index_by_id,
        out_edges,
        in_edges,
        file_types,
        libraries,
        methods,
        method_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trivial_graph_builds_both_indices() {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "a": {"name": "a", "path": "a", "type": ".js", "size": 1000},
                "b": {"name": "b", "path": "b", "type": ".js", "size": 2000}
            },
            "dependencies": {"a": ["b"]}
        }))
        .unwrap();

        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();
        assert_eq!(graph.out_edges[a], vec![b]);
        assert_eq!(graph.in_edges[b], vec![a]);
        assert_eq!(graph.dependency_count(a), 1);
        assert_eq!(graph.dependent_count(b), 1);
        assert_eq!(graph.nodes[a].connections, 1);
        assert_eq!(graph.nodes[b].connections, 1);
    }

    #[test]
    fn cycle_closure_terminates() {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "a": {"type": ".js", "size": 1},
                "b": {"type": ".js", "size": 1}
            },
            "dependencies": {"a": ["b"], "b": ["a"]}
        }))
        .unwrap();

        let a = graph.index_of("a").unwrap();
        let reached = graph.transitive_closure(&[a], super::super::Direction::Out);
        assert_eq!(reached.len(), 2);
    }

    #[test]
    fn unknown_target_is_dropped_not_fatal() {
        let graph = ingest_value(json!({
            "nodeInfo": {"a": {"type": ".js", "size": 1}},
            "dependencies": {"a": ["ghost"]}
        }))
        .unwrap();

        let a = graph.index_of("a").unwrap();
        assert!(graph.out_edges[a].is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_and_self_edges_are_dropped() {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "a": {"type": ".js", "size": 1},
                "b": {"type": ".js", "size": 1}
            },
            "dependencies": {"a": ["b", "b", "a"]}
        }))
        .unwrap();

        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn library_sentinel_becomes_sum_type() {
        let graph = ingest_value(json!({
            "nodeInfo": {
                "library:lodash": {"name": "lodash", "path": "library:lodash", "type": "library", "size": 5000},
                "src/a.ts": {"name": "a.ts", "path": "src/a.ts", "type": ".ts", "size": 100}
            },
            "dependencies": {"src/a.ts": ["library:lodash"]},
            "libraries": ["lodash"]
        }))
        .unwrap();

        let lib = graph.index_of("library:lodash").unwrap();
        assert_eq!(
            graph.nodes[lib].category,
            NodeCategory::Library("lodash".to_owned())
        );
        assert_eq!(graph.nodes[lib].name, "lodash");

        let file = graph.index_of("src/a.ts").unwrap();
        assert_eq!(
            graph.nodes[file].category,
            NodeCategory::File(".ts".to_owned())
        );
    }

    #[test]
    fn missing_tables_are_fatal() {
        assert!(matches!(
            ingest_value(json!({"dependencies": {}})),
            Err(IngestError::MissingNodeInfo)
        ));
        assert!(matches!(
            ingest_value(json!({"nodeInfo": {"a": {"size": 1}}})),
            Err(IngestError::MissingDependencies)
        ));
    }

    #[test]
    fn load_artifact_round_trips_through_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "nodeInfo": {
                    "a": {"type": ".ts", "size": 10},
                    "b": {"type": ".ts", "size": 20}
                },
                "dependencies": {"a": ["b"]}
            })
        )
        .unwrap();

        let graph = load_artifact(file.path()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn load_artifact_reports_io_and_parse_failures() {
        use std::io::Write;

        assert!(load_artifact(Path::new("/nonexistent/artifact.json")).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_artifact(file.path()).is_err());
    }

    #[test]
    fn method_tables_are_ingested() {
        let graph = ingest_value(json!({
            "nodeInfo": {"src/a.ts": {"type": ".ts", "size": 1}},
            "dependencies": {},
            "methodInfo": {
                "src/a.ts": {"methods": [
                    {"name": "run", "type": "function",
                     "params": [{"name": "input", "type": "string"}],
                     "loc": {"start": {"line": 1, "col": 0}, "end": {"line": 9, "col": 1}}},
                    {"name": "tick", "type": "method", "class": "Engine"}
                ]}
            },
            "methodDependencies": {
                "src/a.ts": {"run": [
                    {"name": "tick", "type": "local"},
                    {"name": "debounce", "type": "imported", "module": "lodash"}
                ]}
            }
        }))
        .unwrap();

        let methods = graph.methods_for("src/a.ts");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].kind, MethodKind::Function);
        assert_eq!(methods[0].params[0].name, "input");
        assert_eq!(methods[1].class.as_deref(), Some("Engine"));

        let calls = graph.calls_for("src/a.ts").unwrap();
        let run_calls = &calls["run"];
        assert_eq!(run_calls.len(), 2);
        assert_eq!(run_calls[0].kind, CallKind::Local);
        assert_eq!(run_calls[1].kind, CallKind::Imported);
        assert_eq!(run_calls[1].module.as_deref(), Some("lodash"));
    }
}
