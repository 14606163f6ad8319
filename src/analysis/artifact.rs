use std::collections::HashMap;

use serde::Deserialize;

/// Raw shape of the Graph Data Object as emitted by the analyser. Field
/// presence is validated during ingest, not here; `nodeInfo` and
/// `dependencies` are the only mandatory tables.
#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawArtifact {
    #[serde(rename = "nodeInfo")]
    pub(super) node_info: Option<HashMap<String, RawNodeInfo>>,
    pub(super) dependencies: Option<HashMap<String, Vec<String>>>,
    #[serde(default, rename = "fileTypes")]
    pub(super) file_types: Vec<String>,
    #[serde(default)]
    pub(super) libraries: Vec<String>,
    #[serde(default, rename = "methodInfo")]
    pub(super) method_info: HashMap<String, RawMethodTable>,
    #[serde(default, rename = "methodDependencies")]
    pub(super) method_dependencies: HashMap<String, HashMap<String, Vec<RawCall>>>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNodeInfo {
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) path: Option<String>,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) size: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawMethodTable {
    #[serde(default)]
    pub(super) methods: Vec<RawMethod>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawMethod {
    pub(super) name: String,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) class: Option<String>,
    #[serde(default)]
    pub(super) params: Vec<RawParam>,
    #[serde(default)]
    pub(super) loc: Option<RawLoc>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawParam {
    pub(super) name: String,
    #[serde(default, rename = "type")]
    pub(super) ty: Option<String>,
    #[serde(default, rename = "defaultValue")]
    pub(super) default_value: Option<String>,
    #[serde(default)]
    pub(super) rest: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub(super) struct RawLoc {
    pub(super) start: RawPos,
    pub(super) end: RawPos,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub(super) struct RawPos {
    pub(super) line: u32,
    #[serde(alias = "column")]
    pub(super) col: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawCall {
    pub(super) name: String,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) module: Option<String>,
    #[serde(default)]
    pub(super) source: Option<String>,
}
