//! Ingest of the dependency-analysis artifact produced by the external
//! analyser, and the in-memory module graph derived from it.

mod artifact;
mod error;
mod graph;
mod load;

pub use error::IngestError;
pub use graph::{
    CallKind, CallRecord, Direction, MethodKind, MethodRecord, ModuleGraph, ModuleNode,
    NodeCategory, ParamRecord, SourceSpan,
};
pub use load::load_artifact;

#[cfg(test)]
pub(crate) use load::ingest_value;
