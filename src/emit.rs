//! Artifact persistence.

use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::context::RunContext;
use crate::error::EmitError;
use crate::model::EnrichedArtifact;

/// Serialize the artifact and write it to the context's artifact path.
///
/// Returns the written path, or `None` in test mode, where everything up to
/// and including serialization still runs so a dry run exercises the full
/// pipeline. The file name carries the run timestamp, so separate runs never
/// overwrite each other.
pub fn emit(ctx: &RunContext, artifact: &EnrichedArtifact) -> Result<Option<Utf8PathBuf>, EmitError> {
    let json = to_pretty_json(artifact)?;

    if ctx.test_mode {
        tracing::info!("Conversion completed. Only a test, no artifact written");
        return Ok(None);
    }

    let path = ctx.artifact_path();
    fs::create_dir_all(&ctx.data_dir)?;
    fs::write(&path, json)?;

    tracing::info!("Conversion completed. Artifact saved as {path}");
    Ok(Some(path))
}

/// Pretty-print with a 4-space indent, matching what the visualizer and its
/// fixtures already expect.
fn to_pretty_json(artifact: &EnrichedArtifact) -> Result<Vec<u8>, EmitError> {
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    artifact.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod test {
    use camino::Utf8Path;

    use super::*;
    use crate::merge::merge;
    use crate::model::{TargetRegion, TaskGraph, TaskNode};

    fn sample_artifact() -> EnrichedArtifact {
        let mut graph = TaskGraph::default();
        graph.add_node(TaskNode::new("n1"));
        merge(&graph, vec![TargetRegion::new("n1", "n2")])
    }

    #[test]
    fn writes_to_timestamped_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let ctx = RunContext::with_timestamp(root, None, false, "240101-120000");

        let path = emit(&ctx, &sample_artifact()).unwrap().unwrap();

        assert_eq!(path.file_name(), Some("output240101-120000.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["nodes"][0]["id"], "n1");
        assert_eq!(value["target"][0]["begin_node"], "n1");
        // 4-space indent, not serde_json's default 2.
        assert!(written.contains("\n    \"nodes\""));
    }

    #[test]
    fn test_mode_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let ctx = RunContext::with_timestamp(root, None, true, "240101-120000");

        let path = emit(&ctx, &sample_artifact()).unwrap();

        assert!(path.is_none());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn top_level_keys_are_nodes_links_target() {
        let json = String::from_utf8(to_pretty_json(&sample_artifact()).unwrap()).unwrap();
        let nodes = json.find("\"nodes\"").unwrap();
        let links = json.find("\"links\"").unwrap();
        let target = json.find("\"target\"").unwrap();
        assert!(nodes < links && links < target);
    }
}
