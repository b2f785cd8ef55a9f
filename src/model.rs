//! Data model shared by every pipeline stage.
//!
//! The in-memory graph is a [`TaskGraph`] over [`TaskNode`] and
//! [`DependencyEdge`] weights. The movement log side contributes
//! [`MovementEvent`] and [`TargetRegion`]. The merger flattens both into an
//! [`EnrichedArtifact`], which is the only structure that ever leaves the
//! process.

use petgraph::stable_graph::StableDiGraph;
use serde::Serialize;
use serde_json::{Map, Value};

/// Node attribute holding the task identity assigned by the trace writer.
/// The writer pre-allocates vertices and leaves unused ones at id `0`, so a
/// zero here marks a placeholder with no task semantics.
pub const VERTEX_ID: &str = "vertex_id";

/// The `vertex_id` value of a sentinel node.
pub const SENTINEL_VERTEX_ID: i64 = 0;

/// Directed task-dependency graph. Stable indices let the sanitizer remove
/// sentinel nodes without invalidating the survivors.
pub type TaskGraph = StableDiGraph<TaskNode, DependencyEdge>;

/// One task-creation or synchronization point recorded by the tracer.
///
/// Attributes are carried verbatim from the trace file (`vertex_id`,
/// `end_event`, `has_race`, `race_stack`, ...), typed according to the
/// declarations in the file header. `active` and `hidden` exist purely for
/// the visualizer and are normalized by the annotator.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    /// Node identifier from the trace file, e.g. `n42`.
    pub id: String,
    /// Trace-provided attributes, preserved as-is.
    pub attrs: Map<String, Value>,
    pub active: bool,
    pub hidden: bool,
}

impl TaskNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: Map::new(),
            active: true,
            hidden: false,
        }
    }

    /// The `vertex_id` attribute, if present and integral. A node without
    /// one is treated as a real task, never as a sentinel.
    pub fn vertex_id(&self) -> Option<i64> {
        self.attrs.get(VERTEX_ID).and_then(Value::as_i64)
    }

    /// Whether this node is a tracer placeholder to be discarded.
    pub fn is_sentinel(&self) -> bool {
        self.vertex_id() == Some(SENTINEL_VERTEX_ID)
    }
}

/// One ordering constraint between two tasks. The tracer labels these with an
/// `edge_type` attribute (CONT, FORK_I, FORK_E, JOIN, JOIN_E, BARRIER,
/// TARGET), carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    pub attrs: Map<String, Value>,
    pub hidden: bool,
}

impl DependencyEdge {
    pub fn new() -> Self {
        Self {
            attrs: Map::new(),
            hidden: false,
        }
    }
}

impl Default for DependencyEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded data-copy occurrence. Addresses and the flag are opaque
/// tokens; only the byte count is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementEvent {
    pub orig_address: String,
    pub dest_address: String,
    pub bytes: u64,
    pub flag: String,
}

/// A bracketed span of execution between a begin marker and the next one,
/// holding the movement events observed inside it in temporal order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRegion {
    pub begin_node: String,
    pub end_node: String,
    pub datamove: Vec<MovementEvent>,
}

impl TargetRegion {
    pub fn new(begin_node: impl Into<String>, end_node: impl Into<String>) -> Self {
        Self {
            begin_node: begin_node.into(),
            end_node: end_node.into(),
            datamove: Vec::new(),
        }
    }
}

/// Serialized view of a [`TaskNode`]: the original attributes, the
/// visualization flags, and the node identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
    pub active: bool,
    pub hidden: bool,
    pub id: String,
}

/// Serialized view of a [`DependencyEdge`] with its resolved endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
    pub hidden: bool,
}

/// The terminal output of the pipeline. Assembled once, persisted once,
/// never reloaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedArtifact {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub target: Vec<TargetRegion>,
}
