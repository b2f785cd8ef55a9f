//! Loader for the raw dependency graph.
//!
//! The trace writer dumps its graph as GraphML: a header of `<key>`
//! declarations naming each attribute and its type, followed by `<node>` and
//! `<edge>` elements carrying `<data>` children. This module reads that
//! dialect into a [`TaskGraph`], typing attribute values according to the
//! declarations. Anything outside that subset (descriptions, defaults,
//! nested graphs) is skipped.
//!
//! Any failure here is fatal for the run; a graph that cannot be loaded
//! leaves nothing to enrich.

use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;

use crate::error::GraphLoadError;
use crate::model::{DependencyEdge, TaskGraph, TaskNode};

/// Declared type of a GraphML attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrType {
    Int,
    Float,
    Bool,
    Str,
}

impl AttrType {
    fn from_decl(decl: &str) -> Self {
        match decl {
            "int" | "long" => AttrType::Int,
            "float" | "double" => AttrType::Float,
            "boolean" => AttrType::Bool,
            _ => AttrType::Str,
        }
    }

    fn name(self) -> &'static str {
        match self {
            AttrType::Int => "integer",
            AttrType::Float => "float",
            AttrType::Bool => "boolean",
            AttrType::Str => "string",
        }
    }

    fn parse(self, key: &str, raw: &str) -> Result<Value, GraphLoadError> {
        let value = match self {
            AttrType::Int => raw.parse::<i64>().map(Value::from).ok(),
            AttrType::Float => raw.parse::<f64>().map(Value::from).ok(),
            AttrType::Bool => raw.parse::<bool>().map(Value::from).ok(),
            AttrType::Str => Some(Value::from(raw)),
        };

        value.ok_or_else(|| GraphLoadError::Value {
            key: key.to_string(),
            ty: self.name(),
            value: raw.to_string(),
        })
    }
}

/// One `<key>` declaration: maps a key id to an attribute name and type.
#[derive(Debug, Clone)]
struct KeyDecl {
    name: String,
    ty: AttrType,
}

/// The element currently accumulating `<data>` values.
enum Open {
    Node(TaskNode),
    Edge {
        source: String,
        target: String,
        edge: DependencyEdge,
    },
}

/// Load and parse a raw dependency graph from disk.
pub fn load_graph(path: &Utf8Path) -> Result<TaskGraph, GraphLoadError> {
    let text = fs::read_to_string(path)?;
    parse_graphml(&text)
}

/// Parse GraphML markup into a [`TaskGraph`].
pub fn parse_graphml(text: &str) -> Result<TaskGraph, GraphLoadError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut graph = TaskGraph::default();
    let mut indices = HashMap::new();
    let mut keys: HashMap<String, KeyDecl> = HashMap::new();

    let mut open: Option<Open> = None;
    // (key id, accumulated text) of the <data> element being read.
    let mut data: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"key" => {
                let id = require_attr(&e, "id", "key")?;
                let name = require_attr(&e, "attr.name", "key")?;
                let ty = attr_of(&e, "attr.type")?
                    .map(|decl| AttrType::from_decl(&decl))
                    .unwrap_or(AttrType::Str);
                keys.insert(id, KeyDecl { name, ty });
            }

            Event::Start(e) if e.local_name().as_ref() == b"node" => {
                let id = require_attr(&e, "id", "node")?;
                open = Some(Open::Node(TaskNode::new(id)));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"node" => {
                let id = require_attr(&e, "id", "node")?;
                let node = TaskNode::new(id);
                indices.insert(node.id.clone(), graph.add_node(node));
            }
            Event::End(e) if e.local_name().as_ref() == b"node" => {
                match open.take() {
                    Some(Open::Node(node)) => {
                        indices.insert(node.id.clone(), graph.add_node(node));
                    }
                    _ => return Err(GraphLoadError::Structure("node")),
                }
            }

            Event::Start(e) if e.local_name().as_ref() == b"edge" => {
                let (source, target, edge) = open_edge(&e)?;
                open = Some(Open::Edge {
                    source,
                    target,
                    edge,
                });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"edge" => {
                let (source, target, edge) = open_edge(&e)?;
                add_edge(&mut graph, &indices, source, target, edge)?;
            }
            Event::End(e) if e.local_name().as_ref() == b"edge" => {
                match open.take() {
                    Some(Open::Edge {
                        source,
                        target,
                        edge,
                    }) => add_edge(&mut graph, &indices, source, target, edge)?,
                    _ => return Err(GraphLoadError::Structure("edge")),
                }
            }

            Event::Start(e) if e.local_name().as_ref() == b"data" => {
                let key = require_attr(&e, "key", "data")?;
                data = Some((key, String::new()));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"data" => {
                let key = require_attr(&e, "key", "data")?;
                store_data(&mut open, &keys, &key, "")?;
            }
            Event::Text(e) => {
                if let Some((_, text)) = data.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"data" => {
                let (key, text) = data.take().ok_or(GraphLoadError::Structure("data"))?;
                store_data(&mut open, &keys, &key, &text)?;
            }

            Event::Eof => break,
            _ => (),
        }
    }

    Ok(graph)
}

fn open_edge(e: &BytesStart) -> Result<(String, String, DependencyEdge), GraphLoadError> {
    let source = require_attr(e, "source", "edge")?;
    let target = require_attr(e, "target", "edge")?;
    let mut edge = DependencyEdge::new();

    // The trace writer numbers its edges; keep the id around like any other
    // attribute.
    if let Some(id) = attr_of(e, "id")? {
        edge.attrs.insert("id".to_string(), Value::from(id));
    }

    Ok((source, target, edge))
}

fn add_edge(
    graph: &mut TaskGraph,
    indices: &HashMap<String, petgraph::stable_graph::NodeIndex>,
    source: String,
    target: String,
    edge: DependencyEdge,
) -> Result<(), GraphLoadError> {
    let s = *indices
        .get(&source)
        .ok_or(GraphLoadError::UnknownEndpoint(source))?;
    let t = *indices
        .get(&target)
        .ok_or(GraphLoadError::UnknownEndpoint(target))?;
    graph.add_edge(s, t, edge);
    Ok(())
}

fn store_data(
    open: &mut Option<Open>,
    keys: &HashMap<String, KeyDecl>,
    key: &str,
    text: &str,
) -> Result<(), GraphLoadError> {
    let Some(decl) = keys.get(key) else {
        tracing::debug!("Skipping <data> with undeclared key '{key}'");
        return Ok(());
    };

    let value = decl.ty.parse(&decl.name, text)?;

    match open.as_mut() {
        Some(Open::Node(node)) => {
            node.attrs.insert(decl.name.clone(), value);
        }
        Some(Open::Edge { edge, .. }) => {
            edge.attrs.insert(decl.name.clone(), value);
        }
        None => return Err(GraphLoadError::Structure("data")),
    }

    Ok(())
}

fn attr_of(e: &BytesStart, name: &str) -> Result<Option<String>, GraphLoadError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn require_attr(
    e: &BytesStart,
    name: &str,
    element: &'static str,
) -> Result<String, GraphLoadError> {
    attr_of(e, name)?.ok_or(GraphLoadError::Structure(element))
}
