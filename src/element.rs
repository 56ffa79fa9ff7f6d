use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Class tag carried by the currently selected node
pub const ACTIVE_NODE_CLASS: &str = "active-node";

/// Class tag carried by the currently selected edge
pub const ACTIVE_EDGE_CLASS: &str = "active-edge";

/// Element group: every element is either a node or an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Edge,
}

impl ElementKind {
    /// Selector keyword for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Edge => "edge",
        }
    }

    /// Group name used in the wire format
    pub fn group(self) -> &'static str {
        match self {
            ElementKind::Node => "nodes",
            ElementKind::Edge => "edges",
        }
    }

    /// Class tag used to highlight a selected element of this kind
    pub fn active_class(self) -> &'static str {
        match self {
            ElementKind::Node => ACTIVE_NODE_CLASS,
            ElementKind::Edge => ACTIVE_EDGE_CLASS,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned reference to an element by kind and id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: String,
}

impl ElementRef {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Node,
            id: id.into(),
        }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Edge,
            id: id.into(),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Model-space position of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A diagram node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Position on the diagram plane
    pub position: Position,

    /// Arbitrary payload (everything in `data` except the id)
    pub data: Map<String, Value>,

    /// Style-class tags
    pub classes: BTreeSet<String>,

    /// Element-level fields the editor does not interpret (`locked`, `grabbable`, ...)
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a node with no payload and no classes
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            data: Map::new(),
            classes: BTreeSet::new(),
            extra: Map::new(),
        }
    }

    /// Attach a payload entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Classification of an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Loaded from the diagram or drawn by the author
    #[default]
    Normal,
    /// Synthesized when a node between two others was deleted
    Bypass,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Normal => "normal",
            EdgeKind::Bypass => "bypass",
        }
    }
}

/// A directed diagram edge
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Unique identifier
    pub id: String,

    /// Node the edge starts FROM
    pub source: String,

    /// Node the edge points TO
    pub target: String,

    pub kind: EdgeKind,

    /// Arbitrary payload (everything in `data` except id, source and target)
    pub data: Map<String, Value>,

    /// Style-class tags
    pub classes: BTreeSet<String>,

    pub extra: Map<String, Value>,
}

impl Edge {
    /// Create a normal edge
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Normal,
            data: Map::new(),
            classes: BTreeSet::new(),
            extra: Map::new(),
        }
    }

    /// Create a synthetic bypass edge; the classification is mirrored into `data.kind`
    pub fn bypass(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut edge = Self::new(id, source, target);
        edge.kind = EdgeKind::Bypass;
        edge.data
            .insert("kind".to_string(), Value::from(EdgeKind::Bypass.as_str()));
        edge
    }

    /// Check if this edge touches a given node
    pub fn involves(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Check if this edge starts from a given node
    pub fn starts_from(&self, node_id: &str) -> bool {
        self.source == node_id
    }

    /// Check if this edge ends at a given node
    pub fn ends_at(&self, node_id: &str) -> bool {
        self.target == node_id
    }

    /// Check if this edge goes exactly `source -> target`
    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Borrowed view over either element kind, used for selector matching
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> Element<'a> {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Edge(_) => ElementKind::Edge,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            Element::Node(node) => &node.id,
            Element::Edge(edge) => &edge.id,
        }
    }

    pub fn classes(&self) -> &'a BTreeSet<String> {
        match self {
            Element::Node(node) => &node.classes,
            Element::Edge(edge) => &edge.classes,
        }
    }

    pub fn data(&self) -> &'a Map<String, Value> {
        match self {
            Element::Node(node) => &node.data,
            Element::Edge(edge) => &edge.data,
        }
    }

    pub fn to_ref(&self) -> ElementRef {
        ElementRef {
            kind: self.kind(),
            id: self.id().to_string(),
        }
    }
}

// ========== Wire Format ==========

/// Class tags as they appear on the wire: a space-separated string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireClasses {
    Text(String),
    List(Vec<String>),
}

impl WireClasses {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            WireClasses::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            WireClasses::List(list) => list
                .into_iter()
                .map(|class| class.trim().to_string())
                .filter(|class| !class.is_empty())
                .collect(),
        }
    }
}

/// One element record as accepted from and written to diagram documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default)]
    pub data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<WireClasses>,

    /// Every other key of the record, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementRecord {
    /// Whether this record describes an edge
    pub fn is_edge(&self) -> bool {
        match self.group.as_deref() {
            Some("edges") => true,
            Some("nodes") => false,
            _ => self.data.contains_key("source") && self.data.contains_key("target"),
        }
    }

    /// Convert into a node, taking the id out of the payload
    pub fn into_node(mut self) -> Result<Node, String> {
        let id = take_identifier(&mut self.data, "id")
            .ok_or_else(|| "node record without a string `data.id`".to_string())?;

        Ok(Node {
            id,
            position: self.position.unwrap_or_default(),
            data: self.data,
            classes: self.classes.map(WireClasses::into_set).unwrap_or_default(),
            extra: self.extra,
        })
    }

    /// Convert into an edge, taking id, source and target out of the payload
    pub fn into_edge(mut self) -> Result<Edge, String> {
        let id = take_identifier(&mut self.data, "id")
            .ok_or_else(|| "edge record without a string `data.id`".to_string())?;
        let source = take_identifier(&mut self.data, "source")
            .ok_or_else(|| format!("edge `{}` has no `data.source`", id))?;
        let target = take_identifier(&mut self.data, "target")
            .ok_or_else(|| format!("edge `{}` has no `data.target`", id))?;

        let kind = match self.data.get("kind").and_then(Value::as_str) {
            Some("bypass") => EdgeKind::Bypass,
            _ => EdgeKind::Normal,
        };

        Ok(Edge {
            id,
            source,
            target,
            kind,
            data: self.data,
            classes: self.classes.map(WireClasses::into_set).unwrap_or_default(),
            extra: self.extra,
        })
    }

    pub fn from_node(node: &Node) -> Self {
        let mut data = node.data.clone();
        data.insert("id".to_string(), Value::from(node.id.clone()));
        Self {
            group: Some(ElementKind::Node.group().to_string()),
            data,
            position: Some(node.position),
            classes: Some(WireClasses::Text(join_classes(&node.classes))),
            extra: node.extra.clone(),
        }
    }

    pub fn from_edge(edge: &Edge) -> Self {
        let mut data = edge.data.clone();
        data.insert("id".to_string(), Value::from(edge.id.clone()));
        data.insert("source".to_string(), Value::from(edge.source.clone()));
        data.insert("target".to_string(), Value::from(edge.target.clone()));
        Self {
            group: Some(ElementKind::Edge.group().to_string()),
            data,
            position: None,
            classes: Some(WireClasses::Text(join_classes(&edge.classes))),
            extra: edge.extra.clone(),
        }
    }
}

/// The `elements` field of a diagram: grouped or a flat list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementsWire {
    Flat(Vec<ElementRecord>),
    Grouped {
        #[serde(default)]
        nodes: Vec<ElementRecord>,
        #[serde(default)]
        edges: Vec<ElementRecord>,
    },
}

impl ElementsWire {
    /// Split the records into typed nodes and edges, preserving their order
    pub fn into_parts(self) -> Result<(Vec<Node>, Vec<Edge>), String> {
        let (node_records, edge_records) = match self {
            ElementsWire::Grouped { nodes, edges } => (nodes, edges),
            ElementsWire::Flat(records) => records.into_iter().partition(|r| !r.is_edge()),
        };

        let nodes = node_records
            .into_iter()
            .map(ElementRecord::into_node)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = edge_records
            .into_iter()
            .map(ElementRecord::into_edge)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((nodes, edges))
    }
}

/// Ids may be written as strings or bare numbers
fn take_identifier(data: &mut Map<String, Value>, key: &str) -> Option<String> {
    match data.remove(key)? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn join_classes(classes: &BTreeSet<String>) -> String {
    classes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}
