//! Undirected attributed network with planar node coordinates.
//!
//! Purpose
//! - Hold node ids, per-node attribute maps and undirected edges with their own
//!   attributes. Obfuscation copies this structure and rewrites only coordinates.
//!
//! Conventions
//! - Nodes iterate in id order and edges in normalized endpoint order, so every walk
//!   over a network (and every seeded run) is deterministic.
//! - Edges are unordered pairs; `(a, b)` and `(b, a)` name the same edge. Both
//!   endpoints must exist when an edge is added.
//! - Coordinates live in numeric attributes, `x`/`y` unless configured otherwise.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};
use crate::geom::Coord;

/// Node identifier: an integer or a name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Name(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(i) => write!(f, "{i}"),
            NodeId::Name(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(i: i64) -> Self {
        NodeId::Int(i)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Name(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Name(s)
    }
}

/// Attribute value carried by nodes and edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AttrValue::Int(i) => Some(i as f64),
            AttrValue::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// Normalized undirected edge key (`a <= b`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    a: NodeId,
    b: NodeId,
}

impl EdgeKey {
    pub fn new(u: NodeId, v: NodeId) -> Self {
        if u <= v {
            Self { a: u, b: v }
        } else {
            Self { a: v, b: u }
        }
    }

    #[inline]
    pub fn endpoints(&self) -> (&NodeId, &NodeId) {
        (&self.a, &self.b)
    }
}

/// Reads a node's current coordinate.
pub trait CoordExtractor {
    fn extract(&self, id: &NodeId, attrs: &Attributes) -> Option<Coord>;
}

impl<F> CoordExtractor for F
where
    F: Fn(&NodeId, &Attributes) -> Option<Coord>,
{
    fn extract(&self, id: &NodeId, attrs: &Attributes) -> Option<Coord> {
        self(id, attrs)
    }
}

/// Coordinate from two numeric attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XyExtractor {
    pub x_key: String,
    pub y_key: String,
}

impl XyExtractor {
    pub fn new(x_key: impl Into<String>, y_key: impl Into<String>) -> Self {
        Self {
            x_key: x_key.into(),
            y_key: y_key.into(),
        }
    }
}

impl Default for XyExtractor {
    fn default() -> Self {
        Self::new("x", "y")
    }
}

impl CoordExtractor for XyExtractor {
    fn extract(&self, _id: &NodeId, attrs: &Attributes) -> Option<Coord> {
        let x = attrs.get(&self.x_key)?.as_f64()?;
        let y = attrs.get(&self.y_key)?.as_f64()?;
        Some(Coord::new(x, y))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr", into = "NetworkRepr")]
pub struct Network {
    nodes: BTreeMap<NodeId, Attributes>,
    edges: BTreeMap<EdgeKey, Attributes>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, merging `attrs` into any existing attributes.
    pub fn add_node(&mut self, id: impl Into<NodeId>, attrs: Attributes) {
        self.nodes.entry(id.into()).or_default().extend(attrs);
    }

    /// Insert a node at `(x, y)` under the default `x`/`y` keys.
    pub fn add_node_at(&mut self, id: impl Into<NodeId>, x: f64, y: f64) {
        let mut attrs = Attributes::new();
        attrs.insert("x".into(), AttrValue::Float(x));
        attrs.insert("y".into(), AttrValue::Float(y));
        self.add_node(id, attrs);
    }

    /// Insert or replace the edge `{u, v}`. Both endpoints must already exist.
    pub fn add_edge(
        &mut self,
        u: impl Into<NodeId>,
        v: impl Into<NodeId>,
        attrs: Attributes,
    ) -> Result<()> {
        let (u, v) = (u.into(), v.into());
        for id in [&u, &v] {
            if !self.nodes.contains_key(id) {
                return Err(GeoError::UnknownNode(id.clone()));
            }
        }
        self.edges.insert(EdgeKey::new(u, v), attrs);
        Ok(())
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Attributes> {
        let attrs = self.nodes.remove(id)?;
        self.edges.retain(|k, _| k.a != *id && k.b != *id);
        Some(attrs)
    }

    #[inline]
    pub fn node(&self, id: &NodeId) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Attributes)> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Attributes)> {
        self.edges.iter()
    }

    pub fn edge(&self, u: &NodeId, v: &NodeId) -> Option<&Attributes> {
        self.edges.get(&EdgeKey::new(u.clone(), v.clone()))
    }

    #[inline]
    pub fn has_edge(&self, u: &NodeId, v: &NodeId) -> bool {
        self.edge(u, v).is_some()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of incident edges; a self-loop counts twice.
    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges
            .keys()
            .map(|k| usize::from(k.a == *id) + usize::from(k.b == *id))
            .sum()
    }

    /// Set one attribute on an existing node.
    pub fn set_attr(&mut self, id: &NodeId, key: &str, value: AttrValue) -> Result<()> {
        let attrs = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GeoError::UnknownNode(id.clone()))?;
        attrs.insert(key.to_string(), value);
        Ok(())
    }

    /// Overwrite a node's coordinate attributes.
    pub fn set_coord(&mut self, id: &NodeId, c: Coord, x_key: &str, y_key: &str) -> Result<()> {
        self.set_attr(id, x_key, AttrValue::Float(c.x))?;
        self.set_attr(id, y_key, AttrValue::Float(c.y))
    }

    /// Coordinates of every node the extractor can read, in node order.
    pub fn coords<'a, E>(&'a self, extractor: &'a E) -> impl Iterator<Item = (&'a NodeId, Coord)> + 'a
    where
        E: CoordExtractor + ?Sized,
    {
        self.nodes
            .iter()
            .filter_map(move |(id, attrs)| extractor.extract(id, attrs).map(|c| (id, c)))
    }

    /// Subnetwork induced by `keep`: kept nodes and the edges between them.
    pub fn induced<F>(&self, mut keep: F) -> Network
    where
        F: FnMut(&NodeId, &Attributes) -> bool,
    {
        let nodes: BTreeMap<NodeId, Attributes> = self
            .nodes
            .iter()
            .filter(|(id, attrs)| keep(id, attrs))
            .map(|(id, attrs)| (id.clone(), attrs.clone()))
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|(k, _)| nodes.contains_key(&k.a) && nodes.contains_key(&k.b))
            .map(|(k, attrs)| (k.clone(), attrs.clone()))
            .collect();
        Network { nodes, edges }
    }
}

#[derive(Serialize, Deserialize)]
struct NodeRepr {
    id: NodeId,
    #[serde(default)]
    attrs: Attributes,
}

#[derive(Serialize, Deserialize)]
struct EdgeRepr {
    a: NodeId,
    b: NodeId,
    #[serde(default)]
    attrs: Attributes,
}

#[derive(Serialize, Deserialize)]
struct NetworkRepr {
    nodes: Vec<NodeRepr>,
    #[serde(default)]
    edges: Vec<EdgeRepr>,
}

impl TryFrom<NetworkRepr> for Network {
    type Error = GeoError;
    fn try_from(r: NetworkRepr) -> Result<Self> {
        let mut net = Network::new();
        for n in r.nodes {
            net.add_node(n.id, n.attrs);
        }
        for e in r.edges {
            net.add_edge(e.a, e.b, e.attrs)?;
        }
        Ok(net)
    }
}

impl From<Network> for NetworkRepr {
    fn from(net: Network) -> Self {
        NetworkRepr {
            nodes: net
                .nodes
                .into_iter()
                .map(|(id, attrs)| NodeRepr { id, attrs })
                .collect(),
            edges: net
                .edges
                .into_iter()
                .map(|(k, attrs)| EdgeRepr {
                    a: k.a,
                    b: k.b,
                    attrs,
                })
                .collect(),
        }
    }
}
