//! Region collections and the node → region seam.
//!
//! - `RegionSet`: ordered, keyed collection of region geometries.
//! - `RegionAssignment`: precomputed node → region-key map (the grid partitioner
//!   produces one).
//! - `RegionResolver`: single-method capability the engine asks for a node's region.
//!   Implemented by `RegionAssignment`, `AttributeResolver`, `ContainmentResolver` and
//!   plain closures.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Coord, Geometry};
use crate::network::{AttrValue, Attributes, CoordExtractor, NodeId};

/// Region reference: position in an ordered collection, or a caller-chosen name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionKey {
    Index(usize),
    Name(String),
}

impl RegionKey {
    /// Interpret an attribute value as a key: non-negative integers index, text names.
    pub fn from_attr(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Int(i) => usize::try_from(*i).ok().map(RegionKey::Index),
            AttrValue::Text(s) => Some(RegionKey::Name(s.clone())),
            _ => None,
        }
    }

    pub fn to_attr(&self) -> AttrValue {
        match self {
            // Grid indices stay far below i64::MAX.
            RegionKey::Index(i) => AttrValue::Int(*i as i64),
            RegionKey::Name(s) => AttrValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKey::Index(i) => write!(f, "#{i}"),
            RegionKey::Name(s) => f.write_str(s),
        }
    }
}

impl From<usize> for RegionKey {
    fn from(i: usize) -> Self {
        RegionKey::Index(i)
    }
}

impl From<&str> for RegionKey {
    fn from(s: &str) -> Self {
        RegionKey::Name(s.to_string())
    }
}

/// Ordered collection of keyed regions.
///
/// Invariant: keys are unique; `index` maps each key to its slot in `entries`.
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    entries: Vec<(RegionKey, Geometry)>,
    index: HashMap<RegionKey, usize>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions keyed by their position (`RegionKey::Index`).
    pub fn from_indexed(geometries: Vec<Geometry>) -> Self {
        let mut set = Self::new();
        for (i, g) in geometries.into_iter().enumerate() {
            set.insert(RegionKey::Index(i), g);
        }
        set
    }

    /// Insert a region, replacing the geometry of an existing key in place.
    pub fn insert(&mut self, key: RegionKey, geometry: Geometry) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = geometry,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, geometry));
            }
        }
    }

    pub fn get(&self, key: &RegionKey) -> Option<&Geometry> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionKey, &Geometry)> {
        self.entries.iter().map(|(k, g)| (k, g))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the first region (in collection order) that contains `p`.
    ///
    /// Regions ideally do not overlap; when they do, the earliest one wins.
    pub fn first_containing(&self, p: Coord) -> Option<&RegionKey> {
        self.entries
            .iter()
            .find(|(_, g)| g.contains(p))
            .map(|(k, _)| k)
    }
}

impl FromIterator<(RegionKey, Geometry)> for RegionSet {
    fn from_iter<I: IntoIterator<Item = (RegionKey, Geometry)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, g) in iter {
            set.insert(k, g);
        }
        set
    }
}

/// Resolves the region a node belongs to.
pub trait RegionResolver {
    fn resolve(&self, id: &NodeId, attrs: &Attributes) -> Option<RegionKey>;
}

impl<F> RegionResolver for F
where
    F: Fn(&NodeId, &Attributes) -> Option<RegionKey>,
{
    fn resolve(&self, id: &NodeId, attrs: &Attributes) -> Option<RegionKey> {
        self(id, attrs)
    }
}

/// Precomputed node → region map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionAssignment(BTreeMap<NodeId, RegionKey>);

impl RegionAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, region: RegionKey) -> Option<RegionKey> {
        self.0.insert(node, region)
    }

    pub fn get(&self, node: &NodeId) -> Option<&RegionKey> {
        self.0.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &RegionKey)> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NodeId, RegionKey)> for RegionAssignment {
    fn from_iter<I: IntoIterator<Item = (NodeId, RegionKey)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl RegionResolver for RegionAssignment {
    fn resolve(&self, id: &NodeId, _attrs: &Attributes) -> Option<RegionKey> {
        self.0.get(id).cloned()
    }
}

/// Reads the region key from a node attribute (default `region`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeResolver {
    pub key: String,
}

impl AttributeResolver {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for AttributeResolver {
    fn default() -> Self {
        Self::new("region")
    }
}

impl RegionResolver for AttributeResolver {
    fn resolve(&self, _id: &NodeId, attrs: &Attributes) -> Option<RegionKey> {
        attrs.get(&self.key).and_then(RegionKey::from_attr)
    }
}

/// Finds the first region of a set that contains the node's coordinate.
pub struct ContainmentResolver<'a, E: ?Sized> {
    regions: &'a RegionSet,
    extractor: &'a E,
}

impl<'a, E: CoordExtractor + ?Sized> ContainmentResolver<'a, E> {
    pub fn new(regions: &'a RegionSet, extractor: &'a E) -> Self {
        Self { regions, extractor }
    }
}

impl<E: CoordExtractor + ?Sized> RegionResolver for ContainmentResolver<'_, E> {
    fn resolve(&self, id: &NodeId, attrs: &Attributes) -> Option<RegionKey> {
        let p = self.extractor.extract(id, attrs)?;
        self.regions.first_containing(p).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;
    use crate::network::XyExtractor;

    fn square(x0: f64, y0: f64) -> Geometry {
        Polygon::rect(Coord::new(x0, y0), Coord::new(x0 + 1.0, y0 + 1.0))
            .unwrap()
            .into()
    }

    fn attrs_at(x: f64, y: f64) -> Attributes {
        let mut a = Attributes::new();
        a.insert("x".into(), x.into());
        a.insert("y".into(), y.into());
        a
    }

    #[test]
    fn region_set_keeps_order_and_replaces_in_place() {
        let mut set = RegionSet::new();
        set.insert("north".into(), square(0.0, 1.0));
        set.insert("south".into(), square(0.0, 0.0));
        set.insert("north".into(), square(5.0, 5.0));
        let keys: Vec<String> = set.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["north", "south"]);
        assert!(set
            .get(&"north".into())
            .unwrap()
            .contains(Coord::new(5.5, 5.5)));
    }

    #[test]
    fn containment_resolver_picks_first_match() {
        let set = RegionSet::from_indexed(vec![square(0.0, 0.0), square(0.0, 0.0), square(3.0, 3.0)]);
        let ex = XyExtractor::default();
        let r = ContainmentResolver::new(&set, &ex);
        assert_eq!(
            r.resolve(&NodeId::Int(1), &attrs_at(0.5, 0.5)),
            Some(RegionKey::Index(0))
        );
        assert_eq!(
            r.resolve(&NodeId::Int(1), &attrs_at(3.5, 3.5)),
            Some(RegionKey::Index(2))
        );
        assert_eq!(r.resolve(&NodeId::Int(1), &attrs_at(9.0, 9.0)), None);
    }

    #[test]
    fn attribute_resolver_reads_ints_and_names() {
        let r = AttributeResolver::default();
        let mut a = Attributes::new();
        a.insert("region".into(), AttrValue::Int(4));
        assert_eq!(r.resolve(&NodeId::Int(0), &a), Some(RegionKey::Index(4)));
        a.insert("region".into(), "Back Bay".into());
        assert_eq!(r.resolve(&NodeId::Int(0), &a), Some(RegionKey::Name("Back Bay".into())));
        a.insert("region".into(), AttrValue::Int(-1));
        assert_eq!(r.resolve(&NodeId::Int(0), &a), None);
    }

    #[test]
    fn closures_are_resolvers() {
        let r = |id: &NodeId, _: &Attributes| match id {
            NodeId::Int(i) if *i >= 0 => Some(RegionKey::Index(*i as usize)),
            _ => None,
        };
        assert_eq!(
            r.resolve(&NodeId::Int(2), &Attributes::new()),
            Some(RegionKey::Index(2))
        );
    }
}
