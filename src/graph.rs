//! Directed road graph and shortest-path queries.
//!
//! # Data layout
//!
//! Outgoing edges are stored in **Compressed Sparse Row (CSR)** form. The
//! outgoing edges of node `n` occupy
//!
//! ```text
//! edge_to[ out_start[n] .. out_start[n+1] ]
//! ```
//!
//! with the matching physical lengths in `edge_length`. The graph is
//! immutable once built, so it can be shared by reference between any number
//! of concurrent optimization requests.
//!
//! # Nearest-node resolution
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the closest node, replacing a
//! user click or a stop address with a routable node.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// Dense node identifier, an index into the graph's node arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Marker for "no predecessor" in shortest-path trees.
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Shortest-path queries the optimizer needs from a road network.
///
/// Implementations must answer from immutable state: the same oracle is
/// queried from every request without locking.
pub trait GraphOracle: Send + Sync {
    /// Directed shortest-path length from `from` to `to`, or `None` when no
    /// path exists. `from == to` is always `Some(0.0)`.
    fn distance(&self, from: NodeId, to: NodeId) -> Option<f64>;

    /// Shortest-path lengths from `from` to every node in `targets`.
    ///
    /// The default answers each target separately; graphs that can build a
    /// full single-source tree should override it.
    fn distances_from(&self, from: NodeId, targets: &[NodeId]) -> Vec<Option<f64>> {
        targets.iter().map(|&to| self.distance(from, to)).collect()
    }

    /// Node sequence of one shortest path, both endpoints included.
    fn path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>>;

    /// Length of the shortest direct edge `from -> to`, if any.
    fn edge_length(&self, from: NodeId, to: NodeId) -> Option<f64>;

    /// Position of `node`, or `None` for an unknown id.
    fn position(&self, node: NodeId) -> Option<GeoPoint>;

    /// `true` if `node` is a valid id for this graph.
    fn contains(&self, node: NodeId) -> bool {
        self.position(node).is_some()
    }
}

// R-tree entry: a [lat, lon] point with its node.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared planar distance in degree space, good enough within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Directed road graph in CSR format plus a spatial index.
///
/// Build one with [`RoadGraphBuilder`].
pub struct RoadGraph {
    node_pos: Vec<GeoPoint>,
    /// External identifier of each node (OSM id when loaded from files).
    node_external_id: Vec<u64>,
    out_start: Vec<u32>,
    edge_to: Vec<NodeId>,
    /// Physical length of each edge in metres.
    edge_length: Vec<f64>,
    spatial_idx: RTree<NodeEntry>,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// External identifier recorded for `node` at build time.
    pub fn external_id(&self, node: NodeId) -> Option<u64> {
        self.node_external_id.get(node.index()).copied()
    }

    /// Outgoing `(neighbor, length)` pairs of `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let start = self.out_start[node.index()] as usize;
        let end = self.out_start[node.index() + 1] as usize;
        (start..end).map(move |e| (self.edge_to[e], self.edge_length[e]))
    }

    /// Closest node to `pos`.
    pub fn nearest_node(&self, pos: GeoPoint) -> Result<NodeId> {
        if !pos.is_finite() {
            return Err(RouteError::InvalidInput(format!(
                "stop coordinates ({}, {}) are not finite",
                pos.lat, pos.lon
            )));
        }
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|entry| entry.id)
            .ok_or(RouteError::EmptyGraph)
    }

    /// Resolve every point to its nearest node, preserving order.
    pub fn nearest_nodes(&self, points: &[GeoPoint]) -> Result<Vec<NodeId>> {
        points.iter().map(|&p| self.nearest_node(p)).collect()
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node.index() < self.node_count() {
            Ok(())
        } else {
            Err(RouteError::UnknownNode(node))
        }
    }

    /// Full single-source Dijkstra tree rooted at `origin`.
    pub fn shortest_path_tree(&self, origin: NodeId) -> Result<ShortestPathTree> {
        self.check_node(origin)?;
        Ok(self.dijkstra(origin, None))
    }

    /// Dijkstra from `origin`, stopping early once `target` is settled.
    fn dijkstra(&self, origin: NodeId, target: Option<NodeId>) -> ShortestPathTree {
        let n = self.node_count();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![NodeId::INVALID; n];
        dist[origin.index()] = 0.0;

        // Node id as secondary key keeps tie-breaking deterministic.
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), origin)));

        while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
            if Some(node) == target {
                break;
            }
            // Stale heap entry.
            if cost > dist[node.index()] {
                continue;
            }
            for (neighbor, length) in self.out_edges(node) {
                let next = cost + length;
                if next < dist[neighbor.index()] {
                    dist[neighbor.index()] = next;
                    prev[neighbor.index()] = node;
                    heap.push(Reverse((OrderedFloat(next), neighbor)));
                }
            }
        }

        ShortestPathTree { origin, dist, prev }
    }
}

impl GraphOracle for RoadGraph {
    fn distance(&self, from: NodeId, to: NodeId) -> Option<f64> {
        if self.check_node(from).is_err() || self.check_node(to).is_err() {
            return None;
        }
        if from == to {
            return Some(0.0);
        }
        self.dijkstra(from, Some(to)).distance_to(to)
    }

    fn distances_from(&self, from: NodeId, targets: &[NodeId]) -> Vec<Option<f64>> {
        match self.shortest_path_tree(from) {
            Ok(tree) => targets.iter().map(|&to| tree.distance_to(to)).collect(),
            Err(_) => vec![None; targets.len()],
        }
    }

    fn path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Ok(vec![from]);
        }
        self.dijkstra(from, Some(to))
            .path_to(to)
            .ok_or(RouteError::NotFound { from, to })
    }

    fn edge_length(&self, from: NodeId, to: NodeId) -> Option<f64> {
        if self.check_node(from).is_err() {
            return None;
        }
        self.out_edges(from)
            .filter(|&(neighbor, _)| neighbor == to)
            .map(|(_, length)| length)
            .min_by_key(|&length| OrderedFloat(length))
    }

    fn position(&self, node: NodeId) -> Option<GeoPoint> {
        self.node_pos.get(node.index()).copied()
    }
}

/// Result of a single-source Dijkstra run.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    origin: NodeId,
    dist: Vec<f64>,
    prev: Vec<NodeId>,
}

impl ShortestPathTree {
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Settled distance to `node`, `None` when unreachable or unknown.
    pub fn distance_to(&self, node: NodeId) -> Option<f64> {
        self.dist
            .get(node.index())
            .copied()
            .filter(|d| d.is_finite())
    }

    /// Walk predecessors back from `node` to the origin.
    pub fn path_to(&self, node: NodeId) -> Option<Vec<NodeId>> {
        self.distance_to(node)?;
        let mut path = vec![node];
        let mut cur = node;
        while cur != self.origin {
            cur = self.prev[cur.index()];
            if cur == NodeId::INVALID {
                return None;
            }
            path.push(cur);
        }
        path.reverse();
        Some(path)
    }
}

/// Incremental construction of a [`RoadGraph`].
///
/// ```
/// use delivery_route_ga::graph::{GeoPoint, GraphOracle, RoadGraphBuilder};
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(-9.93, -76.24));
/// let c = b.add_node(GeoPoint::new(-9.94, -76.24));
/// b.add_directed_edge(a, c, 120.0);
/// let graph = b.build();
/// assert_eq!(graph.distance(a, c), Some(120.0));
/// assert_eq!(graph.distance(c, a), None);
/// ```
#[derive(Default)]
pub struct RoadGraphBuilder {
    nodes: Vec<GeoPoint>,
    external_ids: Vec<u64>,
    raw_edges: Vec<(NodeId, NodeId, f64)>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        RoadGraphBuilder {
            nodes: Vec::with_capacity(nodes),
            external_ids: Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node; its external id defaults to its dense index.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let external = self.nodes.len() as u64;
        self.add_node_with_external_id(external, pos)
    }

    pub fn add_node_with_external_id(&mut self, external_id: u64, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.external_ids.push(external_id);
        id
    }

    /// Add a one-way street segment of `length` metres.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length: f64) {
        self.raw_edges.push((from, to, length));
    }

    /// Add a two-way street segment (one edge per direction).
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length: f64) {
        self.add_directed_edge(a, b, length);
        self.add_directed_edge(b, a, length);
    }

    pub fn build(self) -> RoadGraph {
        let node_count = self.nodes.len();
        let mut raw = self.raw_edges;
        // Stable, so parallel edges keep insertion order.
        raw.sort_by_key(|&(from, _, _)| from);

        let mut out_start = vec![0u32; node_count + 1];
        for &(from, _, _) in &raw {
            debug_assert!(from.index() < node_count);
            out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            out_start[i] += out_start[i - 1];
        }

        let edge_to = raw.iter().map(|&(_, to, _)| to).collect();
        let edge_length = raw.iter().map(|&(_, _, length)| length).collect();

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, pos)| NodeEntry {
                point: [pos.lat, pos.lon],
                id: NodeId(i as u32),
            })
            .collect();

        RoadGraph {
            node_pos: self.nodes,
            node_external_id: self.external_ids,
            out_start,
            edge_to,
            edge_length,
            spatial_idx: RTree::bulk_load(entries),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_graphs {
    use super::*;

    /// Unit square ring A→B→C→D→A with the reverse edges weighted 3,
    /// so the ring direction is always the cheaper way around.
    pub fn square_ring() -> (RoadGraph, [NodeId; 4]) {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let bb = b.add_node(GeoPoint::new(0.0, 1.0));
        let c = b.add_node(GeoPoint::new(1.0, 1.0));
        let d = b.add_node(GeoPoint::new(1.0, 0.0));
        for (from, to) in [(a, bb), (bb, c), (c, d), (d, a)] {
            b.add_directed_edge(from, to, 1.0);
            b.add_directed_edge(to, from, 3.0);
        }
        (b.build(), [a, bb, c, d])
    }

    /// One-way triangle A→B→C→A, every edge of length 1.
    pub fn one_way_triangle() -> (RoadGraph, [NodeId; 3]) {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let bb = b.add_node(GeoPoint::new(0.0, 1.0));
        let c = b.add_node(GeoPoint::new(1.0, 0.5));
        b.add_directed_edge(a, bb, 1.0);
        b.add_directed_edge(bb, c, 1.0);
        b.add_directed_edge(c, a, 1.0);
        (b.build(), [a, bb, c])
    }
}
