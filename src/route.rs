//! Expansion of a customer ordering into a continuous road path.

use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::graph::{GeoPoint, GraphOracle, NodeId};
use crate::heuristics::operators::is_valid_permutation;

/// Depot-to-depot path through the road graph.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// Graph nodes in driving order, no two consecutive entries equal.
    pub nodes: Vec<NodeId>,
    /// `(lat, lon)` of every node in `nodes`, for rendering.
    pub coordinates: Vec<GeoPoint>,
    /// Length recomputed by summing the traversed edges.
    pub distance: f64,
}

impl Route {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Stitch the shortest paths between consecutive stops of
/// `[depot, permutation.., depot]` into one node sequence.
///
/// Fails with [`RouteError::NotFound`] if any leg has no path; a route with
/// a missing leg would be geometrically disconnected.
pub fn reconstruct_route<G>(graph: &G, nodes: &[NodeId], permutation: &[usize]) -> Result<Route>
where
    G: GraphOracle + ?Sized,
{
    if nodes.is_empty() {
        return Err(RouteError::InvalidInput("no stops to route".into()));
    }
    if !is_valid_permutation(permutation, nodes.len()) {
        return Err(RouteError::InvalidInput(format!(
            "{:?} is not an ordering of customers 1..{}",
            permutation,
            nodes.len()
        )));
    }

    let mut sequence = Vec::with_capacity(permutation.len() + 2);
    sequence.push(nodes[0]);
    sequence.extend(permutation.iter().map(|&stop| nodes[stop]));
    sequence.push(nodes[0]);

    let mut path_nodes = vec![nodes[0]];
    for leg in sequence.windows(2) {
        let segment = graph.path(leg[0], leg[1])?;
        // Each segment starts where the previous one ended.
        path_nodes.extend(segment.into_iter().skip(1));
    }

    let mut distance = 0.0;
    for step in path_nodes.windows(2) {
        distance += graph
            .edge_length(step[0], step[1])
            .ok_or(RouteError::NotFound { from: step[0], to: step[1] })?;
    }

    let coordinates = path_nodes
        .iter()
        .map(|&n| graph.position(n).ok_or(RouteError::UnknownNode(n)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Route {
        nodes: path_nodes,
        coordinates,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_graphs::{one_way_triangle, square_ring};
    use crate::graph::{RoadGraph, RoadGraphBuilder};
    use crate::heuristics::genetic::optimize;
    use crate::matrix::build_distance_matrix;

    fn assert_no_consecutive_duplicates(route: &Route) {
        for pair in route.nodes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    /// 3x3 grid with two-way streets plus a one-way diagonal shortcut.
    fn grid() -> (RoadGraph, Vec<NodeId>) {
        let mut b = RoadGraphBuilder::new();
        let mut ids = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                ids.push(b.add_node(GeoPoint::new(row as f64 * 0.001, col as f64 * 0.001)));
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                let here = ids[row * 3 + col];
                if col < 2 {
                    b.add_road(here, ids[row * 3 + col + 1], 110.0 + row as f64);
                }
                if row < 2 {
                    b.add_road(here, ids[(row + 1) * 3 + col], 100.0 + col as f64 * 3.0);
                }
            }
        }
        b.add_directed_edge(ids[0], ids[4], 150.0);
        (b.build(), ids)
    }

    #[test]
    fn test_square_ring_route() {
        let (graph, [a, b, c, d]) = square_ring();
        let route = reconstruct_route(&graph, &[a, b, c, d], &[1, 2, 3]).unwrap();
        assert_eq!(route.nodes, vec![a, b, c, d, a]);
        assert_eq!(route.distance, 4.0);
        assert_eq!(route.coordinates.len(), 5);
        assert_eq!(route.coordinates[0], route.coordinates[4]);
    }

    #[test]
    fn test_route_distance_matches_optimizer() {
        let (graph, ids) = grid();
        let stops = vec![ids[0], ids[8], ids[2], ids[6], ids[4]];
        let matrix = build_distance_matrix(&graph, &stops).unwrap();
        let (perm, distance) = optimize(&matrix, 100, 30, 5, Some(77)).unwrap();

        let route = reconstruct_route(&graph, &stops, &perm).unwrap();
        assert!((route.distance - distance).abs() <= 1e-6 * distance.max(1.0));
        assert_no_consecutive_duplicates(&route);
        assert_eq!(route.nodes.first(), Some(&ids[0]));
        assert_eq!(route.nodes.last(), Some(&ids[0]));
    }

    #[test]
    fn test_one_way_detour_in_route() {
        let (graph, [a, b, c]) = one_way_triangle();
        // Visiting C before B forces two detours around the triangle.
        let route = reconstruct_route(&graph, &[a, b, c], &[2, 1]).unwrap();
        assert_eq!(route.nodes, vec![a, b, c, a, b, c, a]);
        assert_eq!(route.distance, 6.0);
        assert_no_consecutive_duplicates(&route);
    }

    #[test]
    fn test_stops_sharing_a_node() {
        let (graph, [a, b, ..]) = square_ring();
        let route = reconstruct_route(&graph, &[a, b, b], &[1, 2]).unwrap();
        assert_eq!(route.nodes, vec![a, b, a]);
        assert_no_consecutive_duplicates(&route);
    }

    #[test]
    fn test_unreachable_leg_fails() {
        let mut b = RoadGraphBuilder::new();
        let x = b.add_node(GeoPoint::new(0.0, 0.0));
        let y = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(x, y, 1.0);
        let graph = b.build();

        let result = reconstruct_route(&graph, &[x, y], &[1]);
        assert!(matches!(result, Err(RouteError::NotFound { from, to }) if from == y && to == x));
    }

    #[test]
    fn test_rejects_bad_permutation() {
        let (graph, nodes) = square_ring();
        assert!(matches!(
            reconstruct_route(&graph, &nodes, &[1, 1, 2]),
            Err(RouteError::InvalidInput(_))
        ));
        assert!(matches!(reconstruct_route(&graph, &[], &[]), Err(RouteError::InvalidInput(_))));
    }
}
